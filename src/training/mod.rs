//! Model training module
//!
//! Provides the model bank and the regressors it trains:
//! - Linear regression (ordinary least squares) on the scaled matrix
//! - Random forest (bagged regression trees) on the encoded matrix
//! - Gradient boosting (least-squares boosted trees) on the encoded matrix
//! - Hold-out split and k-fold cross-validation
//! - Regression metrics and model ranking

mod bundle;
mod config;
mod engine;
mod models;
pub mod cross_validation;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod linear_models;
pub mod random_forest;

pub use bundle::ModelBundle;
pub use config::{ModelKind, TrainingConfig};
pub use engine::{Estimator, ModelBank, ModelFailure, TrainedModel, TrainingOutcome};
pub use models::{r2_score, Metric, ModelMetrics, RegressionScores};
pub use cross_validation::{train_test_split, CVResults, CVSplit, CVStrategy, CrossValidator};
pub use decision_tree::{DecisionTree, TreeNode};
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use linear_models::LinearRegression;
pub use random_forest::RandomForest;
