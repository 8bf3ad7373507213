use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use salary_estimator::prelude::*;
use std::sync::Arc;

const TITLES: [&str; 4] = ["Software Engineer", "Data Scientist", "Accountant", "HR Manager"];
const EDUCATION: [&str; 4] = ["High School", "Bachelor's", "Master's", "PhD"];
const LOCATIONS: [&str; 3] = ["New York, NY", "Austin, TX", "Remote"];

fn create_salary_data(n_rows: usize) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let experience: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(0.0..40.0)).collect();
    let title: Vec<&str> = (0..n_rows).map(|_| TITLES[rng.gen_range(0..TITLES.len())]).collect();
    let education: Vec<&str> = (0..n_rows).map(|_| EDUCATION[rng.gen_range(0..EDUCATION.len())]).collect();
    let location: Vec<&str> = (0..n_rows).map(|_| LOCATIONS[rng.gen_range(0..LOCATIONS.len())]).collect();

    let salary: Vec<f64> = experience
        .iter()
        .map(|e| 50000.0 + 2000.0 * e + rng.gen::<f64>() * 5000.0)
        .collect();

    df!(
        "experience" => experience,
        "job_title" => title,
        "education" => education,
        "location" => location,
        "salary" => salary
    )
    .unwrap()
}

fn requests(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            Record::new()
                .with("experience", (i % 40) as f64)
                .with("job_title", TITLES[i % TITLES.len()])
                .with("education", EDUCATION[i % EDUCATION.len()])
                .with("location", LOCATIONS[i % LOCATIONS.len()])
        })
        .collect()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [1000, 5000].iter() {
        let df = create_salary_data(*n_rows);

        group.bench_with_input(
            BenchmarkId::new("train", n_rows),
            &df,
            |b, df| {
                b.iter(|| {
                    let bank = ModelBank::new(TrainingConfig::new().with_n_estimators(50));
                    bank.train(black_box(df)).unwrap()
                })
            },
        );
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train once
    let outcome = ModelBank::new(TrainingConfig::new().with_n_estimators(50))
        .train(&create_salary_data(5000))
        .unwrap();
    let predictor = Predictor::new(Arc::clone(&outcome.bundle));

    for n_rows in [100, 1000, 10000].iter() {
        let batch = requests(*n_rows);

        group.bench_with_input(
            BenchmarkId::new("predict_batch", n_rows),
            &batch,
            |b, batch| b.iter(|| predictor.predict_batch(black_box(batch), None)),
        );
    }

    let record = requests(1).remove(0);
    group.bench_function("predict_with_confidence", |b| {
        b.iter(|| predictor.predict_with_confidence(black_box(&record), None))
    });

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
