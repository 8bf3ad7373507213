//! Shared fixtures: a seeded synthetic salary dataset

#![allow(dead_code)]

use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use salary_estimator::prelude::*;

pub const EDUCATION: [(&str, f64); 4] = [
    ("High School", 0.8),
    ("Bachelor's", 1.0),
    ("Master's", 1.2),
    ("PhD", 1.4),
];

pub const JOB_TITLES: [(&str, f64); 6] = [
    ("Software Engineer", 95000.0),
    ("Data Scientist", 105000.0),
    ("Marketing Manager", 80000.0),
    ("Sales Representative", 55000.0),
    ("HR Manager", 70000.0),
    ("Accountant", 60000.0),
];

pub const LOCATIONS: [(&str, f64); 5] = [
    ("New York, NY", 1.3),
    ("San Francisco, CA", 1.4),
    ("Austin, TX", 1.0),
    ("Chicago, IL", 1.05),
    ("Remote", 0.95),
];

pub const INDUSTRIES: [(&str, f64); 4] = [
    ("Technology", 1.15),
    ("Finance", 1.1),
    ("Healthcare", 1.0),
    ("Retail", 0.85),
];

pub const COMPANY_SIZES: [&str; 4] = [
    "Small (1-50)",
    "Medium (51-200)",
    "Large (201-1000)",
    "Enterprise (1000+)",
];

pub const GENDERS: [&str; 3] = ["Male", "Female", "Other"];
pub const REMOTE: [&str; 3] = ["Yes", "No", "Hybrid"];

/// `n` synthetic employees; identical for identical seeds
pub fn salary_dataset(n: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut age = Vec::with_capacity(n);
    let mut gender = Vec::with_capacity(n);
    let mut education = Vec::with_capacity(n);
    let mut experience = Vec::with_capacity(n);
    let mut job_title = Vec::with_capacity(n);
    let mut location = Vec::with_capacity(n);
    let mut industry = Vec::with_capacity(n);
    let mut company_size = Vec::with_capacity(n);
    let mut remote_work = Vec::with_capacity(n);
    let mut salary = Vec::with_capacity(n);

    for _ in 0..n {
        let exp: i64 = rng.gen_range(0..=40);
        let (edu, edu_mult) = EDUCATION[rng.gen_range(0..EDUCATION.len())];
        let (title, base) = JOB_TITLES[rng.gen_range(0..JOB_TITLES.len())];
        let (loc, loc_mult) = LOCATIONS[rng.gen_range(0..LOCATIONS.len())];
        let (ind, ind_mult) = INDUSTRIES[rng.gen_range(0..INDUSTRIES.len())];
        let noise: f64 = rng.gen_range(0.9..1.1);

        let value = (base + 1800.0 * exp as f64) * edu_mult * loc_mult * ind_mult * noise;

        age.push(22 + exp + rng.gen_range(0..6));
        gender.push(GENDERS[rng.gen_range(0..GENDERS.len())]);
        education.push(edu);
        experience.push(exp);
        job_title.push(title);
        location.push(loc);
        industry.push(ind);
        company_size.push(COMPANY_SIZES[rng.gen_range(0..COMPANY_SIZES.len())]);
        remote_work.push(REMOTE[rng.gen_range(0..REMOTE.len())]);
        salary.push((value / 100.0).round() * 100.0);
    }

    df!(
        "age" => age,
        "gender" => gender,
        "education" => education,
        "experience" => experience,
        "job_title" => job_title,
        "location" => location,
        "industry" => industry,
        "company_size" => company_size,
        "remote_work" => remote_work,
        "salary" => salary
    )
    .unwrap()
}

/// The five-field subset: experience, education, job title, location, industry
pub fn core_dataset(n: usize, seed: u64) -> DataFrame {
    salary_dataset(n, seed)
        .select(["experience", "education", "job_title", "location", "industry", "salary"])
        .unwrap()
}

/// A fully valid request
pub fn engineer_request() -> Record {
    Record::new()
        .with("experience", 5)
        .with("education", "Bachelor's")
        .with("job_title", "Software Engineer")
        .with("location", "New York, NY")
        .with("industry", "Technology")
}

/// Smaller ensembles keep the suite fast
pub fn fast_config() -> TrainingConfig {
    TrainingConfig::new().with_n_estimators(25)
}
