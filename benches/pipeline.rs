use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ml_builder::pipeline::{ExecutorConfig, PipelineExecutor, PipelineRequest, PipelineStep};
use ml_builder::training::{DecisionTree, LogisticRegression};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::fmt::Write as _;

fn create_classification_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>() * 10.0);
    let y = x
        .rows()
        .into_iter()
        .map(|row| if row.sum() + rng.gen::<f64>() > 5.0 * n_features as f64 { 1.0 } else { 0.0 })
        .collect();
    (x, y)
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    group.sample_size(10);

    for n_rows in [500, 2000, 5000].iter() {
        let data = create_classification_data(*n_rows, 8);

        group.bench_with_input(BenchmarkId::new("decision_tree", n_rows), &data, |b, (x, y)| {
            b.iter(|| {
                let mut tree = DecisionTree::new().with_random_state(42);
                tree.fit(black_box(x), black_box(y)).unwrap();
            })
        });

        group.bench_with_input(BenchmarkId::new("logistic_regression", n_rows), &data, |b, (x, y)| {
            b.iter(|| {
                let mut model = LogisticRegression::new().with_random_state(42);
                model.fit(black_box(x), black_box(y)).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_pipeline_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_run");
    group.sample_size(10);

    let dir = tempfile::TempDir::new().unwrap();
    let uploads = dir.path().join("uploads");
    std::fs::create_dir_all(&uploads).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut csv = String::from("f1,f2,f3,color,label\n");
    for i in 0..2000 {
        let color = ["red", "green", "blue"][i % 3];
        let f1: f64 = rng.gen();
        let label = if f1 > 0.5 { "yes" } else { "no" };
        writeln!(csv, "{},{},{},{},{}", f1, rng.gen::<f64>(), i % 13, color, label).unwrap();
    }
    std::fs::write(uploads.join("bench.csv"), csv).unwrap();

    let executor = PipelineExecutor::new(ExecutorConfig::new(uploads, dir.path().join("models")));
    let request = PipelineRequest::new(
        "bench.csv",
        vec![
            PipelineStep::new("1", "drop_nulls"),
            PipelineStep::new("2", "standard_scaler"),
            PipelineStep::new("3", "train_test_split").with_param("test_size", 0.25),
            PipelineStep::new("4", "decision_tree_classifier").with_param("max_depth", 6),
        ],
    );

    group.bench_function("decision_tree_2000_rows", |b| {
        b.iter(|| {
            let result = executor.run(black_box(&request));
            assert!(result.success);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_fit, bench_pipeline_run);
criterion_main!(benches);
