use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nd_forecast::demand_loader::records_to_frame;
use nd_forecast::features::{build_feature_table, feature_matrix};
use nd_forecast::split::train_test_split;
use nd_forecast::DemandRecord;

/// One year of half-hourly records.
fn year_of_records() -> Vec<DemandRecord> {
    let start = NaiveDate::from_ymd_opt(2022, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..365 * 48)
        .map(|i| DemandRecord {
            timestamp: start + Duration::minutes(30 * i as i64),
            settlement_period: (i % 48) as i64 + 1,
            demand_mw: 25000.0 + (i % 48) as f64 * 100.0,
        })
        .collect()
}

fn benchmark_feature_table(c: &mut Criterion) {
    let frame = records_to_frame(&year_of_records()).unwrap();

    c.bench_function("build_feature_table_1y", |b| {
        b.iter(|| {
            let _table = black_box(build_feature_table(&frame));
        });
    });
}

fn benchmark_split_and_matrix(c: &mut Criterion) {
    let table = build_feature_table(&records_to_frame(&year_of_records()).unwrap()).unwrap();

    c.bench_function("split_and_feature_matrix_1y", |b| {
        b.iter(|| {
            let (train, _test) = train_test_split(&table, 0.8).unwrap();
            let _matrix = black_box(feature_matrix(&train));
        });
    });
}

criterion_group!(benches, benchmark_feature_table, benchmark_split_and_matrix);
criterion_main!(benches);
