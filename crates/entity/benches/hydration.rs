//! Hydration Performance Benchmark
//!
//! Measures single-row and bulk hydration through the derive-generated
//! dispatch, extraction, and the raw coercion engine on its own.

use chrono::{DateTime, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use elif_entity::{hydrate_value, Entity, Hydrator, Property, Row, SemanticType};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Default, Entity)]
#[entity(table = "accounts")]
pub struct Account {
    #[id]
    #[uuid]
    pub id: Property<Uuid>,

    #[field(type = "string", length = 120)]
    pub name: Property<String>,

    #[field(type = "integer")]
    pub age: Property<Option<i32>>,

    #[field(type = "boolean")]
    pub active: Property<bool>,

    #[field(type = "decimal", precision = 12, scale = 2)]
    pub balance: Property<Decimal>,

    #[field(type = "simple_array")]
    pub roles: Property<Vec<String>>,

    #[field(type = "datetime")]
    pub created_at: Property<DateTime<Utc>>,
}

fn account_row(i: usize) -> Row {
    Row::new()
        .with_column("id", Uuid::new_v4().to_string())
        .with_column("name", format!("Account {}", i))
        .with_column("age", (20 + i % 50).to_string())
        .with_column("active", if i % 2 == 0 { "1" } else { "0" })
        .with_column("balance", "1024.50")
        .with_column("roles", "admin,editor")
        .with_column("created_at", "2024-03-05 10:20:30")
}

fn bench_hydration(c: &mut Criterion) {
    let mut group = c.benchmark_group("hydration");
    let hydrator = Hydrator::default();
    hydrator.register::<Account>().unwrap();

    let row = account_row(1);
    group.bench_function("single_row", |b| {
        b.iter(|| {
            let account: Account = hydrator.hydrate(black_box(&row)).unwrap();
            black_box(account)
        })
    });

    let account: Account = hydrator.hydrate(&row).unwrap();
    group.bench_function("extract_row", |b| {
        b.iter(|| black_box(hydrator.extract(black_box(&account), None).unwrap()))
    });

    for &count in &[10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("batch", count), &count, |b, &count| {
            let rows: Vec<Row> = (0..count).map(account_row).collect();
            b.iter(|| black_box(hydrator.hydrate_batch::<Account>(black_box(&rows)).unwrap()))
        });
    }

    group.finish();
}

fn bench_coercion(c: &mut Criterion) {
    let mut group = c.benchmark_group("coercion");

    let cases = [
        (SemanticType::Integer, json!("12345")),
        (SemanticType::Decimal, json!("12345.67890")),
        (SemanticType::DateTime, json!("2024-03-05T10:20:30Z")),
        (SemanticType::Timestamp, json!(1700000000)),
        (SemanticType::Json, json!("{\"a\":[1,2,3]}")),
        (SemanticType::SimpleArray, json!("a,b,c,d")),
    ];

    for (ty, raw) in cases {
        group.bench_with_input(BenchmarkId::new("hydrate", ty), &raw, |b, raw| {
            b.iter(|| black_box(hydrate_value(ty, black_box(raw)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hydration, bench_coercion);
criterion_main!(benches);
