//! Performance benchmarks for the billing engine.
//!
//! This benchmark suite verifies that the engine meets its targets:
//! - Single driver-week calculation: < 100μs mean
//! - Preview of a 100-driver fleet: < 10ms mean
//! - Full generation run for a 100-driver fleet: < 50ms mean
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;
use uuid::Uuid;

use fleet_billing::calculation::{
    DriverWeekFacts, PeriodWindow, calculate_driver_week,
};
use fleet_billing::config::TariffLoader;
use fleet_billing::engine::{MemoryStore, generate_period, preview_period};
use fleet_billing::models::{
    BillingWeek, DriverWeekAssignment, KmExcessRecord, LineStatus, Modality,
};

fn load_catalog() -> TariffLoader {
    TariffLoader::load("./config/fleet").expect("Failed to load catalog")
}

fn week() -> BillingWeek {
    BillingWeek {
        week: 32,
        year: 2025,
    }
}

fn assignment(driver_id: &str) -> DriverWeekAssignment {
    DriverWeekAssignment {
        driver_id: driver_id.to_string(),
        vehicle_plate: format!("PLT-{}", driver_id),
        modality: Some(Modality::FixedFee),
        start_date: None,
        end_date: None,
        active: true,
    }
}

fn km_record(driver_id: &str) -> KmExcessRecord {
    KmExcessRecord {
        id: Uuid::new_v4(),
        driver_id: driver_id.to_string(),
        period_id: None,
        km_over: 85,
        bracket: "tier_b".to_string(),
        percentage: Decimal::new(10, 2),
        base_amount: Decimal::from(52000),
        tax_amount: Decimal::from(9880),
        total_amount: Decimal::from(61880),
        applied: false,
    }
}

fn seeded_store(driver_count: usize) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for i in 0..driver_count {
        let driver_id = format!("drv_{:04}", i);
        store.seed_assignment(assignment(&driver_id));
        if i % 3 == 0 {
            store.seed_km_excess(km_record(&driver_id));
        }
        if i % 5 == 0 {
            store.seed_opening_balance(&driver_id, Decimal::from(100000), 7);
        }
    }
    store
}

fn bench_single_calculation(c: &mut Criterion) {
    let loader = load_catalog();
    let catalog = loader.catalog();
    let facts = DriverWeekFacts {
        assignment: assignment("drv_bench"),
        guarantee: None,
        km_excess: vec![km_record("drv_bench")],
        ticket_credits: vec![],
        pass_through: vec![],
        prior_balance: Decimal::from(100000),
        mora_days: 7,
    };
    let window = PeriodWindow::full_week(Uuid::new_v4(), week());

    c.bench_function("single_driver_week", |b| {
        b.iter(|| {
            calculate_driver_week(
                black_box(&facts),
                black_box(&window),
                black_box(catalog),
                LineStatus::Preview,
            )
            .unwrap()
        })
    });
}

fn bench_preview(c: &mut Criterion) {
    let loader = load_catalog();
    let catalog = loader.catalog();

    let mut group = c.benchmark_group("preview_period");
    for driver_count in [10usize, 100] {
        let store = seeded_store(driver_count);
        group.throughput(Throughput::Elements(driver_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(driver_count),
            &driver_count,
            |b, _| {
                b.iter(|| preview_period(store.as_ref(), black_box(catalog), week()).unwrap())
            },
        );
    }
    group.finish();
}

fn bench_generation(c: &mut Criterion) {
    let loader = load_catalog();
    let catalog = loader.catalog();

    c.bench_function("generate_period_100_drivers", |b| {
        b.iter_batched(
            || seeded_store(100),
            |store| generate_period(store.as_ref(), black_box(catalog), week()).unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_single_calculation,
    bench_preview,
    bench_generation
);
criterion_main!(benches);
