//! Comprehensive integration tests for the billing engine API.
//!
//! This test suite drives the full stack (router → engine → store) and
//! covers:
//! - Full-week and prorated billing
//! - Guarantee installments and deposit completion
//! - Km-excess and ticket-credit consumption
//! - Mora on carried balances
//! - Idempotent regeneration
//! - The period lifecycle (generate, close, reopen, lock conflicts)
//! - Termination settlements with guarantee refunds
//! - Error cases

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use tower::ServiceExt;
use uuid::Uuid;

use fleet_billing::api::{AppState, create_router};
use fleet_billing::config::TariffLoader;
use fleet_billing::engine::{BillingStore, MemoryStore};
use fleet_billing::models::{
    DriverWeekAssignment, GuaranteeAccount, GuaranteeStatus, KmExcessRecord, Modality,
    TicketCredit, TicketStatus,
};

// =============================================================================
// Test Helpers
// =============================================================================

fn create_test_state() -> (AppState, Arc<MemoryStore>) {
    let loader = TariffLoader::load("./config/fleet").expect("Failed to load catalog");
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(loader, store.clone());
    (state, store)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn seed_driver(store: &MemoryStore, driver_id: &str, modality: Modality) {
    store.seed_assignment(DriverWeekAssignment {
        driver_id: driver_id.to_string(),
        vehicle_plate: format!("PLT-{}", driver_id),
        modality: Some(modality),
        start_date: None,
        end_date: None,
        active: true,
    });
}

fn seed_km_excess(store: &MemoryStore, driver_id: &str, total: &str) -> Uuid {
    let record = KmExcessRecord {
        id: Uuid::new_v4(),
        driver_id: driver_id.to_string(),
        period_id: None,
        km_over: 40,
        bracket: "tier_a".to_string(),
        percentage: dec("0.05"),
        base_amount: dec(total),
        tax_amount: dec("0"),
        total_amount: dec(total),
        applied: false,
    };
    let id = record.id;
    store.seed_km_excess(record);
    id
}

fn seed_approved_ticket(store: &MemoryStore, driver_id: &str, amount: &str) -> Uuid {
    let credit = TicketCredit {
        id: Uuid::new_v4(),
        driver_id: driver_id.to_string(),
        amount: dec(amount),
        status: TicketStatus::Approved,
        applied_period_id: None,
    };
    let id = credit.id;
    store.seed_ticket_credit(credit);
    id
}

async fn post(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

fn week_request() -> Value {
    json!({"week": 32, "year": 2025})
}

fn line_field<'a>(report_line: &'a Value, field: &str) -> &'a str {
    report_line[field].as_str().unwrap()
}

// =============================================================================
// Scenario A: full week, fixed fee, no extras
// =============================================================================

#[tokio::test]
async fn test_scenario_a_full_week_fixed_fee() {
    let (state, store) = create_test_state();
    seed_driver(&store, "drv_001", Modality::FixedFee);

    let (status, report) = post(create_router(state), "/periods/generate", week_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["drivers_processed"], 1);
    assert_eq!(report["period"]["status"], "open");
    // weekly rent 520,000 + guarantee quota 50,000
    assert_eq!(report["period"]["totals"]["net"].as_str().unwrap(), "570000");

    let period_id = Uuid::parse_str(report["period"]["id"].as_str().unwrap()).unwrap();
    let lines = store.lines_for_period(period_id);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].0.total_due, dec("570000"));
    assert_eq!(lines[0].0.days_billed, 7);
}

// =============================================================================
// Scenario B: driver starts mid-week on day 4 of 7
// =============================================================================

#[tokio::test]
async fn test_scenario_b_mid_week_start() {
    let (state, store) = create_test_state();
    store.seed_assignment(DriverWeekAssignment {
        driver_id: "drv_002".to_string(),
        vehicle_plate: "PLT-002".to_string(),
        modality: Some(Modality::FixedFee),
        // Thursday of week 32/2025: 4 billable days remain.
        start_date: NaiveDate::from_ymd_opt(2025, 8, 7),
        end_date: None,
        active: true,
    });

    let (status, report) = post(create_router(state), "/periods/generate", week_request()).await;

    assert_eq!(status, StatusCode::OK);
    let period_id = Uuid::parse_str(report["period"]["id"].as_str().unwrap()).unwrap();
    let line = &store.lines_for_period(period_id)[0].0;
    assert_eq!(line.days_billed, 4);
    // 520000 × 4/7 = 297142.86 → 297143
    assert_eq!(line.rent_amount, dec("297143"));
    assert_eq!(line.prorated_factor, Decimal::from(4) / Decimal::from(7));
}

// =============================================================================
// Scenario C: carried balance with no payment accrues mora
// =============================================================================

#[tokio::test]
async fn test_scenario_c_mora_accrual() {
    let (state, store) = create_test_state();
    seed_driver(&store, "drv_003", Modality::FixedFee);
    store.seed_opening_balance("drv_003", dec("100000"), 7);

    let (status, report) = post(create_router(state), "/periods/generate", week_request()).await;

    assert_eq!(status, StatusCode::OK);
    let period_id = Uuid::parse_str(report["period"]["id"].as_str().unwrap()).unwrap();
    let line = &store.lines_for_period(period_id)[0].0;

    // 100000 × 0.015 × 7 = 10500
    assert_eq!(line.mora_amount, dec("10500"));
    assert_eq!(line.mora_days, 7);
    assert_eq!(line.total_due, dec("680500"));
    assert_eq!(store.driver_balance("drv_003").current_balance, dec("680500"));
}

// =============================================================================
// Scenario D: guarantee account completes on its final installment
// =============================================================================

#[tokio::test]
async fn test_scenario_d_guarantee_completion() {
    let (state, store) = create_test_state();
    seed_driver(&store, "drv_004", Modality::FixedFee);
    store.save_guarantee_account(GuaranteeAccount {
        driver_id: "drv_004".to_string(),
        modality: Modality::FixedFee,
        total_installments: 20,
        installments_paid: 19,
        amount_paid: dec("965000"),
        status: GuaranteeStatus::InProgress,
    });

    let (status, report) = post(create_router(state), "/periods/generate", week_request()).await;

    assert_eq!(status, StatusCode::OK);
    let period_id = Uuid::parse_str(report["period"]["id"].as_str().unwrap()).unwrap();
    let line = &store.lines_for_period(period_id)[0].0;

    // Only the 35,000 needed to reach the 1,000,000 target is charged.
    assert_eq!(line.guarantee_amount, dec("35000"));

    let account = store.guarantee_account("drv_004").unwrap();
    assert_eq!(account.status, GuaranteeStatus::Completed);
    assert_eq!(account.amount_paid, dec("1000000"));
}

// =============================================================================
// Scenario E: termination settlement with guarantee refund
// =============================================================================

#[tokio::test]
async fn test_scenario_e_settlement_refund() {
    let (state, store) = create_test_state();
    seed_driver(&store, "drv_005", Modality::FixedFee);
    store.save_guarantee_account(GuaranteeAccount {
        driver_id: "drv_005".to_string(),
        modality: Modality::FixedFee,
        total_installments: 20,
        installments_paid: 1,
        amount_paid: dec("50000"),
        status: GuaranteeStatus::InProgress,
    });
    // Carried credit large enough to leave the final line at -20,000.
    store.seed_opening_balance("drv_005", dec("-264286"), 0);

    let router = create_router(state);
    let (status, settlement) = post(
        router.clone(),
        "/settlements",
        json!({"driver_id": "drv_005", "cutoff_date": "2025-08-06"}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(settlement["status"], "draft");
    assert_eq!(settlement["line"]["days_billed"], 3);
    assert_eq!(settlement["line"]["total_due"].as_str().unwrap(), "-20000");
    assert_eq!(settlement["guarantee_refund"].as_str().unwrap(), "20000");

    // Approval is terminal: driver deactivated, refund credited.
    let settlement_id = settlement["id"].as_str().unwrap();
    let (status, approved) = post(
        router.clone(),
        "/settlements/approve",
        json!({"settlement_id": settlement_id, "actor": "ops_user"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["approved_by"], "ops_user");
    assert!(store.live_assignments().iter().all(|a| !a.active));

    // Second approval is rejected.
    let (status, error) = post(
        router,
        "/settlements/approve",
        json!({"settlement_id": settlement_id, "actor": "ops_user"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "INVALID_SETTLEMENT");
}

// =============================================================================
// Idempotent regeneration
// =============================================================================

#[tokio::test]
async fn test_regeneration_idempotent_via_api() {
    let (state, store) = create_test_state();
    seed_driver(&store, "drv_006", Modality::ShiftBased);
    seed_km_excess(&store, "drv_006", "30940");
    seed_approved_ticket(&store, "drv_006", "25000");

    let router = create_router(state);
    let (_, first) = post(router.clone(), "/periods/generate", week_request()).await;
    let balance_first = store.driver_balance("drv_006").current_balance;

    let (status, second) = post(router, "/periods/generate", week_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        first["period"]["totals"]["net"],
        second["period"]["totals"]["net"]
    );
    assert_eq!(store.driver_balance("drv_006").current_balance, balance_first);

    // The source facts stayed consumed by exactly this period.
    assert!(store.unapplied_km_excess("drv_006").is_empty());
    assert!(store.approved_ticket_credits("drv_006").is_empty());
}

// =============================================================================
// Period lifecycle
// =============================================================================

#[tokio::test]
async fn test_period_lifecycle_close_reopen() {
    let (state, store) = create_test_state();
    seed_driver(&store, "drv_007", Modality::FixedFee);

    let router = create_router(state);
    post(router.clone(), "/periods/generate", week_request()).await;

    // Close stamps the actor.
    let (status, closed) = post(
        router.clone(),
        "/periods/close",
        json!({"week": 32, "year": 2025, "actor": "ops_user"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["status"], "closed");
    assert_eq!(closed["closed_by"], "ops_user");
    assert!(!closed["closed_at"].is_null());

    // Generating a closed period is rejected.
    let (status, error) = post(router.clone(), "/periods/generate", week_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "PERIOD_CLOSED");

    // Reopen clears the stamp and unlocks generation.
    let (status, reopened) = post(router.clone(), "/periods/reopen", week_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reopened["status"], "open");
    assert!(reopened["closed_at"].is_null());
    assert!(reopened["closed_by"].is_null());

    let (status, _) = post(router, "/periods/generate", week_request()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_processing_period_rejects_second_run() {
    let (state, store) = create_test_state();
    seed_driver(&store, "drv_008", Modality::FixedFee);

    // Simulate a run in flight by taking the lock directly.
    store
        .lock_period_for_generation(fleet_billing::models::BillingWeek {
            week: 32,
            year: 2025,
        })
        .unwrap();

    let (status, error) = post(create_router(state), "/periods/generate", week_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "PERIOD_LOCKED");
}

#[tokio::test]
async fn test_close_unknown_period_is_not_found() {
    let (state, _) = create_test_state();
    let (status, error) = post(
        create_router(state),
        "/periods/close",
        json!({"week": 9, "year": 2025, "actor": "ops"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "PERIOD_NOT_FOUND");
}

// =============================================================================
// Preview
// =============================================================================

#[tokio::test]
async fn test_preview_projects_without_persisting() {
    let (state, store) = create_test_state();
    seed_driver(&store, "drv_009", Modality::FixedFee);
    seed_km_excess(&store, "drv_009", "30940");

    let (status, preview) = post(create_router(state), "/periods/preview", week_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["status"], "not_generated");
    assert_eq!(preview["drivers"].as_array().unwrap().len(), 1);
    assert_eq!(
        preview["drivers"][0]["line"]["status"].as_str().unwrap(),
        "preview"
    );
    assert_eq!(preview["totals"]["net"].as_str().unwrap(), "600940");

    // Nothing persisted, nothing consumed.
    assert!(store
        .period_for_week(fleet_billing::models::BillingWeek {
            week: 32,
            year: 2025
        })
        .is_none());
    assert_eq!(store.unapplied_km_excess("drv_009").len(), 1);
}

#[tokio::test]
async fn test_preview_matches_generation_totals() {
    let (state, store) = create_test_state();
    seed_driver(&store, "drv_010", Modality::ShiftBased);
    seed_approved_ticket(&store, "drv_010", "15000");
    store.seed_opening_balance("drv_010", dec("50000"), 3);

    let router = create_router(state);
    let (_, preview) = post(router.clone(), "/periods/preview", week_request()).await;
    let (_, report) = post(router, "/periods/generate", week_request()).await;

    assert_eq!(preview["totals"]["net"], report["period"]["totals"]["net"]);
    assert_eq!(
        preview["totals"]["charges"],
        report["period"]["totals"]["charges"]
    );
}

// =============================================================================
// Partial failure isolation
// =============================================================================

#[tokio::test]
async fn test_malformed_driver_reported_not_fatal() {
    let (state, store) = create_test_state();
    seed_driver(&store, "drv_good", Modality::FixedFee);
    store.seed_assignment(DriverWeekAssignment {
        driver_id: "drv_bad".to_string(),
        vehicle_plate: "PLT-BAD".to_string(),
        modality: Some(Modality::FixedFee),
        start_date: NaiveDate::from_ymd_opt(2025, 8, 9),
        end_date: NaiveDate::from_ymd_opt(2025, 8, 5),
        active: true,
    });

    let (status, report) = post(create_router(state), "/periods/generate", week_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["drivers_processed"], 1);
    let skipped = report["drivers_skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(line_field(&skipped[0], "driver_id"), "drv_bad");
    assert!(line_field(&skipped[0], "reason").contains("precedes"));
}

// =============================================================================
// Consumption exclusivity
// =============================================================================

#[tokio::test]
async fn test_source_facts_consumed_once_across_weeks() {
    let (state, store) = create_test_state();
    seed_driver(&store, "drv_011", Modality::FixedFee);
    seed_km_excess(&store, "drv_011", "30940");

    let router = create_router(state);
    let (_, first) = post(router.clone(), "/periods/generate", week_request()).await;
    let first_period = Uuid::parse_str(first["period"]["id"].as_str().unwrap()).unwrap();
    let first_line = &store.lines_for_period(first_period)[0].0;
    assert_eq!(first_line.gross_charges, dec("600940"));

    let (_, second) = post(
        router,
        "/periods/generate",
        json!({"week": 33, "year": 2025}),
    )
    .await;
    let second_period = Uuid::parse_str(second["period"]["id"].as_str().unwrap()).unwrap();
    let second_line = &store.lines_for_period(second_period)[0].0;

    // The record billed in week 32 never reappears in week 33.
    assert_eq!(second_line.gross_charges, dec("570000"));
}

// =============================================================================
// Error cases
// =============================================================================

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (state, _) = create_test_state();
    let response = create_router(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/periods/generate")
                .header("Content-Type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_field_is_validation_error() {
    let (state, _) = create_test_state();
    let (status, error) = post(
        create_router(state),
        "/periods/generate",
        json!({"week": 32}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_settlement_for_unknown_driver_is_not_found() {
    let (state, _) = create_test_state();
    let (status, error) = post(
        create_router(state),
        "/settlements",
        json!({"driver_id": "ghost", "cutoff_date": "2025-08-06"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "DRIVER_NOT_FOUND");
}

#[tokio::test]
async fn test_settlement_for_inactive_driver_is_not_found() {
    let (state, store) = create_test_state();
    seed_driver(&store, "drv_012", Modality::FixedFee);
    store.deactivate_driver("drv_012");

    let (status, error) = post(
        create_router(state),
        "/settlements",
        json!({"driver_id": "drv_012", "cutoff_date": "2025-08-06"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "DRIVER_NOT_FOUND");
}

// =============================================================================
// Ledger invariant across a mixed history
// =============================================================================

#[tokio::test]
async fn test_balance_equals_signed_movement_sum() {
    let (state, store) = create_test_state();
    seed_driver(&store, "drv_013", Modality::FixedFee);
    store.seed_opening_balance("drv_013", dec("80000"), 5);
    seed_km_excess(&store, "drv_013", "61880");
    seed_approved_ticket(&store, "drv_013", "45000");

    let router = create_router(state);
    post(router.clone(), "/periods/generate", week_request()).await;
    // Regenerate once to push reversal movements through the ledger too.
    post(router, "/periods/generate", week_request()).await;

    let balance = store.driver_balance("drv_013");
    let signed_sum: Decimal = store
        .movements_for_driver("drv_013")
        .iter()
        .map(|m| m.signed_amount())
        .sum();
    assert_eq!(balance.current_balance, signed_sum);
}
