// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for delivery dispatch: assignment, departure, confirmation,
//! failure, cancellation, and the location stream.

use hemolink::InventoryLedger;
use hemolink_store::Store;

use crate::{
    ApiError, ApiResult, AssignTransporterRequest, AssignTransporterResponse,
    CancelDeliveryRequest, CancelDeliveryResponse, ConfirmDeliveryRequest,
    ConfirmDeliveryResponse, EvaluateRequestRequest, EvaluateRequestResponse,
    GetDeliveryResponse, GetRequestResponse, IssueDeliveryTokenRequest, ManualConfirmationInput,
    PushLocationRequest, PushLocationResponse, ReportDeliveryFailureRequest,
    ReportDeliveryFailureResponse, StartDeliveryRequest, assign_transporter, cancel_delivery,
    confirm_delivery, evaluate_request, get_available, get_delivery, get_request,
    issue_delivery_token, push_location, report_delivery_failure, start_delivery,
};

use super::helpers::{
    approved_delivery, at_hour, completed_donation, in_transit_delivery, register_test_donor,
    register_test_facility, seeded_facility, staff_actor, stocked_plasma_units, test_cause,
    transporter_actor,
};

/// Stocks two plasma bags and puts a 300 ml request on the road, so the
/// manifest carries both units.
fn two_unit_delivery(store: &mut Store, ledger: &InventoryLedger) -> (i64, i64, i64) {
    let facility_id: i64 = register_test_facility(store);
    let donor_id: i64 = register_test_donor(store, "Asha Rao", "A+");
    let donation_id: i64 = completed_donation(store, donor_id, facility_id, 450);
    stocked_plasma_units(store, ledger, donation_id, &[200, 250]);
    let (request_id, delivery_id): (i64, i64) =
        in_transit_delivery(store, ledger, facility_id, 300);
    (facility_id, request_id, delivery_id)
}

// ============================================================================
// Dispatch Setup Tests
// ============================================================================

#[test]
fn test_approval_creates_pending_delivery() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (request_id, delivery_id): (i64, i64) =
        approved_delivery(&mut store, &ledger, facility_id, 450);

    let delivery: GetDeliveryResponse = get_delivery(&store, delivery_id).unwrap();
    assert_eq!(delivery.status, "pending");
    assert_eq!(delivery.request_id, request_id);
    assert_eq!(delivery.transporter_id, None);
    assert_eq!(delivery.manifest.len(), 1);
    assert_eq!(delivery.total_quantity_ml, 450);
    assert_eq!(delivery.last_location, None);
    assert_eq!(delivery.confirmation_method, None);

    let record: GetRequestResponse = get_request(&store, request_id).unwrap();
    assert_eq!(record.reservation_id, Some(delivery.reservation_id));
}

#[test]
fn test_assign_transporter_moves_request_to_assigned() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (request_id, delivery_id): (i64, i64) =
        approved_delivery(&mut store, &ledger, facility_id, 450);

    let result: ApiResult<AssignTransporterResponse> = assign_transporter(
        &mut store,
        &AssignTransporterRequest {
            delivery_id,
            transporter_id: 31,
        },
        &staff_actor(),
        test_cause(),
    )
    .unwrap();
    assert_eq!(result.response.transporter_id, 31);

    let delivery: GetDeliveryResponse = get_delivery(&store, delivery_id).unwrap();
    assert_eq!(delivery.transporter_id, Some(31));
    assert_eq!(delivery.status, "pending");

    let record: GetRequestResponse = get_request(&store, request_id).unwrap();
    assert_eq!(record.status, "assigned");
}

#[test]
fn test_start_delivery_requires_transporter() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (_request_id, delivery_id): (i64, i64) =
        approved_delivery(&mut store, &ledger, facility_id, 450);

    let err: ApiError = start_delivery(
        &mut store,
        &StartDeliveryRequest { delivery_id },
        &staff_actor(),
        test_cause(),
        at_hour(31),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::Conflict { .. }));
}

#[test]
fn test_start_delivery_marks_in_transit() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (request_id, delivery_id): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 450);

    let delivery: GetDeliveryResponse = get_delivery(&store, delivery_id).unwrap();
    assert_eq!(delivery.status, "in_transit");

    let record: GetRequestResponse = get_request(&store, request_id).unwrap();
    assert_eq!(record.status, "in_transit");
}

#[test]
fn test_assign_transporter_requires_pending() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (_request_id, delivery_id): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 450);

    let err: ApiError = assign_transporter(
        &mut store,
        &AssignTransporterRequest {
            delivery_id,
            transporter_id: 32,
        },
        &staff_actor(),
        test_cause(),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::Conflict { .. }));
}

// ============================================================================
// Confirmation Tests
// ============================================================================

#[test]
fn test_confirm_with_qr_token_consumes_stock() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (request_id, delivery_id): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 450);

    let token: String = issue_delivery_token(
        &store,
        &IssueDeliveryTokenRequest {
            delivery_id,
            recipient_id: 88,
        },
    )
    .unwrap()
    .token;
    let result: ApiResult<ConfirmDeliveryResponse> = confirm_delivery(
        &mut store,
        &ledger,
        ConfirmDeliveryRequest {
            delivery_id,
            token: Some(token),
            manual: None,
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap();

    assert_eq!(result.response.status, "delivered");
    assert_eq!(result.response.method, "qr_scan");

    let record: GetRequestResponse = get_request(&store, request_id).unwrap();
    assert_eq!(record.status, "delivered");
    assert_eq!(record.reservation_id, None);

    let delivery: GetDeliveryResponse = get_delivery(&store, delivery_id).unwrap();
    assert_eq!(delivery.confirmation_method.as_deref(), Some("qr_scan"));

    // The units left as `used`, not back to the shelf.
    let available: u32 = get_available(&store, &ledger, facility_id, "A+", "plasma", at_hour(34))
        .unwrap()
        .available_ml;
    assert_eq!(available, 0);
}

#[test]
fn test_confirm_with_manual_form() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (_request_id, delivery_id): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 450);

    let result: ApiResult<ConfirmDeliveryResponse> = confirm_delivery(
        &mut store,
        &ledger,
        ConfirmDeliveryRequest {
            delivery_id,
            token: None,
            manual: Some(ManualConfirmationInput {
                recipient_id: 88,
                recipient_name: String::from("Dr. Leena Varga"),
                recipient_role: String::from("charge nurse"),
            }),
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap();

    assert_eq!(result.response.method, "manual_form");
    let delivery: GetDeliveryResponse = get_delivery(&store, delivery_id).unwrap();
    assert_eq!(delivery.confirmation_method.as_deref(), Some("manual_form"));
}

#[test]
fn test_confirm_second_attempt_loses() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (_request_id, delivery_id): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 450);

    let token: String = issue_delivery_token(
        &store,
        &IssueDeliveryTokenRequest {
            delivery_id,
            recipient_id: 88,
        },
    )
    .unwrap()
    .token;
    confirm_delivery(
        &mut store,
        &ledger,
        ConfirmDeliveryRequest {
            delivery_id,
            token: Some(token),
            manual: None,
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap();

    // The manual fallback arriving second changes nothing.
    let err: ApiError = confirm_delivery(
        &mut store,
        &ledger,
        ConfirmDeliveryRequest {
            delivery_id,
            token: None,
            manual: Some(ManualConfirmationInput {
                recipient_id: 89,
                recipient_name: String::from("Dr. Leena Varga"),
                recipient_role: String::from("charge nurse"),
            }),
        },
        &transporter_actor(),
        test_cause(),
        at_hour(34),
    )
    .unwrap_err();

    match err {
        ApiError::Conflict { message } => assert!(message.contains("already been confirmed")),
        other => panic!("expected a conflict, got {other:?}"),
    }

    let delivery: GetDeliveryResponse = get_delivery(&store, delivery_id).unwrap();
    assert_eq!(delivery.confirmation_method.as_deref(), Some("qr_scan"));
}

#[test]
fn test_confirm_mismatched_token_refused() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = completed_donation(&mut store, donor_id, facility_id, 450);
    stocked_plasma_units(&mut store, &ledger, donation_id, &[200, 250]);
    let (_first_request, first_delivery): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 200);
    let (_second_request, second_delivery): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 250);

    let first_token: String = issue_delivery_token(
        &store,
        &IssueDeliveryTokenRequest {
            delivery_id: first_delivery,
            recipient_id: 88,
        },
    )
    .unwrap()
    .token;

    let err: ApiError = confirm_delivery(
        &mut store,
        &ledger,
        ConfirmDeliveryRequest {
            delivery_id: second_delivery,
            token: Some(first_token),
            manual: None,
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap_err();

    match err {
        ApiError::Conflict { message } => assert!(message.contains("does not match")),
        other => panic!("expected a conflict, got {other:?}"),
    }
}

#[test]
fn test_confirm_garbage_token_rejected() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (_request_id, delivery_id): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 450);

    let err: ApiError = confirm_delivery(
        &mut store,
        &ledger,
        ConfirmDeliveryRequest {
            delivery_id,
            token: Some(String::from("not-a-token")),
            manual: None,
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "token"));
}

#[test]
fn test_confirm_requires_exactly_one_proof() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (_request_id, delivery_id): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 450);
    let token: String = issue_delivery_token(
        &store,
        &IssueDeliveryTokenRequest {
            delivery_id,
            recipient_id: 88,
        },
    )
    .unwrap()
    .token;

    let neither: ApiError = confirm_delivery(
        &mut store,
        &ledger,
        ConfirmDeliveryRequest {
            delivery_id,
            token: None,
            manual: None,
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap_err();
    assert!(matches!(neither, ApiError::InvalidInput { ref field, .. } if field == "proof"));

    let both: ApiError = confirm_delivery(
        &mut store,
        &ledger,
        ConfirmDeliveryRequest {
            delivery_id,
            token: Some(token),
            manual: Some(ManualConfirmationInput {
                recipient_id: 88,
                recipient_name: String::from("Dr. Leena Varga"),
                recipient_role: String::from("charge nurse"),
            }),
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap_err();
    assert!(matches!(both, ApiError::InvalidInput { ref field, .. } if field == "proof"));
}

#[test]
fn test_confirm_manual_blank_name_rejected() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (_request_id, delivery_id): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 450);

    let err: ApiError = confirm_delivery(
        &mut store,
        &ledger,
        ConfirmDeliveryRequest {
            delivery_id,
            token: None,
            manual: Some(ManualConfirmationInput {
                recipient_id: 88,
                recipient_name: String::from("   "),
                recipient_role: String::from("charge nurse"),
            }),
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "name"));
}

#[test]
fn test_issue_token_requires_in_transit() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (_request_id, delivery_id): (i64, i64) =
        approved_delivery(&mut store, &ledger, facility_id, 450);

    let err: ApiError = issue_delivery_token(
        &store,
        &IssueDeliveryTokenRequest {
            delivery_id,
            recipient_id: 88,
        },
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::Conflict { .. }));
}

// ============================================================================
// Failure and Cancellation Tests
// ============================================================================

#[test]
fn test_failure_restocks_everything_but_consumed() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, request_id, delivery_id): (i64, i64, i64) =
        two_unit_delivery(&mut store, &ledger);
    let delivery: GetDeliveryResponse = get_delivery(&store, delivery_id).unwrap();
    let consumed_unit: i64 = delivery.manifest[0].unit_id;

    let result: ApiResult<ReportDeliveryFailureResponse> = report_delivery_failure(
        &mut store,
        &ledger,
        &ReportDeliveryFailureRequest {
            delivery_id,
            reason: String::from("cold_chain_breach"),
            consumed_unit_ids: vec![consumed_unit],
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap();

    assert_eq!(result.response.status, "failed");
    assert_eq!(result.response.request_status, "pending_approval");
    assert_eq!(result.response.restocked_ml, 250);

    // Only the unconsumed bag returns to the shelf.
    let available: u32 = get_available(&store, &ledger, facility_id, "A+", "plasma", at_hour(34))
        .unwrap()
        .available_ml;
    assert_eq!(available, 250);

    let record: GetRequestResponse = get_request(&store, request_id).unwrap();
    assert_eq!(record.status, "pending_approval");
    assert_eq!(record.reservation_id, None);
}

#[test]
fn test_failure_with_nothing_consumed_restocks_all() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, request_id, delivery_id): (i64, i64, i64) =
        two_unit_delivery(&mut store, &ledger);

    let result: ApiResult<ReportDeliveryFailureResponse> = report_delivery_failure(
        &mut store,
        &ledger,
        &ReportDeliveryFailureRequest {
            delivery_id,
            reason: String::from("vehicle_breakdown"),
            consumed_unit_ids: Vec::new(),
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap();
    assert_eq!(result.response.restocked_ml, 450);

    // The fresh evaluation covers the request again.
    let retried: ApiResult<EvaluateRequestResponse> = evaluate_request(
        &mut store,
        &ledger,
        &EvaluateRequestRequest { request_id },
        &staff_actor(),
        test_cause(),
        at_hour(34),
    )
    .unwrap();
    assert_eq!(retried.response.decision, "approved");
}

#[test]
fn test_failure_after_consumption_leaves_shortfall() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (_facility_id, request_id, delivery_id): (i64, i64, i64) =
        two_unit_delivery(&mut store, &ledger);
    let delivery: GetDeliveryResponse = get_delivery(&store, delivery_id).unwrap();
    let consumed_unit: i64 = delivery.manifest[0].unit_id;

    report_delivery_failure(
        &mut store,
        &ledger,
        &ReportDeliveryFailureRequest {
            delivery_id,
            reason: String::from("recipient_unavailable"),
            consumed_unit_ids: vec![consumed_unit],
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap();

    // 250 ml left against a 300 ml request: the retry parks it.
    let retried: ApiResult<EvaluateRequestResponse> = evaluate_request(
        &mut store,
        &ledger,
        &EvaluateRequestRequest { request_id },
        &staff_actor(),
        test_cause(),
        at_hour(34),
    )
    .unwrap();
    assert_eq!(retried.response.decision, "needs_support");
    assert_eq!(retried.response.shortfall_ml, Some(50));
}

#[test]
fn test_failure_with_unknown_consumed_unit_refused() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (_facility_id, _request_id, delivery_id): (i64, i64, i64) =
        two_unit_delivery(&mut store, &ledger);

    let err: ApiError = report_delivery_failure(
        &mut store,
        &ledger,
        &ReportDeliveryFailureRequest {
            delivery_id,
            reason: String::from("route_impassable"),
            consumed_unit_ids: vec![999],
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::ResourceNotFound { .. }));

    // The refused report changes nothing; a corrected one still works.
    let delivery: GetDeliveryResponse = get_delivery(&store, delivery_id).unwrap();
    assert_eq!(delivery.status, "in_transit");
    assert!(
        report_delivery_failure(
            &mut store,
            &ledger,
            &ReportDeliveryFailureRequest {
                delivery_id,
                reason: String::from("route_impassable"),
                consumed_unit_ids: Vec::new(),
            },
            &transporter_actor(),
            test_cause(),
            at_hour(34),
        )
        .is_ok()
    );
}

#[test]
fn test_failure_rejects_unknown_reason() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (_request_id, delivery_id): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 450);

    let err: ApiError = report_delivery_failure(
        &mut store,
        &ledger,
        &ReportDeliveryFailureRequest {
            delivery_id,
            reason: String::from("flat_tire"),
            consumed_unit_ids: Vec::new(),
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "reason"));
}

#[test]
fn test_cancel_delivery_restocks_everything() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (request_id, delivery_id): (i64, i64) =
        approved_delivery(&mut store, &ledger, facility_id, 450);

    let result: ApiResult<CancelDeliveryResponse> = cancel_delivery(
        &mut store,
        &ledger,
        &CancelDeliveryRequest { delivery_id },
        &staff_actor(),
        test_cause(),
        at_hour(31),
    )
    .unwrap();
    assert_eq!(result.response.status, "cancelled");
    assert_eq!(result.response.restocked_ml, 450);

    let available: u32 = get_available(&store, &ledger, facility_id, "A+", "plasma", at_hour(32))
        .unwrap()
        .available_ml;
    assert_eq!(available, 450);

    // The request can be approved again, on a fresh delivery.
    let retried: ApiResult<EvaluateRequestResponse> = evaluate_request(
        &mut store,
        &ledger,
        &EvaluateRequestRequest { request_id },
        &staff_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap();
    assert_eq!(retried.response.decision, "approved");
    assert_ne!(retried.response.delivery_id, Some(delivery_id));
}

#[test]
fn test_cancel_delivered_delivery_refused() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (_request_id, delivery_id): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 450);
    confirm_delivery(
        &mut store,
        &ledger,
        ConfirmDeliveryRequest {
            delivery_id,
            token: None,
            manual: Some(ManualConfirmationInput {
                recipient_id: 88,
                recipient_name: String::from("Dr. Leena Varga"),
                recipient_role: String::from("charge nurse"),
            }),
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap();

    let err: ApiError = cancel_delivery(
        &mut store,
        &ledger,
        &CancelDeliveryRequest { delivery_id },
        &staff_actor(),
        test_cause(),
        at_hour(34),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::Conflict { .. }));
}

// ============================================================================
// Location Stream Tests
// ============================================================================

#[test]
fn test_push_location_keeps_latest_by_source_timestamp() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (_request_id, delivery_id): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 450);

    let first: PushLocationResponse = push_location(
        &mut store,
        &PushLocationRequest {
            delivery_id,
            latitude: 12.97,
            longitude: 77.59,
            recorded_at: at_hour(32),
        },
    )
    .unwrap();
    assert!(first.applied);

    let second: PushLocationResponse = push_location(
        &mut store,
        &PushLocationRequest {
            delivery_id,
            latitude: 12.99,
            longitude: 77.61,
            recorded_at: at_hour(34),
        },
    )
    .unwrap();
    assert!(second.applied);

    // An out-of-order report is dropped without error.
    let late: PushLocationResponse = push_location(
        &mut store,
        &PushLocationRequest {
            delivery_id,
            latitude: 12.98,
            longitude: 77.60,
            recorded_at: at_hour(33),
        },
    )
    .unwrap();
    assert!(!late.applied);

    let delivery: GetDeliveryResponse = get_delivery(&store, delivery_id).unwrap();
    let location = delivery.last_location.unwrap();
    assert!((location.latitude - 12.99).abs() < f64::EPSILON);
    assert!((location.longitude - 77.61).abs() < f64::EPSILON);
    assert_eq!(location.recorded_at, at_hour(34));
}

#[test]
fn test_push_location_requires_departure() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (_request_id, delivery_id): (i64, i64) =
        approved_delivery(&mut store, &ledger, facility_id, 450);

    let err: ApiError = push_location(
        &mut store,
        &PushLocationRequest {
            delivery_id,
            latitude: 12.97,
            longitude: 77.59,
            recorded_at: at_hour(31),
        },
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::Conflict { .. }));
}

#[test]
fn test_push_location_after_delivery_ended_is_stale() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (_request_id, delivery_id): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 450);
    confirm_delivery(
        &mut store,
        &ledger,
        ConfirmDeliveryRequest {
            delivery_id,
            token: None,
            manual: Some(ManualConfirmationInput {
                recipient_id: 88,
                recipient_name: String::from("Dr. Leena Varga"),
                recipient_role: String::from("charge nurse"),
            }),
        },
        &transporter_actor(),
        test_cause(),
        at_hour(33),
    )
    .unwrap();

    let result: PushLocationResponse = push_location(
        &mut store,
        &PushLocationRequest {
            delivery_id,
            latitude: 12.97,
            longitude: 77.59,
            recorded_at: at_hour(34),
        },
    )
    .unwrap();

    assert!(!result.applied);
}

#[test]
fn test_push_location_rejects_bad_coordinates() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let (_request_id, delivery_id): (i64, i64) =
        in_transit_delivery(&mut store, &ledger, facility_id, 450);

    let err: ApiError = push_location(
        &mut store,
        &PushLocationRequest {
            delivery_id,
            latitude: 95.0,
            longitude: 77.59,
            recorded_at: at_hour(32),
        },
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "location"));
}
