// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for facility and donor registration, the donation lifecycle, and
//! component splitting.

use hemolink::InventoryLedger;
use hemolink_store::Store;
use time::Duration;

use crate::{
    ApiError, ApiResult, ArchiveDonorRequest, CancelDonationRequest, CompleteDonationRequest,
    EvaluateRequestRequest, GetDonationResponse, MarkUnitTestedRequest, RecordHealthCheckRequest,
    RecordHealthCheckResponse, RecordVitalSignsRequest, RegisterDonationRequest,
    RegisterDonorRequest, RegisterFacilityRequest, RegisterFacilityResponse,
    ReportAdverseEventRequest, SplitAllocationInput, SplitDonationRequest, SplitDonationResponse,
    StartDonationRequest, VoidDonationSplitRequest, archive_donor, cancel_donation,
    complete_donation, evaluate_request, get_available, get_donation, list_facility_events,
    mark_unit_tested, record_health_check, record_vital_signs, register_donation, register_donor,
    register_facility, report_adverse_event, split_donation, start_donation, void_donation_split,
};

use super::helpers::{
    at_hour, completed_donation, register_test_donor, register_test_facility, seeded_facility,
    staff_actor, stocked_plasma_units, submit_plasma_request, test_cause,
};

// ============================================================================
// Facility Registration Tests
// ============================================================================

#[test]
fn test_register_facility_defaults_completion_threshold() {
    let mut store: Store = Store::new();
    let result: ApiResult<RegisterFacilityResponse> = register_facility(
        &mut store,
        RegisterFacilityRequest {
            name: String::from("Central Blood Bank"),
            min_collection_ml: None,
        },
        &staff_actor(),
        test_cause(),
    )
    .unwrap();

    assert_eq!(result.response.facility_id, 1);
    assert_eq!(result.response.min_collection_ml, 200);
    assert_eq!(result.event_id, 1);
    assert_eq!(result.audit_event.action.name, "RegisterFacility");
    assert_eq!(result.audit_event.before.data, "absent");
    assert_eq!(result.audit_event.facility_id, Some(1));
}

#[test]
fn test_register_facility_with_custom_threshold() {
    let mut store: Store = Store::new();
    let result: ApiResult<RegisterFacilityResponse> = register_facility(
        &mut store,
        RegisterFacilityRequest {
            name: String::from("Mobile Collection Van"),
            min_collection_ml: Some(300),
        },
        &staff_actor(),
        test_cause(),
    )
    .unwrap();

    assert_eq!(result.response.min_collection_ml, 300);
}

#[test]
fn test_register_facility_rejects_blank_name() {
    let mut store: Store = Store::new();
    let err: ApiError = register_facility(
        &mut store,
        RegisterFacilityRequest {
            name: String::from("   "),
            min_collection_ml: None,
        },
        &staff_actor(),
        test_cause(),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "name"));
}

// ============================================================================
// Donor Tests
// ============================================================================

#[test]
fn test_register_donor_starts_eligible() {
    let mut store: Store = Store::new();
    let result = register_donor(
        &mut store,
        RegisterDonorRequest {
            name: String::from("Asha Rao"),
            blood_group: String::from("AB-"),
        },
        &staff_actor(),
        test_cause(),
        at_hour(0),
    )
    .unwrap();

    assert_eq!(result.response.donor_id, 1);
    assert_eq!(result.response.blood_group, "AB-");
    assert!(result.audit_event.after.data.contains("eligible=true"));
    // Donor records are not scoped to any one facility.
    assert_eq!(result.audit_event.facility_id, None);
}

#[test]
fn test_register_donor_rejects_unknown_blood_group() {
    let mut store: Store = Store::new();
    let err: ApiError = register_donor(
        &mut store,
        RegisterDonorRequest {
            name: String::from("Asha Rao"),
            blood_group: String::from("C+"),
        },
        &staff_actor(),
        test_cause(),
        at_hour(0),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "blood_group"));
}

#[test]
fn test_health_check_failure_revokes_eligibility() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");

    let result: ApiResult<RecordHealthCheckResponse> = record_health_check(
        &mut store,
        &RecordHealthCheckRequest {
            donor_id,
            passed: false,
        },
        &staff_actor(),
        test_cause(),
    )
    .unwrap();
    assert!(!result.response.eligible);

    let err: ApiError = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: 450,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap_err();
    assert!(
        matches!(err, ApiError::DomainRuleViolation { ref rule, .. } if rule == "donor_eligibility")
    );
}

#[test]
fn test_health_check_pass_restores_eligibility() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");

    record_health_check(
        &mut store,
        &RecordHealthCheckRequest {
            donor_id,
            passed: false,
        },
        &staff_actor(),
        test_cause(),
    )
    .unwrap();
    let restored: ApiResult<RecordHealthCheckResponse> = record_health_check(
        &mut store,
        &RecordHealthCheckRequest {
            donor_id,
            passed: true,
        },
        &staff_actor(),
        test_cause(),
    )
    .unwrap();
    assert!(restored.response.eligible);

    assert!(
        register_donation(
            &mut store,
            &RegisterDonationRequest {
                donor_id,
                facility_id,
                target_quantity_ml: 450,
            },
            &staff_actor(),
            test_cause(),
            at_hour(1),
        )
        .is_ok()
    );
}

#[test]
fn test_health_check_unknown_donor_is_not_found() {
    let mut store: Store = Store::new();
    let err: ApiError = record_health_check(
        &mut store,
        &RecordHealthCheckRequest {
            donor_id: 99,
            passed: true,
        },
        &staff_actor(),
        test_cause(),
    )
    .unwrap_err();

    assert!(
        matches!(err, ApiError::ResourceNotFound { ref resource_type, .. } if resource_type == "donor")
    );
}

#[test]
fn test_archive_donor_refuses_new_donations() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");

    archive_donor(
        &mut store,
        &ArchiveDonorRequest { donor_id },
        &staff_actor(),
        test_cause(),
    )
    .unwrap();

    let err: ApiError = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: 450,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap_err();
    assert!(
        matches!(err, ApiError::DomainRuleViolation { ref rule, .. } if rule == "donor_archived")
    );
}

#[test]
fn test_archive_donor_twice_conflicts() {
    let mut store: Store = Store::new();
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");

    archive_donor(
        &mut store,
        &ArchiveDonorRequest { donor_id },
        &staff_actor(),
        test_cause(),
    )
    .unwrap();
    let err: ApiError = archive_donor(
        &mut store,
        &ArchiveDonorRequest { donor_id },
        &staff_actor(),
        test_cause(),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::Conflict { .. }));
}

#[test]
fn test_archived_donor_health_check_rejected() {
    let mut store: Store = Store::new();
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");

    archive_donor(
        &mut store,
        &ArchiveDonorRequest { donor_id },
        &staff_actor(),
        test_cause(),
    )
    .unwrap();
    let err: ApiError = record_health_check(
        &mut store,
        &RecordHealthCheckRequest {
            donor_id,
            passed: true,
        },
        &staff_actor(),
        test_cause(),
    )
    .unwrap_err();

    assert!(
        matches!(err, ApiError::DomainRuleViolation { ref rule, .. } if rule == "donor_archived")
    );
}

// ============================================================================
// Donation Lifecycle Tests
// ============================================================================

#[test]
fn test_register_donation_requires_known_facility() {
    let mut store: Store = Store::new();
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");

    let err: ApiError = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id: 99,
            target_quantity_ml: 450,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap_err();

    assert!(
        matches!(err, ApiError::ResourceNotFound { ref resource_type, .. } if resource_type == "facility")
    );
}

#[test]
fn test_register_donation_rejects_zero_target() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");

    let err: ApiError = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: 0,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "quantity_ml"));
}

#[test]
fn test_start_donation_marks_in_progress() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: 450,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap()
    .response
    .donation_id;

    let result = start_donation(
        &mut store,
        &StartDonationRequest { donation_id },
        &staff_actor(),
        test_cause(),
        at_hour(2),
    )
    .unwrap();

    assert_eq!(result.response.status, "in_progress");
    assert!(result.audit_event.before.data.contains("status=registered"));
    assert!(result.audit_event.after.data.contains("status=in_progress"));
}

#[test]
fn test_start_donation_twice_is_lifecycle_violation() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: 450,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap()
    .response
    .donation_id;

    start_donation(
        &mut store,
        &StartDonationRequest { donation_id },
        &staff_actor(),
        test_cause(),
        at_hour(2),
    )
    .unwrap();
    let err: ApiError = start_donation(
        &mut store,
        &StartDonationRequest { donation_id },
        &staff_actor(),
        test_cause(),
        at_hour(3),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::DomainRuleViolation { ref rule, .. } if rule == "lifecycle"));
}

#[test]
fn test_record_vital_signs_appends_in_order() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: 450,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap()
    .response
    .donation_id;
    start_donation(
        &mut store,
        &StartDonationRequest { donation_id },
        &staff_actor(),
        test_cause(),
        at_hour(2),
    )
    .unwrap();

    record_vital_signs(
        &mut store,
        RecordVitalSignsRequest {
            donation_id,
            phase: String::from("donation"),
            pulse_bpm: 72,
            systolic_mmhg: 118,
            diastolic_mmhg: 76,
            note: None,
        },
        &staff_actor(),
        test_cause(),
        at_hour(2) + Duration::minutes(5),
    )
    .unwrap();
    let second = record_vital_signs(
        &mut store,
        RecordVitalSignsRequest {
            donation_id,
            phase: String::from("resting"),
            pulse_bpm: 80,
            systolic_mmhg: 112,
            diastolic_mmhg: 74,
            note: Some(String::from("slightly dizzy")),
        },
        &staff_actor(),
        test_cause(),
        at_hour(2) + Duration::minutes(20),
    )
    .unwrap();
    assert_eq!(second.response.entries, 2);

    let donation: GetDonationResponse = get_donation(&store, donation_id).unwrap();
    assert_eq!(donation.vital_log.len(), 2);
    assert_eq!(donation.vital_log[0].phase, "donation");
    assert_eq!(donation.vital_log[1].phase, "resting");
    assert_eq!(donation.vital_log[1].note.as_deref(), Some("slightly dizzy"));
}

#[test]
fn test_record_vital_signs_rejects_backdated_entry() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: 450,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap()
    .response
    .donation_id;
    start_donation(
        &mut store,
        &StartDonationRequest { donation_id },
        &staff_actor(),
        test_cause(),
        at_hour(2),
    )
    .unwrap();

    record_vital_signs(
        &mut store,
        RecordVitalSignsRequest {
            donation_id,
            phase: String::from("donation"),
            pulse_bpm: 72,
            systolic_mmhg: 118,
            diastolic_mmhg: 76,
            note: None,
        },
        &staff_actor(),
        test_cause(),
        at_hour(3),
    )
    .unwrap();
    let err: ApiError = record_vital_signs(
        &mut store,
        RecordVitalSignsRequest {
            donation_id,
            phase: String::from("resting"),
            pulse_bpm: 80,
            systolic_mmhg: 112,
            diastolic_mmhg: 74,
            note: None,
        },
        &staff_actor(),
        test_cause(),
        at_hour(2),
    )
    .unwrap_err();

    assert!(
        matches!(err, ApiError::DomainRuleViolation { ref rule, .. } if rule == "vital_log_order")
    );
}

#[test]
fn test_record_vital_signs_requires_in_progress() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: 450,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap()
    .response
    .donation_id;

    let err: ApiError = record_vital_signs(
        &mut store,
        RecordVitalSignsRequest {
            donation_id,
            phase: String::from("donation"),
            pulse_bpm: 72,
            systolic_mmhg: 118,
            diastolic_mmhg: 76,
            note: None,
        },
        &staff_actor(),
        test_cause(),
        at_hour(2),
    )
    .unwrap_err();

    assert!(
        matches!(err, ApiError::DomainRuleViolation { ref rule, .. } if rule == "vital_log_open")
    );
}

#[test]
fn test_record_vital_signs_rejects_unknown_phase() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: 450,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap()
    .response
    .donation_id;

    let err: ApiError = record_vital_signs(
        &mut store,
        RecordVitalSignsRequest {
            donation_id,
            phase: String::from("recovery"),
            pulse_bpm: 72,
            systolic_mmhg: 118,
            diastolic_mmhg: 76,
            note: None,
        },
        &staff_actor(),
        test_cause(),
        at_hour(2),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "phase"));
}

#[test]
fn test_complete_donation_below_threshold_refused() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: 450,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap()
    .response
    .donation_id;
    start_donation(
        &mut store,
        &StartDonationRequest { donation_id },
        &staff_actor(),
        test_cause(),
        at_hour(2),
    )
    .unwrap();

    let err: ApiError = complete_donation(
        &mut store,
        &CompleteDonationRequest {
            donation_id,
            collected_ml: 150,
        },
        &staff_actor(),
        test_cause(),
        at_hour(3),
    )
    .unwrap_err();
    assert!(
        matches!(err, ApiError::DomainRuleViolation { ref rule, .. } if rule == "minimum_collection")
    );

    // The short draw leaves the donation in progress for staff to settle.
    let donation: GetDonationResponse = get_donation(&store, donation_id).unwrap();
    assert_eq!(donation.status, "in_progress");
}

#[test]
fn test_complete_donation_records_collected_volume() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = completed_donation(&mut store, donor_id, facility_id, 430);

    let donation: GetDonationResponse = get_donation(&store, donation_id).unwrap();
    assert_eq!(donation.status, "completed");
    assert_eq!(donation.collected_quantity_ml, 430);
    assert!(!donation.is_split);
}

#[test]
fn test_adverse_event_terminal_and_revokes_donor() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: 450,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap()
    .response
    .donation_id;
    start_donation(
        &mut store,
        &StartDonationRequest { donation_id },
        &staff_actor(),
        test_cause(),
        at_hour(2),
    )
    .unwrap();

    let result = report_adverse_event(
        &mut store,
        ReportAdverseEventRequest {
            donation_id,
            note: Some(String::from("vasovagal reaction during draw")),
        },
        &staff_actor(),
        test_cause(),
        at_hour(3),
    )
    .unwrap();
    assert_eq!(result.response.status, "adverse_event");
    assert!(!result.response.donor_eligible);
    assert_eq!(
        result.audit_event.action.details.as_deref(),
        Some("vasovagal reaction during draw")
    );

    let err: ApiError = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: 450,
        },
        &staff_actor(),
        test_cause(),
        at_hour(4),
    )
    .unwrap_err();
    assert!(
        matches!(err, ApiError::DomainRuleViolation { ref rule, .. } if rule == "donor_eligibility")
    );
}

#[test]
fn test_cancel_donation_from_registered() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: 450,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap()
    .response
    .donation_id;

    let result = cancel_donation(
        &mut store,
        &CancelDonationRequest { donation_id },
        &staff_actor(),
        test_cause(),
        at_hour(2),
    )
    .unwrap();

    assert_eq!(result.response.status, "cancelled");
}

#[test]
fn test_cancel_completed_donation_is_refused() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = completed_donation(&mut store, donor_id, facility_id, 450);

    let err: ApiError = cancel_donation(
        &mut store,
        &CancelDonationRequest { donation_id },
        &staff_actor(),
        test_cause(),
        at_hour(4),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::DomainRuleViolation { ref rule, .. } if rule == "lifecycle"));
}

// ============================================================================
// Component Splitting Tests
// ============================================================================

#[test]
fn test_split_produces_testing_units() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = completed_donation(&mut store, donor_id, facility_id, 450);

    let result: ApiResult<SplitDonationResponse> = split_donation(
        &mut store,
        &ledger,
        &SplitDonationRequest {
            donation_id,
            allocations: vec![
                SplitAllocationInput {
                    component: String::from("plasma"),
                    quantity_ml: 200,
                },
                SplitAllocationInput {
                    component: String::from("red_cells"),
                    quantity_ml: 250,
                },
            ],
        },
        &staff_actor(),
        test_cause(),
        at_hour(4),
    )
    .unwrap();

    assert_eq!(result.response.units.len(), 2);
    assert!(
        result
            .response
            .units
            .iter()
            .all(|unit| unit.status == "testing")
    );
    // Shelf life counts from the end of collection.
    assert_eq!(
        result.response.units[0].expires_at,
        at_hour(3) + Duration::days(365)
    );
    assert_eq!(
        result.response.units[1].expires_at,
        at_hour(3) + Duration::days(42)
    );

    // Unscreened units never count toward stock.
    let available = get_available(&store, &ledger, facility_id, "A+", "plasma", at_hour(5))
        .unwrap()
        .available_ml;
    assert_eq!(available, 0);

    let donation: GetDonationResponse = get_donation(&store, donation_id).unwrap();
    assert!(donation.is_split);
}

#[test]
fn test_split_sum_over_collected_is_refused() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = completed_donation(&mut store, donor_id, facility_id, 450);

    let err: ApiError = split_donation(
        &mut store,
        &ledger,
        &SplitDonationRequest {
            donation_id,
            allocations: vec![
                SplitAllocationInput {
                    component: String::from("plasma"),
                    quantity_ml: 300,
                },
                SplitAllocationInput {
                    component: String::from("red_cells"),
                    quantity_ml: 200,
                },
            ],
        },
        &staff_actor(),
        test_cause(),
        at_hour(4),
    )
    .unwrap_err();

    assert!(
        matches!(err, ApiError::DomainRuleViolation { ref rule, .. } if rule == "split_within_collection")
    );
}

#[test]
fn test_split_requires_completed_donation() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = register_donation(
        &mut store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: 450,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap()
    .response
    .donation_id;

    let err: ApiError = split_donation(
        &mut store,
        &ledger,
        &SplitDonationRequest {
            donation_id,
            allocations: vec![SplitAllocationInput {
                component: String::from("plasma"),
                quantity_ml: 200,
            }],
        },
        &staff_actor(),
        test_cause(),
        at_hour(2),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::Conflict { .. }));
}

#[test]
fn test_split_twice_is_refused() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = completed_donation(&mut store, donor_id, facility_id, 450);
    stocked_plasma_units(&mut store, &ledger, donation_id, &[450]);

    let err: ApiError = split_donation(
        &mut store,
        &ledger,
        &SplitDonationRequest {
            donation_id,
            allocations: vec![SplitAllocationInput {
                component: String::from("plasma"),
                quantity_ml: 100,
            }],
        },
        &staff_actor(),
        test_cause(),
        at_hour(5),
    )
    .unwrap_err();

    match err {
        ApiError::Conflict { message } => {
            assert!(message.contains("already been split"));
        }
        other => panic!("expected a conflict, got {other:?}"),
    }
}

#[test]
fn test_split_rejects_empty_allocations() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = completed_donation(&mut store, donor_id, facility_id, 450);

    let err: ApiError = split_donation(
        &mut store,
        &ledger,
        &SplitDonationRequest {
            donation_id,
            allocations: Vec::new(),
        },
        &staff_actor(),
        test_cause(),
        at_hour(4),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "allocations"));
}

#[test]
fn test_split_rejects_zero_quantity_cut() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = completed_donation(&mut store, donor_id, facility_id, 450);

    let err: ApiError = split_donation(
        &mut store,
        &ledger,
        &SplitDonationRequest {
            donation_id,
            allocations: vec![SplitAllocationInput {
                component: String::from("plasma"),
                quantity_ml: 0,
            }],
        },
        &staff_actor(),
        test_cause(),
        at_hour(4),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "quantity_ml"));
}

#[test]
fn test_void_split_allows_second_split() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = completed_donation(&mut store, donor_id, facility_id, 450);
    let unit_ids: Vec<i64> = stocked_plasma_units(&mut store, &ledger, donation_id, &[450]);

    let voided = void_donation_split(
        &mut store,
        &ledger,
        &VoidDonationSplitRequest { donation_id },
        &staff_actor(),
        test_cause(),
    )
    .unwrap();
    assert_eq!(voided.response.voided_unit_ids, unit_ids);

    let donation: GetDonationResponse = get_donation(&store, donation_id).unwrap();
    assert!(!donation.is_split);
    // Voided stock is gone.
    let available = get_available(&store, &ledger, facility_id, "A+", "plasma", at_hour(6))
        .unwrap()
        .available_ml;
    assert_eq!(available, 0);

    // The corrected split goes through.
    assert!(
        split_donation(
            &mut store,
            &ledger,
            &SplitDonationRequest {
                donation_id,
                allocations: vec![SplitAllocationInput {
                    component: String::from("plasma"),
                    quantity_ml: 420,
                }],
            },
            &staff_actor(),
            test_cause(),
            at_hour(6),
        )
        .is_ok()
    );
}

#[test]
fn test_void_refuses_while_units_reserved() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);
    let request_id: i64 = submit_plasma_request(&mut store, facility_id, 450, false);
    evaluate_request(
        &mut store,
        &ledger,
        &EvaluateRequestRequest { request_id },
        &staff_actor(),
        test_cause(),
        at_hour(30),
    )
    .unwrap();

    let err: ApiError = void_donation_split(
        &mut store,
        &ledger,
        &VoidDonationSplitRequest { donation_id: 1 },
        &staff_actor(),
        test_cause(),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::Conflict { .. }));
    // The refused void leaves the split marker in place.
    let donation: GetDonationResponse = get_donation(&store, 1).unwrap();
    assert!(donation.is_split);
}

// ============================================================================
// Lab Screening Tests
// ============================================================================

#[test]
fn test_mark_tested_pass_counts_toward_stock() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let (facility_id, _donor_id): (i64, i64) = seeded_facility(&mut store, &ledger, 450);

    let available = get_available(&store, &ledger, facility_id, "A+", "plasma", at_hour(6))
        .unwrap()
        .available_ml;
    assert_eq!(available, 450);
}

#[test]
fn test_mark_tested_fail_keeps_unit_out() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = completed_donation(&mut store, donor_id, facility_id, 450);
    let split: ApiResult<SplitDonationResponse> = split_donation(
        &mut store,
        &ledger,
        &SplitDonationRequest {
            donation_id,
            allocations: vec![SplitAllocationInput {
                component: String::from("plasma"),
                quantity_ml: 450,
            }],
        },
        &staff_actor(),
        test_cause(),
        at_hour(4),
    )
    .unwrap();
    let unit_id: i64 = split.response.units[0].unit_id;

    let result = mark_unit_tested(
        &mut store,
        &ledger,
        &MarkUnitTestedRequest {
            unit_id,
            passed: false,
        },
        &staff_actor(),
        test_cause(),
    )
    .unwrap();
    assert_eq!(result.response.status, "rejected");

    let available = get_available(&store, &ledger, facility_id, "A+", "plasma", at_hour(5))
        .unwrap()
        .available_ml;
    assert_eq!(available, 0);
}

#[test]
fn test_mark_tested_twice_is_refused() {
    let mut store: Store = Store::new();
    let ledger: InventoryLedger = InventoryLedger::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    let donation_id: i64 = completed_donation(&mut store, donor_id, facility_id, 450);
    let unit_ids: Vec<i64> = stocked_plasma_units(&mut store, &ledger, donation_id, &[450]);

    let err: ApiError = mark_unit_tested(
        &mut store,
        &ledger,
        &MarkUnitTestedRequest {
            unit_id: unit_ids[0],
            passed: true,
        },
        &staff_actor(),
        test_cause(),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::Conflict { .. }));
}

// ============================================================================
// Audit Trail Tests
// ============================================================================

#[test]
fn test_audit_events_accumulate_for_facility() {
    let mut store: Store = Store::new();
    let facility_id: i64 = register_test_facility(&mut store);
    let donor_id: i64 = register_test_donor(&mut store, "Asha Rao", "A+");
    completed_donation(&mut store, donor_id, facility_id, 450);

    let events = list_facility_events(&store, facility_id).unwrap();
    // Facility registration plus the three donation transitions; the donor
    // registration is unscoped and does not appear here.
    assert_eq!(events.events.len(), 4);
    assert_eq!(events.events[0].action, "RegisterFacility");
    assert_eq!(events.events[1].action, "RegisterDonation");
    assert_eq!(events.events[2].action, "StartDonation");
    assert_eq!(events.events[3].action, "CompleteDonation");
    assert!(events.events.iter().all(|event| event.actor_id == "staff-7"));
}
