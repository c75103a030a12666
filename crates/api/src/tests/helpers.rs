// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use hemolink::InventoryLedger;
use hemolink_audit::{Actor, Cause};
use hemolink_store::Store;
use time::{Duration, OffsetDateTime};

use crate::{
    ApiResult, AssignTransporterRequest, CompleteDonationRequest, EvaluateRequestRequest,
    EvaluateRequestResponse, MarkUnitTestedRequest, RegisterDonationRequest, RegisterDonorRequest,
    RegisterFacilityRequest, SplitAllocationInput, SplitDonationRequest, StartDeliveryRequest,
    StartDonationRequest, SubmitRequestRequest, assign_transporter, complete_donation,
    evaluate_request, mark_unit_tested, register_donation, register_donor, register_facility,
    split_donation, start_delivery, start_donation, submit_request,
};

pub fn staff_actor() -> Actor {
    Actor::new(String::from("staff-7"), String::from("staff"))
}

pub fn transporter_actor() -> Actor {
    Actor::new(String::from("transporter-31"), String::from("transporter"))
}

pub fn test_cause() -> Cause {
    Cause::new(String::from("api-req-1"), String::from("API request"))
}

pub fn at_hour(hour: i64) -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + Duration::hours(hour)
}

pub fn at_day(day: i64) -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + Duration::days(day)
}

/// Registers a facility with the default completion threshold.
pub fn register_test_facility(store: &mut Store) -> i64 {
    register_facility(
        store,
        RegisterFacilityRequest {
            name: String::from("Central Blood Bank"),
            min_collection_ml: None,
        },
        &staff_actor(),
        test_cause(),
    )
    .unwrap()
    .response
    .facility_id
}

pub fn register_test_donor(store: &mut Store, name: &str, blood_group: &str) -> i64 {
    register_donor(
        store,
        RegisterDonorRequest {
            name: String::from(name),
            blood_group: String::from(blood_group),
        },
        &staff_actor(),
        test_cause(),
        at_hour(0),
    )
    .unwrap()
    .response
    .donor_id
}

/// Registers, starts, and completes a donation of `collected_ml`.
pub fn completed_donation(
    store: &mut Store,
    donor_id: i64,
    facility_id: i64,
    collected_ml: u32,
) -> i64 {
    let donation_id: i64 = register_donation(
        store,
        &RegisterDonationRequest {
            donor_id,
            facility_id,
            target_quantity_ml: collected_ml,
        },
        &staff_actor(),
        test_cause(),
        at_hour(1),
    )
    .unwrap()
    .response
    .donation_id;
    start_donation(
        store,
        &StartDonationRequest { donation_id },
        &staff_actor(),
        test_cause(),
        at_hour(2),
    )
    .unwrap();
    complete_donation(
        store,
        &CompleteDonationRequest {
            donation_id,
            collected_ml,
        },
        &staff_actor(),
        test_cause(),
        at_hour(3),
    )
    .unwrap();
    donation_id
}

/// Splits a completed donation into plasma cuts and screens every unit in.
/// Returns the unit ids, all `available`.
pub fn stocked_plasma_units(
    store: &mut Store,
    ledger: &InventoryLedger,
    donation_id: i64,
    cuts: &[u32],
) -> Vec<i64> {
    let split = split_donation(
        store,
        ledger,
        &SplitDonationRequest {
            donation_id,
            allocations: cuts
                .iter()
                .map(|quantity_ml| SplitAllocationInput {
                    component: String::from("plasma"),
                    quantity_ml: *quantity_ml,
                })
                .collect(),
        },
        &staff_actor(),
        test_cause(),
        at_hour(4),
    )
    .unwrap();
    let unit_ids: Vec<i64> = split.response.units.iter().map(|unit| unit.unit_id).collect();
    for unit_id in &unit_ids {
        mark_unit_tested(
            store,
            ledger,
            &MarkUnitTestedRequest {
                unit_id: *unit_id,
                passed: true,
            },
            &staff_actor(),
            test_cause(),
        )
        .unwrap();
    }
    unit_ids
}

/// A facility stocked with one screened A+ plasma unit of `quantity_ml`.
/// Returns `(facility_id, donor_id)`.
pub fn seeded_facility(
    store: &mut Store,
    ledger: &InventoryLedger,
    quantity_ml: u32,
) -> (i64, i64) {
    let facility_id: i64 = register_test_facility(store);
    let donor_id: i64 = register_test_donor(store, "Asha Rao", "A+");
    let donation_id: i64 = completed_donation(store, donor_id, facility_id, quantity_ml);
    stocked_plasma_units(store, ledger, donation_id, &[quantity_ml]);
    (facility_id, donor_id)
}

/// Submits a resolved A+ plasma request for the facility.
pub fn submit_plasma_request(
    store: &mut Store,
    facility_id: i64,
    quantity_ml: u32,
    is_urgent: bool,
) -> i64 {
    submit_request(
        store,
        &SubmitRequestRequest {
            requester_id: 50,
            facility_id,
            blood_group: String::from("A+"),
            component: Some(String::from("plasma")),
            quantity_ml,
            is_urgent,
        },
        &staff_actor(),
        test_cause(),
        at_hour(24),
    )
    .unwrap()
    .response
    .request_id
}

/// Submits and approves a plasma request; returns `(request_id, delivery_id)`.
pub fn approved_delivery(
    store: &mut Store,
    ledger: &InventoryLedger,
    facility_id: i64,
    quantity_ml: u32,
) -> (i64, i64) {
    let request_id: i64 = submit_plasma_request(store, facility_id, quantity_ml, false);
    let evaluation: ApiResult<EvaluateRequestResponse> = evaluate_request(
        store,
        ledger,
        &EvaluateRequestRequest { request_id },
        &staff_actor(),
        test_cause(),
        at_hour(30),
    )
    .unwrap();
    assert_eq!(evaluation.response.decision, "approved");
    (request_id, evaluation.response.delivery_id.unwrap())
}

/// Drives a fresh request to an in-transit delivery.
pub fn in_transit_delivery(
    store: &mut Store,
    ledger: &InventoryLedger,
    facility_id: i64,
    quantity_ml: u32,
) -> (i64, i64) {
    let (request_id, delivery_id): (i64, i64) =
        approved_delivery(store, ledger, facility_id, quantity_ml);
    assign_transporter(
        store,
        &AssignTransporterRequest {
            delivery_id,
            transporter_id: 31,
        },
        &staff_actor(),
        test_cause(),
    )
    .unwrap();
    start_delivery(
        store,
        &StartDeliveryRequest { delivery_id },
        &transporter_actor(),
        test_cause(),
        at_hour(31),
    )
    .unwrap();
    (request_id, delivery_id)
}
