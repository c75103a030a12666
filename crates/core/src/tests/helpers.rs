// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::InventoryLedger;
use hemolink_domain::{
    BloodComponent, BloodGroup, BloodRequest, BloodUnit, Donation, DonationStatus, Donor,
};
use time::{Duration, OffsetDateTime};

pub const FACILITY_ID: i64 = 1;
pub const REQUESTER_ID: i64 = 50;

pub fn at_day(day: i64) -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + Duration::days(day)
}

pub fn create_test_donor(donor_id: i64) -> Donor {
    Donor::new(
        String::from("Ada Osei"),
        BloodGroup::OPositive,
        at_day(0),
    )
    .with_id(donor_id)
}

pub fn create_registered_donation(donation_id: i64, donor_id: i64) -> Donation {
    Donation::new(donor_id, FACILITY_ID, BloodGroup::OPositive, 450, at_day(0)).with_id(donation_id)
}

pub fn create_completed_donation(donation_id: i64, collected_ml: u32) -> Donation {
    let mut donation: Donation = create_registered_donation(donation_id, 10);
    donation.status = DonationStatus::Completed;
    donation.started_at = Some(at_day(0));
    donation.ended_at = Some(at_day(1));
    donation.collected_quantity_ml = collected_ml;
    donation
}

pub fn create_pending_request(request_id: i64, quantity_ml: u32) -> BloodRequest {
    BloodRequest::new(
        REQUESTER_ID,
        FACILITY_ID,
        BloodGroup::OPositive,
        Some(BloodComponent::RedCells),
        quantity_ml,
        false,
        at_day(1),
    )
    .with_id(request_id)
}

/// A ledger stocked with screened, available red-cell units of the given
/// volumes, all O+ at the test facility. Returns the unit ids.
pub fn stocked_ledger(unit_volumes_ml: &[u32]) -> (InventoryLedger, Vec<i64>) {
    let ledger: InventoryLedger = InventoryLedger::new();
    let units: Vec<BloodUnit> = unit_volumes_ml
        .iter()
        .enumerate()
        .map(|(index, quantity_ml)| {
            BloodUnit::new(
                i64::try_from(index).unwrap() + 100,
                FACILITY_ID,
                BloodGroup::OPositive,
                BloodComponent::RedCells,
                *quantity_ml,
                at_day(1),
            )
        })
        .collect();

    let registered: Vec<BloodUnit> = ledger.register_units(units).unwrap();
    let unit_ids: Vec<i64> = registered
        .iter()
        .map(|unit| unit.id().unwrap())
        .collect();
    for unit_id in &unit_ids {
        ledger.mark_tested(*unit_id, true).unwrap();
    }
    (ledger, unit_ids)
}
