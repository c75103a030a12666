// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Donation lifecycle transitions and donor bookkeeping.
//!
//! Every function takes the current record and returns the updated value;
//! nothing here touches storage. The donor is passed in explicitly wherever
//! eligibility matters, so the rules stay testable without a registry.

use crate::error::CoreError;
use hemolink_domain::{
    DomainError, Donation, DonationStatus, Donor, FacilityConfig, VitalSignEntry,
    validate_collection_volume,
};
use time::OffsetDateTime;

/// Starts collection for a registered donation.
///
/// # Errors
///
/// Returns a wrapped `DomainError` if the donor cannot donate or the donation
/// is not in `registered`, or `CoreError::StateConflict` if the donor record
/// does not belong to the donation.
pub fn start(donation: &Donation, donor: &Donor, now: OffsetDateTime) -> Result<Donation, CoreError> {
    check_donor_matches(donation, donor)?;
    check_can_donate(donor, donation.donor_id)?;
    donation
        .status
        .validate_transition(DonationStatus::InProgress)?;

    let mut started: Donation = donation.clone();
    started.status = DonationStatus::InProgress;
    started.started_at = Some(now);
    Ok(started)
}

/// Appends a vital-sign entry to an in-progress donation.
///
/// The log is append-only and ordered by recording time; an entry older than
/// the newest one in the log is refused rather than re-sorted.
///
/// # Errors
///
/// Returns a wrapped `DomainError::VitalLogClosed` if the donation is not in
/// progress, or `DomainError::VitalLogOutOfOrder` for a backdated entry.
pub fn record_vitals(donation: &Donation, entry: VitalSignEntry) -> Result<Donation, CoreError> {
    if donation.status != DonationStatus::InProgress {
        return Err(DomainError::VitalLogClosed {
            status: donation.status.to_string(),
        }
        .into());
    }

    match donation.vital_log.last() {
        Some(last) if entry.recorded_at < last.recorded_at => {
            return Err(DomainError::VitalLogOutOfOrder {
                last_recorded_at: last.recorded_at,
                attempted: entry.recorded_at,
            }
            .into());
        }
        _ => {}
    }

    let mut updated: Donation = donation.clone();
    updated.vital_log.push(entry);
    Ok(updated)
}

/// Completes an in-progress donation with the collected volume.
///
/// The volume must meet the facility's completion threshold; a short draw is
/// refused and the donation stays in progress for staff to cancel or abort.
///
/// # Errors
///
/// Returns a wrapped `DomainError` if the donation is not in progress or the
/// volume is zero or under the threshold.
pub fn complete(
    donation: &Donation,
    collected_ml: u32,
    config: &FacilityConfig,
    now: OffsetDateTime,
) -> Result<Donation, CoreError> {
    donation
        .status
        .validate_transition(DonationStatus::Completed)?;
    validate_collection_volume(collected_ml, config.min_collection_ml)?;

    let mut completed: Donation = donation.clone();
    completed.status = DonationStatus::Completed;
    completed.collected_quantity_ml = collected_ml;
    completed.ended_at = Some(now);
    Ok(completed)
}

/// Aborts an in-progress donation for medical reasons. Terminal.
///
/// The donor's eligibility should be cleared alongside via
/// [`apply_health_check`]; the medical note travels in the audit record.
///
/// # Errors
///
/// Returns a wrapped `DomainError` if the donation is not in progress.
pub fn report_adverse_event(donation: &Donation, now: OffsetDateTime) -> Result<Donation, CoreError> {
    donation
        .status
        .validate_transition(DonationStatus::AdverseEvent)?;

    let mut aborted: Donation = donation.clone();
    aborted.status = DonationStatus::AdverseEvent;
    aborted.ended_at = Some(now);
    Ok(aborted)
}

/// Cancels a donation that has not completed. Terminal.
///
/// # Errors
///
/// Returns a wrapped `DomainError` if the donation is already terminal.
pub fn cancel(donation: &Donation, now: OffsetDateTime) -> Result<Donation, CoreError> {
    donation
        .status
        .validate_transition(DonationStatus::Cancelled)?;

    let mut cancelled: Donation = donation.clone();
    cancelled.status = DonationStatus::Cancelled;
    cancelled.ended_at = Some(now);
    Ok(cancelled)
}

/// Applies a health-check outcome to a donor's eligibility.
///
/// A failed check (or an adverse event) clears eligibility until a later
/// check restores it.
///
/// # Errors
///
/// Returns a wrapped `DomainError::DonorArchived` if the donor is archived.
pub fn apply_health_check(donor: &Donor, passed: bool) -> Result<Donor, CoreError> {
    let donor_id: i64 = donor
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("donor has no registry id")))?;
    if donor.archived {
        return Err(DomainError::DonorArchived { donor_id }.into());
    }

    let mut checked: Donor = donor.clone();
    checked.eligible = passed;
    Ok(checked)
}

/// Soft-archives a donor. Their history stays attributable; new donations
/// and pledges are refused.
///
/// # Errors
///
/// Returns `CoreError::StateConflict` if the donor is already archived.
pub fn archive_donor(donor: &Donor) -> Result<Donor, CoreError> {
    let donor_id: i64 = donor
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("donor has no registry id")))?;
    if donor.archived {
        return Err(CoreError::StateConflict {
            entity: "donor",
            id: donor_id,
            reason: String::from("donor is already archived"),
        });
    }

    let mut archived: Donor = donor.clone();
    archived.archived = true;
    Ok(archived)
}

/// Credits a completed donation to the donor's tally.
#[must_use]
pub fn credit_completed_donation(donor: &Donor) -> Donor {
    let mut credited: Donor = donor.clone();
    credited.donation_count = credited.donation_count.saturating_add(1);
    credited
}

/// Refuses donors who cannot donate right now.
fn check_can_donate(donor: &Donor, donor_id: i64) -> Result<(), CoreError> {
    if donor.archived {
        return Err(DomainError::DonorArchived { donor_id }.into());
    }
    if !donor.eligible {
        return Err(DomainError::IneligibleDonor { donor_id }.into());
    }
    Ok(())
}

/// Guards against a donor record that does not belong to the donation.
fn check_donor_matches(donation: &Donation, donor: &Donor) -> Result<(), CoreError> {
    if donor.id() != Some(donation.donor_id) {
        return Err(CoreError::StateConflict {
            entity: "donation",
            id: donation.id().unwrap_or_default(),
            reason: String::from("donor record does not match the donation"),
        });
    }
    Ok(())
}
