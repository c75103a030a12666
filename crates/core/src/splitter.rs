// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Splits a completed donation into component blood units.
//!
//! A split is deliberately not idempotent: the physical separation happens
//! once, so a second split of the same donation fails with `AlreadySplit`
//! rather than silently minting duplicate stock. Data-entry mistakes are
//! corrected through the void path, which rejects the donation's still-idle
//! units and clears the split marker so the donation can be re-split.

use crate::error::CoreError;
use hemolink_domain::{
    BloodComponent, BloodUnit, Donation, DonationStatus, validate_split_allocations,
};
use time::OffsetDateTime;

/// One component cut requested from a completed donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitAllocation {
    /// The component to produce.
    pub component: BloodComponent,
    /// The volume of the cut, in milliliters.
    pub quantity_ml: u32,
}

impl SplitAllocation {
    /// Creates a split allocation.
    #[must_use]
    pub const fn new(component: BloodComponent, quantity_ml: u32) -> Self {
        Self {
            component,
            quantity_ml,
        }
    }
}

/// Plans the split of a completed donation into component units.
///
/// Returns the units to register with the ledger (unregistered, in `testing`,
/// expiry derived from each component's shelf life) and the donation with its
/// split marker set. Allocations must conserve quantity: their total may not
/// exceed the collected volume. Nothing is persisted here; the caller
/// registers the units and stores the updated donation.
///
/// # Errors
///
/// Returns `CoreError::StateConflict` if the donation is not completed,
/// `CoreError::AlreadySplit` if it was split before, or a wrapped
/// `DomainError` if the allocations are empty, contain a zero quantity, or
/// exceed the collected volume.
pub fn plan_split(
    donation: &Donation,
    allocations: &[SplitAllocation],
    now: OffsetDateTime,
) -> Result<(Vec<BloodUnit>, Donation), CoreError> {
    let donation_id: i64 = donation
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("donation has no registry id")))?;

    if donation.status != DonationStatus::Completed {
        return Err(CoreError::StateConflict {
            entity: "donation",
            id: donation_id,
            reason: format!(
                "only completed donations can be split (status is '{}')",
                donation.status
            ),
        });
    }

    if donation.is_split() {
        return Err(CoreError::AlreadySplit { donation_id });
    }

    let pairs: Vec<(BloodComponent, u32)> = allocations
        .iter()
        .map(|allocation| (allocation.component, allocation.quantity_ml))
        .collect();
    validate_split_allocations(donation.collected_quantity_ml, &pairs)?;

    // Shelf life counts from the end of collection, not from the split.
    let collected_at: OffsetDateTime = donation
        .ended_at
        .ok_or_else(|| CoreError::Internal(String::from("completed donation has no end time")))?;

    let units: Vec<BloodUnit> = allocations
        .iter()
        .map(|allocation| {
            BloodUnit::new(
                donation_id,
                donation.facility_id,
                donation.blood_group,
                allocation.component,
                allocation.quantity_ml,
                collected_at,
            )
        })
        .collect();

    let mut split: Donation = donation.clone();
    split.split_at = Some(now);

    Ok((units, split))
}

/// Clears a donation's split marker after its units were voided.
///
/// This is the staff escape hatch for a mis-entered split: pair it with the
/// ledger void so the donation's volume is not counted twice.
///
/// # Errors
///
/// Returns `CoreError::StateConflict` if the donation has not been split.
pub fn clear_split(donation: &Donation) -> Result<Donation, CoreError> {
    let donation_id: i64 = donation
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("donation has no registry id")))?;

    if !donation.is_split() {
        return Err(CoreError::StateConflict {
            entity: "donation",
            id: donation_id,
            reason: String::from("donation has not been split"),
        });
    }

    let mut cleared: Donation = donation.clone();
    cleared.split_at = None;
    Ok(cleared)
}
