// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Entity registry and audit log for the HemoLink blood supply system.
//!
//! This crate owns the canonical copy of every workflow entity: facilities,
//! donors, donations, requests, campaigns, pledges and deliveries. The
//! fulfillment core hands back updated values; this registry decides whether
//! they may land.
//!
//! ## Identity
//!
//! Identifiers are minted here and nowhere else. `insert_*` assigns the next
//! `i64` in a per-kind sequence, starting at 1. Entities arrive from their
//! constructors without an identifier and leave the insert call with one.
//!
//! ## Versioned writes
//!
//! Every workflow entity carries a `version` counter. `update_*` treats the
//! incoming record's version as the version the caller read: a mismatch with
//! the stored copy fails with [`StoreError::VersionConflict`] and changes
//! nothing. A successful update bumps the stored version by one. Callers that
//! lose the race re-read and re-apply; nothing is ever silently overwritten.
//!
//! ## Audit log
//!
//! Every successful state transition records exactly one
//! [`AuditEvent`](hemolink_audit::AuditEvent). The log is append-only: events
//! get one-based, strictly increasing identifiers and are never mutated.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

use hemolink::escalation::expire_campaign;
use hemolink_audit::AuditEvent;
use hemolink_domain::{
    BloodRequest, CampaignStatus, Delivery, Donation, Donor, EmergencyCampaign, Facility,
    SupportPledge,
};
use std::collections::HashMap;
use time::OffsetDateTime;
use tracing::debug;

/// Macro to generate the registry methods shared by every versioned entity.
///
/// For an entity kind `donor` this expands to three inherent methods on
/// [`Store`]:
/// - `insert_donor` — mints the next identifier and stores the record
/// - `get_donor` — fetches a stored record by identifier
/// - `update_donor` — versioned replace with conflict detection
///
/// The macro only stamps out monomorphic methods. The rules they enforce
/// (identifier minting, version comparison, version bump) are written once
/// in the macro body and are identical for every entity kind.
///
/// # Usage
///
/// ```ignore
/// registry_methods! {
///     Donor, "donor", donor, donors
/// }
/// ```
///
/// The four arguments are the entity type, the label used in errors, the
/// singular method stem and the map field. Fresh identifiers are drawn from
/// the `<stem>_ids` sequence field.
macro_rules! registry_methods {
    (
        $entity:ty, $label:literal, $singular:ident, $plural:ident
    ) => {
        pastey::paste! {
            #[doc = concat!("Stores a new ", $label, ", minting the next identifier for it.")]
            #[doc = ""]
            #[doc = "Any identifier already on the record is replaced; the registry is"]
            #[doc = "the sole authority for identity."]
            #[must_use]
            pub fn [<insert_ $singular>](&mut self, record: $entity) -> $entity {
                let id: i64 = self.[<$singular _ids>].next();
                let stored: $entity = record.with_id(id);
                self.$plural.insert(id, stored.clone());
                stored
            }

            #[doc = concat!("Fetches a ", $label, " by identifier.")]
            #[doc = ""]
            #[doc = "# Errors"]
            #[doc = ""]
            #[doc = concat!("Returns [`StoreError::NotFound`] if no ", $label, " has the given identifier.")]
            pub fn [<get_ $singular>](&self, id: i64) -> Result<$entity, StoreError> {
                self.$plural.get(&id).cloned().ok_or(StoreError::NotFound {
                    entity: $label,
                    id,
                })
            }

            #[doc = concat!("Replaces a stored ", $label, " if the caller read the latest version.")]
            #[doc = ""]
            #[doc = "The record's `version` is taken as the version the caller read. On a"]
            #[doc = "match the stored copy is replaced with the version bumped by one, and"]
            #[doc = "the bumped record is returned."]
            #[doc = ""]
            #[doc = "# Errors"]
            #[doc = ""]
            #[doc = "Returns [`StoreError::MissingId`] if the record was never stored,"]
            #[doc = "[`StoreError::NotFound`] if its identifier is unknown, and"]
            #[doc = "[`StoreError::VersionConflict`] on a stale write."]
            pub fn [<update_ $singular>](&mut self, record: &$entity) -> Result<$entity, StoreError> {
                let Some(id) = record.id() else {
                    return Err(StoreError::MissingId { entity: $label });
                };
                let Some(current) = self.$plural.get_mut(&id) else {
                    return Err(StoreError::NotFound { entity: $label, id });
                };
                if current.version != record.version {
                    return Err(StoreError::VersionConflict {
                        entity: $label,
                        id,
                        expected: record.version,
                        actual: current.version,
                    });
                }
                let mut updated: $entity = record.clone();
                updated.version += 1;
                *current = updated.clone();
                Ok(updated)
            }
        }
    };
}

mod error;

#[cfg(test)]
mod tests;

pub use error::StoreError;

/// Monotonic identifier sequence for one entity kind.
///
/// Identifiers are one-based so that zero never denotes a stored record.
#[derive(Debug, Default)]
struct IdSequence {
    last_id: i64,
}

impl IdSequence {
    fn next(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// In-memory registry for workflow entities and the audit log.
///
/// One instance holds the whole system state. Callers that need shared
/// access wrap it themselves; the registry has no interior locking.
#[derive(Debug, Default)]
pub struct Store {
    facilities: HashMap<i64, Facility>,
    donors: HashMap<i64, Donor>,
    donations: HashMap<i64, Donation>,
    requests: HashMap<i64, BloodRequest>,
    campaigns: HashMap<i64, EmergencyCampaign>,
    pledges: HashMap<i64, SupportPledge>,
    deliveries: HashMap<i64, Delivery>,
    events: Vec<AuditEvent>,
    facility_ids: IdSequence,
    donor_ids: IdSequence,
    donation_ids: IdSequence,
    request_ids: IdSequence,
    campaign_ids: IdSequence,
    pledge_ids: IdSequence,
    delivery_ids: IdSequence,
}

impl Store {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Facilities
    // ========================================================================

    /// Stores a new facility, minting the next identifier for it.
    ///
    /// Facilities carry no version counter: their configuration is fixed at
    /// registration, so there is no update path to guard.
    #[must_use]
    pub fn insert_facility(&mut self, record: Facility) -> Facility {
        let id: i64 = self.facility_ids.next();
        let stored: Facility = record.with_id(id);
        self.facilities.insert(id, stored.clone());
        stored
    }

    /// Fetches a facility by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no facility has the given
    /// identifier.
    pub fn get_facility(&self, id: i64) -> Result<Facility, StoreError> {
        self.facilities
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "facility",
                id,
            })
    }

    // ========================================================================
    // Donors & Donations
    // ========================================================================

    registry_methods!(Donor, "donor", donor, donors);

    registry_methods!(Donation, "donation", donation, donations);

    // ========================================================================
    // Requests
    // ========================================================================

    registry_methods!(BloodRequest, "request", request, requests);

    // ========================================================================
    // Campaigns & Pledges
    // ========================================================================

    registry_methods!(EmergencyCampaign, "campaign", campaign, campaigns);

    registry_methods!(SupportPledge, "pledge", pledge, pledges);

    /// Returns the most recently opened campaign linked to a request, if any.
    ///
    /// The at-most-one-open-campaign rule is enforced by the escalation
    /// component; this finder just hands it the latest candidate.
    #[must_use]
    pub fn campaign_for_request(&self, request_id: i64) -> Option<EmergencyCampaign> {
        self.campaigns
            .values()
            .filter(|campaign| campaign.request_id == request_id)
            .max_by_key(|campaign| campaign.id())
            .cloned()
    }

    /// Returns every pledge filed against a campaign, ordered by identifier.
    #[must_use]
    pub fn pledges_for_campaign(&self, campaign_id: i64) -> Vec<SupportPledge> {
        let mut pledges: Vec<SupportPledge> = self
            .pledges
            .values()
            .filter(|pledge| pledge.campaign_id == campaign_id)
            .cloned()
            .collect();
        pledges.sort_by_key(|pledge| pledge.id());
        pledges
    }

    // ========================================================================
    // Deliveries
    // ========================================================================

    registry_methods!(Delivery, "delivery", delivery, deliveries);

    /// Returns the most recent delivery created for a request, if any.
    ///
    /// Used to enforce one active run per request: dispatch refuses a new
    /// delivery while the latest one is not terminal.
    #[must_use]
    pub fn latest_delivery_for_request(&self, request_id: i64) -> Option<Delivery> {
        self.deliveries
            .values()
            .filter(|delivery| delivery.request_id == request_id)
            .max_by_key(|delivery| delivery.id())
            .cloned()
    }

    // ========================================================================
    // Audit Log
    // ========================================================================

    /// Appends an audit event to the log and returns its event identifier.
    ///
    /// Event identifiers are one-based and strictly increasing.
    pub fn record_event(&mut self, event: AuditEvent) -> i64 {
        self.events.push(event);
        i64::try_from(self.events.len()).unwrap_or(i64::MAX)
    }

    /// Fetches a recorded audit event by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no event has the given identifier.
    pub fn get_audit_event(&self, event_id: i64) -> Result<AuditEvent, StoreError> {
        let not_found: StoreError = StoreError::NotFound {
            entity: "audit event",
            id: event_id,
        };
        let index: usize = usize::try_from(event_id - 1).map_err(|_| not_found.clone())?;
        self.events.get(index).cloned().ok_or(not_found)
    }

    /// Returns every audit event scoped to a facility, in insertion order.
    #[must_use]
    pub fn events_for_facility(&self, facility_id: i64) -> Vec<AuditEvent> {
        self.events
            .iter()
            .filter(|event| event.facility_id == Some(facility_id))
            .cloned()
            .collect()
    }

    // ========================================================================
    // Sweeps
    // ========================================================================

    /// Flips every overdue campaign still stored as `open` to `expired`.
    ///
    /// Campaigns already treat a passed deadline as expiry on read; this
    /// sweep persists that status so later reads see it directly. Running it
    /// twice is harmless: the second pass finds nothing stored as `open`.
    /// Returns the identifiers of the campaigns flipped, in ascending order.
    pub fn expire_due_campaigns(&mut self, now: OffsetDateTime) -> Vec<i64> {
        let open_campaigns: Vec<EmergencyCampaign> = self
            .campaigns
            .values()
            .filter(|campaign| campaign.status == CampaignStatus::Open)
            .cloned()
            .collect();

        let mut expired_ids: Vec<i64> = Vec::new();
        for campaign in open_campaigns {
            let Ok(expired) = expire_campaign(&campaign, now) else {
                continue;
            };
            if let Ok(stored) = self.update_campaign(&expired)
                && let Some(id) = stored.id()
            {
                expired_ids.push(id);
            }
        }
        expired_ids.sort_unstable();
        if !expired_ids.is_empty() {
            debug!(count = expired_ids.len(), "expired overdue campaigns");
        }
        expired_ids
    }
}
