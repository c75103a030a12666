// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::blood::BloodGroup;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A registered donor.
///
/// Donors are never deleted; a donor who is banned from donating is archived
/// so their donation history stays attributable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donor {
    /// The canonical numeric identifier assigned by the registry.
    /// `None` indicates the donor has not been registered yet.
    donor_id: Option<i64>,
    /// Display name of the donor.
    pub name: String,
    /// The donor's blood group.
    pub blood_group: BloodGroup,
    /// Whether the donor is currently cleared to donate.
    pub eligible: bool,
    /// Soft-delete flag; archived donors cannot register new donations.
    pub archived: bool,
    /// Number of completed donations attributed to this donor.
    pub donation_count: u32,
    /// When the donor was registered.
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
    /// Optimistic concurrency version, bumped on every update.
    pub version: u64,
}

impl Donor {
    /// Creates a new `Donor` without a registered ID.
    ///
    /// New donors start eligible; eligibility is revoked by health checks or
    /// adverse events.
    #[must_use]
    pub const fn new(name: String, blood_group: BloodGroup, registered_at: OffsetDateTime) -> Self {
        Self {
            donor_id: None,
            name,
            blood_group,
            eligible: true,
            archived: false,
            donation_count: 0,
            registered_at,
            version: 0,
        }
    }

    /// Re-attaches a registry ID to a donor value.
    #[must_use]
    pub fn with_id(mut self, donor_id: i64) -> Self {
        self.donor_id = Some(donor_id);
        self
    }

    /// Returns the canonical numeric identifier if registered.
    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        self.donor_id
    }

    /// Whether the donor may register a new donation.
    #[must_use]
    pub const fn can_donate(&self) -> bool {
        self.eligible && !self.archived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_donor() -> Donor {
        Donor::new(
            String::from("Ada Osei"),
            BloodGroup::ONegative,
            OffsetDateTime::UNIX_EPOCH,
        )
    }

    #[test]
    fn test_new_donor_is_eligible() {
        let donor = create_donor();
        assert!(donor.eligible);
        assert!(!donor.archived);
        assert!(donor.can_donate());
    }

    #[test]
    fn test_archived_donor_cannot_donate() {
        let mut donor = create_donor();
        donor.archived = true;
        assert!(!donor.can_donate());
    }

    #[test]
    fn test_ineligible_donor_cannot_donate() {
        let mut donor = create_donor();
        donor.eligible = false;
        assert!(!donor.can_donate());
    }
}
