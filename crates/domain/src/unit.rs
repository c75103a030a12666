// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Blood unit states and the unit record itself.
//!
//! Units are created exclusively by the component splitter and enter the
//! inventory in `testing`. Only the inventory ledger moves them afterwards.
//! Units are never deleted; they leave circulation through the terminal
//! states `used`, `expired` and `rejected`.

use crate::blood::{BloodComponent, BloodGroup};
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Blood unit inventory states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// Awaiting lab screening; not counted as available stock.
    Testing,
    /// Screened and reservable.
    Available,
    /// Earmarked by an approved request.
    Reserved,
    /// Transfused or otherwise consumed.
    Used,
    /// Past its shelf life.
    Expired,
    /// Failed screening or voided by staff.
    Rejected,
}

impl UnitStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Testing => "testing",
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Used => "used",
            Self::Expired => "expired",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUnitStatus` if the string is not a valid status.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "testing" => Ok(Self::Testing),
            "available" => Ok(Self::Available),
            "reserved" => Ok(Self::Reserved),
            "used" => Ok(Self::Used),
            "expired" => Ok(Self::Expired),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DomainError::InvalidUnitStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Returns true if this status is terminal (the unit has left circulation).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Used | Self::Expired | Self::Rejected)
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                entity: "blood unit",
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "cannot transition from terminal state".to_string(),
            });
        }

        let valid = match self {
            Self::Testing => matches!(new_status, Self::Available | Self::Rejected | Self::Expired),
            Self::Available => {
                matches!(new_status, Self::Reserved | Self::Expired | Self::Rejected)
            }
            Self::Reserved => matches!(new_status, Self::Available | Self::Used),
            Self::Used | Self::Expired | Self::Rejected => false,
        };

        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                entity: "blood unit",
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by unit lifecycle rules".to_string(),
            })
        }
    }
}

impl FromStr for UnitStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One physical bag of a blood component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodUnit {
    /// The canonical numeric identifier assigned by the ledger.
    /// `None` indicates the unit has not been registered yet.
    unit_id: Option<i64>,
    /// The donation this unit was split from.
    pub donation_id: i64,
    /// The facility holding the unit.
    pub facility_id: i64,
    /// Blood group inherited from the donation.
    pub blood_group: BloodGroup,
    /// The component in the bag.
    pub component: BloodComponent,
    /// Volume in the bag, in milliliters.
    pub quantity_ml: u32,
    /// Current inventory status.
    pub status: UnitStatus,
    /// When the source donation was collected.
    #[serde(with = "time::serde::rfc3339")]
    pub collected_at: OffsetDateTime,
    /// When the unit stops being transfusable.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl BloodUnit {
    /// Creates a new unit in `testing`, as produced by the splitter.
    ///
    /// The expiry is derived from the collection time and the component's
    /// shelf life.
    #[must_use]
    pub fn new(
        donation_id: i64,
        facility_id: i64,
        blood_group: BloodGroup,
        component: BloodComponent,
        quantity_ml: u32,
        collected_at: OffsetDateTime,
    ) -> Self {
        Self {
            unit_id: None,
            donation_id,
            facility_id,
            blood_group,
            component,
            quantity_ml,
            status: UnitStatus::Testing,
            collected_at,
            expires_at: collected_at + component.shelf_life(),
        }
    }

    /// Re-attaches a ledger ID to a unit value.
    #[must_use]
    pub fn with_id(mut self, unit_id: i64) -> Self {
        self.unit_id = Some(unit_id);
        self
    }

    /// Returns the canonical numeric identifier if registered.
    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        self.unit_id
    }

    /// Whether the unit is past its shelf life at `now`.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}
