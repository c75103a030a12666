// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Donation lifecycle states and the collection record itself.
//!
//! A donation moves `registered → in_progress → {completed, adverse_event,
//! cancelled}`. The three right-hand states are terminal. While in progress,
//! staff append vital-sign entries tagged with the collection phase; the log
//! is append-only and ordered by recording time.

use crate::blood::BloodGroup;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Donation lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    /// Donation is scheduled; collection has not started.
    Registered,
    /// Collection is underway.
    InProgress,
    /// Collection finished with a usable volume.
    Completed,
    /// Collection was aborted for medical reasons.
    AdverseEvent,
    /// Donation was called off before completion.
    Cancelled,
}

impl DonationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::AdverseEvent => "adverse_event",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDonationStatus` if the string is not a
    /// valid status.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "registered" => Ok(Self::Registered),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "adverse_event" => Ok(Self::AdverseEvent),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidDonationStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Returns true if this status is terminal (cannot transition to another state).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::AdverseEvent | Self::Cancelled)
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                entity: "donation",
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "cannot transition from terminal state".to_string(),
            });
        }

        let valid = match self {
            Self::Registered => matches!(new_status, Self::InProgress | Self::Cancelled),
            Self::InProgress => matches!(
                new_status,
                Self::Completed | Self::AdverseEvent | Self::Cancelled
            ),
            Self::Completed | Self::AdverseEvent | Self::Cancelled => false,
        };

        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                entity: "donation",
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by donation lifecycle rules".to_string(),
            })
        }
    }
}

impl FromStr for DonationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The phase of a collection session a vital-sign entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationPhase {
    /// During the draw itself.
    Donation,
    /// Mandatory rest after the draw.
    Resting,
    /// Final check before release from the facility.
    PostRestCheck,
}

impl DonationPhase {
    /// Returns the string representation of the phase.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Donation => "donation",
            Self::Resting => "resting",
            Self::PostRestCheck => "post_rest_check",
        }
    }

    /// Parses a phase from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDonationPhase` if the string is not a
    /// valid phase.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "donation" => Ok(Self::Donation),
            "resting" => Ok(Self::Resting),
            "post_rest_check" => Ok(Self::PostRestCheck),
            _ => Err(DomainError::InvalidDonationPhase {
                phase: s.to_string(),
            }),
        }
    }
}

impl FromStr for DonationPhase {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for DonationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable vital-sign reading taken during a collection session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalSignEntry {
    /// Which phase of the session the reading belongs to.
    pub phase: DonationPhase,
    /// Pulse, in beats per minute.
    pub pulse_bpm: u16,
    /// Systolic blood pressure, in mmHg.
    pub systolic_mmhg: u16,
    /// Diastolic blood pressure, in mmHg.
    pub diastolic_mmhg: u16,
    /// Free-form observation by the attending staff member.
    pub note: Option<String>,
    /// When the reading was taken.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

impl VitalSignEntry {
    /// Creates a new vital-sign entry.
    #[must_use]
    pub const fn new(
        phase: DonationPhase,
        pulse_bpm: u16,
        systolic_mmhg: u16,
        diastolic_mmhg: u16,
        note: Option<String>,
        recorded_at: OffsetDateTime,
    ) -> Self {
        Self {
            phase,
            pulse_bpm,
            systolic_mmhg,
            diastolic_mmhg,
            note,
            recorded_at,
        }
    }
}

/// A single collection session by one donor at one facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    /// The canonical numeric identifier assigned by the registry.
    /// `None` indicates the donation has not been registered yet.
    donation_id: Option<i64>,
    /// The donor giving blood.
    pub donor_id: i64,
    /// The facility hosting the collection.
    pub facility_id: i64,
    /// Blood group of the donor at registration time.
    pub blood_group: BloodGroup,
    /// Current lifecycle status.
    pub status: DonationStatus,
    /// Volume the session aims to collect, in milliliters.
    pub target_quantity_ml: u32,
    /// Volume actually collected, in milliliters. Zero until completion.
    pub collected_quantity_ml: u32,
    /// When the donation was registered.
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
    /// When collection began.
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    /// When the donation reached a terminal state.
    #[serde(with = "time::serde::rfc3339::option")]
    pub ended_at: Option<OffsetDateTime>,
    /// When the collected volume was split into components.
    /// `Some` blocks any further split.
    #[serde(with = "time::serde::rfc3339::option")]
    pub split_at: Option<OffsetDateTime>,
    /// Append-only vital-sign log, ordered by recording time.
    pub vital_log: Vec<VitalSignEntry>,
    /// Optimistic concurrency version, bumped on every update.
    pub version: u64,
}

impl Donation {
    /// Creates a new `Donation` in the `Registered` state without an ID.
    #[must_use]
    pub const fn new(
        donor_id: i64,
        facility_id: i64,
        blood_group: BloodGroup,
        target_quantity_ml: u32,
        registered_at: OffsetDateTime,
    ) -> Self {
        Self {
            donation_id: None,
            donor_id,
            facility_id,
            blood_group,
            status: DonationStatus::Registered,
            target_quantity_ml,
            collected_quantity_ml: 0,
            registered_at,
            started_at: None,
            ended_at: None,
            split_at: None,
            vital_log: Vec::new(),
            version: 0,
        }
    }

    /// Re-attaches a registry ID to a donation value.
    #[must_use]
    pub fn with_id(mut self, donation_id: i64) -> Self {
        self.donation_id = Some(donation_id);
        self
    }

    /// Returns the canonical numeric identifier if registered.
    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        self.donation_id
    }

    /// Whether this donation has already been split into components.
    #[must_use]
    pub const fn is_split(&self) -> bool {
        self.split_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_round_trip() {
        let statuses = vec![
            DonationStatus::Registered,
            DonationStatus::InProgress,
            DonationStatus::Completed,
            DonationStatus::AdverseEvent,
            DonationStatus::Cancelled,
        ];

        for status in statuses {
            let s = status.as_str();
            match DonationStatus::parse_str(s) {
                Ok(parsed) => assert_eq!(status, parsed),
                Err(e) => panic!("Failed to parse status string: {s}: {e}"),
            }
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!DonationStatus::Registered.is_terminal());
        assert!(!DonationStatus::InProgress.is_terminal());
        assert!(DonationStatus::Completed.is_terminal());
        assert!(DonationStatus::AdverseEvent.is_terminal());
        assert!(DonationStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_valid_transitions_from_registered() {
        let current = DonationStatus::Registered;

        assert!(
            current
                .validate_transition(DonationStatus::InProgress)
                .is_ok()
        );
        assert!(
            current
                .validate_transition(DonationStatus::Cancelled)
                .is_ok()
        );
        assert!(
            current
                .validate_transition(DonationStatus::Completed)
                .is_err()
        );
        assert!(
            current
                .validate_transition(DonationStatus::AdverseEvent)
                .is_err()
        );
    }

    #[test]
    fn test_valid_transitions_from_in_progress() {
        let current = DonationStatus::InProgress;

        assert!(
            current
                .validate_transition(DonationStatus::Completed)
                .is_ok()
        );
        assert!(
            current
                .validate_transition(DonationStatus::AdverseEvent)
                .is_ok()
        );
        assert!(
            current
                .validate_transition(DonationStatus::Cancelled)
                .is_ok()
        );
        assert!(
            current
                .validate_transition(DonationStatus::Registered)
                .is_err()
        );
    }

    #[test]
    fn test_no_transitions_from_terminal_states() {
        let terminal_states = vec![
            DonationStatus::Completed,
            DonationStatus::AdverseEvent,
            DonationStatus::Cancelled,
        ];

        for terminal in terminal_states {
            assert!(
                terminal
                    .validate_transition(DonationStatus::InProgress)
                    .is_err()
            );
            assert!(
                terminal
                    .validate_transition(DonationStatus::Registered)
                    .is_err()
            );
        }
    }

    #[test]
    fn test_phase_string_round_trip() {
        let phases = vec![
            DonationPhase::Donation,
            DonationPhase::Resting,
            DonationPhase::PostRestCheck,
        ];

        for phase in phases {
            let s = phase.as_str();
            match DonationPhase::parse_str(s) {
                Ok(parsed) => assert_eq!(phase, parsed),
                Err(e) => panic!("Failed to parse phase string: {s}: {e}"),
            }
        }
    }

    #[test]
    fn test_new_donation_starts_registered() {
        let donation = Donation::new(
            1,
            2,
            BloodGroup::APositive,
            450,
            OffsetDateTime::UNIX_EPOCH,
        );
        assert_eq!(donation.status, DonationStatus::Registered);
        assert_eq!(donation.collected_quantity_ml, 0);
        assert!(donation.vital_log.is_empty());
        assert!(!donation.is_split());
        assert!(donation.id().is_none());
    }
}
