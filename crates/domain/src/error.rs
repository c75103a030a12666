// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Name is empty or invalid.
    InvalidName(String),
    /// Quantity is zero or otherwise malformed.
    InvalidQuantity(String),
    /// Collected volume is below the facility completion threshold.
    BelowMinimumCollection {
        /// The volume actually collected, in milliliters.
        collected_ml: u32,
        /// The facility-configured minimum, in milliliters.
        minimum_ml: u32,
    },
    /// Split allocations request more volume than was collected.
    OverAllocation {
        /// The volume collected by the donation, in milliliters.
        collected_ml: u32,
        /// The total volume requested across allocations, in milliliters.
        allocated_ml: u64,
    },
    /// Split was requested with no allocations.
    EmptyAllocation,
    /// Blood group string is not a recognized ABO/Rh group.
    InvalidBloodGroup {
        /// The unrecognized group string.
        group: String,
    },
    /// Blood component string is not a recognized component.
    InvalidBloodComponent {
        /// The unrecognized component string.
        component: String,
    },
    /// Donation status string is invalid.
    InvalidDonationStatus {
        /// The invalid status string.
        status: String,
    },
    /// Donation phase string is invalid.
    InvalidDonationPhase {
        /// The invalid phase string.
        phase: String,
    },
    /// Blood unit status string is invalid.
    InvalidUnitStatus {
        /// The invalid status string.
        status: String,
    },
    /// Blood request status string is invalid.
    InvalidRequestStatus {
        /// The invalid status string.
        status: String,
    },
    /// Campaign status string is invalid.
    InvalidCampaignStatus {
        /// The invalid status string.
        status: String,
    },
    /// Pledge status string is invalid.
    InvalidPledgeStatus {
        /// The invalid status string.
        status: String,
    },
    /// Delivery status string is invalid.
    InvalidDeliveryStatus {
        /// The invalid status string.
        status: String,
    },
    /// Rejection reason string is invalid.
    InvalidRejectReason {
        /// The invalid reason string.
        reason: String,
    },
    /// Delivery failure reason string is invalid.
    InvalidFailureReason {
        /// The invalid reason string.
        reason: String,
    },
    /// A status transition is not permitted by the lifecycle rules.
    InvalidStatusTransition {
        /// The entity kind whose lifecycle was violated.
        entity: &'static str,
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
        /// Why the transition is not allowed.
        reason: String,
    },
    /// Campaign deadline is not in the future.
    InvalidDeadline {
        /// The rejected deadline.
        deadline: time::OffsetDateTime,
    },
    /// Latitude or longitude is outside the valid range.
    InvalidCoordinates {
        /// Description of the out-of-range value.
        reason: String,
    },
    /// Donor is not currently eligible to donate.
    IneligibleDonor {
        /// The donor identifier.
        donor_id: i64,
    },
    /// Donor record has been archived.
    DonorArchived {
        /// The donor identifier.
        donor_id: i64,
    },
    /// Vital signs can only be appended while a donation is in progress.
    VitalLogClosed {
        /// The donation status that refused the append.
        status: String,
    },
    /// A vital-sign entry is older than the last one in the log.
    /// The log is append-only and ordered; it is never re-sorted.
    VitalLogOutOfOrder {
        /// Recording time of the newest entry already in the log.
        last_recorded_at: time::OffsetDateTime,
        /// Recording time of the rejected entry.
        attempted: time::OffsetDateTime,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidQuantity(msg) => write!(f, "Invalid quantity: {msg}"),
            Self::BelowMinimumCollection {
                collected_ml,
                minimum_ml,
            } => {
                write!(
                    f,
                    "Collected volume {collected_ml} ml is below the facility minimum of {minimum_ml} ml"
                )
            }
            Self::OverAllocation {
                collected_ml,
                allocated_ml,
            } => {
                write!(
                    f,
                    "Split allocations total {allocated_ml} ml but only {collected_ml} ml was collected"
                )
            }
            Self::EmptyAllocation => {
                write!(f, "Split requires at least one component allocation")
            }
            Self::InvalidBloodGroup { group } => {
                write!(f, "Invalid blood group: '{group}'")
            }
            Self::InvalidBloodComponent { component } => {
                write!(f, "Invalid blood component: '{component}'")
            }
            Self::InvalidDonationStatus { status } => {
                write!(f, "Invalid donation status: '{status}'")
            }
            Self::InvalidDonationPhase { phase } => {
                write!(f, "Invalid donation phase: '{phase}'")
            }
            Self::InvalidUnitStatus { status } => {
                write!(f, "Invalid blood unit status: '{status}'")
            }
            Self::InvalidRequestStatus { status } => {
                write!(f, "Invalid blood request status: '{status}'")
            }
            Self::InvalidCampaignStatus { status } => {
                write!(f, "Invalid campaign status: '{status}'")
            }
            Self::InvalidPledgeStatus { status } => {
                write!(f, "Invalid pledge status: '{status}'")
            }
            Self::InvalidDeliveryStatus { status } => {
                write!(f, "Invalid delivery status: '{status}'")
            }
            Self::InvalidRejectReason { reason } => {
                write!(f, "Invalid rejection reason: '{reason}'")
            }
            Self::InvalidFailureReason { reason } => {
                write!(f, "Invalid delivery failure reason: '{reason}'")
            }
            Self::InvalidStatusTransition {
                entity,
                from,
                to,
                reason,
            } => {
                write!(
                    f,
                    "Invalid {entity} status transition from '{from}' to '{to}': {reason}"
                )
            }
            Self::InvalidDeadline { deadline } => {
                write!(f, "Deadline {deadline} must be in the future")
            }
            Self::InvalidCoordinates { reason } => {
                write!(f, "Invalid coordinates: {reason}")
            }
            Self::IneligibleDonor { donor_id } => {
                write!(f, "Donor {donor_id} is not eligible to donate")
            }
            Self::DonorArchived { donor_id } => {
                write!(f, "Donor {donor_id} has been archived")
            }
            Self::VitalLogClosed { status } => {
                write!(
                    f,
                    "Vital signs can only be recorded while a donation is in progress (status is '{status}')"
                )
            }
            Self::VitalLogOutOfOrder {
                last_recorded_at,
                attempted,
            } => {
                write!(
                    f,
                    "Vital-sign entry recorded at {attempted} predates the last log entry at {last_recorded_at}"
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}
