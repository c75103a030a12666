// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hemolink_domain::{BloodComponent, BloodGroup, DomainError};

/// Errors that can occur during state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The ledger could not cover a reservation from available stock.
    ///
    /// This is a normal planning outcome, not a fault: the request matcher
    /// turns it into a `NeedsSupport` decision.
    InsufficientStock {
        /// The facility whose stock was queried.
        facility_id: i64,
        /// The requested blood group.
        blood_group: BloodGroup,
        /// The requested component.
        component: BloodComponent,
        /// The volume that was requested, in milliliters.
        requested_ml: u32,
        /// The volume actually available, in milliliters.
        available_ml: u32,
    },
    /// The donation has already been split into components.
    AlreadySplit {
        /// The donation identifier.
        donation_id: i64,
    },
    /// The delivery already carries a proof of delivery.
    AlreadyConfirmed {
        /// The delivery identifier.
        delivery_id: i64,
    },
    /// A referenced entity does not exist.
    NotFound {
        /// The entity kind.
        entity: &'static str,
        /// The identifier that failed to resolve.
        id: i64,
    },
    /// The entity is past its deadline or shelf life.
    Expired {
        /// The entity kind.
        entity: &'static str,
        /// The identifier of the expired entity.
        id: i64,
    },
    /// The operation is not valid for the entity's current state.
    StateConflict {
        /// The entity kind.
        entity: &'static str,
        /// The identifier of the conflicting entity.
        id: i64,
        /// Why the operation was refused.
        reason: String,
    },
    /// An internal invariant failed (lock poisoning and the like).
    Internal(String),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::InsufficientStock {
                facility_id,
                blood_group,
                component,
                requested_ml,
                available_ml,
            } => {
                write!(
                    f,
                    "Insufficient stock at facility {facility_id} for {blood_group} {component}: requested {requested_ml} ml, available {available_ml} ml"
                )
            }
            Self::AlreadySplit { donation_id } => {
                write!(f, "Donation {donation_id} has already been split")
            }
            Self::AlreadyConfirmed { delivery_id } => {
                write!(f, "Delivery {delivery_id} has already been confirmed")
            }
            Self::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            Self::Expired { entity, id } => write!(f, "{entity} {id} has expired"),
            Self::StateConflict { entity, id, reason } => {
                write!(f, "State conflict on {entity} {id}: {reason}")
            }
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
