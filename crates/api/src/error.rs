// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use crate::token::TokenError;
use hemolink::CoreError;
use hemolink_domain::DomainError;
use hemolink_store::StoreError;

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The operation is not valid for the entity's current state, or the
    /// caller acted on a stale copy of the record.
    Conflict {
        /// A human-readable description of the conflict.
        message: String,
    },
    /// Available stock cannot cover the requested volume.
    InsufficientStock {
        /// A human-readable description of the shortfall.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Conflict { message } => {
                write!(f, "Conflict: {message}")
            }
            Self::InsufficientStock { message } => {
                write!(f, "Insufficient stock: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        Self::InvalidInput {
            field: String::from("token"),
            message: err.to_string(),
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidName(msg) => ApiError::InvalidInput {
            field: String::from("name"),
            message: msg,
        },
        DomainError::InvalidQuantity(msg) => ApiError::InvalidInput {
            field: String::from("quantity_ml"),
            message: msg,
        },
        DomainError::BelowMinimumCollection {
            collected_ml,
            minimum_ml,
        } => ApiError::DomainRuleViolation {
            rule: String::from("minimum_collection"),
            message: format!(
                "Collected volume {collected_ml} ml is below the facility minimum of {minimum_ml} ml"
            ),
        },
        DomainError::OverAllocation {
            collected_ml,
            allocated_ml,
        } => ApiError::DomainRuleViolation {
            rule: String::from("split_within_collection"),
            message: format!(
                "Split allocations total {allocated_ml} ml but only {collected_ml} ml was collected"
            ),
        },
        DomainError::EmptyAllocation => ApiError::InvalidInput {
            field: String::from("allocations"),
            message: String::from("At least one component allocation is required"),
        },
        DomainError::InvalidBloodGroup { group } => ApiError::InvalidInput {
            field: String::from("blood_group"),
            message: format!("'{group}' is not a recognized blood group"),
        },
        DomainError::InvalidBloodComponent { component } => ApiError::InvalidInput {
            field: String::from("component"),
            message: format!("'{component}' is not a recognized blood component"),
        },
        DomainError::InvalidDonationStatus { status } => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("'{status}' is not a donation status"),
        },
        DomainError::InvalidDonationPhase { phase } => ApiError::InvalidInput {
            field: String::from("phase"),
            message: format!("'{phase}' is not a donation phase"),
        },
        DomainError::InvalidUnitStatus { status } => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("'{status}' is not a blood unit status"),
        },
        DomainError::InvalidRequestStatus { status } => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("'{status}' is not a blood request status"),
        },
        DomainError::InvalidCampaignStatus { status } => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("'{status}' is not a campaign status"),
        },
        DomainError::InvalidPledgeStatus { status } => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("'{status}' is not a pledge status"),
        },
        DomainError::InvalidDeliveryStatus { status } => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("'{status}' is not a delivery status"),
        },
        DomainError::InvalidRejectReason { reason } => ApiError::InvalidInput {
            field: String::from("reason"),
            message: format!("'{reason}' is not a rejection reason"),
        },
        DomainError::InvalidFailureReason { reason } => ApiError::InvalidInput {
            field: String::from("reason"),
            message: format!("'{reason}' is not a delivery failure reason"),
        },
        DomainError::InvalidStatusTransition {
            entity,
            from,
            to,
            reason,
        } => ApiError::DomainRuleViolation {
            rule: String::from("lifecycle"),
            message: format!(
                "Invalid {entity} status transition from '{from}' to '{to}': {reason}"
            ),
        },
        DomainError::InvalidDeadline { deadline } => ApiError::InvalidInput {
            field: String::from("deadline"),
            message: format!("Deadline {deadline} must be in the future"),
        },
        DomainError::InvalidCoordinates { reason } => ApiError::InvalidInput {
            field: String::from("location"),
            message: reason,
        },
        DomainError::IneligibleDonor { donor_id } => ApiError::DomainRuleViolation {
            rule: String::from("donor_eligibility"),
            message: format!("Donor {donor_id} is not eligible to donate"),
        },
        DomainError::DonorArchived { donor_id } => ApiError::DomainRuleViolation {
            rule: String::from("donor_archived"),
            message: format!("Donor {donor_id} has been archived"),
        },
        DomainError::VitalLogClosed { status } => ApiError::DomainRuleViolation {
            rule: String::from("vital_log_open"),
            message: format!(
                "Vital signs can only be recorded while a donation is in progress (status is '{status}')"
            ),
        },
        DomainError::VitalLogOutOfOrder {
            last_recorded_at,
            attempted,
        } => ApiError::DomainRuleViolation {
            rule: String::from("vital_log_order"),
            message: format!(
                "Vital-sign entry recorded at {attempted} predates the last log entry at {last_recorded_at}"
            ),
        },
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::InsufficientStock {
            facility_id,
            blood_group,
            component,
            requested_ml,
            available_ml,
        } => ApiError::InsufficientStock {
            message: format!(
                "Facility {facility_id} has {available_ml} ml of {blood_group} {component} available; {requested_ml} ml requested"
            ),
        },
        CoreError::AlreadySplit { donation_id } => ApiError::Conflict {
            message: format!("Donation {donation_id} has already been split"),
        },
        CoreError::AlreadyConfirmed { delivery_id } => ApiError::Conflict {
            message: format!("Delivery {delivery_id} has already been confirmed"),
        },
        CoreError::NotFound { entity, id } => ApiError::ResourceNotFound {
            resource_type: String::from(entity),
            message: format!("{entity} {id} does not exist"),
        },
        CoreError::Expired { entity, id } => ApiError::Conflict {
            message: format!("{entity} {id} has expired"),
        },
        CoreError::StateConflict { entity, id, reason } => ApiError::Conflict {
            message: format!("{entity} {id}: {reason}"),
        },
        CoreError::Internal(msg) => ApiError::Internal { message: msg },
    }
}

/// Translates a store error into an API error.
///
/// Version conflicts surface as API conflicts so a caller holding a stale
/// record re-reads instead of retrying blindly.
#[must_use]
pub fn translate_store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound { entity, id } => ApiError::ResourceNotFound {
            resource_type: String::from(entity),
            message: format!("{entity} {id} does not exist"),
        },
        StoreError::VersionConflict {
            entity,
            id,
            expected,
            actual,
        } => ApiError::Conflict {
            message: format!(
                "Stale write to {entity} {id}: expected version {expected}, stored version is {actual}"
            ),
        },
        StoreError::MissingId { entity } => ApiError::Internal {
            message: format!("{entity} record has no registry id"),
        },
    }
}
