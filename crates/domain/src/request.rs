// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Blood request states and the request record itself.
//!
//! A request either reaches `delivered`, is terminally `rejected`, or waits in
//! `need_support` while an emergency campaign gathers pledges. Requests whose
//! delivery fails or is cancelled return to `pending_approval` for a fresh
//! evaluation; the original reservation is released first.

use crate::blood::{BloodComponent, BloodGroup};
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Blood request lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting evaluation by the matcher.
    PendingApproval,
    /// Stock reserved; delivery record created.
    Approved,
    /// A transporter has been assigned to the delivery.
    Assigned,
    /// The delivery is on the road.
    InTransit,
    /// The delivery was confirmed at the destination.
    Delivered,
    /// Terminally refused.
    Rejected,
    /// Insufficient stock; an emergency campaign may be opened.
    NeedSupport,
}

impl RequestStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Assigned => "assigned",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Rejected => "rejected",
            Self::NeedSupport => "need_support",
        }
    }

    /// Parses a status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRequestStatus` if the string is not a
    /// valid status.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending_approval" => Ok(Self::PendingApproval),
            "approved" => Ok(Self::Approved),
            "assigned" => Ok(Self::Assigned),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            "rejected" => Ok(Self::Rejected),
            "need_support" => Ok(Self::NeedSupport),
            _ => Err(DomainError::InvalidRequestStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Returns true if this status is terminal (cannot transition to another state).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Rejected)
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                entity: "blood request",
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "cannot transition from terminal state".to_string(),
            });
        }

        let valid = match self {
            Self::PendingApproval => {
                matches!(
                    new_status,
                    Self::Approved | Self::Rejected | Self::NeedSupport
                )
            }
            // Re-evaluation after a campaign restocks, or a staff rejection.
            Self::NeedSupport => matches!(new_status, Self::Approved | Self::Rejected),
            // Back to pending_approval when the delivery is cancelled.
            Self::Approved => {
                matches!(
                    new_status,
                    Self::Assigned | Self::PendingApproval | Self::Rejected
                )
            }
            Self::Assigned => {
                matches!(
                    new_status,
                    Self::InTransit | Self::PendingApproval | Self::Rejected
                )
            }
            // Back to pending_approval when the delivery fails or is cancelled.
            Self::InTransit => matches!(new_status, Self::Delivered | Self::PendingApproval),
            Self::Delivered | Self::Rejected => false,
        };

        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                entity: "blood request",
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by request lifecycle rules".to_string(),
            })
        }
    }
}

impl FromStr for RequestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a request was (or would be) rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The requested component has not been resolved by staff.
    UnresolvedComponent,
    /// The destination facility is not registered.
    UnknownFacility,
    /// The request duplicates one already in flight.
    DuplicateRequest,
    /// The requester withdrew the request.
    WithdrawnByRequester,
}

impl RejectReason {
    /// Returns the string representation of the reason.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnresolvedComponent => "unresolved_component",
            Self::UnknownFacility => "unknown_facility",
            Self::DuplicateRequest => "duplicate_request",
            Self::WithdrawnByRequester => "withdrawn_by_requester",
        }
    }

    /// Parses a reason from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRejectReason` if the string is not a
    /// valid reason.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "unresolved_component" => Ok(Self::UnresolvedComponent),
            "unknown_facility" => Ok(Self::UnknownFacility),
            "duplicate_request" => Ok(Self::DuplicateRequest),
            "withdrawn_by_requester" => Ok(Self::WithdrawnByRequester),
            _ => Err(DomainError::InvalidRejectReason {
                reason: s.to_string(),
            }),
        }
    }
}

impl FromStr for RejectReason {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recipient facility's request for blood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodRequest {
    /// The canonical numeric identifier assigned by the registry.
    /// `None` indicates the request has not been submitted yet.
    request_id: Option<i64>,
    /// The requesting party (clinician or coordinator).
    pub requester_id: i64,
    /// The facility that must fulfill the request.
    pub facility_id: i64,
    /// Required blood group.
    pub blood_group: BloodGroup,
    /// Required component. `None` until staff resolve it; approval is
    /// impossible while unresolved.
    pub component: Option<BloodComponent>,
    /// Required volume, in milliliters.
    pub quantity_ml: u32,
    /// Whether the request is flagged urgent.
    pub is_urgent: bool,
    /// Current lifecycle status.
    pub status: RequestStatus,
    /// The ledger reservation backing an approval, while one is held.
    pub reservation_id: Option<i64>,
    /// Why the request was rejected, once it is.
    pub reject_reason: Option<RejectReason>,
    /// When the request was submitted.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Optimistic concurrency version, bumped on every update.
    pub version: u64,
}

impl BloodRequest {
    /// Creates a new `BloodRequest` in `pending_approval` without an ID.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        requester_id: i64,
        facility_id: i64,
        blood_group: BloodGroup,
        component: Option<BloodComponent>,
        quantity_ml: u32,
        is_urgent: bool,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            request_id: None,
            requester_id,
            facility_id,
            blood_group,
            component,
            quantity_ml,
            is_urgent,
            status: RequestStatus::PendingApproval,
            reservation_id: None,
            reject_reason: None,
            created_at,
            version: 0,
        }
    }

    /// Re-attaches a registry ID to a request value.
    #[must_use]
    pub fn with_id(mut self, request_id: i64) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Returns the canonical numeric identifier if registered.
    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        self.request_id
    }
}
