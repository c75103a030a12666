// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Evaluates blood requests against available stock.
//!
//! A request is matched in full or not at all; partial fulfillment does not
//! exist. Evaluation produces one of three decisions:
//!
//! * `Approved` — the ledger reserved a covering set of units and the request
//!   moves to `approved`, carrying the reservation id.
//! * `Rejected` — a terminal defect in the request itself (for now, an
//!   unresolved component at evaluation time). Staff rejections with other
//!   reasons run through [`reject`].
//! * `NeedsSupport` — the request is well-formed but stock cannot cover it.
//!   The request parks in `need_support`, available stock stays untouched,
//!   and an emergency campaign may be opened for the shortfall.
//!
//! `InsufficientStock` from the ledger is a decision input here, never an
//! error the caller sees.

use crate::error::CoreError;
use crate::ledger::{InventoryLedger, StockReservation};
use hemolink_domain::{BloodComponent, BloodRequest, RejectReason, RequestStatus};
use time::OffsetDateTime;
use tracing::info;

/// The matcher's verdict on one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Stock reserved; the request is approved.
    Approved {
        /// The reservation backing the approval.
        reservation: StockReservation,
    },
    /// The request is terminally rejected.
    Rejected {
        /// Why it was rejected.
        reason: RejectReason,
    },
    /// Stock cannot cover the request; escalation may follow.
    NeedsSupport {
        /// How much volume is missing, in milliliters.
        shortfall_ml: u32,
    },
}

/// The outcome of an evaluation: the decision and the request as it should
/// be persisted afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// The matcher's verdict.
    pub decision: Decision,
    /// The request with its post-decision status.
    pub request: BloodRequest,
}

/// Evaluates a request against the ledger.
///
/// Only `pending_approval` and `need_support` requests can be evaluated;
/// `need_support` re-evaluation is how a request recovers once a campaign
/// restocks the shelf. A request whose component is still unresolved is
/// rejected outright without touching the ledger.
///
/// # Errors
///
/// Returns `CoreError::StateConflict` if the request is not awaiting a
/// decision. Ledger contention and shortfalls are folded into the decision
/// and are not errors.
pub fn evaluate(
    request: &BloodRequest,
    ledger: &InventoryLedger,
    now: OffsetDateTime,
) -> Result<Evaluation, CoreError> {
    check_awaiting_decision(request)?;

    let Some(component) = request.component else {
        // Approval is impossible while the component is unresolved. The
        // request keeps its current status so staff can resolve and retry;
        // only the decision reports the rejection.
        info!(
            request_id = request.id(),
            "Refused to match request with unresolved component"
        );
        return Ok(Evaluation {
            decision: Decision::Rejected {
                reason: RejectReason::UnresolvedComponent,
            },
            request: request.clone(),
        });
    };

    match ledger.reserve(
        request.facility_id,
        request.blood_group,
        component,
        request.quantity_ml,
        now,
    ) {
        Ok(reservation) => {
            let mut approved: BloodRequest = request.clone();
            approved.status.validate_transition(RequestStatus::Approved)?;
            approved.status = RequestStatus::Approved;
            approved.reservation_id = Some(reservation.reservation_id);
            info!(
                request_id = request.id(),
                reservation_id = reservation.reservation_id,
                quantity_ml = request.quantity_ml,
                "Approved request"
            );
            Ok(Evaluation {
                decision: Decision::Approved { reservation },
                request: approved,
            })
        }
        Err(CoreError::InsufficientStock { available_ml, .. }) => {
            let mut parked: BloodRequest = request.clone();
            if parked.status != RequestStatus::NeedSupport {
                parked
                    .status
                    .validate_transition(RequestStatus::NeedSupport)?;
                parked.status = RequestStatus::NeedSupport;
            }
            let shortfall_ml: u32 = request.quantity_ml.saturating_sub(available_ml);
            info!(
                request_id = request.id(),
                requested_ml = request.quantity_ml,
                available_ml,
                shortfall_ml,
                "Request needs support"
            );
            Ok(Evaluation {
                decision: Decision::NeedsSupport { shortfall_ml },
                request: parked,
            })
        }
        Err(other) => Err(other),
    }
}

/// Terminally rejects a request on staff authority.
///
/// Only requests that are awaiting a decision can be rejected here: once a
/// reservation is held, the delivery must be cancelled first so the stock is
/// released.
///
/// # Errors
///
/// Returns `CoreError::StateConflict` if the request holds a reservation or
/// is not awaiting a decision.
pub fn reject(request: &BloodRequest, reason: RejectReason) -> Result<BloodRequest, CoreError> {
    check_awaiting_decision(request)?;
    if request.reservation_id.is_some() {
        return Err(CoreError::StateConflict {
            entity: "blood request",
            id: request.id().unwrap_or_default(),
            reason: String::from("request holds a reservation; cancel the delivery first"),
        });
    }

    let mut rejected: BloodRequest = request.clone();
    rejected.status.validate_transition(RequestStatus::Rejected)?;
    rejected.status = RequestStatus::Rejected;
    rejected.reject_reason = Some(reason);
    info!(request_id = request.id(), reason = %reason, "Rejected request");
    Ok(rejected)
}

/// Resolves the component of a request whose component field is still open.
///
/// # Errors
///
/// Returns `CoreError::StateConflict` if the request is not awaiting a
/// decision or the component was already resolved.
pub fn resolve_component(
    request: &BloodRequest,
    component: BloodComponent,
) -> Result<BloodRequest, CoreError> {
    check_awaiting_decision(request)?;
    if request.component.is_some() {
        return Err(CoreError::StateConflict {
            entity: "blood request",
            id: request.id().unwrap_or_default(),
            reason: String::from("component has already been resolved"),
        });
    }

    let mut resolved: BloodRequest = request.clone();
    resolved.component = Some(component);
    Ok(resolved)
}

/// Only `pending_approval` and `need_support` requests await a decision.
fn check_awaiting_decision(request: &BloodRequest) -> Result<(), CoreError> {
    if matches!(
        request.status,
        RequestStatus::PendingApproval | RequestStatus::NeedSupport
    ) {
        return Ok(());
    }
    Err(CoreError::StateConflict {
        entity: "blood request",
        id: request.id().unwrap_or_default(),
        reason: format!("request is not awaiting a decision (status is '{}')", request.status),
    })
}
