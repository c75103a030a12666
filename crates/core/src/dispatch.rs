// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Delivery dispatch: from reservation to proof of delivery.
//!
//! A delivery is created `pending` the moment its request is approved,
//! carrying a manifest drawn from the reservation. Confirmation is
//! first-wins: exactly one proof of delivery is ever recorded, whether it
//! arrives by QR scan or manual form, and every later attempt fails with
//! `AlreadyConfirmed`. A failed delivery restocks its reservation minus any
//! units already consumed, and the request returns to `pending_approval` for
//! a fresh evaluation.
//!
//! Location updates are a stream, not a log: reports may arrive out of
//! order, and only the most recent by source timestamp is kept.

use crate::error::CoreError;
use crate::ledger::StockReservation;
use hemolink_domain::{
    BloodRequest, ConfirmationMethod, Delivery, DeliveryConfirmation, DeliveryStatus,
    FailureReason, GeoPoint, RequestStatus, validate_coordinates, validate_name,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info};

/// The identifiers embedded in a QR confirmation token.
///
/// The token itself is opaque to the recipient; confirmation validates these
/// fields against the delivery record, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// The delivery being confirmed.
    pub delivery_id: i64,
    /// The request the delivery fulfills.
    pub request_id: i64,
    /// The destination facility.
    pub facility_id: i64,
    /// The recipient the token was issued to.
    pub recipient_id: i64,
    /// Random value making each issued token distinct.
    pub nonce: u64,
}

/// Proof of delivery presented at confirmation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationProof {
    /// A decoded QR token.
    QrToken(TokenPayload),
    /// The manual fallback form, for when scanning is impossible.
    ManualForm {
        /// The recipient confirming the delivery.
        recipient_id: i64,
        /// Name of the person who signed for the shipment.
        recipient_name: String,
        /// Their role at the destination.
        recipient_role: String,
    },
}

/// What became of one location report.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationOutcome {
    /// The report advanced the delivery's last known position.
    Applied(Delivery),
    /// The report was older than the last known position, or the delivery
    /// already ended. Ignored without error: out-of-order arrival is normal.
    Stale,
}

/// Creates a `pending` delivery for a freshly approved request.
///
/// The manifest is the reservation's unit list. At most one non-terminal
/// delivery may exist per request; the caller passes the most recent one, if
/// any, for the conflict check.
///
/// # Errors
///
/// Returns `CoreError::StateConflict` if the request is not approved, the
/// reservation does not back it, or another delivery is still active.
pub fn create(
    request: &BloodRequest,
    reservation: &StockReservation,
    existing: Option<&Delivery>,
    now: OffsetDateTime,
) -> Result<Delivery, CoreError> {
    let request_id: i64 = request
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("request has no registry id")))?;

    if request.status != RequestStatus::Approved {
        return Err(CoreError::StateConflict {
            entity: "blood request",
            id: request_id,
            reason: format!(
                "deliveries are created for approved requests (status is '{}')",
                request.status
            ),
        });
    }
    if request.reservation_id != Some(reservation.reservation_id) {
        return Err(CoreError::StateConflict {
            entity: "blood request",
            id: request_id,
            reason: String::from("reservation does not back this request"),
        });
    }

    match existing {
        Some(delivery) if !delivery.status.is_terminal() => {
            return Err(CoreError::StateConflict {
                entity: "delivery",
                id: delivery.id().unwrap_or_default(),
                reason: String::from("a delivery is already active for this request"),
            });
        }
        _ => {}
    }

    let delivery: Delivery = Delivery::new(
        request_id,
        request.facility_id,
        reservation.reservation_id,
        reservation.lines.clone(),
        now,
    );
    info!(
        request_id,
        reservation_id = reservation.reservation_id,
        manifest_ml = delivery.manifest_quantity_ml(),
        "Created delivery"
    );
    Ok(delivery)
}

/// Assigns (or reassigns) a transporter to a pending delivery.
///
/// The request moves to `assigned` on the first assignment and stays there
/// if the transporter is swapped before departure.
///
/// # Errors
///
/// Returns `CoreError::StateConflict` if the delivery is not pending.
pub fn assign_transporter(
    delivery: &Delivery,
    request: &BloodRequest,
    transporter_id: i64,
) -> Result<(Delivery, BloodRequest), CoreError> {
    let delivery_id: i64 = delivery
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("delivery has no registry id")))?;

    if delivery.status != DeliveryStatus::Pending {
        return Err(CoreError::StateConflict {
            entity: "delivery",
            id: delivery_id,
            reason: format!(
                "transporters are assigned while pending (status is '{}')",
                delivery.status
            ),
        });
    }

    let mut assigned: Delivery = delivery.clone();
    assigned.transporter_id = Some(transporter_id);

    let mut updated_request: BloodRequest = request.clone();
    if updated_request.status == RequestStatus::Approved {
        updated_request
            .status
            .validate_transition(RequestStatus::Assigned)?;
        updated_request.status = RequestStatus::Assigned;
    }

    info!(delivery_id, transporter_id, "Assigned transporter");
    Ok((assigned, updated_request))
}

/// Puts an assigned delivery on the road and opens its location stream.
///
/// # Errors
///
/// Returns `CoreError::StateConflict` if no transporter is assigned, or a
/// wrapped `DomainError` if the delivery is not pending.
pub fn start(
    delivery: &Delivery,
    request: &BloodRequest,
    now: OffsetDateTime,
) -> Result<(Delivery, BloodRequest), CoreError> {
    let delivery_id: i64 = delivery
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("delivery has no registry id")))?;

    if delivery.transporter_id.is_none() {
        return Err(CoreError::StateConflict {
            entity: "delivery",
            id: delivery_id,
            reason: String::from("a transporter must be assigned before departure"),
        });
    }
    delivery
        .status
        .validate_transition(DeliveryStatus::InTransit)?;

    let mut started: Delivery = delivery.clone();
    started.status = DeliveryStatus::InTransit;
    started.started_at = Some(now);

    let mut updated_request: BloodRequest = request.clone();
    updated_request
        .status
        .validate_transition(RequestStatus::InTransit)?;
    updated_request.status = RequestStatus::InTransit;

    info!(delivery_id, "Delivery in transit");
    Ok((started, updated_request))
}

/// Applies one location report to an in-transit delivery.
///
/// Keep-latest semantics: a report older than (or as old as) the last known
/// position is `Stale`, as is any report for a delivery that already ended.
/// Reports for a delivery that has not departed are an error; the stream
/// only exists in transit.
///
/// # Errors
///
/// Returns `CoreError::StateConflict` for a pending delivery, or a wrapped
/// `DomainError::InvalidCoordinates` for out-of-range values.
pub fn record_location(
    delivery: &Delivery,
    latitude: f64,
    longitude: f64,
    recorded_at: OffsetDateTime,
) -> Result<LocationOutcome, CoreError> {
    validate_coordinates(latitude, longitude)?;

    let delivery_id: i64 = delivery
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("delivery has no registry id")))?;

    match delivery.status {
        DeliveryStatus::InTransit => {}
        DeliveryStatus::Pending => {
            return Err(CoreError::StateConflict {
                entity: "delivery",
                id: delivery_id,
                reason: String::from("location stream opens when the delivery departs"),
            });
        }
        // A report racing the terminal transition is dropped, not an error.
        _ => return Ok(LocationOutcome::Stale),
    }

    let stale: bool = delivery
        .last_location
        .as_ref()
        .is_some_and(|last| recorded_at <= last.recorded_at);
    if stale {
        debug!(delivery_id, %recorded_at, "Dropped stale location report");
        return Ok(LocationOutcome::Stale);
    }

    let mut updated: Delivery = delivery.clone();
    updated.last_location = Some(GeoPoint::new(latitude, longitude, recorded_at));
    debug!(delivery_id, latitude, longitude, "Recorded location");
    Ok(LocationOutcome::Applied(updated))
}

/// Confirms a delivery at the destination. First confirmation wins.
///
/// A QR proof must match the delivery's own identifiers; a manual form must
/// carry a usable name and role. On success the delivery is `delivered` and
/// the request follows; the caller then commits the ledger reservation.
///
/// # Errors
///
/// Returns `CoreError::AlreadyConfirmed` on any second attempt,
/// `CoreError::StateConflict` for a mismatched token, or a wrapped
/// `DomainError` if the delivery is not in transit.
pub fn confirm(
    delivery: &Delivery,
    request: &BloodRequest,
    proof: &ConfirmationProof,
    now: OffsetDateTime,
) -> Result<(Delivery, BloodRequest), CoreError> {
    let delivery_id: i64 = delivery
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("delivery has no registry id")))?;

    if delivery.confirmation.is_some() || delivery.status == DeliveryStatus::Delivered {
        return Err(CoreError::AlreadyConfirmed { delivery_id });
    }
    delivery
        .status
        .validate_transition(DeliveryStatus::Delivered)?;

    let confirmation: DeliveryConfirmation = match proof {
        ConfirmationProof::QrToken(payload) => {
            let matches: bool = payload.delivery_id == delivery_id
                && payload.request_id == delivery.request_id
                && payload.facility_id == delivery.facility_id;
            if !matches {
                return Err(CoreError::StateConflict {
                    entity: "delivery",
                    id: delivery_id,
                    reason: String::from("confirmation token does not match the delivery record"),
                });
            }
            DeliveryConfirmation::new(payload.recipient_id, ConfirmationMethod::QrScan, now)
        }
        ConfirmationProof::ManualForm {
            recipient_id,
            recipient_name,
            recipient_role,
        } => {
            validate_name(recipient_name)?;
            validate_name(recipient_role)?;
            DeliveryConfirmation::new(
                *recipient_id,
                ConfirmationMethod::ManualForm {
                    recipient_name: recipient_name.clone(),
                    recipient_role: recipient_role.clone(),
                },
                now,
            )
        }
    };

    let mut confirmed: Delivery = delivery.clone();
    confirmed.status = DeliveryStatus::Delivered;
    confirmed.confirmation = Some(confirmation);
    confirmed.ended_at = Some(now);

    let mut updated_request: BloodRequest = request.clone();
    updated_request
        .status
        .validate_transition(RequestStatus::Delivered)?;
    updated_request.status = RequestStatus::Delivered;
    updated_request.reservation_id = None;

    info!(delivery_id, request_id = delivery.request_id, "Delivery confirmed");
    Ok((confirmed, updated_request))
}

/// Fails an in-transit delivery with a structured reason.
///
/// The request returns to `pending_approval` for a fresh evaluation. The
/// caller must settle the ledger reservation with `release_except` before
/// persisting either record, so restocked volume is visible to the next
/// evaluation.
///
/// # Errors
///
/// Returns `CoreError::AlreadyConfirmed` if the delivery was confirmed, or a
/// wrapped `DomainError` if it is not in transit.
pub fn fail(
    delivery: &Delivery,
    request: &BloodRequest,
    reason: FailureReason,
    now: OffsetDateTime,
) -> Result<(Delivery, BloodRequest), CoreError> {
    let delivery_id: i64 = delivery
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("delivery has no registry id")))?;

    if delivery.confirmation.is_some() || delivery.status == DeliveryStatus::Delivered {
        return Err(CoreError::AlreadyConfirmed { delivery_id });
    }
    delivery.status.validate_transition(DeliveryStatus::Failed)?;

    let mut failed: Delivery = delivery.clone();
    failed.status = DeliveryStatus::Failed;
    failed.failure_reason = Some(reason);
    failed.ended_at = Some(now);

    let mut updated_request: BloodRequest = request.clone();
    updated_request
        .status
        .validate_transition(RequestStatus::PendingApproval)?;
    updated_request.status = RequestStatus::PendingApproval;
    updated_request.reservation_id = None;

    info!(delivery_id, reason = %reason, "Delivery failed");
    Ok((failed, updated_request))
}

/// Cancels a delivery that has not ended.
///
/// The request returns to `pending_approval` and the caller releases the
/// full reservation: cancelled runs consume nothing.
///
/// # Errors
///
/// Returns `CoreError::AlreadyConfirmed` if the delivery was confirmed, or a
/// wrapped `DomainError` if it is already terminal.
pub fn cancel(
    delivery: &Delivery,
    request: &BloodRequest,
    now: OffsetDateTime,
) -> Result<(Delivery, BloodRequest), CoreError> {
    let delivery_id: i64 = delivery
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("delivery has no registry id")))?;

    if delivery.confirmation.is_some() || delivery.status == DeliveryStatus::Delivered {
        return Err(CoreError::AlreadyConfirmed { delivery_id });
    }
    delivery
        .status
        .validate_transition(DeliveryStatus::Cancelled)?;

    let mut cancelled: Delivery = delivery.clone();
    cancelled.status = DeliveryStatus::Cancelled;
    cancelled.ended_at = Some(now);

    let mut updated_request: BloodRequest = request.clone();
    updated_request
        .status
        .validate_transition(RequestStatus::PendingApproval)?;
    updated_request.status = RequestStatus::PendingApproval;
    updated_request.reservation_id = None;

    info!(delivery_id, request_id = delivery.request_id, "Delivery cancelled");
    Ok((cancelled, updated_request))
}
