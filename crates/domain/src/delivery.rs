// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Delivery states, manifest lines, location tracking and proof of delivery.
//!
//! A delivery is created in `pending` when its request is approved, rides
//! `in_transit` after a transporter starts the run, and ends `delivered`,
//! `failed` or `cancelled`. Location updates arrive as an unordered stream;
//! only the most recent reading by timestamp is kept. Confirmation is
//! first-wins: one proof of delivery, QR scan or manual form, ever.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Delivery lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Created at approval; awaiting a transporter.
    Pending,
    /// On the road.
    InTransit,
    /// Confirmed at the destination.
    Delivered,
    /// Aborted with a structured reason; stock restocked.
    Failed,
    /// Called off before completion.
    Cancelled,
}

impl DeliveryStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDeliveryStatus` if the string is not a
    /// valid status.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidDeliveryStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Returns true if this status is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed | Self::Cancelled)
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                entity: "delivery",
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "cannot transition from terminal state".to_string(),
            });
        }

        let valid = match self {
            Self::Pending => matches!(new_status, Self::InTransit | Self::Cancelled),
            Self::InTransit => {
                matches!(new_status, Self::Delivered | Self::Failed | Self::Cancelled)
            }
            Self::Delivered | Self::Failed | Self::Cancelled => false,
        };

        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                entity: "delivery",
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by delivery lifecycle rules".to_string(),
            })
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured reason a delivery failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The vehicle broke down en route.
    VehicleBreakdown,
    /// The route became impassable.
    RouteImpassable,
    /// Nobody at the destination could receive the shipment.
    RecipientUnavailable,
    /// Cold chain integrity was compromised.
    ColdChainBreach,
}

impl FailureReason {
    /// Returns the string representation of the reason.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VehicleBreakdown => "vehicle_breakdown",
            Self::RouteImpassable => "route_impassable",
            Self::RecipientUnavailable => "recipient_unavailable",
            Self::ColdChainBreach => "cold_chain_breach",
        }
    }

    /// Parses a reason from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidFailureReason` if the string is not a
    /// valid reason.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "vehicle_breakdown" => Ok(Self::VehicleBreakdown),
            "route_impassable" => Ok(Self::RouteImpassable),
            "recipient_unavailable" => Ok(Self::RecipientUnavailable),
            "cold_chain_breach" => Ok(Self::ColdChainBreach),
            _ => Err(DomainError::InvalidFailureReason {
                reason: s.to_string(),
            }),
        }
    }
}

impl FromStr for FailureReason {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A timestamped position report from the transporter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees, -90.0 to 90.0.
    pub latitude: f64,
    /// Longitude in decimal degrees, -180.0 to 180.0.
    pub longitude: f64,
    /// When the position was recorded at the source.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

impl GeoPoint {
    /// Creates a new position report.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64, recorded_at: OffsetDateTime) -> Self {
        Self {
            latitude,
            longitude,
            recorded_at,
        }
    }
}

/// One reserved unit riding in a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestLine {
    /// The blood unit on board.
    pub unit_id: i64,
    /// Volume of the unit, in milliliters.
    pub quantity_ml: u32,
}

impl ManifestLine {
    /// Creates a manifest line.
    #[must_use]
    pub const fn new(unit_id: i64, quantity_ml: u32) -> Self {
        Self {
            unit_id,
            quantity_ml,
        }
    }
}

/// How a delivery was confirmed at the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ConfirmationMethod {
    /// The recipient scanned the QR token issued for this delivery.
    QrScan,
    /// The recipient filled the manual fallback form.
    ManualForm {
        /// Name of the person who signed for the shipment.
        recipient_name: String,
        /// Their role at the destination.
        recipient_role: String,
    },
}

/// Proof of delivery. Recorded exactly once, first confirmation wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryConfirmation {
    /// The recipient who confirmed.
    pub recipient_id: i64,
    /// How the confirmation was made.
    pub method: ConfirmationMethod,
    /// When the confirmation was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub confirmed_at: OffsetDateTime,
}

impl DeliveryConfirmation {
    /// Creates a confirmation record.
    #[must_use]
    pub const fn new(
        recipient_id: i64,
        method: ConfirmationMethod,
        confirmed_at: OffsetDateTime,
    ) -> Self {
        Self {
            recipient_id,
            method,
            confirmed_at,
        }
    }
}

/// A shipment carrying reserved units to the requesting facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    /// The canonical numeric identifier assigned by the registry.
    /// `None` indicates the delivery has not been recorded yet.
    delivery_id: Option<i64>,
    /// The request the delivery fulfills.
    pub request_id: i64,
    /// The destination facility.
    pub facility_id: i64,
    /// The ledger reservation backing the manifest.
    pub reservation_id: i64,
    /// The assigned transporter, once there is one.
    pub transporter_id: Option<i64>,
    /// Current lifecycle status.
    pub status: DeliveryStatus,
    /// The reserved units on board.
    pub manifest: Vec<ManifestLine>,
    /// Most recent position report, by source timestamp.
    pub last_location: Option<GeoPoint>,
    /// Proof of delivery, once confirmed.
    pub confirmation: Option<DeliveryConfirmation>,
    /// Why the delivery failed, if it did.
    pub failure_reason: Option<FailureReason>,
    /// When the delivery record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transporter departed.
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    /// When the delivery reached a terminal state.
    #[serde(with = "time::serde::rfc3339::option")]
    pub ended_at: Option<OffsetDateTime>,
    /// Optimistic concurrency version, bumped on every update.
    pub version: u64,
}

impl Delivery {
    /// Creates a new `pending` delivery without an ID.
    #[must_use]
    pub const fn new(
        request_id: i64,
        facility_id: i64,
        reservation_id: i64,
        manifest: Vec<ManifestLine>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            delivery_id: None,
            request_id,
            facility_id,
            reservation_id,
            transporter_id: None,
            status: DeliveryStatus::Pending,
            manifest,
            last_location: None,
            confirmation: None,
            failure_reason: None,
            created_at,
            started_at: None,
            ended_at: None,
            version: 0,
        }
    }

    /// Re-attaches a registry ID to a delivery value.
    #[must_use]
    pub fn with_id(mut self, delivery_id: i64) -> Self {
        self.delivery_id = Some(delivery_id);
        self
    }

    /// Returns the canonical numeric identifier if registered.
    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        self.delivery_id
    }

    /// Total volume on the manifest, in milliliters.
    #[must_use]
    pub fn manifest_quantity_ml(&self) -> u64 {
        self.manifest
            .iter()
            .map(|line| u64::from(line.quantity_ml))
            .sum()
    }
}
