// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod blood;
mod campaign;
mod delivery;
mod donation;
mod donor;
mod error;
mod facility;
mod request;
mod unit;
mod validation;

#[cfg(test)]
mod tests;

pub use blood::{BloodComponent, BloodGroup};
pub use campaign::{CampaignStatus, EmergencyCampaign, PledgeStatus, SupportPledge};
pub use delivery::{
    ConfirmationMethod, Delivery, DeliveryConfirmation, DeliveryStatus, FailureReason, GeoPoint,
    ManifestLine,
};
pub use donation::{Donation, DonationPhase, DonationStatus, VitalSignEntry};
pub use donor::Donor;
pub use error::DomainError;
pub use facility::{DEFAULT_MIN_COLLECTION_ML, Facility, FacilityConfig};
pub use request::{BloodRequest, RejectReason, RequestStatus};
pub use unit::{BloodUnit, UnitStatus};
pub use validation::{
    validate_collection_volume, validate_coordinates, validate_deadline, validate_name,
    validate_quantity, validate_split_allocations,
};
