// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Field-level validation shared by every entry point into the system.

use crate::blood::BloodComponent;
use crate::error::DomainError;
use time::OffsetDateTime;

/// Validates a display name.
///
/// # Errors
///
/// Returns `DomainError::InvalidName` if the name is empty or whitespace.
pub fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidName(String::from(
            "name must not be empty",
        )));
    }
    Ok(())
}

/// Validates a volume in milliliters.
///
/// Quantities are unsigned throughout, so the only malformed value is zero.
///
/// # Errors
///
/// Returns `DomainError::InvalidQuantity` if the quantity is zero.
pub fn validate_quantity(quantity_ml: u32) -> Result<(), DomainError> {
    if quantity_ml == 0 {
        return Err(DomainError::InvalidQuantity(String::from(
            "quantity must be greater than zero",
        )));
    }
    Ok(())
}

/// Validates the collected volume against the facility completion threshold.
///
/// # Errors
///
/// Returns `DomainError::InvalidQuantity` for a zero volume, or
/// `DomainError::BelowMinimumCollection` when the volume is positive but
/// under the threshold.
pub fn validate_collection_volume(collected_ml: u32, minimum_ml: u32) -> Result<(), DomainError> {
    if collected_ml == 0 {
        return Err(DomainError::InvalidQuantity(String::from(
            "collected volume must be greater than zero",
        )));
    }
    if collected_ml < minimum_ml {
        return Err(DomainError::BelowMinimumCollection {
            collected_ml,
            minimum_ml,
        });
    }
    Ok(())
}

/// Validates a set of split allocations against the collected volume.
///
/// Quantity is conserved: the allocations may not total more than was
/// collected. Totals are accumulated in 64 bits so the check cannot be
/// defeated by overflow.
///
/// # Errors
///
/// Returns `DomainError::EmptyAllocation` for an empty set,
/// `DomainError::InvalidQuantity` if any single allocation is zero, or
/// `DomainError::OverAllocation` when the total exceeds the collected volume.
pub fn validate_split_allocations(
    collected_ml: u32,
    allocations: &[(BloodComponent, u32)],
) -> Result<(), DomainError> {
    if allocations.is_empty() {
        return Err(DomainError::EmptyAllocation);
    }

    let mut allocated_ml: u64 = 0;
    for (component, quantity_ml) in allocations {
        if *quantity_ml == 0 {
            return Err(DomainError::InvalidQuantity(format!(
                "allocation for {component} must be greater than zero"
            )));
        }
        allocated_ml += u64::from(*quantity_ml);
    }

    if allocated_ml > u64::from(collected_ml) {
        return Err(DomainError::OverAllocation {
            collected_ml,
            allocated_ml,
        });
    }
    Ok(())
}

/// Validates that a campaign deadline lies in the future.
///
/// # Errors
///
/// Returns `DomainError::InvalidDeadline` if the deadline is not after `now`.
pub fn validate_deadline(deadline: OffsetDateTime, now: OffsetDateTime) -> Result<(), DomainError> {
    if deadline <= now {
        return Err(DomainError::InvalidDeadline { deadline });
    }
    Ok(())
}

/// Validates geographic coordinates from a transporter position report.
///
/// # Errors
///
/// Returns `DomainError::InvalidCoordinates` if either value is out of range
/// or not finite.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), DomainError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(DomainError::InvalidCoordinates {
            reason: format!("latitude {latitude} is outside -90.0..=90.0"),
        });
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(DomainError::InvalidCoordinates {
            reason: format!("longitude {longitude} is outside -180.0..=180.0"),
        });
    }
    Ok(())
}
