// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};

/// Default minimum collected volume required to complete a donation, in milliliters.
///
/// Collections below this threshold cannot produce transfusable components and
/// are refused at completion time unless the facility overrides the limit.
pub const DEFAULT_MIN_COLLECTION_ML: u32 = 200;

/// Per-facility operating configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityConfig {
    /// Minimum collected volume, in milliliters, for a donation to complete.
    pub min_collection_ml: u32,
}

impl FacilityConfig {
    /// Creates a configuration with an explicit completion threshold.
    #[must_use]
    pub const fn new(min_collection_ml: u32) -> Self {
        Self { min_collection_ml }
    }
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self {
            min_collection_ml: DEFAULT_MIN_COLLECTION_ML,
        }
    }
}

/// A blood bank facility: the scope for inventory, donations and requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    /// The canonical numeric identifier assigned by the registry.
    /// `None` indicates the facility has not been registered yet.
    facility_id: Option<i64>,
    /// Display name of the facility.
    pub name: String,
    /// Operating configuration.
    pub config: FacilityConfig,
}

impl Facility {
    /// Creates a new `Facility` without a registered ID.
    ///
    /// # Arguments
    ///
    /// * `name` - Display name of the facility
    /// * `config` - Operating configuration
    #[must_use]
    pub const fn new(name: String, config: FacilityConfig) -> Self {
        Self {
            facility_id: None,
            name,
            config,
        }
    }

    /// Re-attaches a registry ID to a facility value.
    #[must_use]
    pub fn with_id(mut self, facility_id: i64) -> Self {
        self.facility_id = Some(facility_id);
        self
    }

    /// Returns the canonical numeric identifier if registered.
    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        self.facility_id
    }
}
