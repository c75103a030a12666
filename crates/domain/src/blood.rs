// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Blood typing vocabulary.
//!
//! Blood groups use clinical ABO/Rh notation on the wire ("A+", "O-", ...).
//! Components carry their regulatory shelf life, which the splitter uses to
//! stamp expiry timestamps on new units.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The eight ABO/Rh blood groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    /// A positive
    #[serde(rename = "A+")]
    APositive,
    /// A negative
    #[serde(rename = "A-")]
    ANegative,
    /// B positive
    #[serde(rename = "B+")]
    BPositive,
    /// B negative
    #[serde(rename = "B-")]
    BNegative,
    /// AB positive
    #[serde(rename = "AB+")]
    AbPositive,
    /// AB negative
    #[serde(rename = "AB-")]
    AbNegative,
    /// O positive
    #[serde(rename = "O+")]
    OPositive,
    /// O negative
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    /// Returns the clinical notation for the group.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }

    /// Parses a group from its clinical notation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBloodGroup` if the string is not a valid group.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "A+" => Ok(Self::APositive),
            "A-" => Ok(Self::ANegative),
            "B+" => Ok(Self::BPositive),
            "B-" => Ok(Self::BNegative),
            "AB+" => Ok(Self::AbPositive),
            "AB-" => Ok(Self::AbNegative),
            "O+" => Ok(Self::OPositive),
            "O-" => Ok(Self::ONegative),
            _ => Err(DomainError::InvalidBloodGroup {
                group: s.to_string(),
            }),
        }
    }
}

impl FromStr for BloodGroup {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Blood components produced by splitting a whole-blood donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloodComponent {
    /// Unseparated whole blood
    WholeBlood,
    /// Plasma
    Plasma,
    /// Packed red cells
    RedCells,
    /// Platelet concentrate
    Platelets,
}

impl BloodComponent {
    /// Returns the string representation of the component.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WholeBlood => "whole_blood",
            Self::Plasma => "plasma",
            Self::RedCells => "red_cells",
            Self::Platelets => "platelets",
        }
    }

    /// Parses a component from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBloodComponent` if the string is not a
    /// valid component.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "whole_blood" => Ok(Self::WholeBlood),
            "plasma" => Ok(Self::Plasma),
            "red_cells" => Ok(Self::RedCells),
            "platelets" => Ok(Self::Platelets),
            _ => Err(DomainError::InvalidBloodComponent {
                component: s.to_string(),
            }),
        }
    }

    /// Regulatory storage shelf life for the component, counted from collection.
    #[must_use]
    pub const fn shelf_life_days(&self) -> i64 {
        match self {
            Self::WholeBlood => 35,
            Self::Plasma => 365,
            Self::RedCells => 42,
            Self::Platelets => 5,
        }
    }

    /// Shelf life as a [`time::Duration`].
    #[must_use]
    pub const fn shelf_life(&self) -> time::Duration {
        time::Duration::days(self.shelf_life_days())
    }
}

impl FromStr for BloodComponent {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for BloodComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
