// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record of the given kind carries the given identifier.
    NotFound { entity: &'static str, id: i64 },
    /// A write carried a stale version and lost the race.
    VersionConflict {
        entity: &'static str,
        id: i64,
        expected: u64,
        actual: u64,
    },
    /// The record was never stored, so it cannot be updated.
    MissingId { entity: &'static str },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "No {entity} with id {id}"),
            Self::VersionConflict {
                entity,
                id,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Stale write to {entity} {id}: expected version {expected}, stored version is {actual}"
                )
            }
            Self::MissingId { entity } => {
                write!(f, "Cannot update a {entity} that was never stored")
            }
        }
    }
}

impl std::error::Error for StoreError {}
