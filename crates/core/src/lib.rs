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

//! The fulfillment core: every state transition in the blood supply
//! lifecycle, from donor check-in to proof of delivery.
//!
//! Components here are pure where they can be: lifecycle, splitter, matcher,
//! escalation and dispatch take current records and return updated values,
//! leaving persistence to the caller. The one stateful piece is the
//! [`InventoryLedger`], which owns blood units outright so that reserve,
//! commit and release stay atomic per stock key.

pub mod dispatch;
pub mod escalation;
pub mod lifecycle;
pub mod matcher;
pub mod splitter;

mod error;
mod ledger;

#[cfg(test)]
mod tests;

pub use dispatch::{ConfirmationProof, LocationOutcome, TokenPayload};
pub use error::CoreError;
pub use ledger::{InventoryLedger, StockKey, StockLevel, StockReservation};
pub use matcher::{Decision, Evaluation};
pub use splitter::SplitAllocation;
