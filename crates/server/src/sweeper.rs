// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Interval-driven expiry sweeps over stock and campaigns.
//!
//! Expiry is already lazy at every read: stock queries skip units past their
//! shelf life, and campaign reads report an overdue campaign as expired. The
//! sweep persists what reads already report, so stored status catches up and
//! dashboards iterating raw records see the same truth. Both sweeps are
//! idempotent; a pass that finds nothing overdue changes nothing.
//!
//! Sweeps are housekeeping, not workflow: they record no audit events, and
//! what they flip is only ever what lazy reads had stopped counting anyway.

use crate::live::{LiveEvent, LiveEventBroadcaster};
use hemolink::InventoryLedger;
use hemolink_store::Store;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Runs the expiry sweep on a fixed interval until the server shuts down.
pub async fn run_sweeps(
    store: Arc<Mutex<Store>>,
    ledger: Arc<InventoryLedger>,
    events: LiveEventBroadcaster,
    interval_secs: u64,
) {
    // A zero interval would spin; clamp to one second.
    let period: Duration = Duration::from_secs(interval_secs.max(1));
    let mut ticker: tokio::time::Interval = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        sweep_once(&store, &ledger, &events, OffsetDateTime::now_utc()).await;
    }
}

/// Runs one expiry pass and broadcasts what it flipped.
async fn sweep_once(
    store: &Mutex<Store>,
    ledger: &InventoryLedger,
    events: &LiveEventBroadcaster,
    now: OffsetDateTime,
) {
    match ledger.sweep_expired(now) {
        Ok(unit_ids) if !unit_ids.is_empty() => {
            info!(count = unit_ids.len(), "Expired units past shelf life");
            events.broadcast(&LiveEvent::UnitsExpired { unit_ids });
        }
        Ok(_) => {}
        Err(err) => {
            warn!(error = %err, "Unit expiry sweep failed");
        }
    }

    let mut guard = store.lock().await;
    let campaign_ids: Vec<i64> = guard.expire_due_campaigns(now);
    drop(guard);

    if !campaign_ids.is_empty() {
        info!(count = campaign_ids.len(), "Expired campaigns past deadline");
        events.broadcast(&LiveEvent::CampaignsExpired { campaign_ids });
    }
}
