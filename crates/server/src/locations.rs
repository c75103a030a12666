// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Asynchronous ingest for transporter position reports.
//!
//! Position reports are telemetry, not workflow: they arrive in bursts from
//! the road, never gate a delivery's lifecycle, and are not audited. The HTTP
//! handler acknowledges a report as soon as it is queued; a single consumer
//! task applies the queue to the store in arrival order, so reports never
//! contend with workflow writes for the store lock.
//!
//! The keep-latest rule lives in the dispatch core: a report older than the
//! delivery's last known position is ignored without error. Reports that fail
//! validation, or that arrive for a delivery that is not underway, are logged
//! and dropped; the ingest loop itself never stops.

use crate::live::{LiveEvent, LiveEventBroadcaster};
use hemolink_api::{ApiError, PushLocationRequest, PushLocationResponse, push_location};
use hemolink_store::Store;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

/// Maximum number of position reports queued before senders see backpressure.
pub const LOCATION_QUEUE_SIZE: usize = 256;

/// A transporter position report queued for ingest.
#[derive(Debug, Clone)]
pub struct LocationUpdate {
    /// The delivery being tracked.
    pub delivery_id: i64,
    /// Latitude of the report, in degrees.
    pub latitude: f64,
    /// Longitude of the report, in degrees.
    pub longitude: f64,
    /// When the position was recorded at the source.
    pub recorded_at: OffsetDateTime,
}

/// Consumes queued position reports and applies them to the store.
///
/// Runs until every sender handle is dropped. Each applied report is
/// broadcast to live subscribers; stale and invalid reports are dropped
/// with a log line.
pub async fn run_location_ingest(
    store: Arc<Mutex<Store>>,
    mut reports: mpsc::Receiver<LocationUpdate>,
    events: LiveEventBroadcaster,
) {
    while let Some(update) = reports.recv().await {
        let request: PushLocationRequest = PushLocationRequest {
            delivery_id: update.delivery_id,
            latitude: update.latitude,
            longitude: update.longitude,
            recorded_at: update.recorded_at,
        };

        let mut guard = store.lock().await;
        let outcome: Result<PushLocationResponse, ApiError> = push_location(&mut guard, &request);
        drop(guard);

        match outcome {
            Ok(response) if response.applied => {
                debug!(delivery_id = update.delivery_id, "Applied position report");
                events.broadcast(&LiveEvent::LocationUpdated {
                    delivery_id: update.delivery_id,
                    latitude: update.latitude,
                    longitude: update.longitude,
                });
            }
            Ok(_) => {
                debug!(
                    delivery_id = update.delivery_id,
                    "Ignored position report behind the last known position"
                );
            }
            Err(err) => {
                warn!(
                    delivery_id = update.delivery_id,
                    error = %err,
                    "Dropped position report"
                );
            }
        }
    }

    debug!("Position ingest queue closed");
}
