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
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod live;
mod locations;
mod sweeper;

use axum::{
    Json, Router,
    extract::{FromRef, Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use hemolink::InventoryLedger;
use hemolink_api::{
    ApiError, ApiResult, ArchiveDonorRequest, ArchiveDonorResponse, AssignTransporterRequest,
    AssignTransporterResponse, AvailableStockResponse, CancelDeliveryRequest,
    CancelDeliveryResponse, CancelDonationRequest, CancelDonationResponse, CloseCampaignRequest,
    CloseCampaignResponse, CompleteDonationRequest, CompleteDonationResponse,
    ConfirmDeliveryRequest, ConfirmDeliveryResponse, EvaluateRequestRequest,
    EvaluateRequestResponse, GetCampaignResponse, GetDeliveryResponse, GetDonationResponse,
    GetRequestResponse, IssueDeliveryTokenRequest, IssueDeliveryTokenResponse,
    ListAuditEventsResponse, ListStockResponse, ManualConfirmationInput, MarkUnitTestedRequest,
    MarkUnitTestedResponse, OpenCampaignRequest, OpenCampaignResponse, RecordHealthCheckRequest,
    RecordHealthCheckResponse, RecordVitalSignsRequest, RecordVitalSignsResponse,
    RegisterDonationRequest, RegisterDonationResponse, RegisterDonorRequest,
    RegisterDonorResponse, RegisterFacilityRequest, RegisterFacilityResponse,
    RejectRequestRequest, RejectRequestResponse, ReportAdverseEventRequest,
    ReportAdverseEventResponse, ReportDeliveryFailureRequest, ReportDeliveryFailureResponse,
    ResolveComponentRequest, ResolveComponentResponse, ReviewPledgeRequest, ReviewPledgeResponse,
    SchedulePledgedDonationRequest, SchedulePledgedDonationResponse, SplitAllocationInput,
    SplitDonationRequest, SplitDonationResponse, StartDeliveryRequest, StartDeliveryResponse,
    StartDonationRequest, StartDonationResponse, SubmitPledgeRequest, SubmitPledgeResponse,
    SubmitRequestRequest, SubmitRequestResponse, VoidDonationSplitRequest,
    VoidDonationSplitResponse, archive_donor, assign_transporter, cancel_delivery,
    cancel_donation, close_campaign, complete_donation, confirm_delivery, evaluate_request,
    get_available, get_campaign, get_delivery, get_donation, get_request, issue_delivery_token,
    list_facility_events, list_stock, mark_unit_tested, open_campaign, record_health_check,
    record_vital_signs, register_donation, register_donor, register_facility, reject_request,
    report_adverse_event, report_delivery_failure, resolve_component, review_pledge,
    schedule_pledged_donation, split_donation, start_delivery, start_donation, submit_pledge,
    submit_request, void_donation_split,
};
use hemolink_audit::{Actor, Cause};
use hemolink_store::Store;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info};

use crate::live::{LiveEvent, LiveEventBroadcaster, live_events_handler};
use crate::locations::{LOCATION_QUEUE_SIZE, LocationUpdate, run_location_ingest};
use crate::sweeper::run_sweeps;

/// HemoLink Server - HTTP server for the HemoLink blood supply system
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Seconds between background expiry sweeps over stock and campaigns
    #[arg(long, default_value_t = 60)]
    sweep_interval_secs: u64,
}

/// Application state shared across handlers.
///
/// The store is wrapped in a Mutex so command handlers apply their state
/// changes one at a time; the inventory ledger serializes its own per-key
/// bookkeeping internally.
#[derive(Clone)]
struct AppState {
    /// Authoritative records for donors, donations, requests, and deliveries.
    store: Arc<Mutex<Store>>,
    /// Reserve/release/commit bookkeeping for blood units.
    ledger: Arc<InventoryLedger>,
    /// Fan-out channel for live dispatch-board events.
    events: LiveEventBroadcaster,
    /// Queue feeding the background position ingest task.
    locations: mpsc::Sender<LocationUpdate>,
}

impl FromRef<AppState> for LiveEventBroadcaster {
    fn from_ref(state: &AppState) -> Self {
        state.events.clone()
    }
}

/// API request for registering a facility.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RegisterFacilityApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The facility's display name.
    name: String,
    /// Minimum collection volume in milliliters. Defaults when omitted.
    min_collection_ml: Option<u32>,
}

/// API request for registering a donor.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RegisterDonorApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The donor's name.
    name: String,
    /// The donor's blood group (e.g., "O-", "AB+").
    blood_group: String,
}

/// API request for recording a donor health check.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RecordHealthCheckApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// Whether the donor passed the screening.
    passed: bool,
}

/// API request for actions that carry no payload beyond attribution.
///
/// Used by endpoints whose target is fully named by the URL, such as
/// starting a donation or closing a campaign.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct AuditedActionApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
}

/// API request for registering a donation appointment.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RegisterDonationApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The donor giving blood.
    donor_id: i64,
    /// The facility hosting the donation.
    facility_id: i64,
    /// The volume the facility intends to collect, in milliliters.
    target_quantity_ml: u32,
}

/// API request for appending a vital-sign reading to a donation.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RecordVitalSignsApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The phase of the donation (e.g., "pre", "during", "post").
    phase: String,
    /// Pulse in beats per minute.
    pulse_bpm: u16,
    /// Systolic blood pressure in mmHg.
    systolic_mmhg: u16,
    /// Diastolic blood pressure in mmHg.
    diastolic_mmhg: u16,
    /// Optional free-form nurse note.
    note: Option<String>,
}

/// API request for completing a donation.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct CompleteDonationApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The volume actually collected, in milliliters.
    collected_ml: u32,
}

/// API request for reporting an adverse event during a donation.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ReportAdverseEventApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// Optional description of what happened.
    note: Option<String>,
}

/// One component cut within a split request.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct SplitAllocationApiInput {
    /// The component to produce (e.g., "plasma", "red_cells").
    component: String,
    /// The volume of the cut, in milliliters.
    quantity_ml: u32,
}

/// API request for splitting a completed donation into component units.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct SplitDonationApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The component cuts to produce from the collected volume.
    allocations: Vec<SplitAllocationApiInput>,
}

/// API request for recording a unit's lab result.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct MarkUnitTestedApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// Whether the unit passed screening.
    passed: bool,
}

/// API request for submitting a blood request.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct SubmitRequestApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The requesting hospital or ward.
    requester_id: i64,
    /// The facility the request is directed at.
    facility_id: i64,
    /// The blood group needed (e.g., "O-").
    blood_group: String,
    /// The component needed. May be left open for later resolution.
    component: Option<String>,
    /// The volume needed, in milliliters.
    quantity_ml: u32,
    /// Whether the request is urgent.
    is_urgent: bool,
}

/// API request for resolving a request's open component.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ResolveComponentApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The component to settle on (e.g., "plasma").
    component: String,
}

/// API request for rejecting a blood request.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RejectRequestApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// Why the request is being turned down.
    reason: String,
}

/// API request for opening an emergency donor campaign.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct OpenCampaignApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The starved request the campaign backs.
    request_id: i64,
    /// The shortfall the campaign is trying to cover, in milliliters.
    quantity_needed_ml: u32,
    /// When the campaign expires (RFC 3339).
    #[serde(with = "time::serde::rfc3339")]
    deadline: OffsetDateTime,
}

/// API request for pledging a donor to a campaign.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct SubmitPledgeApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The donor volunteering to give blood.
    volunteer_donor_id: i64,
}

/// API request for reviewing a pledge.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ReviewPledgeApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// Whether the pledge is accepted.
    approve: bool,
}

/// API request for scheduling a donation from an approved pledge.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct SchedulePledgedDonationApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The volume the facility intends to collect, in milliliters.
    target_quantity_ml: u32,
}

/// API request for assigning a transporter to a delivery.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct AssignTransporterApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The transporter taking the shipment.
    transporter_id: i64,
}

/// API request for issuing a QR confirmation token.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct IssueDeliveryTokenApiRequest {
    /// The recipient the token is bound to.
    recipient_id: i64,
}

/// The manual fallback form, for confirming without a scan.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ManualConfirmationApiInput {
    /// The recipient confirming the delivery.
    recipient_id: i64,
    /// Name of the person who signed for the shipment.
    recipient_name: String,
    /// Their role at the destination.
    recipient_role: String,
}

/// API request for confirming a delivery at the destination.
///
/// Exactly one proof must be presented: a scanned QR token or the manual
/// fallback form.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ConfirmDeliveryApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The scanned QR token, when confirming by scan.
    token: Option<String>,
    /// The manual form, when confirming without a scan.
    manual: Option<ManualConfirmationApiInput>,
}

/// API request for reporting a delivery failure.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ReportDeliveryFailureApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The type of the actor.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// Why the delivery failed (e.g., "vehicle_breakdown").
    reason: String,
    /// Units lost or spoiled in the incident, excluded from restock.
    consumed_unit_ids: Vec<i64>,
}

/// API request for a transporter position report.
///
/// Position reports are telemetry, not workflow actions, so they carry no
/// actor attribution.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct PushLocationApiRequest {
    /// Degrees latitude of the report.
    latitude: f64,
    /// Degrees longitude of the report.
    longitude: f64,
    /// When the transporter recorded the position (RFC 3339).
    #[serde(with = "time::serde::rfc3339")]
    recorded_at: OffsetDateTime,
}

/// Query parameters for the available-stock endpoint.
#[derive(Debug, Deserialize)]
struct AvailableStockQuery {
    /// The blood group to check (e.g., "O-").
    blood_group: String,
    /// The component to check (e.g., "plasma").
    component: String,
}

/// Response envelope for write endpoints.
///
/// Pairs the operation's response payload with the ID of the audit event
/// recorded for the state change.
#[derive(Debug, Serialize, Deserialize)]
struct WriteResponse<T> {
    /// The audit event recorded for this action.
    event_id: i64,
    /// The operation's response payload, flattened into the envelope.
    #[serde(flatten)]
    payload: T,
}

/// Acknowledgement for a queued position report.
#[derive(Debug, Serialize, Deserialize)]
struct LocationAckResponse {
    /// The delivery the report was queued for.
    delivery_id: i64,
    /// Whether the report was accepted into the ingest queue.
    queued: bool,
}

/// Error response structure for API errors.
#[derive(Debug, Serialize, Deserialize)]
struct ErrorResponse {
    /// Whether the request resulted in an error.
    error: bool,
    /// A human-readable error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } | ApiError::InsufficientStock { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal API error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Handler for POST `/facilities` endpoint.
///
/// Registers a new facility.
async fn handle_register_facility(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RegisterFacilityApiRequest>,
) -> Result<Json<WriteResponse<RegisterFacilityResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        name = %req.name,
        "Handling register_facility request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: RegisterFacilityRequest = RegisterFacilityRequest {
        name: req.name,
        min_collection_ml: req.min_collection_ml,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<RegisterFacilityResponse> =
        register_facility(&mut store, api_request, &actor, cause)?;
    drop(store);

    info!(
        event_id = result.event_id,
        facility_id = result.response.facility_id,
        "Successfully registered facility"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/donors` endpoint.
///
/// Registers a new donor with their blood group.
async fn handle_register_donor(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RegisterDonorApiRequest>,
) -> Result<Json<WriteResponse<RegisterDonorResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        name = %req.name,
        blood_group = %req.blood_group,
        "Handling register_donor request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: RegisterDonorRequest = RegisterDonorRequest {
        name: req.name,
        blood_group: req.blood_group,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<RegisterDonorResponse> = register_donor(
        &mut store,
        api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        donor_id = result.response.donor_id,
        "Successfully registered donor"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/donors/{donor_id}/health_check` endpoint.
///
/// Records a screening outcome against a donor.
async fn handle_record_health_check(
    AxumState(app_state): AxumState<AppState>,
    Path(donor_id): Path<i64>,
    Json(req): Json<RecordHealthCheckApiRequest>,
) -> Result<Json<WriteResponse<RecordHealthCheckResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        donor_id,
        passed = req.passed,
        "Handling record_health_check request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: RecordHealthCheckRequest = RecordHealthCheckRequest {
        donor_id,
        passed: req.passed,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<RecordHealthCheckResponse> =
        record_health_check(&mut store, &api_request, &actor, cause)?;
    drop(store);

    info!(
        event_id = result.event_id,
        donor_id,
        eligible = result.response.eligible,
        "Successfully recorded health check"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/donors/{donor_id}/archive` endpoint.
///
/// Archives a donor so no further work can reference them.
async fn handle_archive_donor(
    AxumState(app_state): AxumState<AppState>,
    Path(donor_id): Path<i64>,
    Json(req): Json<AuditedActionApiRequest>,
) -> Result<Json<WriteResponse<ArchiveDonorResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        donor_id,
        "Handling archive_donor request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: ArchiveDonorRequest = ArchiveDonorRequest { donor_id };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<ArchiveDonorResponse> =
        archive_donor(&mut store, &api_request, &actor, cause)?;
    drop(store);

    info!(
        event_id = result.event_id,
        donor_id, "Successfully archived donor"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/donations` endpoint.
///
/// Registers a donation appointment for an eligible donor.
async fn handle_register_donation(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RegisterDonationApiRequest>,
) -> Result<Json<WriteResponse<RegisterDonationResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        donor_id = req.donor_id,
        facility_id = req.facility_id,
        "Handling register_donation request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: RegisterDonationRequest = RegisterDonationRequest {
        donor_id: req.donor_id,
        facility_id: req.facility_id,
        target_quantity_ml: req.target_quantity_ml,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<RegisterDonationResponse> = register_donation(
        &mut store,
        &api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        donation_id = result.response.donation_id,
        "Successfully registered donation"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/donations/{donation_id}/start` endpoint.
///
/// Moves a registered donation into progress.
async fn handle_start_donation(
    AxumState(app_state): AxumState<AppState>,
    Path(donation_id): Path<i64>,
    Json(req): Json<AuditedActionApiRequest>,
) -> Result<Json<WriteResponse<StartDonationResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        donation_id,
        "Handling start_donation request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: StartDonationRequest = StartDonationRequest { donation_id };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<StartDonationResponse> = start_donation(
        &mut store,
        &api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        donation_id, "Successfully started donation"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/donations/{donation_id}/vitals` endpoint.
///
/// Appends a vital-sign reading to an in-progress donation.
async fn handle_record_vital_signs(
    AxumState(app_state): AxumState<AppState>,
    Path(donation_id): Path<i64>,
    Json(req): Json<RecordVitalSignsApiRequest>,
) -> Result<Json<WriteResponse<RecordVitalSignsResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        donation_id,
        phase = %req.phase,
        "Handling record_vital_signs request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: RecordVitalSignsRequest = RecordVitalSignsRequest {
        donation_id,
        phase: req.phase,
        pulse_bpm: req.pulse_bpm,
        systolic_mmhg: req.systolic_mmhg,
        diastolic_mmhg: req.diastolic_mmhg,
        note: req.note,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<RecordVitalSignsResponse> = record_vital_signs(
        &mut store,
        api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        donation_id,
        entries = result.response.entries,
        "Successfully recorded vital signs"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/donations/{donation_id}/complete` endpoint.
///
/// Completes an in-progress donation with the collected volume.
async fn handle_complete_donation(
    AxumState(app_state): AxumState<AppState>,
    Path(donation_id): Path<i64>,
    Json(req): Json<CompleteDonationApiRequest>,
) -> Result<Json<WriteResponse<CompleteDonationResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        donation_id,
        collected_ml = req.collected_ml,
        "Handling complete_donation request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: CompleteDonationRequest = CompleteDonationRequest {
        donation_id,
        collected_ml: req.collected_ml,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<CompleteDonationResponse> = complete_donation(
        &mut store,
        &api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        donation_id, "Successfully completed donation"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/donations/{donation_id}/adverse_event` endpoint.
///
/// Closes a donation after a donor reaction and flags the donor.
async fn handle_report_adverse_event(
    AxumState(app_state): AxumState<AppState>,
    Path(donation_id): Path<i64>,
    Json(req): Json<ReportAdverseEventApiRequest>,
) -> Result<Json<WriteResponse<ReportAdverseEventResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        donation_id,
        "Handling report_adverse_event request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: ReportAdverseEventRequest = ReportAdverseEventRequest {
        donation_id,
        note: req.note,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<ReportAdverseEventResponse> = report_adverse_event(
        &mut store,
        api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        donation_id, "Successfully reported adverse event"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/donations/{donation_id}/cancel` endpoint.
///
/// Cancels a donation that has not completed.
async fn handle_cancel_donation(
    AxumState(app_state): AxumState<AppState>,
    Path(donation_id): Path<i64>,
    Json(req): Json<AuditedActionApiRequest>,
) -> Result<Json<WriteResponse<CancelDonationResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        donation_id,
        "Handling cancel_donation request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: CancelDonationRequest = CancelDonationRequest { donation_id };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<CancelDonationResponse> = cancel_donation(
        &mut store,
        &api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        donation_id, "Successfully cancelled donation"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/donations/{donation_id}/split` endpoint.
///
/// Splits a completed donation into component units and registers them
/// with the inventory ledger.
async fn handle_split_donation(
    AxumState(app_state): AxumState<AppState>,
    Path(donation_id): Path<i64>,
    Json(req): Json<SplitDonationApiRequest>,
) -> Result<Json<WriteResponse<SplitDonationResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        donation_id,
        allocations = req.allocations.len(),
        "Handling split_donation request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: SplitDonationRequest = SplitDonationRequest {
        donation_id,
        allocations: req
            .allocations
            .into_iter()
            .map(|allocation| SplitAllocationInput {
                component: allocation.component,
                quantity_ml: allocation.quantity_ml,
            })
            .collect(),
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<SplitDonationResponse> = split_donation(
        &mut store,
        &app_state.ledger,
        &api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        donation_id,
        units = result.response.units.len(),
        "Successfully split donation"
    );

    let unit_ids: Vec<i64> = result
        .response
        .units
        .iter()
        .map(|unit| unit.unit_id)
        .collect();
    app_state.events.broadcast(&LiveEvent::UnitsSplit {
        donation_id,
        unit_ids,
    });

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/donations/{donation_id}/void_split` endpoint.
///
/// Voids an erroneous split while every minted unit is still untouched.
async fn handle_void_donation_split(
    AxumState(app_state): AxumState<AppState>,
    Path(donation_id): Path<i64>,
    Json(req): Json<AuditedActionApiRequest>,
) -> Result<Json<WriteResponse<VoidDonationSplitResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        donation_id,
        "Handling void_donation_split request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: VoidDonationSplitRequest = VoidDonationSplitRequest { donation_id };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<VoidDonationSplitResponse> =
        void_donation_split(&mut store, &app_state.ledger, &api_request, &actor, cause)?;
    drop(store);

    info!(
        event_id = result.event_id,
        donation_id,
        voided = result.response.voided_unit_ids.len(),
        "Successfully voided donation split"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/units/{unit_id}/lab_result` endpoint.
///
/// Records a screening outcome for a minted unit.
async fn handle_mark_unit_tested(
    AxumState(app_state): AxumState<AppState>,
    Path(unit_id): Path<i64>,
    Json(req): Json<MarkUnitTestedApiRequest>,
) -> Result<Json<WriteResponse<MarkUnitTestedResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        unit_id,
        passed = req.passed,
        "Handling mark_unit_tested request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: MarkUnitTestedRequest = MarkUnitTestedRequest {
        unit_id,
        passed: req.passed,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<MarkUnitTestedResponse> =
        mark_unit_tested(&mut store, &app_state.ledger, &api_request, &actor, cause)?;
    drop(store);

    info!(
        event_id = result.event_id,
        unit_id,
        status = %result.response.status,
        "Successfully recorded lab result"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/requests` endpoint.
///
/// Submits a blood request from a hospital or ward.
async fn handle_submit_request(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<SubmitRequestApiRequest>,
) -> Result<Json<WriteResponse<SubmitRequestResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        requester_id = req.requester_id,
        facility_id = req.facility_id,
        blood_group = %req.blood_group,
        quantity_ml = req.quantity_ml,
        "Handling submit_request request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: SubmitRequestRequest = SubmitRequestRequest {
        requester_id: req.requester_id,
        facility_id: req.facility_id,
        blood_group: req.blood_group,
        component: req.component,
        quantity_ml: req.quantity_ml,
        is_urgent: req.is_urgent,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<SubmitRequestResponse> = submit_request(
        &mut store,
        &api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        request_id = result.response.request_id,
        "Successfully submitted request"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/requests/{request_id}/component` endpoint.
///
/// Resolves a request that was submitted without a component.
async fn handle_resolve_component(
    AxumState(app_state): AxumState<AppState>,
    Path(request_id): Path<i64>,
    Json(req): Json<ResolveComponentApiRequest>,
) -> Result<Json<WriteResponse<ResolveComponentResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        request_id,
        component = %req.component,
        "Handling resolve_component request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: ResolveComponentRequest = ResolveComponentRequest {
        request_id,
        component: req.component,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<ResolveComponentResponse> =
        resolve_component(&mut store, &api_request, &actor, cause)?;
    drop(store);

    info!(
        event_id = result.event_id,
        request_id, "Successfully resolved request component"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/requests/{request_id}/evaluate` endpoint.
///
/// Runs the all-or-nothing fulfillment decision for a pending request.
async fn handle_evaluate_request(
    AxumState(app_state): AxumState<AppState>,
    Path(request_id): Path<i64>,
    Json(req): Json<AuditedActionApiRequest>,
) -> Result<Json<WriteResponse<EvaluateRequestResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        request_id,
        "Handling evaluate_request request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: EvaluateRequestRequest = EvaluateRequestRequest { request_id };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<EvaluateRequestResponse> = evaluate_request(
        &mut store,
        &app_state.ledger,
        &api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        request_id,
        decision = %result.response.decision,
        "Successfully evaluated request"
    );

    // Approvals and shortfalls both matter to dispatch boards; rejections
    // surface through the response alone.
    match result.response.decision.as_str() {
        "approved" => {
            if let Some(delivery_id) = result.response.delivery_id {
                app_state.events.broadcast(&LiveEvent::RequestApproved {
                    request_id,
                    delivery_id,
                });
            }
        }
        "needs_support" => {
            app_state.events.broadcast(&LiveEvent::RequestNeedsSupport {
                request_id,
                shortfall_ml: result.response.shortfall_ml.unwrap_or_default(),
            });
        }
        _ => {}
    }

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/requests/{request_id}/reject` endpoint.
///
/// Rejects a pending request with a reason.
async fn handle_reject_request(
    AxumState(app_state): AxumState<AppState>,
    Path(request_id): Path<i64>,
    Json(req): Json<RejectRequestApiRequest>,
) -> Result<Json<WriteResponse<RejectRequestResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        request_id,
        "Handling reject_request request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: RejectRequestRequest = RejectRequestRequest {
        request_id,
        reason: req.reason,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<RejectRequestResponse> =
        reject_request(&mut store, &api_request, &actor, cause)?;
    drop(store);

    info!(
        event_id = result.event_id,
        request_id, "Successfully rejected request"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/campaigns` endpoint.
///
/// Opens an emergency donor campaign backing a starved request.
async fn handle_open_campaign(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<OpenCampaignApiRequest>,
) -> Result<Json<WriteResponse<OpenCampaignResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        request_id = req.request_id,
        quantity_needed_ml = req.quantity_needed_ml,
        "Handling open_campaign request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: OpenCampaignRequest = OpenCampaignRequest {
        request_id: req.request_id,
        quantity_needed_ml: req.quantity_needed_ml,
        deadline: req.deadline,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<OpenCampaignResponse> = open_campaign(
        &mut store,
        &api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        campaign_id = result.response.campaign_id,
        "Successfully opened campaign"
    );

    app_state.events.broadcast(&LiveEvent::CampaignOpened {
        campaign_id: result.response.campaign_id,
        request_id: result.response.request_id,
    });

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/campaigns/{campaign_id}/pledges` endpoint.
///
/// Records a donor's pledge against an open campaign.
async fn handle_submit_pledge(
    AxumState(app_state): AxumState<AppState>,
    Path(campaign_id): Path<i64>,
    Json(req): Json<SubmitPledgeApiRequest>,
) -> Result<Json<WriteResponse<SubmitPledgeResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        campaign_id,
        volunteer_donor_id = req.volunteer_donor_id,
        "Handling submit_pledge request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: SubmitPledgeRequest = SubmitPledgeRequest {
        campaign_id,
        volunteer_donor_id: req.volunteer_donor_id,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<SubmitPledgeResponse> = submit_pledge(
        &mut store,
        &api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        campaign_id,
        pledge_id = result.response.pledge_id,
        "Successfully recorded pledge"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/pledges/{pledge_id}/review` endpoint.
///
/// Approves or declines a pending pledge.
async fn handle_review_pledge(
    AxumState(app_state): AxumState<AppState>,
    Path(pledge_id): Path<i64>,
    Json(req): Json<ReviewPledgeApiRequest>,
) -> Result<Json<WriteResponse<ReviewPledgeResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        pledge_id,
        approve = req.approve,
        "Handling review_pledge request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: ReviewPledgeRequest = ReviewPledgeRequest {
        pledge_id,
        approve: req.approve,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<ReviewPledgeResponse> =
        review_pledge(&mut store, &api_request, &actor, cause)?;
    drop(store);

    info!(
        event_id = result.event_id,
        pledge_id,
        status = %result.response.status,
        "Successfully reviewed pledge"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/pledges/{pledge_id}/schedule` endpoint.
///
/// Converts an approved pledge into a registered donation.
async fn handle_schedule_pledged_donation(
    AxumState(app_state): AxumState<AppState>,
    Path(pledge_id): Path<i64>,
    Json(req): Json<SchedulePledgedDonationApiRequest>,
) -> Result<Json<WriteResponse<SchedulePledgedDonationResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        pledge_id,
        target_quantity_ml = req.target_quantity_ml,
        "Handling schedule_pledged_donation request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: SchedulePledgedDonationRequest = SchedulePledgedDonationRequest {
        pledge_id,
        target_quantity_ml: req.target_quantity_ml,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<SchedulePledgedDonationResponse> = schedule_pledged_donation(
        &mut store,
        &api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        pledge_id,
        donation_id = result.response.donation_id,
        "Successfully scheduled pledged donation"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/campaigns/{campaign_id}/close` endpoint.
///
/// Closes an open campaign by staff decision.
async fn handle_close_campaign(
    AxumState(app_state): AxumState<AppState>,
    Path(campaign_id): Path<i64>,
    Json(req): Json<AuditedActionApiRequest>,
) -> Result<Json<WriteResponse<CloseCampaignResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        campaign_id,
        "Handling close_campaign request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: CloseCampaignRequest = CloseCampaignRequest { campaign_id };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<CloseCampaignResponse> = close_campaign(
        &mut store,
        &api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        campaign_id, "Successfully closed campaign"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/deliveries/{delivery_id}/transporter` endpoint.
///
/// Assigns a transporter to a pending delivery.
async fn handle_assign_transporter(
    AxumState(app_state): AxumState<AppState>,
    Path(delivery_id): Path<i64>,
    Json(req): Json<AssignTransporterApiRequest>,
) -> Result<Json<WriteResponse<AssignTransporterResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        delivery_id,
        transporter_id = req.transporter_id,
        "Handling assign_transporter request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: AssignTransporterRequest = AssignTransporterRequest {
        delivery_id,
        transporter_id: req.transporter_id,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<AssignTransporterResponse> =
        assign_transporter(&mut store, &api_request, &actor, cause)?;
    drop(store);

    info!(
        event_id = result.event_id,
        delivery_id, "Successfully assigned transporter"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/deliveries/{delivery_id}/start` endpoint.
///
/// Moves a pending delivery with an assigned transporter into transit.
async fn handle_start_delivery(
    AxumState(app_state): AxumState<AppState>,
    Path(delivery_id): Path<i64>,
    Json(req): Json<AuditedActionApiRequest>,
) -> Result<Json<WriteResponse<StartDeliveryResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        delivery_id,
        "Handling start_delivery request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: StartDeliveryRequest = StartDeliveryRequest { delivery_id };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<StartDeliveryResponse> = start_delivery(
        &mut store,
        &api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        delivery_id, "Successfully started delivery"
    );

    app_state
        .events
        .broadcast(&LiveEvent::DeliveryStarted { delivery_id });

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/deliveries/{delivery_id}/token` endpoint.
///
/// Issues a QR confirmation token for an in-transit delivery. Issuing a
/// token changes no state, so no audit event is recorded.
async fn handle_issue_delivery_token(
    AxumState(app_state): AxumState<AppState>,
    Path(delivery_id): Path<i64>,
    Json(req): Json<IssueDeliveryTokenApiRequest>,
) -> Result<Json<IssueDeliveryTokenResponse>, HttpError> {
    info!(
        delivery_id,
        recipient_id = req.recipient_id,
        "Handling issue_delivery_token request"
    );

    let api_request: IssueDeliveryTokenRequest = IssueDeliveryTokenRequest {
        delivery_id,
        recipient_id: req.recipient_id,
    };

    let store = app_state.store.lock().await;
    let response: IssueDeliveryTokenResponse = issue_delivery_token(&store, &api_request)?;
    drop(store);

    Ok(Json(response))
}

/// Handler for POST `/deliveries/{delivery_id}/confirm` endpoint.
///
/// Confirms an in-transit delivery by QR scan or manual form. The first
/// confirmation wins; repeats are conflicts.
async fn handle_confirm_delivery(
    AxumState(app_state): AxumState<AppState>,
    Path(delivery_id): Path<i64>,
    Json(req): Json<ConfirmDeliveryApiRequest>,
) -> Result<Json<WriteResponse<ConfirmDeliveryResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        delivery_id,
        by_token = req.token.is_some(),
        "Handling confirm_delivery request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: ConfirmDeliveryRequest = ConfirmDeliveryRequest {
        delivery_id,
        token: req.token,
        manual: req.manual.map(|manual| ManualConfirmationInput {
            recipient_id: manual.recipient_id,
            recipient_name: manual.recipient_name,
            recipient_role: manual.recipient_role,
        }),
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<ConfirmDeliveryResponse> = confirm_delivery(
        &mut store,
        &app_state.ledger,
        api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        delivery_id,
        method = %result.response.method,
        "Successfully confirmed delivery"
    );

    app_state.events.broadcast(&LiveEvent::DeliveryConfirmed {
        delivery_id,
        method: result.response.method.clone(),
    });

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/deliveries/{delivery_id}/fail` endpoint.
///
/// Records a delivery failure and restocks intact units.
async fn handle_report_delivery_failure(
    AxumState(app_state): AxumState<AppState>,
    Path(delivery_id): Path<i64>,
    Json(req): Json<ReportDeliveryFailureApiRequest>,
) -> Result<Json<WriteResponse<ReportDeliveryFailureResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        delivery_id,
        reason = %req.reason,
        "Handling report_delivery_failure request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: ReportDeliveryFailureRequest = ReportDeliveryFailureRequest {
        delivery_id,
        reason: req.reason,
        consumed_unit_ids: req.consumed_unit_ids,
    };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<ReportDeliveryFailureResponse> = report_delivery_failure(
        &mut store,
        &app_state.ledger,
        &api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        delivery_id,
        restocked_ml = result.response.restocked_ml,
        "Successfully recorded delivery failure"
    );

    app_state.events.broadcast(&LiveEvent::DeliveryFailed {
        delivery_id,
        reason: api_request.reason.clone(),
    });

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/deliveries/{delivery_id}/cancel` endpoint.
///
/// Cancels a delivery that has not reached a terminal state.
async fn handle_cancel_delivery(
    AxumState(app_state): AxumState<AppState>,
    Path(delivery_id): Path<i64>,
    Json(req): Json<AuditedActionApiRequest>,
) -> Result<Json<WriteResponse<CancelDeliveryResponse>>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        delivery_id,
        "Handling cancel_delivery request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let api_request: CancelDeliveryRequest = CancelDeliveryRequest { delivery_id };

    let mut store = app_state.store.lock().await;
    let result: ApiResult<CancelDeliveryResponse> = cancel_delivery(
        &mut store,
        &app_state.ledger,
        &api_request,
        &actor,
        cause,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    info!(
        event_id = result.event_id,
        delivery_id, "Successfully cancelled delivery"
    );

    Ok(Json(WriteResponse {
        event_id: result.event_id,
        payload: result.response,
    }))
}

/// Handler for POST `/deliveries/{delivery_id}/location` endpoint.
///
/// Queues a transporter position report for asynchronous ingest. The
/// report is acknowledged once queued, not once applied.
async fn handle_push_location(
    AxumState(app_state): AxumState<AppState>,
    Path(delivery_id): Path<i64>,
    Json(req): Json<PushLocationApiRequest>,
) -> Result<(StatusCode, Json<LocationAckResponse>), HttpError> {
    debug!(delivery_id, "Handling push_location request");

    let update: LocationUpdate = LocationUpdate {
        delivery_id,
        latitude: req.latitude,
        longitude: req.longitude,
        recorded_at: req.recorded_at,
    };

    if app_state.locations.send(update).await.is_err() {
        return Err(HttpError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: String::from("Position ingest queue is closed"),
        });
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(LocationAckResponse {
            delivery_id,
            queued: true,
        }),
    ))
}

/// Handler for GET `/donations/{donation_id}` endpoint.
async fn handle_get_donation(
    AxumState(app_state): AxumState<AppState>,
    Path(donation_id): Path<i64>,
) -> Result<Json<GetDonationResponse>, HttpError> {
    info!(donation_id, "Handling get_donation request");

    let store = app_state.store.lock().await;
    let response: GetDonationResponse = get_donation(&store, donation_id)?;
    drop(store);

    Ok(Json(response))
}

/// Handler for GET `/requests/{request_id}` endpoint.
async fn handle_get_request(
    AxumState(app_state): AxumState<AppState>,
    Path(request_id): Path<i64>,
) -> Result<Json<GetRequestResponse>, HttpError> {
    info!(request_id, "Handling get_request request");

    let store = app_state.store.lock().await;
    let response: GetRequestResponse = get_request(&store, request_id)?;
    drop(store);

    Ok(Json(response))
}

/// Handler for GET `/campaigns/{campaign_id}` endpoint.
///
/// Reports the campaign as of now, so a campaign past its deadline reads
/// as expired even before a sweep persists that fact.
async fn handle_get_campaign(
    AxumState(app_state): AxumState<AppState>,
    Path(campaign_id): Path<i64>,
) -> Result<Json<GetCampaignResponse>, HttpError> {
    info!(campaign_id, "Handling get_campaign request");

    let store = app_state.store.lock().await;
    let response: GetCampaignResponse =
        get_campaign(&store, campaign_id, OffsetDateTime::now_utc())?;
    drop(store);

    Ok(Json(response))
}

/// Handler for GET `/deliveries/{delivery_id}` endpoint.
async fn handle_get_delivery(
    AxumState(app_state): AxumState<AppState>,
    Path(delivery_id): Path<i64>,
) -> Result<Json<GetDeliveryResponse>, HttpError> {
    info!(delivery_id, "Handling get_delivery request");

    let store = app_state.store.lock().await;
    let response: GetDeliveryResponse = get_delivery(&store, delivery_id)?;
    drop(store);

    Ok(Json(response))
}

/// Handler for GET `/facilities/{facility_id}/stock/available` endpoint.
///
/// Reports uncommitted stock for one (blood group, component) pairing.
async fn handle_get_available_stock(
    AxumState(app_state): AxumState<AppState>,
    Path(facility_id): Path<i64>,
    Query(query): Query<AvailableStockQuery>,
) -> Result<Json<AvailableStockResponse>, HttpError> {
    info!(
        facility_id,
        blood_group = %query.blood_group,
        component = %query.component,
        "Handling get_available_stock request"
    );

    let store = app_state.store.lock().await;
    let response: AvailableStockResponse = get_available(
        &store,
        &app_state.ledger,
        facility_id,
        &query.blood_group,
        &query.component,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    Ok(Json(response))
}

/// Handler for GET `/facilities/{facility_id}/stock` endpoint.
///
/// Reports every non-zero stock level at the facility.
async fn handle_list_stock(
    AxumState(app_state): AxumState<AppState>,
    Path(facility_id): Path<i64>,
) -> Result<Json<ListStockResponse>, HttpError> {
    info!(facility_id, "Handling list_stock request");

    let store = app_state.store.lock().await;
    let response: ListStockResponse = list_stock(
        &store,
        &app_state.ledger,
        facility_id,
        OffsetDateTime::now_utc(),
    )?;
    drop(store);

    Ok(Json(response))
}

/// Handler for GET `/facilities/{facility_id}/audit` endpoint.
///
/// Lists the audit trail of every state change scoped to the facility.
async fn handle_list_audit_events(
    AxumState(app_state): AxumState<AppState>,
    Path(facility_id): Path<i64>,
) -> Result<Json<ListAuditEventsResponse>, HttpError> {
    info!(facility_id, "Handling list_audit_events request");

    let store = app_state.store.lock().await;
    let response: ListAuditEventsResponse = list_facility_events(&store, facility_id)?;
    drop(store);

    Ok(Json(response))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/facilities", post(handle_register_facility))
        .route("/donors", post(handle_register_donor))
        .route("/donors/{donor_id}/health_check", post(handle_record_health_check))
        .route("/donors/{donor_id}/archive", post(handle_archive_donor))
        .route("/donations", post(handle_register_donation))
        .route("/donations/{donation_id}", get(handle_get_donation))
        .route("/donations/{donation_id}/start", post(handle_start_donation))
        .route("/donations/{donation_id}/vitals", post(handle_record_vital_signs))
        .route("/donations/{donation_id}/complete", post(handle_complete_donation))
        .route("/donations/{donation_id}/adverse_event", post(handle_report_adverse_event))
        .route("/donations/{donation_id}/cancel", post(handle_cancel_donation))
        .route("/donations/{donation_id}/split", post(handle_split_donation))
        .route("/donations/{donation_id}/void_split", post(handle_void_donation_split))
        .route("/units/{unit_id}/lab_result", post(handle_mark_unit_tested))
        .route("/requests", post(handle_submit_request))
        .route("/requests/{request_id}", get(handle_get_request))
        .route("/requests/{request_id}/component", post(handle_resolve_component))
        .route("/requests/{request_id}/evaluate", post(handle_evaluate_request))
        .route("/requests/{request_id}/reject", post(handle_reject_request))
        .route("/campaigns", post(handle_open_campaign))
        .route("/campaigns/{campaign_id}", get(handle_get_campaign))
        .route("/campaigns/{campaign_id}/pledges", post(handle_submit_pledge))
        .route("/campaigns/{campaign_id}/close", post(handle_close_campaign))
        .route("/pledges/{pledge_id}/review", post(handle_review_pledge))
        .route("/pledges/{pledge_id}/schedule", post(handle_schedule_pledged_donation))
        .route("/deliveries/{delivery_id}", get(handle_get_delivery))
        .route("/deliveries/{delivery_id}/transporter", post(handle_assign_transporter))
        .route("/deliveries/{delivery_id}/start", post(handle_start_delivery))
        .route("/deliveries/{delivery_id}/token", post(handle_issue_delivery_token))
        .route("/deliveries/{delivery_id}/confirm", post(handle_confirm_delivery))
        .route("/deliveries/{delivery_id}/fail", post(handle_report_delivery_failure))
        .route("/deliveries/{delivery_id}/cancel", post(handle_cancel_delivery))
        .route("/deliveries/{delivery_id}/location", post(handle_push_location))
        .route("/facilities/{facility_id}/stock", get(handle_list_stock))
        .route("/facilities/{facility_id}/stock/available", get(handle_get_available_stock))
        .route("/facilities/{facility_id}/audit", get(handle_list_audit_events))
        .route("/live", get(live_events_handler))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing HemoLink Server");

    let store: Arc<Mutex<Store>> = Arc::new(Mutex::new(Store::new()));
    let ledger: Arc<InventoryLedger> = Arc::new(InventoryLedger::new());
    let events: LiveEventBroadcaster = LiveEventBroadcaster::new();

    // Background position ingest
    let (location_tx, location_rx) = mpsc::channel::<LocationUpdate>(LOCATION_QUEUE_SIZE);
    tokio::spawn(run_location_ingest(
        Arc::clone(&store),
        location_rx,
        events.clone(),
    ));

    // Background expiry sweeps
    tokio::spawn(run_sweeps(
        Arc::clone(&store),
        Arc::clone(&ledger),
        events.clone(),
        args.sweep_interval_secs,
    ));

    let app_state: AppState = AppState {
        store,
        ledger,
        events,
        locations: location_tx,
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
