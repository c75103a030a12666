// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for the HemoLink blood supply system.
//!
//! Handlers translate request DTOs into core operations against the store
//! and the inventory ledger, translate every lower-layer error into the API
//! contract, and pair each successful state change with exactly one audit
//! event.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

mod error;
mod handlers;
mod request_response;
mod token;

#[cfg(test)]
mod tests;

pub use error::{
    ApiError, translate_core_error, translate_domain_error, translate_store_error,
};
pub use handlers::{
    ApiResult, archive_donor, assign_transporter, cancel_delivery, cancel_donation,
    close_campaign, complete_donation, confirm_delivery, evaluate_request, get_available,
    get_campaign, get_delivery, get_donation, get_request, issue_delivery_token,
    list_facility_events, list_stock, mark_unit_tested, open_campaign, push_location,
    record_health_check, record_vital_signs, register_donation, register_donor,
    register_facility, reject_request, report_adverse_event, report_delivery_failure,
    resolve_component, review_pledge, schedule_pledged_donation, split_donation,
    start_delivery, start_donation, submit_pledge, submit_request, void_donation_split,
};
pub use request_response::{
    ArchiveDonorRequest, ArchiveDonorResponse, AssignTransporterRequest,
    AssignTransporterResponse, AuditEventInfo, AvailableStockResponse, CancelDeliveryRequest,
    CancelDeliveryResponse, CancelDonationRequest, CancelDonationResponse, CloseCampaignRequest,
    CloseCampaignResponse, CompleteDonationRequest, CompleteDonationResponse,
    ConfirmDeliveryRequest, ConfirmDeliveryResponse, EvaluateRequestRequest,
    EvaluateRequestResponse, GetCampaignResponse, GetDeliveryResponse, GetDonationResponse,
    GetRequestResponse, IssueDeliveryTokenRequest, IssueDeliveryTokenResponse,
    ListAuditEventsResponse, ListStockResponse, LocationInfo, ManifestLineInfo,
    ManualConfirmationInput, MarkUnitTestedRequest, MarkUnitTestedResponse, OpenCampaignRequest,
    OpenCampaignResponse, PledgeInfo, PushLocationRequest, PushLocationResponse,
    RecordHealthCheckRequest, RecordHealthCheckResponse, RecordVitalSignsRequest,
    RecordVitalSignsResponse, RegisterDonationRequest, RegisterDonationResponse,
    RegisterDonorRequest, RegisterDonorResponse, RegisterFacilityRequest,
    RegisterFacilityResponse, RejectRequestRequest, RejectRequestResponse,
    ReportAdverseEventRequest, ReportAdverseEventResponse, ReportDeliveryFailureRequest,
    ReportDeliveryFailureResponse, ResolveComponentRequest, ResolveComponentResponse,
    ReviewPledgeRequest, ReviewPledgeResponse, SchedulePledgedDonationRequest,
    SchedulePledgedDonationResponse, SplitAllocationInput, SplitDonationRequest,
    SplitDonationResponse, StartDeliveryRequest, StartDeliveryResponse, StartDonationRequest,
    StartDonationResponse, StockLevelInfo, SubmitPledgeRequest, SubmitPledgeResponse,
    SubmitRequestRequest, SubmitRequestResponse, UnitInfo, VitalSignInfo,
    VoidDonationSplitRequest, VoidDonationSplitResponse,
};
pub use token::{TokenError, decode_token, encode_token, issue_confirmation_token};
