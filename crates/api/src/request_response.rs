// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.

use time::OffsetDateTime;

/// API request to register a new blood bank facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFacilityRequest {
    /// Display name of the facility.
    pub name: String,
    /// Minimum collected volume for a donation to complete, in milliliters.
    /// Defaults to the system-wide threshold when omitted.
    pub min_collection_ml: Option<u32>,
}

/// API response for a successful facility registration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegisterFacilityResponse {
    /// The canonical numeric identifier.
    pub facility_id: i64,
    /// Display name of the facility.
    pub name: String,
    /// The completion threshold in effect, in milliliters.
    pub min_collection_ml: u32,
    /// A success message.
    pub message: String,
}

/// API request to register a new donor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDonorRequest {
    /// Display name of the donor.
    pub name: String,
    /// The donor's blood group (e.g., "O+", "AB-").
    pub blood_group: String,
}

/// API response for a successful donor registration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegisterDonorResponse {
    /// The canonical numeric identifier.
    pub donor_id: i64,
    /// Display name of the donor.
    pub name: String,
    /// The donor's blood group.
    pub blood_group: String,
    /// A success message.
    pub message: String,
}

/// API request to record the outcome of a donor health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHealthCheckRequest {
    /// The donor who was examined.
    pub donor_id: i64,
    /// Whether the donor passed the check.
    pub passed: bool,
}

/// API response for a recorded health check.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RecordHealthCheckResponse {
    /// The donor who was examined.
    pub donor_id: i64,
    /// The donor's eligibility after the check.
    pub eligible: bool,
    /// A success message.
    pub message: String,
}

/// API request to archive a donor record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDonorRequest {
    /// The donor to archive.
    pub donor_id: i64,
}

/// API response for a successful donor archival.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArchiveDonorResponse {
    /// The archived donor.
    pub donor_id: i64,
    /// A success message.
    pub message: String,
}

/// API request to register a new donation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDonationRequest {
    /// The donor giving blood.
    pub donor_id: i64,
    /// The facility hosting the collection.
    pub facility_id: i64,
    /// Volume the session aims to collect, in milliliters.
    pub target_quantity_ml: u32,
}

/// API response for a successful donation registration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegisterDonationResponse {
    /// The canonical numeric identifier.
    pub donation_id: i64,
    /// The donor giving blood.
    pub donor_id: i64,
    /// The facility hosting the collection.
    pub facility_id: i64,
    /// The donation's lifecycle status.
    pub status: String,
    /// A success message.
    pub message: String,
}

/// API request to start a registered donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartDonationRequest {
    /// The donation to start.
    pub donation_id: i64,
}

/// API response for a started donation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StartDonationResponse {
    /// The started donation.
    pub donation_id: i64,
    /// The donation's lifecycle status.
    pub status: String,
    /// A success message.
    pub message: String,
}

/// API request to append a vital-sign reading to an in-progress donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordVitalSignsRequest {
    /// The donation being monitored.
    pub donation_id: i64,
    /// The session phase ("donation", "resting", "post_rest_check").
    pub phase: String,
    /// Pulse, in beats per minute.
    pub pulse_bpm: u16,
    /// Systolic blood pressure, in mmHg.
    pub systolic_mmhg: u16,
    /// Diastolic blood pressure, in mmHg.
    pub diastolic_mmhg: u16,
    /// Free-form observation by the attending staff member.
    pub note: Option<String>,
}

/// API response for a recorded vital-sign reading.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RecordVitalSignsResponse {
    /// The donation being monitored.
    pub donation_id: i64,
    /// Number of entries in the vital log after the append.
    pub entries: usize,
    /// A success message.
    pub message: String,
}

/// API request to complete an in-progress donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteDonationRequest {
    /// The donation to complete.
    pub donation_id: i64,
    /// Volume actually collected, in milliliters.
    pub collected_ml: u32,
}

/// API response for a completed donation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CompleteDonationResponse {
    /// The completed donation.
    pub donation_id: i64,
    /// The donation's lifecycle status.
    pub status: String,
    /// Volume actually collected, in milliliters.
    pub collected_quantity_ml: u32,
    /// A success message.
    pub message: String,
}

/// API request to abort an in-progress donation for medical reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportAdverseEventRequest {
    /// The donation being aborted.
    pub donation_id: i64,
    /// Medical note describing the event.
    pub note: Option<String>,
}

/// API response for a reported adverse event.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReportAdverseEventResponse {
    /// The aborted donation.
    pub donation_id: i64,
    /// The donation's lifecycle status.
    pub status: String,
    /// The donor's eligibility after the event.
    pub donor_eligible: bool,
    /// A success message.
    pub message: String,
}

/// API request to cancel a donation before completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelDonationRequest {
    /// The donation to cancel.
    pub donation_id: i64,
}

/// API response for a cancelled donation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CancelDonationResponse {
    /// The cancelled donation.
    pub donation_id: i64,
    /// The donation's lifecycle status.
    pub status: String,
    /// A success message.
    pub message: String,
}

/// One vital-sign reading, as returned by donation queries.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VitalSignInfo {
    /// The session phase of the reading.
    pub phase: String,
    /// Pulse, in beats per minute.
    pub pulse_bpm: u16,
    /// Systolic blood pressure, in mmHg.
    pub systolic_mmhg: u16,
    /// Diastolic blood pressure, in mmHg.
    pub diastolic_mmhg: u16,
    /// Free-form observation by the attending staff member.
    pub note: Option<String>,
    /// When the reading was taken.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

/// API response for a donation query.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GetDonationResponse {
    /// The canonical numeric identifier.
    pub donation_id: i64,
    /// The donor giving blood.
    pub donor_id: i64,
    /// The facility hosting the collection.
    pub facility_id: i64,
    /// Blood group of the donor at registration time.
    pub blood_group: String,
    /// The donation's lifecycle status.
    pub status: String,
    /// Volume the session aims to collect, in milliliters.
    pub target_quantity_ml: u32,
    /// Volume actually collected, in milliliters.
    pub collected_quantity_ml: u32,
    /// Whether the donation has been split into components.
    pub is_split: bool,
    /// The append-only vital-sign log, in recording order.
    pub vital_log: Vec<VitalSignInfo>,
}

/// One component cut requested from a completed donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAllocationInput {
    /// The component to produce (e.g., "plasma", "red_cells").
    pub component: String,
    /// The volume of the cut, in milliliters.
    pub quantity_ml: u32,
}

/// API request to split a completed donation into component units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDonationRequest {
    /// The donation to split.
    pub donation_id: i64,
    /// The component cuts to produce.
    pub allocations: Vec<SplitAllocationInput>,
}

/// One blood unit, as returned by split and inventory operations.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UnitInfo {
    /// The ledger-assigned unit identifier.
    pub unit_id: i64,
    /// The donation the unit was split from.
    pub donation_id: i64,
    /// The component in the bag.
    pub component: String,
    /// Volume in the bag, in milliliters.
    pub quantity_ml: u32,
    /// The unit's inventory status.
    pub status: String,
    /// When the unit stops being transfusable.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// API response for a successful donation split.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SplitDonationResponse {
    /// The split donation.
    pub donation_id: i64,
    /// The units minted by the split, in registration order.
    pub units: Vec<UnitInfo>,
    /// A success message.
    pub message: String,
}

/// API request to void a mis-entered split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoidDonationSplitRequest {
    /// The donation whose split is being voided.
    pub donation_id: i64,
}

/// API response for a voided split.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VoidDonationSplitResponse {
    /// The donation whose split was voided.
    pub donation_id: i64,
    /// The units rejected by the void, in ascending order.
    pub voided_unit_ids: Vec<i64>,
    /// A success message.
    pub message: String,
}

/// API request to record a lab result for a unit in testing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkUnitTestedRequest {
    /// The unit the lab examined.
    pub unit_id: i64,
    /// Whether the unit passed screening.
    pub passed: bool,
}

/// API response for a recorded lab result.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MarkUnitTestedResponse {
    /// The unit the lab examined.
    pub unit_id: i64,
    /// The unit's inventory status after the result.
    pub status: String,
    /// A success message.
    pub message: String,
}

/// API request to submit a blood request for a facility to fulfill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequestRequest {
    /// The requesting party (clinician or coordinator).
    pub requester_id: i64,
    /// The facility that must fulfill the request.
    pub facility_id: i64,
    /// Required blood group (e.g., "O+", "AB-").
    pub blood_group: String,
    /// Required component, if already known.
    pub component: Option<String>,
    /// Required volume, in milliliters.
    pub quantity_ml: u32,
    /// Whether the request is flagged urgent.
    pub is_urgent: bool,
}

/// API response for a submitted blood request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubmitRequestResponse {
    /// The canonical numeric identifier.
    pub request_id: i64,
    /// The facility that must fulfill the request.
    pub facility_id: i64,
    /// The request's lifecycle status.
    pub status: String,
    /// A success message.
    pub message: String,
}

/// API request to resolve the component of a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveComponentRequest {
    /// The request whose component is being resolved.
    pub request_id: i64,
    /// The resolved component.
    pub component: String,
}

/// API response for a resolved component.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResolveComponentResponse {
    /// The request whose component was resolved.
    pub request_id: i64,
    /// The resolved component.
    pub component: String,
    /// A success message.
    pub message: String,
}

/// API request to evaluate a request against available stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluateRequestRequest {
    /// The request to evaluate.
    pub request_id: i64,
}

/// API response for an evaluated request.
///
/// The decision is data, not an error: a shortfall reports `needs_support`
/// with the missing volume, and a rejection carries its reason.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EvaluateRequestResponse {
    /// The evaluated request.
    pub request_id: i64,
    /// The request's lifecycle status after the decision.
    pub status: String,
    /// The matcher's verdict ("approved", "rejected", "needs_support").
    pub decision: String,
    /// Why the request was rejected, when it was.
    pub reject_reason: Option<String>,
    /// The missing volume in milliliters, when stock cannot cover it.
    pub shortfall_ml: Option<u32>,
    /// The ledger reservation backing an approval.
    pub reservation_id: Option<i64>,
    /// The delivery created for an approval.
    pub delivery_id: Option<i64>,
    /// A success message.
    pub message: String,
}

/// API request to reject a request outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectRequestRequest {
    /// The request to reject.
    pub request_id: i64,
    /// The rejection reason (e.g., "duplicate_request").
    pub reason: String,
}

/// API response for a rejected request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RejectRequestResponse {
    /// The rejected request.
    pub request_id: i64,
    /// The request's lifecycle status.
    pub status: String,
    /// The recorded rejection reason.
    pub reason: String,
    /// A success message.
    pub message: String,
}

/// API response for a blood request query.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GetRequestResponse {
    /// The canonical numeric identifier.
    pub request_id: i64,
    /// The requesting party.
    pub requester_id: i64,
    /// The facility that must fulfill the request.
    pub facility_id: i64,
    /// Required blood group.
    pub blood_group: String,
    /// Required component, once resolved.
    pub component: Option<String>,
    /// Required volume, in milliliters.
    pub quantity_ml: u32,
    /// Whether the request is flagged urgent.
    pub is_urgent: bool,
    /// The request's lifecycle status.
    pub status: String,
    /// The ledger reservation backing an approval, while one is held.
    pub reservation_id: Option<i64>,
    /// Why the request was rejected, once it is.
    pub reject_reason: Option<String>,
    /// When the request was submitted.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// API response for an availability query on one stock bucket.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AvailableStockResponse {
    /// The facility whose stock was queried.
    pub facility_id: i64,
    /// The queried blood group.
    pub blood_group: String,
    /// The queried component.
    pub component: String,
    /// Screened, unexpired, unreserved volume in milliliters.
    pub available_ml: u32,
}

/// Available volume for one `(blood group, component)` pair.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StockLevelInfo {
    /// The blood group of the stock.
    pub blood_group: String,
    /// The component of the stock.
    pub component: String,
    /// Screened, unexpired, unreserved volume in milliliters.
    pub available_ml: u32,
}

/// API response listing every stock level at one facility.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListStockResponse {
    /// The facility whose stock was listed.
    pub facility_id: i64,
    /// Stock levels in stable `(blood group, component)` order.
    pub levels: Vec<StockLevelInfo>,
}

/// API request to open an emergency campaign for an unfulfillable request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenCampaignRequest {
    /// The request the campaign is trying to fulfill.
    pub request_id: i64,
    /// Shortfall the campaign needs to cover, in milliliters.
    pub quantity_needed_ml: u32,
    /// Hard deadline after which the campaign expires.
    pub deadline: OffsetDateTime,
}

/// API response for an opened campaign.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OpenCampaignResponse {
    /// The canonical numeric identifier.
    pub campaign_id: i64,
    /// The request the campaign is trying to fulfill.
    pub request_id: i64,
    /// The campaign's lifecycle status.
    pub status: String,
    /// A success message.
    pub message: String,
}

/// API request to pledge support to an open campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitPledgeRequest {
    /// The campaign the pledge answers.
    pub campaign_id: i64,
    /// The volunteering donor.
    pub volunteer_donor_id: i64,
}

/// API response for a submitted pledge.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubmitPledgeResponse {
    /// The canonical numeric identifier.
    pub pledge_id: i64,
    /// The campaign the pledge answers.
    pub campaign_id: i64,
    /// The pledge's review status.
    pub status: String,
    /// A success message.
    pub message: String,
}

/// API request to review a pending pledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPledgeRequest {
    /// The pledge under review.
    pub pledge_id: i64,
    /// Whether staff approve the pledge.
    pub approve: bool,
}

/// API response for a reviewed pledge.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReviewPledgeResponse {
    /// The reviewed pledge.
    pub pledge_id: i64,
    /// The pledge's review status.
    pub status: String,
    /// A success message.
    pub message: String,
}

/// API request to schedule a donation for an approved pledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulePledgedDonationRequest {
    /// The approved pledge being converted into a session.
    pub pledge_id: i64,
    /// Volume the session aims to collect, in milliliters.
    pub target_quantity_ml: u32,
}

/// API response for a scheduled pledged donation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SchedulePledgedDonationResponse {
    /// The pledge that was converted.
    pub pledge_id: i64,
    /// The donation session created for the volunteer.
    pub donation_id: i64,
    /// The volunteering donor.
    pub donor_id: i64,
    /// The facility that will host the collection.
    pub facility_id: i64,
    /// A success message.
    pub message: String,
}

/// API request to close a campaign manually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseCampaignRequest {
    /// The campaign to close.
    pub campaign_id: i64,
}

/// API response for a closed campaign.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CloseCampaignResponse {
    /// The closed campaign.
    pub campaign_id: i64,
    /// The campaign's lifecycle status.
    pub status: String,
    /// A success message.
    pub message: String,
}

/// One support pledge, as returned by campaign queries.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PledgeInfo {
    /// The canonical numeric identifier.
    pub pledge_id: i64,
    /// The volunteering donor.
    pub volunteer_donor_id: i64,
    /// The pledge's review status.
    pub status: String,
    /// When the pledge was made.
    #[serde(with = "time::serde::rfc3339")]
    pub pledged_at: OffsetDateTime,
}

/// API response for a campaign query.
///
/// The status is the effective one: an open campaign past its deadline reads
/// as expired even before the sweep persists the transition.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GetCampaignResponse {
    /// The canonical numeric identifier.
    pub campaign_id: i64,
    /// The request the campaign is trying to fulfill.
    pub request_id: i64,
    /// The facility that will collect pledged donations.
    pub facility_id: i64,
    /// Blood group being sought.
    pub blood_group: String,
    /// Component being sought.
    pub component: String,
    /// Shortfall the campaign needs to cover, in milliliters.
    pub quantity_needed_ml: u32,
    /// Hard deadline after which the campaign expires.
    #[serde(with = "time::serde::rfc3339")]
    pub deadline: OffsetDateTime,
    /// The campaign's effective lifecycle status.
    pub status: String,
    /// Pledges made to the campaign, in submission order.
    pub pledges: Vec<PledgeInfo>,
}

/// API request to assign a transporter to a pending delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignTransporterRequest {
    /// The delivery being staffed.
    pub delivery_id: i64,
    /// The transporter taking the shipment.
    pub transporter_id: i64,
}

/// API response for an assigned transporter.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AssignTransporterResponse {
    /// The staffed delivery.
    pub delivery_id: i64,
    /// The assigned transporter.
    pub transporter_id: i64,
    /// A success message.
    pub message: String,
}

/// API request to mark a delivery as departed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartDeliveryRequest {
    /// The departing delivery.
    pub delivery_id: i64,
}

/// API response for a departed delivery.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StartDeliveryResponse {
    /// The departed delivery.
    pub delivery_id: i64,
    /// The delivery's lifecycle status.
    pub status: String,
    /// A success message.
    pub message: String,
}

/// API request to issue a QR confirmation token for an in-transit delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDeliveryTokenRequest {
    /// The delivery the token will confirm.
    pub delivery_id: i64,
    /// The recipient the token is issued to.
    pub recipient_id: i64,
}

/// API response carrying an issued confirmation token.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IssueDeliveryTokenResponse {
    /// The delivery the token confirms.
    pub delivery_id: i64,
    /// The opaque token string.
    pub token: String,
    /// A success message.
    pub message: String,
}

/// The manual fallback form, for when scanning is impossible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualConfirmationInput {
    /// The recipient confirming the delivery.
    pub recipient_id: i64,
    /// Name of the person who signed for the shipment.
    pub recipient_name: String,
    /// Their role at the destination.
    pub recipient_role: String,
}

/// API request to confirm a delivery at the destination.
///
/// Exactly one proof must be presented: a scanned QR token or the manual
/// fallback form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDeliveryRequest {
    /// The delivery being confirmed.
    pub delivery_id: i64,
    /// The scanned QR token, when confirming by scan.
    pub token: Option<String>,
    /// The manual form, when confirming without a scan.
    pub manual: Option<ManualConfirmationInput>,
}

/// API response for a confirmed delivery.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConfirmDeliveryResponse {
    /// The confirmed delivery.
    pub delivery_id: i64,
    /// The fulfilled request.
    pub request_id: i64,
    /// The delivery's lifecycle status.
    pub status: String,
    /// How the confirmation was made ("qr_scan" or "manual_form").
    pub method: String,
    /// A success message.
    pub message: String,
}

/// API request to fail an in-transit delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDeliveryFailureRequest {
    /// The failing delivery.
    pub delivery_id: i64,
    /// The structured failure reason (e.g., "vehicle_breakdown").
    pub reason: String,
    /// Units lost or spoiled in transit; everything else is restocked.
    pub consumed_unit_ids: Vec<i64>,
}

/// API response for a failed delivery.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReportDeliveryFailureResponse {
    /// The failed delivery.
    pub delivery_id: i64,
    /// The delivery's lifecycle status.
    pub status: String,
    /// The request's lifecycle status after the failure.
    pub request_status: String,
    /// Volume returned to available stock, in milliliters.
    pub restocked_ml: u32,
    /// A success message.
    pub message: String,
}

/// API request to cancel a delivery that has not ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelDeliveryRequest {
    /// The delivery to cancel.
    pub delivery_id: i64,
}

/// API response for a cancelled delivery.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CancelDeliveryResponse {
    /// The cancelled delivery.
    pub delivery_id: i64,
    /// The delivery's lifecycle status.
    pub status: String,
    /// Volume returned to available stock, in milliliters.
    pub restocked_ml: u32,
    /// A success message.
    pub message: String,
}

/// API request to report a transporter position for a delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct PushLocationRequest {
    /// The delivery being tracked.
    pub delivery_id: i64,
    /// Latitude of the report, in degrees.
    pub latitude: f64,
    /// Longitude of the report, in degrees.
    pub longitude: f64,
    /// When the position was recorded at the source.
    pub recorded_at: OffsetDateTime,
}

/// API response for a location report.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PushLocationResponse {
    /// The tracked delivery.
    pub delivery_id: i64,
    /// Whether the report advanced the last known position. Stale reports
    /// are ignored without error.
    pub applied: bool,
    /// A success message.
    pub message: String,
}

/// A transporter position, as returned by delivery queries.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LocationInfo {
    /// Latitude of the report, in degrees.
    pub latitude: f64,
    /// Longitude of the report, in degrees.
    pub longitude: f64,
    /// When the position was recorded at the source.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

/// One reserved unit on a delivery manifest.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ManifestLineInfo {
    /// The reserved unit.
    pub unit_id: i64,
    /// The unit's volume, in milliliters.
    pub quantity_ml: u32,
}

/// API response for a delivery query.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GetDeliveryResponse {
    /// The canonical numeric identifier.
    pub delivery_id: i64,
    /// The request the delivery fulfills.
    pub request_id: i64,
    /// The destination facility.
    pub facility_id: i64,
    /// The ledger reservation backing the manifest.
    pub reservation_id: i64,
    /// The assigned transporter, once there is one.
    pub transporter_id: Option<i64>,
    /// The delivery's lifecycle status.
    pub status: String,
    /// The reserved units on board.
    pub manifest: Vec<ManifestLineInfo>,
    /// Total volume on the manifest, in milliliters.
    pub total_quantity_ml: u64,
    /// Most recent position report, by source timestamp.
    pub last_location: Option<LocationInfo>,
    /// How the delivery was confirmed, once it is.
    pub confirmation_method: Option<String>,
    /// Why the delivery failed, if it did.
    pub failure_reason: Option<String>,
}

/// One audit event, as returned by audit queries.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuditEventInfo {
    /// The actor who initiated the change.
    pub actor_id: String,
    /// The type of actor.
    pub actor_type: String,
    /// The cause identifier.
    pub cause_id: String,
    /// The cause description.
    pub cause_description: String,
    /// The action that was performed.
    pub action: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
    /// The state before the transition.
    pub before: String,
    /// The state after the transition.
    pub after: String,
}

/// API response listing the audit events scoped to one facility.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListAuditEventsResponse {
    /// The facility whose events were listed.
    pub facility_id: i64,
    /// The facility's events, oldest first.
    pub events: Vec<AuditEventInfo>,
}
