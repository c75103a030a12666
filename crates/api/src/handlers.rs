// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! Every state-changing handler returns an [`ApiResult`] pairing the
//! response with the audit event it recorded. Read-only handlers return
//! plain responses. Handlers own the persistence choreography: core
//! functions decide, the store remembers, the ledger moves stock.

use hemolink::{
    ConfirmationProof, Decision, Evaluation, InventoryLedger, LocationOutcome, SplitAllocation,
    StockLevel, dispatch, escalation, lifecycle, matcher, splitter,
};
use hemolink_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use hemolink_domain::{
    BloodComponent, BloodGroup, BloodRequest, BloodUnit, CampaignStatus, ConfirmationMethod,
    Delivery, DeliveryStatus, Donation, DonationPhase, Donor, EmergencyCampaign, Facility,
    FacilityConfig, FailureReason, RejectReason, SupportPledge, VitalSignEntry, validate_name,
    validate_quantity,
};
use hemolink_store::Store;
use time::OffsetDateTime;

use crate::error::{ApiError, translate_core_error, translate_domain_error, translate_store_error};
use crate::request_response::{
    ArchiveDonorRequest, ArchiveDonorResponse, AssignTransporterRequest, AssignTransporterResponse,
    AuditEventInfo, AvailableStockResponse, CancelDeliveryRequest, CancelDeliveryResponse,
    CancelDonationRequest, CancelDonationResponse, CloseCampaignRequest, CloseCampaignResponse,
    CompleteDonationRequest, CompleteDonationResponse, ConfirmDeliveryRequest,
    ConfirmDeliveryResponse, EvaluateRequestRequest, EvaluateRequestResponse, GetCampaignResponse,
    GetDeliveryResponse, GetDonationResponse, GetRequestResponse, IssueDeliveryTokenRequest,
    IssueDeliveryTokenResponse, ListAuditEventsResponse, ListStockResponse, LocationInfo,
    ManifestLineInfo, MarkUnitTestedRequest, MarkUnitTestedResponse, OpenCampaignRequest,
    OpenCampaignResponse, PledgeInfo, PushLocationRequest, PushLocationResponse,
    RecordHealthCheckRequest, RecordHealthCheckResponse, RecordVitalSignsRequest,
    RecordVitalSignsResponse, RegisterDonationRequest, RegisterDonationResponse,
    RegisterDonorRequest, RegisterDonorResponse, RegisterFacilityRequest,
    RegisterFacilityResponse, RejectRequestRequest, RejectRequestResponse,
    ReportAdverseEventRequest, ReportAdverseEventResponse, ReportDeliveryFailureRequest,
    ReportDeliveryFailureResponse, ResolveComponentRequest, ResolveComponentResponse,
    ReviewPledgeRequest, ReviewPledgeResponse, SchedulePledgedDonationRequest,
    SchedulePledgedDonationResponse, SplitDonationRequest, SplitDonationResponse,
    StartDeliveryRequest, StartDeliveryResponse, StartDonationRequest, StartDonationResponse,
    StockLevelInfo, SubmitPledgeRequest, SubmitPledgeResponse, SubmitRequestRequest,
    SubmitRequestResponse, UnitInfo, VitalSignInfo, VoidDonationSplitRequest,
    VoidDonationSplitResponse,
};
use crate::token::{decode_token, issue_confirmation_token};

/// The result of an API operation that includes both the response and the audit event.
///
/// This ensures that successful API operations always produce an audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResult<T> {
    /// The API response.
    pub response: T,
    /// The audit event generated by this operation.
    pub audit_event: AuditEvent,
    /// The registry id the audit event was stored under.
    pub event_id: i64,
}

/// Records the audit event and pairs it with the response.
fn audited<T>(store: &mut Store, response: T, event: AuditEvent) -> ApiResult<T> {
    let event_id: i64 = store.record_event(event.clone());
    ApiResult {
        response,
        audit_event: event,
        event_id,
    }
}

/// Unwraps a registry id that persistence must have assigned.
fn registry_id(id: Option<i64>, entity: &str) -> Result<i64, ApiError> {
    id.ok_or_else(|| ApiError::Internal {
        message: format!("{entity} record has no registry id"),
    })
}

fn unit_info(unit: &BloodUnit) -> UnitInfo {
    UnitInfo {
        unit_id: unit.id().unwrap_or_default(),
        donation_id: unit.donation_id,
        component: unit.component.to_string(),
        quantity_ml: unit.quantity_ml,
        status: unit.status.to_string(),
        expires_at: unit.expires_at,
    }
}

/// Registers a new blood bank facility.
///
/// This function:
/// 1. Validates the facility name
/// 2. Builds the operating configuration, falling back to the default
///    completion threshold when none is given
/// 3. Persists the facility and records an audit event
///
/// # Arguments
///
/// * `store` - The registry to persist into
/// * `request` - The registration request
/// * `actor` - The staff member performing the action
/// * `cause` - The reason for the change
///
/// # Returns
///
/// * `Ok(ApiResult<RegisterFacilityResponse>)` - The registered facility and its audit event
/// * `Err(ApiError)` - If validation fails
///
/// # Errors
///
/// Returns an error if:
/// - The facility name is empty or whitespace
pub fn register_facility(
    store: &mut Store,
    request: RegisterFacilityRequest,
    actor: &Actor,
    cause: Cause,
) -> Result<ApiResult<RegisterFacilityResponse>, ApiError> {
    validate_name(&request.name).map_err(translate_domain_error)?;

    let config: FacilityConfig = request
        .min_collection_ml
        .map_or_else(FacilityConfig::default, FacilityConfig::new);
    let stored: Facility = store.insert_facility(Facility::new(request.name, config));
    let facility_id: i64 = registry_id(stored.id(), "facility")?;

    let action: Action = Action::new(
        String::from("RegisterFacility"),
        Some(format!("Registered facility '{}'", stored.name)),
    );
    let before: StateSnapshot = StateSnapshot::absent();
    let after: StateSnapshot = StateSnapshot::new(format!(
        "facility_id={facility_id},min_collection_ml={}",
        stored.config.min_collection_ml
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(facility_id),
        before,
        after,
    );

    let response: RegisterFacilityResponse = RegisterFacilityResponse {
        facility_id,
        name: stored.name.clone(),
        min_collection_ml: stored.config.min_collection_ml,
        message: format!("Facility '{}' registered", stored.name),
    };
    Ok(audited(store, response, event))
}

/// Registers a new donor.
///
/// This function:
/// 1. Validates the donor name and blood group
/// 2. Persists the donor, who starts eligible
/// 3. Records an audit event
///
/// # Arguments
///
/// * `store` - The registry to persist into
/// * `request` - The registration request
/// * `actor` - The staff member performing the action
/// * `cause` - The reason for the change
/// * `now` - The registration timestamp
///
/// # Returns
///
/// * `Ok(ApiResult<RegisterDonorResponse>)` - The registered donor and its audit event
/// * `Err(ApiError)` - If validation fails
///
/// # Errors
///
/// Returns an error if:
/// - The donor name is empty or whitespace
/// - The blood group is not one of the eight recognized groups
pub fn register_donor(
    store: &mut Store,
    request: RegisterDonorRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<RegisterDonorResponse>, ApiError> {
    validate_name(&request.name).map_err(translate_domain_error)?;
    let blood_group: BloodGroup = request.blood_group.parse().map_err(translate_domain_error)?;

    let stored: Donor = store.insert_donor(Donor::new(request.name, blood_group, now));
    let donor_id: i64 = registry_id(stored.id(), "donor")?;

    let action: Action = Action::new(
        String::from("RegisterDonor"),
        Some(format!("Registered donor '{}' ({blood_group})", stored.name)),
    );
    let before: StateSnapshot = StateSnapshot::absent();
    let after: StateSnapshot =
        StateSnapshot::new(format!("donor_id={donor_id},eligible=true,archived=false"));
    let event: AuditEvent = AuditEvent::new(actor.clone(), cause, action, None, before, after);

    let response: RegisterDonorResponse = RegisterDonorResponse {
        donor_id,
        name: stored.name.clone(),
        blood_group: blood_group.to_string(),
        message: format!("Donor '{}' registered", stored.name),
    };
    Ok(audited(store, response, event))
}

/// Records the outcome of a donor health check, setting eligibility.
///
/// # Errors
///
/// Returns an error if the donor does not exist, is archived, or the write
/// loses a version race.
pub fn record_health_check(
    store: &mut Store,
    request: &RecordHealthCheckRequest,
    actor: &Actor,
    cause: Cause,
) -> Result<ApiResult<RecordHealthCheckResponse>, ApiError> {
    let donor: Donor = store
        .get_donor(request.donor_id)
        .map_err(translate_store_error)?;
    let checked: Donor =
        lifecycle::apply_health_check(&donor, request.passed).map_err(translate_core_error)?;
    let stored: Donor = store
        .update_donor(&checked)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(
        String::from("RecordHealthCheck"),
        Some(format!(
            "Health check {}",
            if request.passed { "passed" } else { "failed" }
        )),
    );
    let before: StateSnapshot = StateSnapshot::new(format!(
        "donor_id={},eligible={}",
        request.donor_id, donor.eligible
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "donor_id={},eligible={}",
        request.donor_id, stored.eligible
    ));
    let event: AuditEvent = AuditEvent::new(actor.clone(), cause, action, None, before, after);

    let response: RecordHealthCheckResponse = RecordHealthCheckResponse {
        donor_id: request.donor_id,
        eligible: stored.eligible,
        message: format!(
            "Donor {} is now {}",
            request.donor_id,
            if stored.eligible {
                "eligible"
            } else {
                "ineligible"
            }
        ),
    };
    Ok(audited(store, response, event))
}

/// Soft-archives a donor. Their history stays attributable; new donations
/// and pledges are refused.
///
/// # Errors
///
/// Returns an error if the donor does not exist, is already archived, or the
/// write loses a version race.
pub fn archive_donor(
    store: &mut Store,
    request: &ArchiveDonorRequest,
    actor: &Actor,
    cause: Cause,
) -> Result<ApiResult<ArchiveDonorResponse>, ApiError> {
    let donor: Donor = store
        .get_donor(request.donor_id)
        .map_err(translate_store_error)?;
    let archived: Donor = lifecycle::archive_donor(&donor).map_err(translate_core_error)?;
    store
        .update_donor(&archived)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(String::from("ArchiveDonor"), None);
    let before: StateSnapshot =
        StateSnapshot::new(format!("donor_id={},archived=false", request.donor_id));
    let after: StateSnapshot =
        StateSnapshot::new(format!("donor_id={},archived=true", request.donor_id));
    let event: AuditEvent = AuditEvent::new(actor.clone(), cause, action, None, before, after);

    let response: ArchiveDonorResponse = ArchiveDonorResponse {
        donor_id: request.donor_id,
        message: format!("Donor {} archived", request.donor_id),
    };
    Ok(audited(store, response, event))
}

/// Registers a donation appointment for an eligible donor.
///
/// This function:
/// 1. Validates the target quantity
/// 2. Refuses archived or ineligible donors
/// 3. Persists a `registered` donation carrying the donor's blood group
/// 4. Records an audit event scoped to the hosting facility
///
/// # Arguments
///
/// * `store` - The registry to persist into
/// * `request` - The registration request
/// * `actor` - The staff member performing the action
/// * `cause` - The reason for the change
/// * `now` - The registration timestamp
///
/// # Returns
///
/// * `Ok(ApiResult<RegisterDonationResponse>)` - The registered donation and its audit event
/// * `Err(ApiError)` - If validation fails or the donor cannot donate
///
/// # Errors
///
/// Returns an error if:
/// - The target quantity is zero
/// - The donor or facility does not exist
/// - The donor is archived or ineligible
pub fn register_donation(
    store: &mut Store,
    request: &RegisterDonationRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<RegisterDonationResponse>, ApiError> {
    validate_quantity(request.target_quantity_ml).map_err(translate_domain_error)?;

    let donor: Donor = store
        .get_donor(request.donor_id)
        .map_err(translate_store_error)?;
    store
        .get_facility(request.facility_id)
        .map_err(translate_store_error)?;
    if donor.archived {
        return Err(translate_domain_error(
            hemolink_domain::DomainError::DonorArchived {
                donor_id: request.donor_id,
            },
        ));
    }
    if !donor.eligible {
        return Err(translate_domain_error(
            hemolink_domain::DomainError::IneligibleDonor {
                donor_id: request.donor_id,
            },
        ));
    }

    let stored: Donation = store.insert_donation(Donation::new(
        request.donor_id,
        request.facility_id,
        donor.blood_group,
        request.target_quantity_ml,
        now,
    ));
    let donation_id: i64 = registry_id(stored.id(), "donation")?;

    let action: Action = Action::new(
        String::from("RegisterDonation"),
        Some(format!(
            "Registered a {} ml donation for donor {}",
            request.target_quantity_ml, request.donor_id
        )),
    );
    let before: StateSnapshot = StateSnapshot::absent();
    let after: StateSnapshot =
        StateSnapshot::new(format!("donation_id={donation_id},status=registered"));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(request.facility_id),
        before,
        after,
    );

    let response: RegisterDonationResponse = RegisterDonationResponse {
        donation_id,
        donor_id: request.donor_id,
        facility_id: request.facility_id,
        status: stored.status.to_string(),
        message: format!(
            "Donation {donation_id} registered for donor {}",
            request.donor_id
        ),
    };
    Ok(audited(store, response, event))
}

/// Moves a registered donation into collection.
///
/// # Errors
///
/// Returns an error if the donation or donor does not exist, the donor can
/// no longer donate, the transition is invalid, or the write loses a
/// version race.
pub fn start_donation(
    store: &mut Store,
    request: &StartDonationRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<StartDonationResponse>, ApiError> {
    let donation: Donation = store
        .get_donation(request.donation_id)
        .map_err(translate_store_error)?;
    let donor: Donor = store
        .get_donor(donation.donor_id)
        .map_err(translate_store_error)?;
    let started: Donation =
        lifecycle::start(&donation, &donor, now).map_err(translate_core_error)?;
    let stored: Donation = store
        .update_donation(&started)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(String::from("StartDonation"), None);
    let before: StateSnapshot = StateSnapshot::new(format!(
        "donation_id={},status={}",
        request.donation_id, donation.status
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "donation_id={},status={}",
        request.donation_id, stored.status
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(donation.facility_id),
        before,
        after,
    );

    let response: StartDonationResponse = StartDonationResponse {
        donation_id: request.donation_id,
        status: stored.status.to_string(),
        message: format!("Donation {} is in progress", request.donation_id),
    };
    Ok(audited(store, response, event))
}

/// Appends a vital-sign entry to an in-progress donation's log.
///
/// Entries are append-only and must not move backwards through the
/// donation/resting/post-rest phases.
///
/// # Errors
///
/// Returns an error if the donation does not exist, the phase is unknown or
/// out of order, the log is closed, or the write loses a version race.
pub fn record_vital_signs(
    store: &mut Store,
    request: RecordVitalSignsRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<RecordVitalSignsResponse>, ApiError> {
    let donation: Donation = store
        .get_donation(request.donation_id)
        .map_err(translate_store_error)?;
    let phase: DonationPhase = request.phase.parse().map_err(translate_domain_error)?;
    let entry: VitalSignEntry = VitalSignEntry::new(
        phase,
        request.pulse_bpm,
        request.systolic_mmhg,
        request.diastolic_mmhg,
        request.note,
        now,
    );
    let updated: Donation =
        lifecycle::record_vitals(&donation, entry).map_err(translate_core_error)?;
    let stored: Donation = store
        .update_donation(&updated)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(
        String::from("RecordVitalSigns"),
        Some(format!("Recorded vitals for phase '{phase}'")),
    );
    let before: StateSnapshot = StateSnapshot::new(format!(
        "donation_id={},entries={}",
        request.donation_id,
        donation.vital_log.len()
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "donation_id={},entries={}",
        request.donation_id,
        stored.vital_log.len()
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(donation.facility_id),
        before,
        after,
    );

    let response: RecordVitalSignsResponse = RecordVitalSignsResponse {
        donation_id: request.donation_id,
        entries: stored.vital_log.len(),
        message: format!(
            "Recorded {phase} vitals for donation {}",
            request.donation_id
        ),
    };
    Ok(audited(store, response, event))
}

/// Completes an in-progress donation with the collected volume.
///
/// The hosting facility's minimum collection threshold applies. Completion
/// also credits the donation to the donor's tally.
///
/// # Errors
///
/// Returns an error if the donation, facility, or donor does not exist, the
/// volume is below the facility threshold, the transition is invalid, or a
/// write loses a version race.
pub fn complete_donation(
    store: &mut Store,
    request: &CompleteDonationRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<CompleteDonationResponse>, ApiError> {
    let donation: Donation = store
        .get_donation(request.donation_id)
        .map_err(translate_store_error)?;
    let facility: Facility = store
        .get_facility(donation.facility_id)
        .map_err(translate_store_error)?;
    let completed: Donation =
        lifecycle::complete(&donation, request.collected_ml, &facility.config, now)
            .map_err(translate_core_error)?;
    let stored: Donation = store
        .update_donation(&completed)
        .map_err(translate_store_error)?;

    let donor: Donor = store
        .get_donor(donation.donor_id)
        .map_err(translate_store_error)?;
    let credited: Donor = lifecycle::credit_completed_donation(&donor);
    store
        .update_donor(&credited)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(
        String::from("CompleteDonation"),
        Some(format!("Collected {} ml", request.collected_ml)),
    );
    let before: StateSnapshot = StateSnapshot::new(format!(
        "donation_id={},status={}",
        request.donation_id, donation.status
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "donation_id={},status={},collected_ml={}",
        request.donation_id, stored.status, stored.collected_quantity_ml
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(donation.facility_id),
        before,
        after,
    );

    let response: CompleteDonationResponse = CompleteDonationResponse {
        donation_id: request.donation_id,
        status: stored.status.to_string(),
        collected_quantity_ml: stored.collected_quantity_ml,
        message: format!(
            "Donation {} completed with {} ml collected",
            request.donation_id, stored.collected_quantity_ml
        ),
    };
    Ok(audited(store, response, event))
}

/// Aborts an in-progress donation after a medical incident.
///
/// The donor's eligibility is revoked alongside; a later health check can
/// restore it. The medical note travels in the audit record, not the
/// donation.
///
/// # Errors
///
/// Returns an error if the donation or donor does not exist, the donation is
/// not in progress, or a write loses a version race.
pub fn report_adverse_event(
    store: &mut Store,
    request: ReportAdverseEventRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<ReportAdverseEventResponse>, ApiError> {
    let donation: Donation = store
        .get_donation(request.donation_id)
        .map_err(translate_store_error)?;
    let aborted: Donation =
        lifecycle::report_adverse_event(&donation, now).map_err(translate_core_error)?;
    let stored: Donation = store
        .update_donation(&aborted)
        .map_err(translate_store_error)?;

    let donor: Donor = store
        .get_donor(donation.donor_id)
        .map_err(translate_store_error)?;
    let revoked: Donor =
        lifecycle::apply_health_check(&donor, false).map_err(translate_core_error)?;
    let stored_donor: Donor = store
        .update_donor(&revoked)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(String::from("ReportAdverseEvent"), request.note);
    let before: StateSnapshot = StateSnapshot::new(format!(
        "donation_id={},status={}",
        request.donation_id, donation.status
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "donation_id={},status={},donor_eligible=false",
        request.donation_id, stored.status
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(donation.facility_id),
        before,
        after,
    );

    let response: ReportAdverseEventResponse = ReportAdverseEventResponse {
        donation_id: request.donation_id,
        status: stored.status.to_string(),
        donor_eligible: stored_donor.eligible,
        message: format!(
            "Adverse event recorded for donation {}",
            request.donation_id
        ),
    };
    Ok(audited(store, response, event))
}

/// Cancels a donation that has not completed.
///
/// # Errors
///
/// Returns an error if the donation does not exist, is already terminal, or
/// the write loses a version race.
pub fn cancel_donation(
    store: &mut Store,
    request: &CancelDonationRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<CancelDonationResponse>, ApiError> {
    let donation: Donation = store
        .get_donation(request.donation_id)
        .map_err(translate_store_error)?;
    let cancelled: Donation = lifecycle::cancel(&donation, now).map_err(translate_core_error)?;
    let stored: Donation = store
        .update_donation(&cancelled)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(String::from("CancelDonation"), None);
    let before: StateSnapshot = StateSnapshot::new(format!(
        "donation_id={},status={}",
        request.donation_id, donation.status
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "donation_id={},status={}",
        request.donation_id, stored.status
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(donation.facility_id),
        before,
        after,
    );

    let response: CancelDonationResponse = CancelDonationResponse {
        donation_id: request.donation_id,
        status: stored.status.to_string(),
        message: format!("Donation {} cancelled", request.donation_id),
    };
    Ok(audited(store, response, event))
}

/// Fetches a donation with its vital-sign log.
///
/// # Errors
///
/// Returns an error if the donation does not exist.
pub fn get_donation(store: &Store, donation_id: i64) -> Result<GetDonationResponse, ApiError> {
    let donation: Donation = store
        .get_donation(donation_id)
        .map_err(translate_store_error)?;
    Ok(GetDonationResponse {
        donation_id,
        donor_id: donation.donor_id,
        facility_id: donation.facility_id,
        blood_group: donation.blood_group.to_string(),
        status: donation.status.to_string(),
        target_quantity_ml: donation.target_quantity_ml,
        collected_quantity_ml: donation.collected_quantity_ml,
        is_split: donation.is_split(),
        vital_log: donation
            .vital_log
            .iter()
            .map(|entry| VitalSignInfo {
                phase: entry.phase.to_string(),
                pulse_bpm: entry.pulse_bpm,
                systolic_mmhg: entry.systolic_mmhg,
                diastolic_mmhg: entry.diastolic_mmhg,
                note: entry.note.clone(),
                recorded_at: entry.recorded_at,
            })
            .collect(),
    })
}

/// Splits a completed donation into component blood units.
///
/// This function:
/// 1. Parses and validates the requested allocations
/// 2. Plans the split against the donation's collected volume
/// 3. Persists the split marker on the donation, then registers the new
///    units with the inventory ledger in `testing` status
///
/// A donation can be split once. A second split attempt fails with a
/// conflict unless the previous units were voided first.
///
/// # Arguments
///
/// * `store` - The registry to persist into
/// * `ledger` - The inventory ledger that will own the units
/// * `request` - The split request
/// * `actor` - The staff member performing the action
/// * `cause` - The reason for the change
/// * `now` - The split timestamp
///
/// # Returns
///
/// * `Ok(ApiResult<SplitDonationResponse>)` - The produced units and the audit event
/// * `Err(ApiError)` - If the split is invalid
///
/// # Errors
///
/// Returns an error if:
/// - The donation does not exist or is not completed
/// - The donation was already split
/// - The allocations are empty, contain a zero quantity, or sum over the
///   collected volume
/// - The write loses a version race
pub fn split_donation(
    store: &mut Store,
    ledger: &InventoryLedger,
    request: &SplitDonationRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<SplitDonationResponse>, ApiError> {
    let donation: Donation = store
        .get_donation(request.donation_id)
        .map_err(translate_store_error)?;

    let mut allocations: Vec<SplitAllocation> = Vec::with_capacity(request.allocations.len());
    for allocation in &request.allocations {
        let component: BloodComponent = allocation
            .component
            .parse()
            .map_err(translate_domain_error)?;
        allocations.push(SplitAllocation::new(component, allocation.quantity_ml));
    }

    let (units, marked): (Vec<BloodUnit>, Donation) =
        splitter::plan_split(&donation, &allocations, now).map_err(translate_core_error)?;
    // Persist the split marker before handing units to the ledger: a version
    // conflict here must not leave orphan units on the shelf.
    store
        .update_donation(&marked)
        .map_err(translate_store_error)?;
    let registered: Vec<BloodUnit> = ledger
        .register_units(units)
        .map_err(translate_core_error)?;

    let action: Action = Action::new(
        String::from("SplitDonation"),
        Some(format!("Split into {} component units", registered.len())),
    );
    let before: StateSnapshot =
        StateSnapshot::new(format!("donation_id={},split=false", request.donation_id));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "donation_id={},split=true,units={}",
        request.donation_id,
        registered.len()
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(donation.facility_id),
        before,
        after,
    );

    let response: SplitDonationResponse = SplitDonationResponse {
        donation_id: request.donation_id,
        units: registered.iter().map(unit_info).collect(),
        message: format!(
            "Donation {} split into {} units",
            request.donation_id,
            registered.len()
        ),
    };
    Ok(audited(store, response, event))
}

/// Voids a donation's split, rejecting its units and clearing the marker so
/// the donation can be split again.
///
/// Voiding is refused while any unit from the split is reserved or used.
///
/// # Errors
///
/// Returns an error if the donation does not exist, was never split, any of
/// its units is reserved or used, or the write loses a version race.
pub fn void_donation_split(
    store: &mut Store,
    ledger: &InventoryLedger,
    request: &VoidDonationSplitRequest,
    actor: &Actor,
    cause: Cause,
) -> Result<ApiResult<VoidDonationSplitResponse>, ApiError> {
    let donation: Donation = store
        .get_donation(request.donation_id)
        .map_err(translate_store_error)?;
    let cleared: Donation = splitter::clear_split(&donation).map_err(translate_core_error)?;
    // Void the units first: the ledger refuses the whole batch while any
    // unit is committed, and a refused void must leave the marker in place.
    let voided: Vec<i64> = ledger
        .void_units_for_donation(request.donation_id)
        .map_err(translate_core_error)?;
    store
        .update_donation(&cleared)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(
        String::from("VoidDonationSplit"),
        Some(format!("Voided {} units", voided.len())),
    );
    let before: StateSnapshot =
        StateSnapshot::new(format!("donation_id={},split=true", request.donation_id));
    let after: StateSnapshot =
        StateSnapshot::new(format!("donation_id={},split=false", request.donation_id));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(donation.facility_id),
        before,
        after,
    );

    let response: VoidDonationSplitResponse = VoidDonationSplitResponse {
        donation_id: request.donation_id,
        voided_unit_ids: voided.clone(),
        message: format!(
            "Voided {} units from donation {}",
            voided.len(),
            request.donation_id
        ),
    };
    Ok(audited(store, response, event))
}

/// Records a lab screening result for a unit in `testing` status.
///
/// A passing unit becomes `available` and counts toward stock; a failing
/// unit is `rejected` and never will.
///
/// # Errors
///
/// Returns an error if the unit does not exist or is not in `testing`.
pub fn mark_unit_tested(
    store: &mut Store,
    ledger: &InventoryLedger,
    request: &MarkUnitTestedRequest,
    actor: &Actor,
    cause: Cause,
) -> Result<ApiResult<MarkUnitTestedResponse>, ApiError> {
    let unit: BloodUnit = ledger
        .mark_tested(request.unit_id, request.passed)
        .map_err(translate_core_error)?;

    let action: Action = Action::new(
        String::from("MarkUnitTested"),
        Some(format!(
            "Screening {}",
            if request.passed { "passed" } else { "failed" }
        )),
    );
    let before: StateSnapshot =
        StateSnapshot::new(format!("unit_id={},status=testing", request.unit_id));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "unit_id={},status={}",
        request.unit_id, unit.status
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(unit.facility_id),
        before,
        after,
    );

    let response: MarkUnitTestedResponse = MarkUnitTestedResponse {
        unit_id: request.unit_id,
        status: unit.status.to_string(),
        message: format!("Unit {} marked {}", request.unit_id, unit.status),
    };
    Ok(audited(store, response, event))
}

/// Submits a new blood request for a facility.
///
/// The component may be left unresolved and supplied later via
/// [`resolve_component`]; evaluation rejects requests whose component is
/// still missing.
///
/// # Errors
///
/// Returns an error if the quantity is zero, the facility does not exist,
/// or the blood group or component does not parse.
pub fn submit_request(
    store: &mut Store,
    request: &SubmitRequestRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<SubmitRequestResponse>, ApiError> {
    validate_quantity(request.quantity_ml).map_err(translate_domain_error)?;
    store
        .get_facility(request.facility_id)
        .map_err(translate_store_error)?;
    let blood_group: BloodGroup = request.blood_group.parse().map_err(translate_domain_error)?;
    let component: Option<BloodComponent> = match &request.component {
        Some(raw) => Some(raw.parse().map_err(translate_domain_error)?),
        None => None,
    };

    let stored: BloodRequest = store.insert_request(BloodRequest::new(
        request.requester_id,
        request.facility_id,
        blood_group,
        component,
        request.quantity_ml,
        request.is_urgent,
        now,
    ));
    let request_id: i64 = registry_id(stored.id(), "request")?;

    let action: Action = Action::new(
        String::from("SubmitRequest"),
        Some(format!(
            "Requested {} ml of {blood_group}",
            request.quantity_ml
        )),
    );
    let before: StateSnapshot = StateSnapshot::absent();
    let after: StateSnapshot = StateSnapshot::new(format!(
        "request_id={request_id},status=pending_approval,urgent={}",
        request.is_urgent
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(request.facility_id),
        before,
        after,
    );

    let response: SubmitRequestResponse = SubmitRequestResponse {
        request_id,
        facility_id: request.facility_id,
        status: stored.status.to_string(),
        message: format!(
            "Request submitted for {} ml of {blood_group}",
            request.quantity_ml
        ),
    };
    Ok(audited(store, response, event))
}

/// Resolves the component of a request that was submitted without one.
///
/// # Errors
///
/// Returns an error if the request does not exist, already left the
/// awaiting-decision states, or the write loses a version race.
pub fn resolve_component(
    store: &mut Store,
    request: &ResolveComponentRequest,
    actor: &Actor,
    cause: Cause,
) -> Result<ApiResult<ResolveComponentResponse>, ApiError> {
    let record: BloodRequest = store
        .get_request(request.request_id)
        .map_err(translate_store_error)?;
    let component: BloodComponent = request.component.parse().map_err(translate_domain_error)?;
    let resolved: BloodRequest =
        matcher::resolve_component(&record, component).map_err(translate_core_error)?;
    store
        .update_request(&resolved)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(
        String::from("ResolveComponent"),
        Some(format!("Component resolved to '{component}'")),
    );
    let before: StateSnapshot = StateSnapshot::new(format!(
        "request_id={},component={}",
        request.request_id,
        record
            .component
            .map_or_else(|| String::from("unresolved"), |c| c.to_string())
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "request_id={},component={component}",
        request.request_id
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(record.facility_id),
        before,
        after,
    );

    let response: ResolveComponentResponse = ResolveComponentResponse {
        request_id: request.request_id,
        component: component.to_string(),
        message: format!(
            "Request {} resolved to {component}",
            request.request_id
        ),
    };
    Ok(audited(store, response, event))
}

/// Evaluates a request against available stock.
///
/// This function:
/// 1. Runs the matcher, which reserves stock atomically on approval
/// 2. Persists the post-decision request
/// 3. On approval, creates the `pending` delivery for the reservation and
///    completes any open campaign for the request
///
/// There is no partial fulfillment: the decision is approve in full,
/// reject, or park the request in `need_support` with the shortfall.
///
/// # Arguments
///
/// * `store` - The registry to persist into
/// * `ledger` - The inventory ledger to reserve against
/// * `request` - The evaluation request
/// * `actor` - The staff member performing the action
/// * `cause` - The reason for the change
/// * `now` - The evaluation timestamp
///
/// # Returns
///
/// * `Ok(ApiResult<EvaluateRequestResponse>)` - The decision and the audit event
/// * `Err(ApiError)` - If the request cannot be evaluated
///
/// # Errors
///
/// Returns an error if:
/// - The request does not exist or is not awaiting a decision
/// - A write loses a version race
#[allow(clippy::too_many_lines)]
pub fn evaluate_request(
    store: &mut Store,
    ledger: &InventoryLedger,
    request: &EvaluateRequestRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<EvaluateRequestResponse>, ApiError> {
    let record: BloodRequest = store
        .get_request(request.request_id)
        .map_err(translate_store_error)?;
    let evaluation: Evaluation =
        matcher::evaluate(&record, ledger, now).map_err(translate_core_error)?;

    let stored: BloodRequest = match store.update_request(&evaluation.request) {
        Ok(stored) => stored,
        Err(err) => {
            // A reservation nobody persisted would pin stock forever.
            if let Decision::Approved { reservation } = &evaluation.decision
                && ledger.release(reservation.reservation_id).is_err()
            {
                tracing::warn!(
                    reservation_id = reservation.reservation_id,
                    "failed to release the reservation of a stale approval"
                );
            }
            return Err(translate_store_error(err));
        }
    };

    let mut delivery_id: Option<i64> = None;
    if let Decision::Approved { reservation } = &evaluation.decision {
        let existing: Option<Delivery> = store.latest_delivery_for_request(request.request_id);
        let delivery: Delivery = dispatch::create(&stored, reservation, existing.as_ref(), now)
            .map_err(translate_core_error)?;
        let inserted: Delivery = store.insert_delivery(delivery);
        delivery_id = Some(registry_id(inserted.id(), "delivery")?);

        // A campaign still raising support for this request has done its job.
        if let Some(campaign) = store.campaign_for_request(request.request_id)
            && campaign.status == CampaignStatus::Open
            && let Ok(completed) = escalation::complete_campaign(&campaign, now)
        {
            store
                .update_campaign(&completed)
                .map_err(translate_store_error)?;
        }
    }

    let (decision_label, reject_reason, shortfall_ml, reservation_id): (
        &'static str,
        Option<String>,
        Option<u32>,
        Option<i64>,
    ) = match &evaluation.decision {
        Decision::Approved { reservation } => {
            ("approved", None, None, Some(reservation.reservation_id))
        }
        Decision::Rejected { reason } => ("rejected", Some(reason.to_string()), None, None),
        Decision::NeedsSupport { shortfall_ml } => {
            ("needs_support", None, Some(*shortfall_ml), None)
        }
    };

    let action: Action = Action::new(
        String::from("EvaluateRequest"),
        Some(format!("Decision: {decision_label}")),
    );
    let before: StateSnapshot = StateSnapshot::new(format!(
        "request_id={},status={}",
        request.request_id, record.status
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "request_id={},status={},decision={decision_label}",
        request.request_id, stored.status
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(record.facility_id),
        before,
        after,
    );

    let message: String = match &evaluation.decision {
        Decision::Approved { reservation } => format!(
            "Request {} approved with reservation {}",
            request.request_id, reservation.reservation_id
        ),
        Decision::Rejected { reason } => {
            format!("Request {} rejected: {reason}", request.request_id)
        }
        Decision::NeedsSupport { shortfall_ml } => format!(
            "Request {} needs support: {shortfall_ml} ml short",
            request.request_id
        ),
    };

    let response: EvaluateRequestResponse = EvaluateRequestResponse {
        request_id: request.request_id,
        status: stored.status.to_string(),
        decision: String::from(decision_label),
        reject_reason,
        shortfall_ml,
        reservation_id,
        delivery_id,
        message,
    };
    Ok(audited(store, response, event))
}

/// Terminally rejects a request on staff authority with a structured reason.
///
/// # Errors
///
/// Returns an error if the request does not exist, the reason does not
/// parse, the request already holds a reservation, or the write loses a
/// version race.
pub fn reject_request(
    store: &mut Store,
    request: &RejectRequestRequest,
    actor: &Actor,
    cause: Cause,
) -> Result<ApiResult<RejectRequestResponse>, ApiError> {
    let record: BloodRequest = store
        .get_request(request.request_id)
        .map_err(translate_store_error)?;
    let reason: RejectReason = request.reason.parse().map_err(translate_domain_error)?;
    let rejected: BloodRequest = matcher::reject(&record, reason).map_err(translate_core_error)?;
    let stored: BloodRequest = store
        .update_request(&rejected)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(
        String::from("RejectRequest"),
        Some(format!("Rejected: {reason}")),
    );
    let before: StateSnapshot = StateSnapshot::new(format!(
        "request_id={},status={}",
        request.request_id, record.status
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "request_id={},status={},reason={reason}",
        request.request_id, stored.status
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(record.facility_id),
        before,
        after,
    );

    let response: RejectRequestResponse = RejectRequestResponse {
        request_id: request.request_id,
        status: stored.status.to_string(),
        reason: reason.to_string(),
        message: format!("Request {} rejected: {reason}", request.request_id),
    };
    Ok(audited(store, response, event))
}

/// Fetches a request.
///
/// # Errors
///
/// Returns an error if the request does not exist.
pub fn get_request(store: &Store, request_id: i64) -> Result<GetRequestResponse, ApiError> {
    let record: BloodRequest = store
        .get_request(request_id)
        .map_err(translate_store_error)?;
    Ok(GetRequestResponse {
        request_id,
        requester_id: record.requester_id,
        facility_id: record.facility_id,
        blood_group: record.blood_group.to_string(),
        component: record.component.map(|component| component.to_string()),
        quantity_ml: record.quantity_ml,
        is_urgent: record.is_urgent,
        status: record.status.to_string(),
        reservation_id: record.reservation_id,
        reject_reason: record.reject_reason.map(|reason| reason.to_string()),
        created_at: record.created_at,
    })
}

/// Reports the available volume for one stock bucket of a facility.
///
/// Available stock is screened, unexpired, unreserved volume; expiry is
/// applied lazily as of `now`.
///
/// # Errors
///
/// Returns an error if the facility does not exist or the blood group or
/// component does not parse.
pub fn get_available(
    store: &Store,
    ledger: &InventoryLedger,
    facility_id: i64,
    blood_group: &str,
    component: &str,
    now: OffsetDateTime,
) -> Result<AvailableStockResponse, ApiError> {
    store
        .get_facility(facility_id)
        .map_err(translate_store_error)?;
    let group: BloodGroup = blood_group.parse().map_err(translate_domain_error)?;
    let parsed: BloodComponent = component.parse().map_err(translate_domain_error)?;
    let available_ml: u32 = ledger
        .available(facility_id, group, parsed, now)
        .map_err(translate_core_error)?;
    Ok(AvailableStockResponse {
        facility_id,
        blood_group: group.to_string(),
        component: parsed.to_string(),
        available_ml,
    })
}

/// Lists every non-empty stock bucket of a facility.
///
/// # Errors
///
/// Returns an error if the facility does not exist.
pub fn list_stock(
    store: &Store,
    ledger: &InventoryLedger,
    facility_id: i64,
    now: OffsetDateTime,
) -> Result<ListStockResponse, ApiError> {
    store
        .get_facility(facility_id)
        .map_err(translate_store_error)?;
    let levels: Vec<StockLevel> = ledger
        .stock_levels(facility_id, now)
        .map_err(translate_core_error)?;
    Ok(ListStockResponse {
        facility_id,
        levels: levels
            .iter()
            .map(|level| StockLevelInfo {
                blood_group: level.blood_group.to_string(),
                component: level.component.to_string(),
                available_ml: level.available_ml,
            })
            .collect(),
    })
}

/// Opens an emergency campaign for a request parked in `need_support`.
///
/// # Errors
///
/// Returns an error if the request does not exist, is not in
/// `need_support`, still has an unresolved component, already has an open
/// campaign, or the quantity or deadline is invalid.
pub fn open_campaign(
    store: &mut Store,
    request: &OpenCampaignRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<OpenCampaignResponse>, ApiError> {
    let record: BloodRequest = store
        .get_request(request.request_id)
        .map_err(translate_store_error)?;
    let existing: Option<EmergencyCampaign> = store.campaign_for_request(request.request_id);
    let campaign: EmergencyCampaign = escalation::open_campaign(
        &record,
        existing.as_ref(),
        request.quantity_needed_ml,
        request.deadline,
        now,
    )
    .map_err(translate_core_error)?;
    let stored: EmergencyCampaign = store.insert_campaign(campaign);
    let campaign_id: i64 = registry_id(stored.id(), "campaign")?;

    let action: Action = Action::new(
        String::from("OpenCampaign"),
        Some(format!(
            "Raising {} ml for request {}",
            request.quantity_needed_ml, request.request_id
        )),
    );
    let before: StateSnapshot = StateSnapshot::absent();
    let after: StateSnapshot = StateSnapshot::new(format!("campaign_id={campaign_id},status=open"));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(record.facility_id),
        before,
        after,
    );

    let response: OpenCampaignResponse = OpenCampaignResponse {
        campaign_id,
        request_id: request.request_id,
        status: stored.status.to_string(),
        message: format!("Campaign opened for request {}", request.request_id),
    };
    Ok(audited(store, response, event))
}

/// Records a volunteer's pledge against an open campaign.
///
/// A pledge is a lead, not blood: it never touches the ledger. Stock enters
/// through the donation pipeline once the pledge is approved and scheduled.
///
/// # Errors
///
/// Returns an error if the campaign or donor does not exist, the campaign
/// is closed or past its deadline, the volunteer is archived, or the
/// volunteer already pledged.
pub fn submit_pledge(
    store: &mut Store,
    request: &SubmitPledgeRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<SubmitPledgeResponse>, ApiError> {
    let campaign: EmergencyCampaign = store
        .get_campaign(request.campaign_id)
        .map_err(translate_store_error)?;
    let volunteer: Donor = store
        .get_donor(request.volunteer_donor_id)
        .map_err(translate_store_error)?;
    let existing: Vec<SupportPledge> = store.pledges_for_campaign(request.campaign_id);
    let pledge: SupportPledge =
        escalation::submit_pledge(&campaign, &volunteer, &existing, now)
            .map_err(translate_core_error)?;
    let stored: SupportPledge = store.insert_pledge(pledge);
    let pledge_id: i64 = registry_id(stored.id(), "pledge")?;

    let action: Action = Action::new(
        String::from("SubmitPledge"),
        Some(format!(
            "Donor {} pledged support",
            request.volunteer_donor_id
        )),
    );
    let before: StateSnapshot = StateSnapshot::absent();
    let after: StateSnapshot = StateSnapshot::new(format!("pledge_id={pledge_id},status=pending"));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(campaign.facility_id),
        before,
        after,
    );

    let response: SubmitPledgeResponse = SubmitPledgeResponse {
        pledge_id,
        campaign_id: request.campaign_id,
        status: stored.status.to_string(),
        message: format!("Pledge recorded for campaign {}", request.campaign_id),
    };
    Ok(audited(store, response, event))
}

/// Approves or rejects a pending pledge.
///
/// # Errors
///
/// Returns an error if the pledge or its campaign does not exist, the
/// pledge was already reviewed, or the write loses a version race.
pub fn review_pledge(
    store: &mut Store,
    request: &ReviewPledgeRequest,
    actor: &Actor,
    cause: Cause,
) -> Result<ApiResult<ReviewPledgeResponse>, ApiError> {
    let pledge: SupportPledge = store
        .get_pledge(request.pledge_id)
        .map_err(translate_store_error)?;
    let campaign: EmergencyCampaign = store
        .get_campaign(pledge.campaign_id)
        .map_err(translate_store_error)?;
    let reviewed: SupportPledge =
        escalation::review_pledge(&pledge, request.approve).map_err(translate_core_error)?;
    let stored: SupportPledge = store
        .update_pledge(&reviewed)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(
        String::from("ReviewPledge"),
        Some(format!(
            "Pledge {}",
            if request.approve {
                "approved"
            } else {
                "rejected"
            }
        )),
    );
    let before: StateSnapshot = StateSnapshot::new(format!(
        "pledge_id={},status={}",
        request.pledge_id, pledge.status
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "pledge_id={},status={}",
        request.pledge_id, stored.status
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(campaign.facility_id),
        before,
        after,
    );

    let response: ReviewPledgeResponse = ReviewPledgeResponse {
        pledge_id: request.pledge_id,
        status: stored.status.to_string(),
        message: format!(
            "Pledge {} {}",
            request.pledge_id,
            if request.approve {
                "approved"
            } else {
                "rejected"
            }
        ),
    };
    Ok(audited(store, response, event))
}

/// Registers a donation for an approved pledge, feeding the campaign's
/// shortfall through the normal donation pipeline.
///
/// The donation targets the campaign's facility; its volume reaches stock
/// only after completion, splitting, and screening.
///
/// # Errors
///
/// Returns an error if the pledge, campaign, or donor does not exist, the
/// pledge is not approved, the volunteer can no longer donate, or the
/// quantity is zero.
pub fn schedule_pledged_donation(
    store: &mut Store,
    request: &SchedulePledgedDonationRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<SchedulePledgedDonationResponse>, ApiError> {
    let pledge: SupportPledge = store
        .get_pledge(request.pledge_id)
        .map_err(translate_store_error)?;
    let campaign: EmergencyCampaign = store
        .get_campaign(pledge.campaign_id)
        .map_err(translate_store_error)?;
    let volunteer: Donor = store
        .get_donor(pledge.volunteer_donor_id)
        .map_err(translate_store_error)?;
    let donation: Donation = escalation::schedule_pledged_donation(
        &campaign,
        &pledge,
        &volunteer,
        request.target_quantity_ml,
        now,
    )
    .map_err(translate_core_error)?;
    let stored: Donation = store.insert_donation(donation);
    let donation_id: i64 = registry_id(stored.id(), "donation")?;

    let action: Action = Action::new(
        String::from("SchedulePledgedDonation"),
        Some(format!("Scheduled donation for pledge {}", request.pledge_id)),
    );
    let before: StateSnapshot = StateSnapshot::absent();
    let after: StateSnapshot =
        StateSnapshot::new(format!("donation_id={donation_id},status=registered"));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(campaign.facility_id),
        before,
        after,
    );

    let response: SchedulePledgedDonationResponse = SchedulePledgedDonationResponse {
        pledge_id: request.pledge_id,
        donation_id,
        donor_id: pledge.volunteer_donor_id,
        facility_id: campaign.facility_id,
        message: format!(
            "Donation {donation_id} scheduled for volunteer {}",
            pledge.volunteer_donor_id
        ),
    };
    Ok(audited(store, response, event))
}

/// Closes an open campaign by staff decision.
///
/// # Errors
///
/// Returns an error if the campaign does not exist, is already terminal or
/// past its deadline, or the write loses a version race.
pub fn close_campaign(
    store: &mut Store,
    request: &CloseCampaignRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<CloseCampaignResponse>, ApiError> {
    let campaign: EmergencyCampaign = store
        .get_campaign(request.campaign_id)
        .map_err(translate_store_error)?;
    let closed: EmergencyCampaign =
        escalation::close_campaign(&campaign, now).map_err(translate_core_error)?;
    let stored: EmergencyCampaign = store
        .update_campaign(&closed)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(String::from("CloseCampaign"), None);
    let before: StateSnapshot = StateSnapshot::new(format!(
        "campaign_id={},status={}",
        request.campaign_id, campaign.status
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "campaign_id={},status={}",
        request.campaign_id, stored.status
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(campaign.facility_id),
        before,
        after,
    );

    let response: CloseCampaignResponse = CloseCampaignResponse {
        campaign_id: request.campaign_id,
        status: stored.status.to_string(),
        message: format!("Campaign {} closed", request.campaign_id),
    };
    Ok(audited(store, response, event))
}

/// Fetches a campaign with its pledges.
///
/// The reported status applies expiry lazily: an open campaign past its
/// deadline reads as `expired` even before the sweep persists it.
///
/// # Errors
///
/// Returns an error if the campaign does not exist.
pub fn get_campaign(
    store: &Store,
    campaign_id: i64,
    now: OffsetDateTime,
) -> Result<GetCampaignResponse, ApiError> {
    let campaign: EmergencyCampaign = store
        .get_campaign(campaign_id)
        .map_err(translate_store_error)?;
    let pledges: Vec<SupportPledge> = store.pledges_for_campaign(campaign_id);
    Ok(GetCampaignResponse {
        campaign_id,
        request_id: campaign.request_id,
        facility_id: campaign.facility_id,
        blood_group: campaign.blood_group.to_string(),
        component: campaign.component.to_string(),
        quantity_needed_ml: campaign.quantity_needed_ml,
        deadline: campaign.deadline,
        status: campaign.effective_status(now).to_string(),
        pledges: pledges
            .iter()
            .map(|pledge| PledgeInfo {
                pledge_id: pledge.id().unwrap_or_default(),
                volunteer_donor_id: pledge.volunteer_donor_id,
                status: pledge.status.to_string(),
                pledged_at: pledge.pledged_at,
            })
            .collect(),
    })
}

/// Assigns a transporter to a pending delivery and moves its request to
/// `assigned`.
///
/// # Errors
///
/// Returns an error if the delivery or request does not exist, the delivery
/// is not pending, or a write loses a version race.
pub fn assign_transporter(
    store: &mut Store,
    request: &AssignTransporterRequest,
    actor: &Actor,
    cause: Cause,
) -> Result<ApiResult<AssignTransporterResponse>, ApiError> {
    let delivery: Delivery = store
        .get_delivery(request.delivery_id)
        .map_err(translate_store_error)?;
    let record: BloodRequest = store
        .get_request(delivery.request_id)
        .map_err(translate_store_error)?;
    let (assigned, updated_request): (Delivery, BloodRequest) =
        dispatch::assign_transporter(&delivery, &record, request.transporter_id)
            .map_err(translate_core_error)?;
    store
        .update_delivery(&assigned)
        .map_err(translate_store_error)?;
    store
        .update_request(&updated_request)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(
        String::from("AssignTransporter"),
        Some(format!("Transporter {} assigned", request.transporter_id)),
    );
    let before: StateSnapshot = StateSnapshot::new(format!(
        "delivery_id={},transporter=none",
        request.delivery_id
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "delivery_id={},transporter={}",
        request.delivery_id, request.transporter_id
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(delivery.facility_id),
        before,
        after,
    );

    let response: AssignTransporterResponse = AssignTransporterResponse {
        delivery_id: request.delivery_id,
        transporter_id: request.transporter_id,
        message: format!(
            "Transporter {} assigned to delivery {}",
            request.transporter_id, request.delivery_id
        ),
    };
    Ok(audited(store, response, event))
}

/// Starts a delivery, moving it and its request to `in_transit`.
///
/// # Errors
///
/// Returns an error if the delivery or request does not exist, no
/// transporter is assigned, the delivery is not pending, or a write loses a
/// version race.
pub fn start_delivery(
    store: &mut Store,
    request: &StartDeliveryRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<StartDeliveryResponse>, ApiError> {
    let delivery: Delivery = store
        .get_delivery(request.delivery_id)
        .map_err(translate_store_error)?;
    let record: BloodRequest = store
        .get_request(delivery.request_id)
        .map_err(translate_store_error)?;
    let (started, updated_request): (Delivery, BloodRequest) =
        dispatch::start(&delivery, &record, now).map_err(translate_core_error)?;
    let stored: Delivery = store
        .update_delivery(&started)
        .map_err(translate_store_error)?;
    store
        .update_request(&updated_request)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(String::from("StartDelivery"), None);
    let before: StateSnapshot = StateSnapshot::new(format!(
        "delivery_id={},status={}",
        request.delivery_id, delivery.status
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "delivery_id={},status={}",
        request.delivery_id, stored.status
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(delivery.facility_id),
        before,
        after,
    );

    let response: StartDeliveryResponse = StartDeliveryResponse {
        delivery_id: request.delivery_id,
        status: stored.status.to_string(),
        message: format!("Delivery {} is in transit", request.delivery_id),
    };
    Ok(audited(store, response, event))
}

/// Issues a QR confirmation token for an in-transit delivery.
///
/// The token is opaque to the recipient and binds the delivery, its
/// request, the destination facility, and the recipient it was issued to.
/// Issuing is repeatable; every issued token for the delivery stays valid
/// until the first confirmation wins.
///
/// # Errors
///
/// Returns an error if the delivery does not exist, is not in transit, or
/// the token cannot be encoded.
pub fn issue_delivery_token(
    store: &Store,
    request: &IssueDeliveryTokenRequest,
) -> Result<IssueDeliveryTokenResponse, ApiError> {
    let delivery: Delivery = store
        .get_delivery(request.delivery_id)
        .map_err(translate_store_error)?;
    if delivery.status != DeliveryStatus::InTransit {
        return Err(ApiError::Conflict {
            message: format!(
                "Delivery {} is not in transit (status is '{}')",
                request.delivery_id, delivery.status
            ),
        });
    }
    let token: String = issue_confirmation_token(
        request.delivery_id,
        delivery.request_id,
        delivery.facility_id,
        request.recipient_id,
    )?;
    Ok(IssueDeliveryTokenResponse {
        delivery_id: request.delivery_id,
        token,
        message: format!(
            "Confirmation token issued for delivery {}",
            request.delivery_id
        ),
    })
}

/// Confirms an in-transit delivery with exactly one proof of receipt.
///
/// This function:
/// 1. Builds the proof from either a QR token or the manual fallback form
/// 2. Runs the first-wins confirmation against the stored delivery
/// 3. Persists the delivered delivery and request, then commits the
///    reservation so the units leave stock as `used`
///
/// # Arguments
///
/// * `store` - The registry to persist into
/// * `ledger` - The inventory ledger holding the reservation
/// * `request` - The confirmation request
/// * `actor` - The recipient or staff member confirming
/// * `cause` - The reason for the change
/// * `now` - The confirmation timestamp
///
/// # Returns
///
/// * `Ok(ApiResult<ConfirmDeliveryResponse>)` - The confirmed delivery and audit event
/// * `Err(ApiError)` - If the proof is invalid or the delivery was already confirmed
///
/// # Errors
///
/// Returns an error if:
/// - Both or neither of the token and manual form are presented
/// - The token does not decode or does not match the delivery
/// - The delivery is not in transit or was already confirmed
/// - A write loses a version race
pub fn confirm_delivery(
    store: &mut Store,
    ledger: &InventoryLedger,
    request: ConfirmDeliveryRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<ConfirmDeliveryResponse>, ApiError> {
    let delivery_id: i64 = request.delivery_id;
    let delivery: Delivery = store
        .get_delivery(delivery_id)
        .map_err(translate_store_error)?;
    let record: BloodRequest = store
        .get_request(delivery.request_id)
        .map_err(translate_store_error)?;

    let proof: ConfirmationProof = match (request.token, request.manual) {
        (Some(token), None) => ConfirmationProof::QrToken(decode_token(&token)?),
        (None, Some(manual)) => ConfirmationProof::ManualForm {
            recipient_id: manual.recipient_id,
            recipient_name: manual.recipient_name,
            recipient_role: manual.recipient_role,
        },
        _ => {
            return Err(ApiError::InvalidInput {
                field: String::from("proof"),
                message: String::from("Exactly one of token or manual form must be presented"),
            });
        }
    };
    let method: &'static str = match &proof {
        ConfirmationProof::QrToken(_) => "qr_scan",
        ConfirmationProof::ManualForm { .. } => "manual_form",
    };

    let (confirmed, updated_request): (Delivery, BloodRequest) =
        dispatch::confirm(&delivery, &record, &proof, now).map_err(translate_core_error)?;
    // Persist before committing: a lost version race means someone else's
    // confirmation already won, and the stock must not be consumed twice.
    let stored: Delivery = store
        .update_delivery(&confirmed)
        .map_err(translate_store_error)?;
    store
        .update_request(&updated_request)
        .map_err(translate_store_error)?;
    ledger
        .commit(delivery.reservation_id)
        .map_err(translate_core_error)?;

    let action: Action = Action::new(
        String::from("ConfirmDelivery"),
        Some(format!("Confirmed by {method}")),
    );
    let before: StateSnapshot = StateSnapshot::new(format!(
        "delivery_id={delivery_id},status={}",
        delivery.status
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "delivery_id={delivery_id},status={},method={method}",
        stored.status
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(delivery.facility_id),
        before,
        after,
    );

    let response: ConfirmDeliveryResponse = ConfirmDeliveryResponse {
        delivery_id,
        request_id: delivery.request_id,
        status: stored.status.to_string(),
        method: String::from(method),
        message: format!("Delivery {delivery_id} confirmed"),
    };
    Ok(audited(store, response, event))
}

/// Records a delivery failure and restocks what was not handed over.
///
/// The reservation is settled before either record is persisted: volume not
/// listed as consumed returns to `available`, consumed units become `used`.
/// The request returns to `pending_approval` for a fresh evaluation.
///
/// # Errors
///
/// Returns an error if the delivery or request does not exist, the reason
/// does not parse, the delivery is not in transit, a consumed unit id is
/// not on the manifest, or a write loses a version race.
pub fn report_delivery_failure(
    store: &mut Store,
    ledger: &InventoryLedger,
    request: &ReportDeliveryFailureRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<ReportDeliveryFailureResponse>, ApiError> {
    let delivery: Delivery = store
        .get_delivery(request.delivery_id)
        .map_err(translate_store_error)?;
    let record: BloodRequest = store
        .get_request(delivery.request_id)
        .map_err(translate_store_error)?;
    let reason: FailureReason = request.reason.parse().map_err(translate_domain_error)?;
    let (failed, updated_request): (Delivery, BloodRequest) =
        dispatch::fail(&delivery, &record, reason, now).map_err(translate_core_error)?;
    let restocked_ml: u32 = ledger
        .release_except(delivery.reservation_id, &request.consumed_unit_ids)
        .map_err(translate_core_error)?;
    let stored: Delivery = store
        .update_delivery(&failed)
        .map_err(translate_store_error)?;
    let stored_request: BloodRequest = store
        .update_request(&updated_request)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(
        String::from("ReportDeliveryFailure"),
        Some(format!("Failed: {reason}; restocked {restocked_ml} ml")),
    );
    let before: StateSnapshot = StateSnapshot::new(format!(
        "delivery_id={},status={}",
        request.delivery_id, delivery.status
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "delivery_id={},status={},reason={reason}",
        request.delivery_id, stored.status
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(delivery.facility_id),
        before,
        after,
    );

    let response: ReportDeliveryFailureResponse = ReportDeliveryFailureResponse {
        delivery_id: request.delivery_id,
        status: stored.status.to_string(),
        request_status: stored_request.status.to_string(),
        restocked_ml,
        message: format!(
            "Delivery {} failed; restocked {restocked_ml} ml",
            request.delivery_id
        ),
    };
    Ok(audited(store, response, event))
}

/// Cancels a delivery before completion, releasing its full reservation.
///
/// The request returns to `pending_approval` for a fresh evaluation.
///
/// # Errors
///
/// Returns an error if the delivery or request does not exist, the delivery
/// is already terminal, or a write loses a version race.
pub fn cancel_delivery(
    store: &mut Store,
    ledger: &InventoryLedger,
    request: &CancelDeliveryRequest,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ApiResult<CancelDeliveryResponse>, ApiError> {
    let delivery: Delivery = store
        .get_delivery(request.delivery_id)
        .map_err(translate_store_error)?;
    let record: BloodRequest = store
        .get_request(delivery.request_id)
        .map_err(translate_store_error)?;
    let (cancelled, updated_request): (Delivery, BloodRequest) =
        dispatch::cancel(&delivery, &record, now).map_err(translate_core_error)?;
    let restocked_ml: u32 = ledger
        .release(delivery.reservation_id)
        .map_err(translate_core_error)?;
    let stored: Delivery = store
        .update_delivery(&cancelled)
        .map_err(translate_store_error)?;
    store
        .update_request(&updated_request)
        .map_err(translate_store_error)?;

    let action: Action = Action::new(String::from("CancelDelivery"), None);
    let before: StateSnapshot = StateSnapshot::new(format!(
        "delivery_id={},status={}",
        request.delivery_id, delivery.status
    ));
    let after: StateSnapshot = StateSnapshot::new(format!(
        "delivery_id={},status={}",
        request.delivery_id, stored.status
    ));
    let event: AuditEvent = AuditEvent::new(
        actor.clone(),
        cause,
        action,
        Some(delivery.facility_id),
        before,
        after,
    );

    let response: CancelDeliveryResponse = CancelDeliveryResponse {
        delivery_id: request.delivery_id,
        status: stored.status.to_string(),
        restocked_ml,
        message: format!(
            "Delivery {} cancelled; restocked {restocked_ml} ml",
            request.delivery_id
        ),
    };
    Ok(audited(store, response, event))
}

/// Folds one position report into a delivery's last known location.
///
/// Reports are a stream, not a log: they may arrive out of order and only
/// the most recent by source timestamp is kept. A stale report is dropped
/// without error. Position reports are not audited; the audit trail records
/// lifecycle transitions, not telemetry.
///
/// # Errors
///
/// Returns an error if the delivery does not exist, the coordinates are out
/// of range, or the write loses a version race.
pub fn push_location(
    store: &mut Store,
    request: &PushLocationRequest,
) -> Result<PushLocationResponse, ApiError> {
    let delivery: Delivery = store
        .get_delivery(request.delivery_id)
        .map_err(translate_store_error)?;
    let outcome: LocationOutcome = dispatch::record_location(
        &delivery,
        request.latitude,
        request.longitude,
        request.recorded_at,
    )
    .map_err(translate_core_error)?;

    let applied: bool = match outcome {
        LocationOutcome::Applied(updated) => {
            store
                .update_delivery(&updated)
                .map_err(translate_store_error)?;
            true
        }
        LocationOutcome::Stale => false,
    };

    Ok(PushLocationResponse {
        delivery_id: request.delivery_id,
        applied,
        message: if applied {
            format!("Position updated for delivery {}", request.delivery_id)
        } else {
            format!(
                "Stale position report for delivery {} ignored",
                request.delivery_id
            )
        },
    })
}

/// Fetches a delivery with its manifest and tracking state.
///
/// # Errors
///
/// Returns an error if the delivery does not exist.
pub fn get_delivery(store: &Store, delivery_id: i64) -> Result<GetDeliveryResponse, ApiError> {
    let delivery: Delivery = store
        .get_delivery(delivery_id)
        .map_err(translate_store_error)?;
    Ok(GetDeliveryResponse {
        delivery_id,
        request_id: delivery.request_id,
        facility_id: delivery.facility_id,
        reservation_id: delivery.reservation_id,
        transporter_id: delivery.transporter_id,
        status: delivery.status.to_string(),
        manifest: delivery
            .manifest
            .iter()
            .map(|line| ManifestLineInfo {
                unit_id: line.unit_id,
                quantity_ml: line.quantity_ml,
            })
            .collect(),
        total_quantity_ml: delivery.manifest_quantity_ml(),
        last_location: delivery.last_location.as_ref().map(|point| LocationInfo {
            latitude: point.latitude,
            longitude: point.longitude,
            recorded_at: point.recorded_at,
        }),
        confirmation_method: delivery.confirmation.as_ref().map(|confirmation| {
            match confirmation.method {
                ConfirmationMethod::QrScan => String::from("qr_scan"),
                ConfirmationMethod::ManualForm { .. } => String::from("manual_form"),
            }
        }),
        failure_reason: delivery.failure_reason.map(|reason| reason.to_string()),
    })
}

/// Lists the audit trail of one facility, oldest first.
///
/// # Errors
///
/// Returns an error if the facility does not exist.
pub fn list_facility_events(
    store: &Store,
    facility_id: i64,
) -> Result<ListAuditEventsResponse, ApiError> {
    store
        .get_facility(facility_id)
        .map_err(translate_store_error)?;
    let events: Vec<AuditEvent> = store.events_for_facility(facility_id);
    Ok(ListAuditEventsResponse {
        facility_id,
        events: events
            .iter()
            .map(|event| AuditEventInfo {
                actor_id: event.actor.id.clone(),
                actor_type: event.actor.actor_type.clone(),
                cause_id: event.cause.id.clone(),
                cause_description: event.cause.description.clone(),
                action: event.action.name.clone(),
                details: event.action.details.clone(),
                before: event.before.data.clone(),
                after: event.after.data.clone(),
            })
            .collect(),
    })
}
