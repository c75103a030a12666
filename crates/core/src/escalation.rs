// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Emergency campaigns and support pledges.
//!
//! A campaign is opened for a request parked in `need_support` and gathers
//! pledges until it is closed, completed or expires at its deadline. Expiry
//! is lazy: the deadline is checked on every read, so a campaign past its
//! deadline refuses pledges even before the sweep persists the transition.
//!
//! Pledges never move blood. Approving one authorizes scheduling the
//! volunteer, which re-enters the donation lifecycle as a normal registration
//! and reaches the shelf only through splitting and screening.

use crate::error::CoreError;
use hemolink_domain::{
    BloodRequest, CampaignStatus, Donation, DomainError, Donor, EmergencyCampaign, PledgeStatus,
    RequestStatus, SupportPledge, validate_deadline, validate_quantity,
};
use time::OffsetDateTime;
use tracing::info;

/// Opens a campaign for a request that stock could not cover.
///
/// At most one non-terminal campaign may exist per request; the caller passes
/// the currently open one, if any, for the conflict check.
///
/// # Errors
///
/// Returns `CoreError::StateConflict` if the request is not in `need_support`
/// or already has an open campaign, or a wrapped `DomainError` for a zero
/// quantity or a deadline that is not in the future.
pub fn open_campaign(
    request: &BloodRequest,
    existing: Option<&EmergencyCampaign>,
    quantity_needed_ml: u32,
    deadline: OffsetDateTime,
    now: OffsetDateTime,
) -> Result<EmergencyCampaign, CoreError> {
    let request_id: i64 = request
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("request has no registry id")))?;

    if request.status != RequestStatus::NeedSupport {
        return Err(CoreError::StateConflict {
            entity: "blood request",
            id: request_id,
            reason: format!(
                "campaigns are opened for requests in need_support (status is '{}')",
                request.status
            ),
        });
    }

    let Some(component) = request.component else {
        return Err(CoreError::StateConflict {
            entity: "blood request",
            id: request_id,
            reason: String::from("request component must be resolved before escalation"),
        });
    };

    match existing {
        Some(campaign) if !campaign.effective_status(now).is_terminal() => {
            return Err(CoreError::StateConflict {
                entity: "campaign",
                id: campaign.id().unwrap_or_default(),
                reason: String::from("an open campaign already exists for this request"),
            });
        }
        _ => {}
    }

    validate_quantity(quantity_needed_ml)?;
    validate_deadline(deadline, now)?;

    let campaign: EmergencyCampaign = EmergencyCampaign::new(
        request_id,
        request.facility_id,
        request.blood_group,
        component,
        quantity_needed_ml,
        deadline,
        now,
    );
    info!(
        request_id,
        quantity_needed_ml,
        deadline = %deadline,
        "Opened emergency campaign"
    );
    Ok(campaign)
}

/// Records a volunteer's pledge against an open campaign.
///
/// Archived donors are refused here; an ineligible donor may still pledge and
/// is screened again at scheduling time, when eligibility actually matters.
///
/// # Errors
///
/// Returns `CoreError::Expired` if the campaign deadline has passed,
/// `CoreError::StateConflict` if it is closed or the volunteer already
/// pledged, or a wrapped `DomainError::DonorArchived`.
pub fn submit_pledge(
    campaign: &EmergencyCampaign,
    volunteer: &Donor,
    existing_pledges: &[SupportPledge],
    now: OffsetDateTime,
) -> Result<SupportPledge, CoreError> {
    let campaign_id: i64 = campaign
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("campaign has no registry id")))?;
    let volunteer_id: i64 = volunteer
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("donor has no registry id")))?;

    match campaign.effective_status(now) {
        CampaignStatus::Open => {}
        CampaignStatus::Expired => {
            return Err(CoreError::Expired {
                entity: "campaign",
                id: campaign_id,
            });
        }
        status => {
            return Err(CoreError::StateConflict {
                entity: "campaign",
                id: campaign_id,
                reason: format!("campaign is {status} and no longer accepts pledges"),
            });
        }
    }

    if volunteer.archived {
        return Err(DomainError::DonorArchived {
            donor_id: volunteer_id,
        }
        .into());
    }

    let duplicate: bool = existing_pledges
        .iter()
        .any(|pledge| pledge.volunteer_donor_id == volunteer_id);
    if duplicate {
        return Err(CoreError::StateConflict {
            entity: "campaign",
            id: campaign_id,
            reason: format!("donor {volunteer_id} has already pledged to this campaign"),
        });
    }

    let pledge: SupportPledge = SupportPledge::new(campaign_id, volunteer_id, now);
    info!(campaign_id, volunteer_id, "Recorded support pledge");
    Ok(pledge)
}

/// Reviews a pending pledge. One-shot: a reviewed pledge never changes again.
///
/// # Errors
///
/// Returns a wrapped `DomainError` if the pledge has already been reviewed.
pub fn review_pledge(pledge: &SupportPledge, approve: bool) -> Result<SupportPledge, CoreError> {
    let verdict: PledgeStatus = if approve {
        PledgeStatus::Approved
    } else {
        PledgeStatus::Rejected
    };
    pledge.status.validate_transition(verdict)?;

    let mut reviewed: SupportPledge = pledge.clone();
    reviewed.status = verdict;
    info!(
        pledge_id = pledge.id(),
        campaign_id = pledge.campaign_id,
        verdict = %verdict,
        "Reviewed support pledge"
    );
    Ok(reviewed)
}

/// Schedules a donation for an approved pledge.
///
/// The donation re-enters the normal lifecycle in `registered`; the pledged
/// blood reaches the shelf only through completion, splitting and screening.
/// Scheduling stays possible after the campaign ends: an approved lead is
/// still blood the bank wants.
///
/// # Errors
///
/// Returns `CoreError::StateConflict` if the pledge is not approved or does
/// not belong to the campaign, or a wrapped `DomainError` if the volunteer
/// can no longer donate.
pub fn schedule_pledged_donation(
    campaign: &EmergencyCampaign,
    pledge: &SupportPledge,
    volunteer: &Donor,
    target_quantity_ml: u32,
    now: OffsetDateTime,
) -> Result<Donation, CoreError> {
    let pledge_id: i64 = pledge
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("pledge has no registry id")))?;
    let volunteer_id: i64 = volunteer
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("donor has no registry id")))?;

    if campaign.id() != Some(pledge.campaign_id) {
        return Err(CoreError::StateConflict {
            entity: "pledge",
            id: pledge_id,
            reason: String::from("pledge does not belong to this campaign"),
        });
    }
    if pledge.status != PledgeStatus::Approved {
        return Err(CoreError::StateConflict {
            entity: "pledge",
            id: pledge_id,
            reason: format!("only approved pledges can be scheduled (status is '{}')", pledge.status),
        });
    }
    if pledge.volunteer_donor_id != volunteer_id {
        return Err(CoreError::StateConflict {
            entity: "pledge",
            id: pledge_id,
            reason: String::from("donor record does not match the pledge"),
        });
    }

    if volunteer.archived {
        return Err(DomainError::DonorArchived {
            donor_id: volunteer_id,
        }
        .into());
    }
    if !volunteer.eligible {
        return Err(DomainError::IneligibleDonor {
            donor_id: volunteer_id,
        }
        .into());
    }

    validate_quantity(target_quantity_ml)?;

    let donation: Donation = Donation::new(
        volunteer_id,
        campaign.facility_id,
        volunteer.blood_group,
        target_quantity_ml,
        now,
    );
    info!(
        pledge_id,
        volunteer_id,
        facility_id = campaign.facility_id,
        "Scheduled pledged donation"
    );
    Ok(donation)
}

/// Closes an open campaign on staff authority.
///
/// # Errors
///
/// Returns `CoreError::Expired` if the deadline already passed (the campaign
/// reads as expired, not closed), or a wrapped `DomainError` if the campaign
/// is otherwise terminal.
pub fn close_campaign(
    campaign: &EmergencyCampaign,
    now: OffsetDateTime,
) -> Result<EmergencyCampaign, CoreError> {
    settle_campaign(campaign, CampaignStatus::Closed, now)
}

/// Completes a campaign whose linked request was approved while it ran.
///
/// # Errors
///
/// Returns `CoreError::Expired` if the deadline already passed, or a wrapped
/// `DomainError` if the campaign is otherwise terminal.
pub fn complete_campaign(
    campaign: &EmergencyCampaign,
    now: OffsetDateTime,
) -> Result<EmergencyCampaign, CoreError> {
    settle_campaign(campaign, CampaignStatus::Completed, now)
}

/// Persists the lazy expiry of a campaign whose deadline has passed.
///
/// Used by the periodic sweep. Idempotent at the caller: the sweep only
/// selects campaigns still stored as `open`.
///
/// # Errors
///
/// Returns `CoreError::StateConflict` if the campaign is not stored as
/// `open` or its deadline has not passed yet.
pub fn expire_campaign(
    campaign: &EmergencyCampaign,
    now: OffsetDateTime,
) -> Result<EmergencyCampaign, CoreError> {
    let campaign_id: i64 = campaign
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("campaign has no registry id")))?;

    if campaign.status != CampaignStatus::Open {
        return Err(CoreError::StateConflict {
            entity: "campaign",
            id: campaign_id,
            reason: format!("campaign is already {}", campaign.status),
        });
    }
    if now <= campaign.deadline {
        return Err(CoreError::StateConflict {
            entity: "campaign",
            id: campaign_id,
            reason: String::from("campaign deadline has not passed"),
        });
    }

    let mut expired: EmergencyCampaign = campaign.clone();
    expired.status = CampaignStatus::Expired;
    info!(campaign_id, "Expired emergency campaign");
    Ok(expired)
}

/// Shared settle path for `closed` and `completed`.
fn settle_campaign(
    campaign: &EmergencyCampaign,
    outcome: CampaignStatus,
    now: OffsetDateTime,
) -> Result<EmergencyCampaign, CoreError> {
    let campaign_id: i64 = campaign
        .id()
        .ok_or_else(|| CoreError::Internal(String::from("campaign has no registry id")))?;

    // Lazy expiry wins over a late settle.
    if campaign.effective_status(now) == CampaignStatus::Expired {
        return Err(CoreError::Expired {
            entity: "campaign",
            id: campaign_id,
        });
    }
    campaign.status.validate_transition(outcome)?;

    let mut settled: EmergencyCampaign = campaign.clone();
    settled.status = outcome;
    info!(campaign_id, outcome = %outcome, "Settled emergency campaign");
    Ok(settled)
}
