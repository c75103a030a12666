// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Emergency campaign and support pledge states.
//!
//! A campaign belongs to exactly one blood request that could not be matched
//! from stock. Campaigns close one way: once `closed`, `completed` or
//! `expired`, they never reopen; a retry is a new campaign on the same
//! request. Expiry is evaluated lazily against the deadline, so a campaign
//! past its deadline reads as `expired` even before a sweep persists it.

use crate::blood::{BloodComponent, BloodGroup};
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Emergency campaign lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Accepting pledges.
    Open,
    /// Closed by staff before the deadline.
    Closed,
    /// The linked request was approved while the campaign ran.
    Completed,
    /// The deadline passed without fulfillment.
    Expired,
}

impl CampaignStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }

    /// Parses a status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCampaignStatus` if the string is not a
    /// valid status.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "completed" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            _ => Err(DomainError::InvalidCampaignStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Returns true if this status is terminal. Every state except `open` is.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                entity: "campaign",
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "campaigns never reopen".to_string(),
            });
        }

        match new_status {
            Self::Closed | Self::Completed | Self::Expired => Ok(()),
            Self::Open => Err(DomainError::InvalidStatusTransition {
                entity: "campaign",
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "campaign is already open".to_string(),
            }),
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An emergency donor drive opened for an unfulfillable request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyCampaign {
    /// The canonical numeric identifier assigned by the registry.
    /// `None` indicates the campaign has not been opened yet.
    campaign_id: Option<i64>,
    /// The request the campaign is trying to fulfill.
    pub request_id: i64,
    /// The facility that will collect pledged donations.
    pub facility_id: i64,
    /// Blood group being sought.
    pub blood_group: BloodGroup,
    /// Component being sought.
    pub component: BloodComponent,
    /// Shortfall the campaign needs to cover, in milliliters.
    pub quantity_needed_ml: u32,
    /// Hard deadline after which the campaign expires.
    #[serde(with = "time::serde::rfc3339")]
    pub deadline: OffsetDateTime,
    /// Current lifecycle status as last persisted.
    pub status: CampaignStatus,
    /// When the campaign was opened.
    #[serde(with = "time::serde::rfc3339")]
    pub opened_at: OffsetDateTime,
    /// Optimistic concurrency version, bumped on every update.
    pub version: u64,
}

impl EmergencyCampaign {
    /// Creates a new open campaign without an ID.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        request_id: i64,
        facility_id: i64,
        blood_group: BloodGroup,
        component: BloodComponent,
        quantity_needed_ml: u32,
        deadline: OffsetDateTime,
        opened_at: OffsetDateTime,
    ) -> Self {
        Self {
            campaign_id: None,
            request_id,
            facility_id,
            blood_group,
            component,
            quantity_needed_ml,
            deadline,
            status: CampaignStatus::Open,
            opened_at,
            version: 0,
        }
    }

    /// Re-attaches a registry ID to a campaign value.
    #[must_use]
    pub fn with_id(mut self, campaign_id: i64) -> Self {
        self.campaign_id = Some(campaign_id);
        self
    }

    /// Returns the canonical numeric identifier if registered.
    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        self.campaign_id
    }

    /// The status the campaign effectively has at `now`.
    ///
    /// An `open` campaign past its deadline reads as `expired` without
    /// waiting for the sweep to persist the transition. Idempotent.
    #[must_use]
    pub fn effective_status(&self, now: OffsetDateTime) -> CampaignStatus {
        if self.status == CampaignStatus::Open && now > self.deadline {
            CampaignStatus::Expired
        } else {
            self.status
        }
    }

    /// Whether pledges are currently accepted.
    #[must_use]
    pub fn accepts_pledges(&self, now: OffsetDateTime) -> bool {
        self.effective_status(now) == CampaignStatus::Open
    }
}

/// Support pledge lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PledgeStatus {
    /// Awaiting staff review.
    Pending,
    /// Reviewed and accepted; the volunteer may be scheduled.
    Approved,
    /// Reviewed and declined.
    Rejected,
}

impl PledgeStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPledgeStatus` if the string is not a
    /// valid status.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DomainError::InvalidPledgeStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Returns true if this status is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                entity: "pledge",
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "pledge has already been reviewed".to_string(),
            });
        }

        match new_status {
            Self::Approved | Self::Rejected => Ok(()),
            Self::Pending => Err(DomainError::InvalidStatusTransition {
                entity: "pledge",
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "pledge is already pending".to_string(),
            }),
        }
    }
}

impl FromStr for PledgeStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for PledgeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A volunteer's intent to donate in response to a campaign.
///
/// A pledge is a lead, not blood: it never touches the inventory ledger.
/// Approving one only authorizes scheduling a normal donation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportPledge {
    /// The canonical numeric identifier assigned by the registry.
    /// `None` indicates the pledge has not been recorded yet.
    pledge_id: Option<i64>,
    /// The campaign the pledge answers.
    pub campaign_id: i64,
    /// The volunteering donor.
    pub volunteer_donor_id: i64,
    /// Current review status.
    pub status: PledgeStatus,
    /// When the pledge was made.
    #[serde(with = "time::serde::rfc3339")]
    pub pledged_at: OffsetDateTime,
    /// Optimistic concurrency version, bumped on every update.
    pub version: u64,
}

impl SupportPledge {
    /// Creates a new pending pledge without an ID.
    #[must_use]
    pub const fn new(campaign_id: i64, volunteer_donor_id: i64, pledged_at: OffsetDateTime) -> Self {
        Self {
            pledge_id: None,
            campaign_id,
            volunteer_donor_id,
            status: PledgeStatus::Pending,
            pledged_at,
            version: 0,
        }
    }

    /// Re-attaches a registry ID to a pledge value.
    #[must_use]
    pub fn with_id(mut self, pledge_id: i64) -> Self {
        self.pledge_id = Some(pledge_id);
        self
    }

    /// Returns the canonical numeric identifier if registered.
    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        self.pledge_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_campaign(deadline: OffsetDateTime) -> EmergencyCampaign {
        EmergencyCampaign::new(
            1,
            1,
            BloodGroup::AbPositive,
            BloodComponent::Plasma,
            600,
            deadline,
            OffsetDateTime::UNIX_EPOCH,
        )
    }

    #[test]
    fn test_status_string_round_trip() {
        let statuses = vec![
            CampaignStatus::Open,
            CampaignStatus::Closed,
            CampaignStatus::Completed,
            CampaignStatus::Expired,
        ];

        for status in statuses {
            let s = status.as_str();
            match CampaignStatus::parse_str(s) {
                Ok(parsed) => assert_eq!(status, parsed),
                Err(e) => panic!("Failed to parse status string: {s}: {e}"),
            }
        }
    }

    #[test]
    fn test_only_open_is_non_terminal() {
        assert!(!CampaignStatus::Open.is_terminal());
        assert!(CampaignStatus::Closed.is_terminal());
        assert!(CampaignStatus::Completed.is_terminal());
        assert!(CampaignStatus::Expired.is_terminal());
    }

    #[test]
    fn test_campaigns_never_reopen() {
        for terminal in [
            CampaignStatus::Closed,
            CampaignStatus::Completed,
            CampaignStatus::Expired,
        ] {
            assert!(terminal.validate_transition(CampaignStatus::Open).is_err());
        }
    }

    #[test]
    fn test_lazy_expiry_is_idempotent() {
        let deadline = OffsetDateTime::UNIX_EPOCH + time::Duration::days(3);
        let campaign = create_campaign(deadline);

        let before = deadline - time::Duration::hours(1);
        let after = deadline + time::Duration::hours(1);

        assert_eq!(campaign.effective_status(before), CampaignStatus::Open);
        assert_eq!(campaign.effective_status(after), CampaignStatus::Expired);
        // Reading twice changes nothing.
        assert_eq!(campaign.effective_status(after), CampaignStatus::Expired);
        assert_eq!(campaign.status, CampaignStatus::Open);
    }

    #[test]
    fn test_expired_campaign_refuses_pledges() {
        let deadline = OffsetDateTime::UNIX_EPOCH + time::Duration::days(3);
        let campaign = create_campaign(deadline);

        assert!(campaign.accepts_pledges(deadline - time::Duration::hours(1)));
        assert!(!campaign.accepts_pledges(deadline + time::Duration::hours(1)));
    }

    #[test]
    fn test_pledge_review_is_one_shot() {
        assert!(
            PledgeStatus::Pending
                .validate_transition(PledgeStatus::Approved)
                .is_ok()
        );
        assert!(
            PledgeStatus::Approved
                .validate_transition(PledgeStatus::Rejected)
                .is_err()
        );
        assert!(
            PledgeStatus::Rejected
                .validate_transition(PledgeStatus::Approved)
                .is_err()
        );
    }
}
