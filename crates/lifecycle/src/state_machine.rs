//! Allowed status transitions for campaigns and collaboration requests.

use influencer_core::store::{DocumentStore, RequestChange};
use influencer_core::types::{CampaignStatus, CollaborationRequest, RequestStatus};
use influencer_core::{EngineError, EngineResult};
use tracing::debug;
use uuid::Uuid;

/// Re-reads allowed when a request changes between read and write.
const STALE_READ_RETRIES: u32 = 3;

/// Whether a campaign may move from `from` to `to`.
pub fn campaign_transition_allowed(from: CampaignStatus, to: CampaignStatus) -> bool {
    use CampaignStatus::*;
    matches!(
        (from, to),
        (Draft, PendingApproval)
            | (Draft, Cancelled)
            | (PendingApproval, Approved)
            | (PendingApproval, Draft)
            | (PendingApproval, Cancelled)
            | (Approved, InProgress)
            | (Approved, Cancelled)
            | (InProgress, Completed)
            | (InProgress, Cancelled)
    )
}

pub fn check_campaign_transition(from: CampaignStatus, to: CampaignStatus) -> EngineResult<()> {
    if campaign_transition_allowed(from, to) {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition {
            entity: "campaign",
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Whether a collaboration request may move from `from` to `to`. A
/// negotiating request may receive further counter-offers.
pub fn request_transition_allowed(from: RequestStatus, to: RequestStatus) -> bool {
    use RequestStatus::*;
    matches!(
        (from, to),
        (Pending, Negotiating | Accepted | Declined) | (Negotiating, Negotiating | Accepted | Declined)
    )
}

pub fn check_request_transition(from: RequestStatus, to: RequestStatus) -> EngineResult<()> {
    if request_transition_allowed(from, to) {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition {
            entity: "collaboration request",
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Validates `change` against the stored request and applies it with a
/// status compare-and-set. A stale read is re-checked against the fresh
/// status, so a change racing a terminal decision fails with
/// `InvalidTransition` instead of overwriting it.
pub async fn apply_request_change(
    store: &dyn DocumentStore,
    request_id: Uuid,
    change: RequestChange,
) -> EngineResult<CollaborationRequest> {
    let to = change.target_status();
    let mut attempt = 0;
    loop {
        let current = store
            .get_collaboration_request(request_id)
            .await?
            .ok_or_else(|| EngineError::not_found("collaboration request", request_id))?;
        check_request_transition(current.status, to)?;

        match store
            .update_collaboration_request(request_id, current.status, change.clone())
            .await
        {
            Err(EngineError::InvalidTransition { .. }) if attempt < STALE_READ_RETRIES => {
                attempt += 1;
                debug!(request_id = %request_id, attempt, "Request changed since read, retrying");
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMPAIGN_STATES: [CampaignStatus; 6] = [
        CampaignStatus::Draft,
        CampaignStatus::PendingApproval,
        CampaignStatus::Approved,
        CampaignStatus::InProgress,
        CampaignStatus::Completed,
        CampaignStatus::Cancelled,
    ];

    #[test]
    fn test_happy_path() {
        let path = [
            CampaignStatus::Draft,
            CampaignStatus::PendingApproval,
            CampaignStatus::Approved,
            CampaignStatus::InProgress,
            CampaignStatus::Completed,
        ];
        for pair in path.windows(2) {
            assert!(check_campaign_transition(pair[0], pair[1]).is_ok());
        }
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for from in [CampaignStatus::Completed, CampaignStatus::Cancelled] {
            for to in CAMPAIGN_STATES {
                assert!(!campaign_transition_allowed(from, to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_no_self_or_skipping_transitions() {
        for status in CAMPAIGN_STATES {
            assert!(!campaign_transition_allowed(status, status));
        }
        assert!(!campaign_transition_allowed(CampaignStatus::Draft, CampaignStatus::InProgress));
        assert!(!campaign_transition_allowed(CampaignStatus::Approved, CampaignStatus::Completed));
        assert!(campaign_transition_allowed(CampaignStatus::PendingApproval, CampaignStatus::Draft));
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = check_campaign_transition(CampaignStatus::Completed, CampaignStatus::Draft).unwrap_err();
        assert_eq!(err.to_string(), "Invalid campaign transition: completed -> draft");
        assert!(err.is_user_visible());
    }

    #[test]
    fn test_request_transitions() {
        assert!(request_transition_allowed(RequestStatus::Pending, RequestStatus::Negotiating));
        assert!(request_transition_allowed(RequestStatus::Negotiating, RequestStatus::Negotiating));
        assert!(request_transition_allowed(RequestStatus::Negotiating, RequestStatus::Accepted));
        assert!(!request_transition_allowed(RequestStatus::Pending, RequestStatus::Pending));
        for terminal in [RequestStatus::Accepted, RequestStatus::Declined] {
            for to in [
                RequestStatus::Pending,
                RequestStatus::Negotiating,
                RequestStatus::Accepted,
                RequestStatus::Declined,
            ] {
                assert!(check_request_transition(terminal, to).is_err());
            }
        }
    }
}
