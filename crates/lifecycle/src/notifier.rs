//! Notification dispatcher: turns domain events into notification records
//! for the party on the other side of each change.

use influencer_core::event_bus::{DomainEvent, EventEnvelope};
use influencer_core::store::DocumentStore;
use influencer_core::types::{ContentStatus, Notification, NotificationKind, Party, RequestStatus};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct Draft {
    recipient: Party,
    recipient_id: Uuid,
    kind: NotificationKind,
    title: &'static str,
    message: String,
    campaign_id: Uuid,
    related_id: Uuid,
}

fn with_note(base: &str, note: Option<&str>) -> String {
    match note.map(str::trim).filter(|n| !n.is_empty()) {
        Some(note) => format!("{base}: {note}"),
        None => base.to_string(),
    }
}

fn draft_for(event: &DomainEvent) -> Option<Draft> {
    let draft = match event {
        DomainEvent::CollaborationRequested {
            request_id,
            campaign_id,
            influencer_id,
            ..
        } => Draft {
            recipient: Party::Influencer,
            recipient_id: *influencer_id,
            kind: NotificationKind::CollaborationRequest,
            title: "New collaboration request",
            message: "A brand has invited you to a campaign".to_string(),
            campaign_id: *campaign_id,
            related_id: *request_id,
        },
        DomainEvent::CollaborationResponded {
            request_id,
            campaign_id,
            brand_id,
            status,
            message,
            ..
        } => {
            let (kind, title) = match status {
                RequestStatus::Accepted => (NotificationKind::CollaborationAccepted, "Collaboration accepted"),
                RequestStatus::Declined => (NotificationKind::CollaborationDeclined, "Collaboration declined"),
                _ => return None,
            };
            Draft {
                recipient: Party::Brand,
                recipient_id: *brand_id,
                kind,
                title,
                message: with_note(&format!("The influencer {status} your request"), message.as_deref()),
                campaign_id: *campaign_id,
                related_id: *request_id,
            }
        }
        DomainEvent::CounterOfferMade {
            request_id,
            campaign_id,
            influencer_id,
            brand_id,
            offered_by,
        } => {
            let recipient = offered_by.counterpart();
            Draft {
                recipient,
                recipient_id: match recipient {
                    Party::Influencer => *influencer_id,
                    Party::Brand => *brand_id,
                },
                kind: NotificationKind::CounterOffer,
                title: "New counter-offer",
                message: "New terms were proposed for a collaboration".to_string(),
                campaign_id: *campaign_id,
                related_id: *request_id,
            }
        }
        DomainEvent::ContentSubmitted {
            content_id,
            campaign_id,
            brand_id,
            ..
        } => Draft {
            recipient: Party::Brand,
            recipient_id: *brand_id,
            kind: NotificationKind::ContentSubmitted,
            title: "Content awaiting review",
            message: "An influencer submitted content for approval".to_string(),
            campaign_id: *campaign_id,
            related_id: *content_id,
        },
        DomainEvent::ContentReviewed {
            content_id,
            campaign_id,
            influencer_id,
            status,
            feedback,
        } => {
            let (kind, title, base) = match status {
                ContentStatus::Approved => (
                    NotificationKind::ContentApproved,
                    "Content approved",
                    "Your content was approved",
                ),
                ContentStatus::Rejected => (
                    NotificationKind::ContentRejected,
                    "Content rejected",
                    "Your content was rejected",
                ),
                ContentStatus::PendingApproval => return None,
            };
            Draft {
                recipient: Party::Influencer,
                recipient_id: *influencer_id,
                kind,
                title,
                message: with_note(base, feedback.as_deref()),
                campaign_id: *campaign_id,
                related_id: *content_id,
            }
        }
        DomainEvent::CampaignStatusChanged {
            campaign_id,
            brand_id,
            from,
            to,
        } => Draft {
            recipient: Party::Brand,
            recipient_id: *brand_id,
            kind: NotificationKind::CampaignStatusChanged,
            title: "Campaign status changed",
            message: format!("Campaign moved from {from} to {to}"),
            campaign_id: *campaign_id,
            related_id: *campaign_id,
        },
        DomainEvent::ReportGenerated {
            report_id,
            campaign_id,
            brand_id,
        } => Draft {
            recipient: Party::Brand,
            recipient_id: *brand_id,
            kind: NotificationKind::ReportReady,
            title: "Campaign report ready",
            message: "A new performance report is available".to_string(),
            campaign_id: *campaign_id,
            related_id: *report_id,
        },
    };
    Some(draft)
}

/// Maps an event to the notification it produces, if any.
pub fn notification_for(envelope: &EventEnvelope) -> Option<Notification> {
    draft_for(&envelope.event).map(|d| Notification {
        id: Uuid::new_v4(),
        recipient: d.recipient,
        recipient_id: d.recipient_id,
        kind: d.kind,
        title: d.title.to_string(),
        message: d.message,
        campaign_id: Some(d.campaign_id),
        related_id: Some(d.related_id),
        read: false,
        created_at: envelope.occurred_at,
    })
}

pub struct NotificationDispatcher {
    store: Arc<dyn DocumentStore>,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Writes the notification for one event. Store failures are logged and
    /// swallowed.
    pub async fn dispatch(&self, envelope: &EventEnvelope) -> Option<Notification> {
        let notification = notification_for(envelope)?;
        match self.store.insert_notification(notification.clone()).await {
            Ok(()) => {
                metrics::counter!("notifications.written").increment(1);
                debug!(
                    event = envelope.event.name(),
                    recipient_id = %notification.recipient_id,
                    "Notification written"
                );
                Some(notification)
            }
            Err(e) => {
                metrics::counter!("notifications.failed").increment(1);
                warn!(event = envelope.event.name(), error = %e, "Notification write failed");
                None
            }
        }
    }

    /// Drains the event channel until every sender is dropped.
    pub async fn run(self, mut receiver: mpsc::Receiver<EventEnvelope>) {
        info!("Notification dispatcher started");
        while let Some(envelope) = receiver.recv().await {
            self.dispatch(&envelope).await;
        }
        info!("Notification dispatcher stopped");
    }
}
