//! Domain event bus: trait for publishing lifecycle events from any module.
//!
//! Components accept an `Arc<dyn EventSink>` and publish after each state
//! change. Delivery (notification records, push, email) happens downstream
//! of the sink, so core logic never waits on it.

use crate::types::{CampaignStatus, ContentStatus, Party, RequestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    CollaborationRequested {
        request_id: Uuid,
        campaign_id: Uuid,
        influencer_id: Uuid,
        brand_id: Uuid,
    },
    CollaborationResponded {
        request_id: Uuid,
        campaign_id: Uuid,
        influencer_id: Uuid,
        brand_id: Uuid,
        status: RequestStatus,
        message: Option<String>,
    },
    CounterOfferMade {
        request_id: Uuid,
        campaign_id: Uuid,
        influencer_id: Uuid,
        brand_id: Uuid,
        offered_by: Party,
    },
    ContentSubmitted {
        content_id: Uuid,
        campaign_id: Uuid,
        influencer_id: Uuid,
        brand_id: Uuid,
    },
    ContentReviewed {
        content_id: Uuid,
        campaign_id: Uuid,
        influencer_id: Uuid,
        status: ContentStatus,
        feedback: Option<String>,
    },
    CampaignStatusChanged {
        campaign_id: Uuid,
        brand_id: Uuid,
        from: CampaignStatus,
        to: CampaignStatus,
    },
    ReportGenerated {
        report_id: Uuid,
        campaign_id: Uuid,
        brand_id: Uuid,
    },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::CollaborationRequested { .. } => "collaboration_requested",
            DomainEvent::CollaborationResponded { .. } => "collaboration_responded",
            DomainEvent::CounterOfferMade { .. } => "counter_offer_made",
            DomainEvent::ContentSubmitted { .. } => "content_submitted",
            DomainEvent::ContentReviewed { .. } => "content_reviewed",
            DomainEvent::CampaignStatusChanged { .. } => "campaign_status_changed",
            DomainEvent::ReportGenerated { .. } => "report_generated",
        }
    }
}

/// An event stamped at publication time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub event: DomainEvent,
}

impl EventEnvelope {
    pub fn new(event: DomainEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event,
        }
    }
}

/// Fire-and-forget publication of domain events. Implementations must not
/// block and must not fail the caller.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);
}

/// No-op sink for modules and tests that don't need event emission.
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn emit(&self, _event: DomainEvent) {}
}

/// In-memory sink that captures events for testing.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().expect("event bus mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("event bus mutex poisoned").len()
    }

    pub fn count_named(&self, name: &str) -> usize {
        self.events
            .lock()
            .expect("event bus mutex poisoned")
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().expect("event bus mutex poisoned").clear();
    }
}

impl EventSink for CaptureSink {
    fn emit(&self, event: DomainEvent) {
        self.events.lock().expect("event bus mutex poisoned").push(event);
    }
}

/// Bounded channel sink. A full or closed channel drops the event.
pub struct ChannelSink {
    sender: mpsc::Sender<EventEnvelope>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<EventEnvelope>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: DomainEvent) {
        let name = event.name();
        if let Err(e) = self.sender.try_send(EventEnvelope::new(event)) {
            metrics::counter!("events.dropped").increment(1);
            warn!(event = name, error = %e, "Domain event dropped");
        } else {
            metrics::counter!("events.published").increment(1);
        }
    }
}

/// Convenience: create a no-op event bus for modules that don't need it.
pub fn noop_sink() -> Arc<dyn EventSink> {
    Arc::new(NoOpSink)
}

/// Convenience: create a capture sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}

/// Convenience: create a channel sink and the receiving half for a consumer.
pub fn channel_sink(capacity: usize) -> (Arc<ChannelSink>, mpsc::Receiver<EventEnvelope>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (Arc::new(ChannelSink::new(sender)), receiver)
}
