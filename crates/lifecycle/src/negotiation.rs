//! Counter-offer exchange on collaboration requests.

use crate::state_machine::apply_request_change;
use chrono::Utc;
use influencer_core::event_bus::{DomainEvent, EventSink};
use influencer_core::store::{DocumentStore, RequestChange};
use influencer_core::types::{CollaborationRequest, CounterOffer};
use influencer_core::EngineResult;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct Negotiator {
    store: Arc<dyn DocumentStore>,
    events: Arc<dyn EventSink>,
}

impl Negotiator {
    pub fn new(store: Arc<dyn DocumentStore>, events: Arc<dyn EventSink>) -> Self {
        Self { store, events }
    }

    /// Records a counter-offer and moves the request to `negotiating`. The
    /// offer is appended to the negotiation history and the other party is
    /// notified. Resolution goes through the regular accept/decline call.
    pub async fn negotiate_terms(
        &self,
        request_id: Uuid,
        offer: CounterOffer,
    ) -> EngineResult<CollaborationRequest> {
        let offered_by = offer.offered_by;
        let request = apply_request_change(
            self.store.as_ref(),
            request_id,
            RequestChange::CounterOffer { offer, at: Utc::now() },
        )
        .await?;

        self.events.emit(DomainEvent::CounterOfferMade {
            request_id,
            campaign_id: request.campaign_id,
            influencer_id: request.influencer_id,
            brand_id: request.brand_id,
            offered_by,
        });
        metrics::counter!("lifecycle.counter_offers").increment(1);
        info!(
            request_id = %request_id,
            offered_by = ?offered_by,
            round = request.negotiation_history.len(),
            "Counter-offer recorded"
        );
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::YieldingStore;
    use influencer_core::event_bus::capture_sink;
    use influencer_core::types::{OfferTerms, Party, RequestStatus};
    use influencer_core::{EngineError, MemoryStore};

    async fn pending_request(store: &MemoryStore) -> Uuid {
        let now = Utc::now();
        let request = CollaborationRequest {
            id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            influencer_id: Uuid::new_v4(),
            brand_id: Uuid::new_v4(),
            status: RequestStatus::Pending,
            compensation: Some(300.0),
            requirements: None,
            deadline: None,
            counter_offer: None,
            negotiation_history: Vec::new(),
            message: None,
            created_at: now,
            updated_at: now,
            responded_at: None,
        };
        let id = request.id;
        store.insert_collaboration_request(request).await.unwrap();
        id
    }

    fn offer(by: Party, compensation: f64) -> CounterOffer {
        CounterOffer {
            offered_by: by,
            terms: OfferTerms {
                compensation: Some(compensation),
                deliverables: vec!["1 reel".into()],
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_offers_append_to_history() {
        let store = Arc::new(MemoryStore::new());
        let events = capture_sink();
        let negotiator = Negotiator::new(store.clone(), events.clone());
        let id = pending_request(&store).await;

        negotiator.negotiate_terms(id, offer(Party::Influencer, 450.0)).await.unwrap();
        let request = negotiator.negotiate_terms(id, offer(Party::Brand, 400.0)).await.unwrap();

        assert_eq!(request.status, RequestStatus::Negotiating);
        assert_eq!(request.negotiation_history.len(), 2);
        assert_eq!(request.negotiation_history[0].offered_by, Party::Influencer);
        assert_eq!(request.negotiation_history[1].terms.compensation, Some(400.0));
        assert_eq!(request.counter_offer, Some(offer(Party::Brand, 400.0)));
        // The original offer is untouched until a decision is made.
        assert_eq!(request.compensation, Some(300.0));

        let stored = store.get_collaboration_request(id).await.unwrap().unwrap();
        assert_eq!(stored.negotiation_history, request.negotiation_history);

        let offered_by: Vec<Party> = events
            .events()
            .into_iter()
            .filter_map(|e| match e {
                DomainEvent::CounterOfferMade { offered_by, .. } => Some(offered_by),
                _ => None,
            })
            .collect();
        assert_eq!(offered_by, vec![Party::Influencer, Party::Brand]);
    }

    #[tokio::test]
    async fn test_concurrent_offers_both_recorded() {
        let store = Arc::new(YieldingStore::default());
        let events = capture_sink();
        let negotiator = Negotiator::new(store.clone(), events.clone());
        let id = pending_request(&store.0).await;

        let (first, second) = tokio::join!(
            negotiator.negotiate_terms(id, offer(Party::Influencer, 450.0)),
            negotiator.negotiate_terms(id, offer(Party::Brand, 400.0)),
        );
        first.unwrap();
        second.unwrap();

        let stored = store.0.get_collaboration_request(id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Negotiating);
        assert_eq!(stored.negotiation_history.len(), 2);
        assert_eq!(events.count_named("counter_offer_made"), 2);
    }

    #[tokio::test]
    async fn test_no_negotiation_after_decision() {
        let store = Arc::new(MemoryStore::new());
        let negotiator = Negotiator::new(store.clone(), capture_sink());
        let id = pending_request(&store).await;
        let mut request = store.get_collaboration_request(id).await.unwrap().unwrap();
        request.status = RequestStatus::Accepted;
        store.put_collaboration_request(request).await.unwrap();

        let err = negotiator
            .negotiate_terms(id, offer(Party::Brand, 100.0))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
        let stored = store.get_collaboration_request(id).await.unwrap().unwrap();
        assert!(stored.negotiation_history.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_request() {
        let negotiator = Negotiator::new(Arc::new(MemoryStore::new()), capture_sink());
        let err = negotiator
            .negotiate_terms(Uuid::new_v4(), offer(Party::Brand, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}
