//! Campaign lifecycle: campaign and collaboration-request state machines,
//! content approval, negotiation and notification dispatch.

pub mod campaigns;
pub mod negotiation;
pub mod notifier;
pub mod state_machine;

#[cfg(test)]
mod test_support;

pub use campaigns::{CampaignCreated, CampaignManager, NewCampaign, NewCollaborationRequest, NewContent};
pub use negotiation::Negotiator;
pub use notifier::NotificationDispatcher;
