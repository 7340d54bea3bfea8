//! Outbound domain events.
//!
//! Events are published after the change that raised them has been
//! committed. Publishing is fire-and-forget: a failure is logged and never
//! turns a committed operation into an error.

use async_trait::async_trait;
use tracing::{info, warn};
use crate::domain::events::DomainEvent;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &DomainEvent);

    async fn publish_all(&self, events: Vec<DomainEvent>) {
        for event in &events { self.publish(event).await; }
    }
}

/// Writes events to the log only. Used when no broker is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, event: &DomainEvent) {
        info!(subject = event.subject(), ?event, "domain event");
    }
}

pub struct NatsPublisher {
    client: async_nats::Client,
    prefix: String,
}

impl NatsPublisher {
    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, async_nats::ConnectError> {
        let client = async_nats::connect(url).await?;
        Ok(Self { client, prefix: prefix.into() })
    }

    pub fn subject_for(&self, event: &DomainEvent) -> String { format!("{}.{}", self.prefix, event.subject()) }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, event: &DomainEvent) {
        let subject = self.subject_for(event);
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(e) => { warn!(%subject, error = %e, "could not encode event"); return; }
        };
        if let Err(e) = self.client.publish(subject.clone(), payload.into()).await {
            warn!(%subject, error = %e, "could not publish event");
        }
    }
}
