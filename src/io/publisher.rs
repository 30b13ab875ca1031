//! Outbound message hand-off

use async_trait::async_trait;

/// One message to be published on the bus
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

impl Publication {
    pub fn retained(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self { topic: topic.into(), payload: payload.into(), retain: true }
    }
}

/// Sink for publications
///
/// Publishing is fire-and-forget: an `Ok` only means the message was handed
/// to the transport, not that it was delivered.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, publication: Publication) -> anyhow::Result<()>;
}
