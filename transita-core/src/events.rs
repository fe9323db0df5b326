use crate::CoreResult;
use async_trait::async_trait;

/// Outbound event publishing seam. Handlers publish fire-and-forget; the
/// production implementation is the Kafka producer in the store crate.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> CoreResult<()>;
}
