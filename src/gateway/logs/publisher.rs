use async_trait::async_trait;

use crate::core::events::DomainEvent;
use crate::core::library::LibraryError;
use crate::gateway::events::EventPublisher;

// LogPublisher emits domain events to the tracing pipeline. Suits
// single-process embedders; a broker-backed publisher can be swapped in
// behind the same trait.
#[derive(Debug, Default)]
pub struct LogPublisher {}

impl LogPublisher {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), LibraryError> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(name = event.name.as_str(), key = event.key.as_str(), "{}", payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::core::events::DomainEvent;
    use crate::gateway::events::EventPublisher;
    use crate::gateway::logs::publisher::LogPublisher;

    #[tokio::test]
    async fn test_should_publish_to_log() {
        let data = HashMap::from([("book_id", "b1")]);
        let event = DomainEvent::added("book_issued", "circulation", "b1", &HashMap::new(), &data)
            .expect("build event");
        let publisher = LogPublisher::new();
        publisher.publish(&event).await.expect("should publish");
    }
}
