use crate::circulation::domain::service::{CatalogState, CirculationServiceImpl};
use crate::circulation::domain::CirculationService;
use crate::core::domain::Configuration;
use crate::core::library::LibraryResult;
use crate::gateway::events::EventPublisher;
use crate::store::repository::PersistencePort;

// Builds the engine: validates the configuration, loads the store snapshot
// and reconciles it into catalog state before the first operation runs.
pub async fn create_circulation_service(
    config: &Configuration,
    store: Box<dyn PersistencePort>,
    events_publisher: Box<dyn EventPublisher>,
) -> LibraryResult<Box<dyn CirculationService>> {
    config.validate()?;
    let books = store.load_all_books().await?;
    let loans = store.load_all_loans().await?;
    let holds = store.load_all_hold_requests().await?;
    let (state, orphaned_holds) = CatalogState::reconcile(books, loans, holds)?;
    // rows dropped during reconciliation no longer back any queue entry
    for hold in orphaned_holds {
        store.delete_hold_request(hold.book_id.as_str(), hold.borrower_id.as_str()).await?;
    }
    Ok(Box::new(CirculationServiceImpl::new(config, store, events_publisher, state)))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::circulation::factory::create_circulation_service;
    use crate::core::domain::Configuration;
    use crate::gateway::factory::create_publisher;
    use crate::store::factory::create_memory_persistence_port;

    #[tokio::test]
    async fn test_should_create_service_from_empty_store() {
        let config = Configuration::new(14, Decimal::ONE, 30);
        let svc = create_circulation_service(&config, create_memory_persistence_port(), create_publisher())
            .await;
        assert!(svc.is_ok());
    }

    #[tokio::test]
    async fn test_should_reject_invalid_configuration() {
        let config = Configuration::new(0, Decimal::ONE, 30);
        let svc = create_circulation_service(&config, create_memory_persistence_port(), create_publisher())
            .await;
        assert!(svc.is_err());
    }
}
