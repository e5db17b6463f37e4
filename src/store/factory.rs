use crate::store::repository::memory_persistence_port::MemoryPersistencePort;
use crate::store::repository::PersistencePort;

pub fn create_memory_persistence_port() -> Box<dyn PersistencePort> {
    Box::new(MemoryPersistencePort::new())
}
