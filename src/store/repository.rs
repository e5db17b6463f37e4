pub mod memory_persistence_port;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::books::domain::model::BookEntity;
use crate::core::library::{BookStatus, LibraryResult};
use crate::holds::domain::model::HoldRequestEntity;
use crate::loans::domain::model::LoanEntity;

// PersistencePort is the durable-storage contract the circulation service
// mirrors every mutation through. save_* calls return the store-assigned
// id. load_all_* are used once at startup to reconstruct in-memory state.
// Each call is expected to succeed or fail before the triggering operation
// returns; the engine performs no retries.
#[async_trait]
pub trait PersistencePort: Sync + Send {
    async fn save_book(&self, book: &BookEntity) -> LibraryResult<String>;

    async fn update_book_status(&self, book_id: &str, status: BookStatus) -> LibraryResult<()>;

    async fn delete_book(&self, book_id: &str) -> LibraryResult<()>;

    async fn save_loan(&self, loan: &LoanEntity) -> LibraryResult<String>;

    async fn update_loan_return(&self, loan_id: &str, receiver_id: &str,
                                returned_at: NaiveDateTime, fine_paid: bool) -> LibraryResult<()>;

    async fn save_hold_request(&self, hold: &HoldRequestEntity) -> LibraryResult<String>;

    async fn delete_hold_request(&self, book_id: &str, borrower_id: &str) -> LibraryResult<()>;

    async fn load_all_books(&self) -> LibraryResult<Vec<BookEntity>>;

    async fn load_all_loans(&self) -> LibraryResult<Vec<LoanEntity>>;

    async fn load_all_hold_requests(&self) -> LibraryResult<Vec<HoldRequestEntity>>;
}
