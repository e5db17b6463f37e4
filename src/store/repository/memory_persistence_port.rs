use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::books::domain::model::BookEntity;
use crate::core::library::{BookStatus, LibraryError, LibraryResult};
use crate::holds::domain::model::HoldRequestEntity;
use crate::loans::domain::model::LoanEntity;
use crate::store::repository::PersistencePort;

#[derive(Debug, Default)]
struct MemoryTables {
    books: HashMap<String, BookEntity>,
    loans: HashMap<String, LoanEntity>,
    // one row per (book_id, borrower_id) pair
    holds: HashMap<(String, String), HoldRequestEntity>,
}

// MemoryPersistencePort is a process-local adapter with the same contract
// as a durable store: ids are assigned on first save and every write either
// succeeds or fails before returning. Used by tests and by embedders that
// bring no database.
#[derive(Debug, Default)]
pub struct MemoryPersistencePort {
    tables: Mutex<MemoryTables>,
}

impl MemoryPersistencePort {
    pub fn new() -> Self {
        Self { tables: Mutex::new(MemoryTables::default()) }
    }

    fn guard(&self) -> LibraryResult<MutexGuard<'_, MemoryTables>> {
        self.tables.lock().map_err(|err| {
            LibraryError::runtime(format!("memory store lock poisoned {:?}", err).as_str(), None)
        })
    }
}

#[async_trait]
impl PersistencePort for MemoryPersistencePort {
    async fn save_book(&self, book: &BookEntity) -> LibraryResult<String> {
        let mut tables = self.guard()?;
        let id = Uuid::new_v4().to_string();
        let mut saved = book.clone();
        saved.book_id = id.to_string();
        tables.books.insert(id.to_string(), saved);
        Ok(id)
    }

    async fn update_book_status(&self, book_id: &str, status: BookStatus) -> LibraryResult<()> {
        let mut tables = self.guard()?;
        let book = tables.books.get_mut(book_id).ok_or_else(|| {
            LibraryError::not_found(format!("book with id {} not found", book_id).as_str())
        })?;
        book.book_status = status;
        book.version += 1;
        Ok(())
    }

    async fn delete_book(&self, book_id: &str) -> LibraryResult<()> {
        let mut tables = self.guard()?;
        tables.books.remove(book_id).ok_or_else(|| {
            LibraryError::not_found(format!("book with id {} not found", book_id).as_str())
        })?;
        Ok(())
    }

    async fn save_loan(&self, loan: &LoanEntity) -> LibraryResult<String> {
        let mut tables = self.guard()?;
        let id = Uuid::new_v4().to_string();
        let mut saved = loan.clone();
        saved.loan_id = id.to_string();
        tables.loans.insert(id.to_string(), saved);
        Ok(id)
    }

    async fn update_loan_return(&self, loan_id: &str, receiver_id: &str,
                                returned_at: NaiveDateTime, fine_paid: bool) -> LibraryResult<()> {
        let mut tables = self.guard()?;
        let loan = tables.loans.get_mut(loan_id).ok_or_else(|| {
            LibraryError::not_found(format!("loan with id {} not found", loan_id).as_str())
        })?;
        if loan.returned_at.is_some() {
            return Err(LibraryError::duplicate_key(
                format!("loan with id {} is already returned", loan_id).as_str()));
        }
        loan.receiver_id = Some(receiver_id.to_string());
        loan.returned_at = Some(returned_at);
        loan.fine_paid = fine_paid;
        loan.updated_at = returned_at;
        loan.version += 1;
        Ok(())
    }

    async fn save_hold_request(&self, hold: &HoldRequestEntity) -> LibraryResult<String> {
        let mut tables = self.guard()?;
        let key = (hold.book_id.to_string(), hold.borrower_id.to_string());
        if tables.holds.contains_key(&key) {
            return Err(LibraryError::duplicate_key(
                format!("hold for book {} and borrower {} already exists",
                        hold.book_id, hold.borrower_id).as_str()));
        }
        let id = Uuid::new_v4().to_string();
        let mut saved = hold.clone();
        saved.hold_id = id.to_string();
        tables.holds.insert(key, saved);
        Ok(id)
    }

    async fn delete_hold_request(&self, book_id: &str, borrower_id: &str) -> LibraryResult<()> {
        let mut tables = self.guard()?;
        let key = (book_id.to_string(), borrower_id.to_string());
        tables.holds.remove(&key).ok_or_else(|| {
            LibraryError::not_found(format!("hold for book {} and borrower {} not found",
                                            book_id, borrower_id).as_str())
        })?;
        Ok(())
    }

    async fn load_all_books(&self) -> LibraryResult<Vec<BookEntity>> {
        let tables = self.guard()?;
        Ok(tables.books.values().cloned().collect())
    }

    async fn load_all_loans(&self) -> LibraryResult<Vec<LoanEntity>> {
        let tables = self.guard()?;
        Ok(tables.loans.values().cloned().collect())
    }

    async fn load_all_hold_requests(&self) -> LibraryResult<Vec<HoldRequestEntity>> {
        let tables = self.guard()?;
        Ok(tables.holds.values().cloned().collect())
    }
}
