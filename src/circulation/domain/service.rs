use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::books::domain::model::{BookEntity, BookRecord};
use crate::borrowers::domain::model::BorrowerEntity;
use crate::circulation::domain::{CirculationService, IssueOutcome, PlaceHoldOutcome, RemoveBookOutcome, ReturnOutcome};
use crate::circulation::dto::{BookDto, HoldDto, LoanDto};
use crate::core::domain::Configuration;
use crate::core::events::DomainEvent;
use crate::core::library::{BookStatus, LibraryError, LibraryResult};
use crate::gateway::events::EventPublisher;
use crate::holds::domain::model::HoldRequestEntity;
use crate::holds::domain::queue::EnqueueOutcome;
use crate::loans::domain::fine::compute_fine;
use crate::loans::domain::model::LoanEntity;
use crate::store::repository::PersistencePort;
use crate::utils::date::days_between;

// The in-memory catalog: every book with its queue and ledger, plus the
// per-borrower back-reference views. archived_loans keeps the closed loan
// history of removed books so aggregate fines survive catalog removal.
pub(crate) struct CatalogState {
    pub(crate) books: HashMap<String, BookRecord>,
    pub(crate) borrowers: HashMap<String, BorrowerEntity>,
    pub(crate) archived_loans: Vec<LoanEntity>,
}

impl CatalogState {
    // Rebuilds engine state from a store snapshot such that every invariant
    // holds before the first operation runs: book status is re-derived from
    // active loans (the stored value is advisory), queues are ordered by
    // request time, and borrower views are re-attached. Rows that cannot be
    // honored without breaking an invariant are dropped with a warning; the
    // dropped holds still own store rows and are returned so the caller can
    // delete them (a stale row would otherwise block the pair's next hold).
    // A book with two active loans on record is corrupt input and fails.
    pub(crate) fn reconcile(books: Vec<BookEntity>, loans: Vec<LoanEntity>,
                            mut holds: Vec<HoldRequestEntity>)
                            -> LibraryResult<(CatalogState, Vec<HoldRequestEntity>)> {
        let mut state = CatalogState {
            books: HashMap::new(),
            borrowers: HashMap::new(),
            archived_loans: Vec::new(),
        };
        for book in books {
            state.books.insert(book.book_id.to_string(), BookRecord::new(book));
        }
        for loan in loans {
            if let Some(record) = state.books.get_mut(loan.book_id.as_str()) {
                let attach = if loan.is_active() {
                    Some((loan.borrower_id.to_string(), loan.loan_id.to_string()))
                } else {
                    None
                };
                record.ledger.restore(loan)?;
                if let Some((borrower_id, loan_id)) = attach {
                    state.borrowers.entry(borrower_id.to_string())
                        .or_insert_with(|| BorrowerEntity::new(borrower_id.as_str()))
                        .attach_loan(loan_id.as_str());
                }
            } else if loan.is_active() {
                return Err(LibraryError::validation(
                    format!("active loan {} references unknown book {}",
                            loan.loan_id, loan.book_id).as_str(), Some("409".to_string())));
            } else {
                // closed history of a removed book, kept for fine queries
                state.archived_loans.push(loan);
            }
        }
        holds.sort_by(|a, b| a.requested_at.cmp(&b.requested_at));
        let mut orphaned = Vec::new();
        for hold in holds {
            let Some(record) = state.books.get_mut(hold.book_id.as_str()) else {
                tracing::warn!("dropping hold {} for unknown book {}", hold.hold_id, hold.book_id);
                orphaned.push(hold);
                continue;
            };
            if record.ledger.find_active_loan_for(hold.borrower_id.as_str()).is_some() {
                tracing::warn!("dropping hold {}: borrower {} already has book {} on loan",
                               hold.hold_id, hold.borrower_id, hold.book_id);
                orphaned.push(hold);
                continue;
            }
            let borrower_id = hold.borrower_id.to_string();
            let hold_id = hold.hold_id.to_string();
            match record.queue.enqueue(hold) {
                EnqueueOutcome::Accepted => {
                    state.borrowers.entry(borrower_id.to_string())
                        .or_insert_with(|| BorrowerEntity::new(borrower_id.as_str()))
                        .attach_hold(hold_id.as_str());
                }
                EnqueueOutcome::RejectedDuplicate => {
                    // the kept entry owns the (book, borrower) store row
                    tracing::warn!("dropping duplicate hold {} for borrower {}", hold_id, borrower_id);
                }
            }
        }
        for record in state.books.values_mut() {
            let derived = record.derived_status();
            if record.book.book_status != derived {
                tracing::warn!("book {} stored status {} disagrees with ledger, using {}",
                               record.book.book_id, record.book.book_status, derived);
                record.book.book_status = derived;
            }
        }
        Ok((state, orphaned))
    }
}

pub(crate) struct CirculationServiceImpl {
    config: Configuration,
    store: Box<dyn PersistencePort>,
    events_publisher: Box<dyn EventPublisher>,
    // one mutual-exclusion boundary for all admission decisions: reading
    // queue/ledger state and acting on it must not interleave
    state: Mutex<CatalogState>,
}

impl CirculationServiceImpl {
    pub(crate) fn new(config: &Configuration, store: Box<dyn PersistencePort>,
                      events_publisher: Box<dyn EventPublisher>, state: CatalogState) -> Self {
        Self {
            config: config.clone(),
            store,
            events_publisher,
            state: Mutex::new(state),
        }
    }

    // Events are advisory; a publisher failure never aborts an operation.
    async fn publish(&self, event: serde_json::Result<DomainEvent>) {
        match event {
            Ok(event) => {
                if let Err(err) = self.events_publisher.publish(&event).await {
                    tracing::debug!("failed to publish event {:?}", err);
                }
            }
            Err(err) => {
                tracing::debug!("failed to build event {:?}", err);
            }
        }
    }

    // Lazy expiry: drops every hold older than expiry_days from the store,
    // the queue and the owning borrower's view. Runs at the start of each
    // issue attempt, never as a background sweep. Store deletes go first so
    // a failure leaves in-memory state untouched.
    async fn purge_expired_holds(&self, state: &mut CatalogState, book_id: &str,
                                 now: NaiveDateTime) -> LibraryResult<()> {
        let record = state.books.get_mut(book_id).ok_or_else(|| {
            LibraryError::not_found(format!("book with id {} not found", book_id).as_str())
        })?;
        let expired: Vec<HoldRequestEntity> = record.queue.entries()
            .filter(|h| days_between(h.requested_at, now) > self.config.expiry_days)
            .cloned()
            .collect();
        if expired.is_empty() {
            return Ok(());
        }
        for hold in &expired {
            self.store.delete_hold_request(hold.book_id.as_str(), hold.borrower_id.as_str()).await?;
        }
        for hold in record.queue.purge_expired(now, self.config.expiry_days) {
            if let Some(borrower) = state.borrowers.get_mut(hold.borrower_id.as_str()) {
                borrower.detach_hold(hold.hold_id.as_str());
            }
            tracing::debug!("expired hold {} on book {} for borrower {}",
                            hold.hold_id, hold.book_id, hold.borrower_id);
            self.publish(DomainEvent::deleted(
                "hold_expired", "circulation", hold.hold_id.as_str(),
                &HashMap::new(), &HoldDto::from(&hold))).await;
        }
        Ok(())
    }
}

#[async_trait]
impl CirculationService for CirculationServiceImpl {
    async fn add_book(&self, title: &str, author: &str, subject: &str,
                      now: NaiveDateTime) -> LibraryResult<BookDto> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let mut book = BookEntity::new(title, author, subject, now);
        let book_id = self.store.save_book(&book).await?;
        book.book_id = book_id.to_string();
        let record = BookRecord::new(book);
        let dto = BookDto::from(&record);
        state.books.insert(book_id.to_string(), record);
        tracing::info!("added book {} to catalog", book_id);
        self.publish(DomainEvent::added(
            "book_added", "circulation", book_id.as_str(), &HashMap::new(), &dto)).await;
        Ok(dto)
    }

    async fn issue(&self, book_id: &str, borrower_id: &str, staff_id: &str,
                   now: NaiveDateTime) -> LibraryResult<IssueOutcome> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        self.purge_expired_holds(state, book_id, now).await?;

        let record = state.books.get_mut(book_id).ok_or_else(|| {
            LibraryError::not_found(format!("book with id {} not found", book_id).as_str())
        })?;
        if record.ledger.has_active_loan() {
            return Ok(IssueOutcome::AlreadyIssued);
        }
        if !record.queue.is_empty() {
            match record.queue.position_of(borrower_id) {
                None => return Ok(IssueOutcome::BlockedNotInQueue),
                Some(pos) if pos > 0 => return Ok(IssueOutcome::BlockedQueuePosition(pos)),
                Some(_) => {
                    // the head of the queue is being serviced
                    self.store.delete_hold_request(book_id, borrower_id).await?;
                    if let Some(head) = record.queue.dequeue_head() {
                        if let Some(borrower) = state.borrowers.get_mut(head.borrower_id.as_str()) {
                            borrower.detach_hold(head.hold_id.as_str());
                        }
                    }
                }
            }
        }
        let record = state.books.get_mut(book_id).ok_or_else(|| {
            LibraryError::not_found(format!("book with id {} not found", book_id).as_str())
        })?;
        let mut loan = LoanEntity::new(book_id, borrower_id, staff_id, now);
        let loan_id = self.store.save_loan(&loan).await?;
        loan.loan_id = loan_id;
        self.store.update_book_status(book_id, BookStatus::Issued).await?;
        let loan = record.ledger.open_loan(loan)?;
        record.book.book_status = BookStatus::Issued;
        record.book.updated_at = now;
        record.book.version += 1;
        state.borrowers.entry(borrower_id.to_string())
            .or_insert_with(|| BorrowerEntity::new(borrower_id))
            .attach_loan(loan.loan_id.as_str());
        let dto = LoanDto::from(&loan);
        tracing::info!("issued book {} to borrower {} by staff {}", book_id, borrower_id, staff_id);
        self.publish(DomainEvent::added(
            "book_issued", "circulation", loan.loan_id.as_str(), &HashMap::new(), &dto)).await;
        Ok(IssueOutcome::Issued(dto))
    }

    async fn return_book(&self, book_id: &str, loan_id: &str, staff_id: &str,
                         fine_paid: bool, now: NaiveDateTime) -> LibraryResult<ReturnOutcome> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let record = state.books.get_mut(book_id).ok_or_else(|| {
            LibraryError::not_found(format!("book with id {} not found", book_id).as_str())
        })?;
        let active = record.ledger.active_loan()
            .filter(|l| l.loan_id == loan_id)
            .cloned()
            .ok_or_else(|| LibraryError::invalid_reference(
                format!("loan {} is not the active loan for book {}", loan_id, book_id).as_str()))?;
        let raw_fine = if active.fine_paid {
            Decimal::ZERO
        } else {
            compute_fine(active.issued_at, now, self.config.deadline_days, self.config.per_day_rate)
        };
        self.store.update_loan_return(loan_id, staff_id, now, fine_paid).await?;
        self.store.update_book_status(book_id, BookStatus::Available).await?;
        let closed = record.ledger.close_loan(loan_id, staff_id, now, fine_paid)?;
        record.book.book_status = BookStatus::Available;
        record.book.updated_at = now;
        record.book.version += 1;
        if let Some(borrower) = state.borrowers.get_mut(closed.borrower_id.as_str()) {
            borrower.detach_loan(loan_id);
        }
        let dto = LoanDto::from(&closed);
        tracing::info!("returned book {} from borrower {} with fine {}",
                       book_id, closed.borrower_id, raw_fine);
        self.publish(DomainEvent::updated(
            "book_returned", "circulation", loan_id, &HashMap::new(), &dto)).await;
        Ok(ReturnOutcome::Returned { loan: dto, raw_fine })
    }

    async fn place_hold(&self, book_id: &str, borrower_id: &str,
                        now: NaiveDateTime) -> LibraryResult<PlaceHoldOutcome> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let record = state.books.get_mut(book_id).ok_or_else(|| {
            LibraryError::not_found(format!("book with id {} not found", book_id).as_str())
        })?;
        if record.ledger.find_active_loan_for(borrower_id).is_some() {
            return Ok(PlaceHoldOutcome::RejectedAlreadyBorrowed);
        }
        if record.queue.contains(borrower_id) {
            return Ok(PlaceHoldOutcome::RejectedDuplicate);
        }
        let mut hold = HoldRequestEntity::new(book_id, borrower_id, now);
        let hold_id = self.store.save_hold_request(&hold).await?;
        hold.hold_id = hold_id.to_string();
        let dto = HoldDto::from(&hold);
        match record.queue.enqueue(hold) {
            EnqueueOutcome::Accepted => {}
            EnqueueOutcome::RejectedDuplicate => return Ok(PlaceHoldOutcome::RejectedDuplicate),
        }
        state.borrowers.entry(borrower_id.to_string())
            .or_insert_with(|| BorrowerEntity::new(borrower_id))
            .attach_hold(hold_id.as_str());
        tracing::info!("placed hold {} on book {} for borrower {}", hold_id, book_id, borrower_id);
        self.publish(DomainEvent::added(
            "hold_placed", "circulation", hold_id.as_str(), &HashMap::new(), &dto)).await;
        Ok(PlaceHoldOutcome::Placed(dto))
    }

    async fn remove_book(&self, book_id: &str) -> LibraryResult<RemoveBookOutcome> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let record = state.books.get(book_id).ok_or_else(|| {
            LibraryError::not_found(format!("book with id {} not found", book_id).as_str())
        })?;
        if record.ledger.has_active_loan() {
            return Ok(RemoveBookOutcome::RejectedCurrentlyIssued);
        }
        let dto = BookDto::from(record);
        let waiting: Vec<String> = record.queue.entries()
            .map(|h| h.borrower_id.to_string())
            .collect();
        for borrower_id in &waiting {
            self.store.delete_hold_request(book_id, borrower_id).await?;
        }
        self.store.delete_book(book_id).await?;
        if let Some(mut record) = state.books.remove(book_id) {
            for hold in record.queue.remove_all() {
                if let Some(borrower) = state.borrowers.get_mut(hold.borrower_id.as_str()) {
                    borrower.detach_hold(hold.hold_id.as_str());
                }
            }
            for loan in record.ledger.loans() {
                state.archived_loans.push(loan.clone());
            }
        }
        tracing::info!("removed book {} and {} pending holds", book_id, waiting.len());
        self.publish(DomainEvent::deleted(
            "book_removed", "circulation", book_id, &HashMap::new(), &dto)).await;
        Ok(RemoveBookOutcome::Removed)
    }

    async fn fine_owed(&self, book_id: &str, loan_id: &str,
                       now: NaiveDateTime) -> LibraryResult<Decimal> {
        let guard = self.state.lock().await;
        let record = guard.books.get(book_id).ok_or_else(|| {
            LibraryError::not_found(format!("book with id {} not found", book_id).as_str())
        })?;
        let loan = record.ledger.loans()
            .find(|l| l.loan_id == loan_id)
            .ok_or_else(|| LibraryError::invalid_reference(
                format!("loan {} is not on record for book {}", loan_id, book_id).as_str()))?;
        if loan.fine_paid {
            return Ok(Decimal::ZERO);
        }
        let reference = loan.returned_at.unwrap_or(now);
        Ok(compute_fine(loan.issued_at, reference, self.config.deadline_days, self.config.per_day_rate))
    }

    async fn aggregate_fine(&self, borrower_id: &str,
                            now: NaiveDateTime) -> LibraryResult<Decimal> {
        let guard = self.state.lock().await;
        let mut total = Decimal::ZERO;
        let all_loans = guard.books.values()
            .flat_map(|record| record.ledger.loans())
            .chain(guard.archived_loans.iter());
        for loan in all_loans.filter(|l| l.borrower_id == borrower_id) {
            if loan.fine_paid {
                continue;
            }
            let reference = loan.returned_at.unwrap_or(now);
            total += compute_fine(loan.issued_at, reference,
                                  self.config.deadline_days, self.config.per_day_rate);
        }
        Ok(total)
    }

    async fn find_book(&self, book_id: &str) -> LibraryResult<BookDto> {
        let guard = self.state.lock().await;
        let record = guard.books.get(book_id).ok_or_else(|| {
            LibraryError::not_found(format!("book with id {} not found", book_id).as_str())
        })?;
        Ok(BookDto::from(record))
    }

    async fn hold_position(&self, book_id: &str, borrower_id: &str) -> LibraryResult<Option<usize>> {
        let guard = self.state.lock().await;
        let record = guard.books.get(book_id).ok_or_else(|| {
            LibraryError::not_found(format!("book with id {} not found", book_id).as_str())
        })?;
        Ok(record.queue.position_of(borrower_id))
    }

    async fn borrower_loans(&self, borrower_id: &str) -> LibraryResult<Vec<LoanDto>> {
        let guard = self.state.lock().await;
        Ok(guard.books.values()
            .filter_map(|record| record.ledger.find_active_loan_for(borrower_id))
            .map(LoanDto::from)
            .collect())
    }

    async fn borrower_holds(&self, borrower_id: &str) -> LibraryResult<Vec<HoldDto>> {
        let guard = self.state.lock().await;
        Ok(guard.books.values()
            .flat_map(|record| record.queue.entries())
            .filter(|hold| hold.borrower_id == borrower_id)
            .map(HoldDto::from)
            .collect())
    }
}
