use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::circulation::dto::{BookDto, HoldDto, LoanDto};
use crate::core::library::LibraryResult;

pub mod service;

// Admission outcomes are ordinary business results the caller branches on,
// not errors. Errors (LibraryError) are reserved for caller misuse and
// store failures.
#[derive(Debug, PartialEq)]
pub enum IssueOutcome {
    Issued(LoanDto),
    // the book is out; placing a hold is a separate, explicit call
    AlreadyIssued,
    // others are waiting and this borrower never requested a hold
    BlockedNotInQueue,
    // borrower is queued behind this many earlier requests
    BlockedQueuePosition(usize),
}

#[derive(Debug, PartialEq)]
pub enum ReturnOutcome {
    Returned {
        loan: LoanDto,
        // fine accrued by this loan, before the caller's payment decision
        raw_fine: Decimal,
    },
}

#[derive(Debug, PartialEq)]
pub enum PlaceHoldOutcome {
    Placed(HoldDto),
    RejectedDuplicate,
    RejectedAlreadyBorrowed,
}

#[derive(Debug, PartialEq)]
pub enum RemoveBookOutcome {
    Removed,
    RejectedCurrentlyIssued,
}

// CirculationService orchestrates the availability state machine, the FIFO
// hold queue and the loan ledger of every book, mirroring each mutation
// through the persistence port. Every operation takes `now` from the
// caller; the engine owns no clock and performs no I/O of its own.
//
// Operations on the same service instance are serialized internally; the
// admission decisions below read queue and ledger state and act on it as
// one atomic step.
#[async_trait]
pub trait CirculationService: Sync + Send {
    async fn add_book(&self, title: &str, author: &str, subject: &str,
                      now: NaiveDateTime) -> LibraryResult<BookDto>;

    async fn issue(&self, book_id: &str, borrower_id: &str, staff_id: &str,
                   now: NaiveDateTime) -> LibraryResult<IssueOutcome>;

    async fn return_book(&self, book_id: &str, loan_id: &str, staff_id: &str,
                         fine_paid: bool, now: NaiveDateTime) -> LibraryResult<ReturnOutcome>;

    async fn place_hold(&self, book_id: &str, borrower_id: &str,
                        now: NaiveDateTime) -> LibraryResult<PlaceHoldOutcome>;

    async fn remove_book(&self, book_id: &str) -> LibraryResult<RemoveBookOutcome>;

    // fine currently owed by the active loan, for the caller to present
    // before deciding the fine_paid flag of return_book
    async fn fine_owed(&self, book_id: &str, loan_id: &str,
                       now: NaiveDateTime) -> LibraryResult<Decimal>;

    // sum of unsettled fines across all of the borrower's loans, open or
    // closed; pure read
    async fn aggregate_fine(&self, borrower_id: &str,
                            now: NaiveDateTime) -> LibraryResult<Decimal>;

    async fn find_book(&self, book_id: &str) -> LibraryResult<BookDto>;

    async fn hold_position(&self, book_id: &str, borrower_id: &str) -> LibraryResult<Option<usize>>;

    async fn borrower_loans(&self, borrower_id: &str) -> LibraryResult<Vec<LoanDto>>;

    async fn borrower_holds(&self, borrower_id: &str) -> LibraryResult<Vec<HoldDto>>;
}
