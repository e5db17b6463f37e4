use chrono::NaiveDateTime;

use crate::core::library::{LibraryError, LibraryResult};
use crate::loans::domain::model::LoanEntity;

// LoanLedger is the append-only record of issuance and return events for
// one book. At most one loan is active at a time; the ledger is the sole
// authority for the book's availability transition.
#[derive(Debug, Default)]
pub struct Ledger {
    loans: Vec<LoanEntity>,
}

impl Ledger {
    pub fn new() -> Self {
        Self { loans: Vec::new() }
    }

    pub fn has_active_loan(&self) -> bool {
        self.loans.iter().any(|l| l.is_active())
    }

    pub fn active_loan(&self) -> Option<&LoanEntity> {
        self.loans.iter().find(|l| l.is_active())
    }

    pub fn find_active_loan_for(&self, borrower_id: &str) -> Option<&LoanEntity> {
        self.active_loan().filter(|l| l.borrower_id == borrower_id)
    }

    // Appends a freshly issued loan. The loan must carry its store-assigned
    // id and the book must not already be out.
    pub fn open_loan(&mut self, loan: LoanEntity) -> LibraryResult<LoanEntity> {
        if self.has_active_loan() {
            return Err(LibraryError::validation(
                format!("book {} already has an active loan", loan.book_id).as_str(),
                Some("409".to_string())));
        }
        if !loan.is_active() {
            return Err(LibraryError::validation(
                format!("loan {} is already closed", loan.loan_id).as_str(),
                Some("400".to_string())));
        }
        self.loans.push(loan.clone());
        Ok(loan)
    }

    // Closes the active loan identified by loan_id, recording who received
    // the book back and whether the fine was settled. A closed loan is
    // never reopened.
    pub fn close_loan(&mut self, loan_id: &str, receiver_id: &str,
                      returned_at: NaiveDateTime, fine_paid: bool) -> LibraryResult<LoanEntity> {
        let loan = self.loans.iter_mut()
            .find(|l| l.loan_id == loan_id && l.is_active())
            .ok_or_else(|| LibraryError::invalid_reference(
                format!("loan {} is not the active loan", loan_id).as_str()))?;
        loan.receiver_id = Some(receiver_id.to_string());
        loan.returned_at = Some(returned_at);
        loan.fine_paid = fine_paid;
        loan.updated_at = returned_at;
        loan.version += 1;
        Ok(loan.clone())
    }

    pub fn loans(&self) -> impl Iterator<Item = &LoanEntity> {
        self.loans.iter()
    }

    pub fn restore(&mut self, loan: LoanEntity) -> LibraryResult<()> {
        if loan.is_active() && self.has_active_loan() {
            return Err(LibraryError::validation(
                format!("book {} has more than one active loan on record", loan.book_id).as_str(),
                Some("409".to_string())));
        }
        self.loans.push(loan);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::loans::domain::ledger::Ledger;
    use crate::loans::domain::model::LoanEntity;

    fn loan(id: &str, borrower_id: &str) -> LoanEntity {
        let mut loan = LoanEntity::new("book1", borrower_id, "staff1", Utc::now().naive_utc());
        loan.loan_id = id.to_string();
        loan
    }

    #[tokio::test]
    async fn test_should_open_and_close_loan() {
        let mut ledger = Ledger::new();
        assert!(!ledger.has_active_loan());
        let opened = ledger.open_loan(loan("l1", "b1")).expect("should open");
        assert!(ledger.has_active_loan());
        assert_eq!("l1", ledger.active_loan().expect("active").loan_id.as_str());

        let returned_at = opened.issued_at + Duration::days(3);
        let closed = ledger.close_loan("l1", "staff2", returned_at, true).expect("should close");
        assert!(!ledger.has_active_loan());
        assert_eq!(Some("staff2".to_string()), closed.receiver_id);
        assert_eq!(Some(returned_at), closed.returned_at);
        assert!(closed.fine_paid);
    }

    #[tokio::test]
    async fn test_should_refuse_second_active_loan() {
        let mut ledger = Ledger::new();
        ledger.open_loan(loan("l1", "b1")).expect("should open");
        assert!(ledger.open_loan(loan("l2", "b2")).is_err());
    }

    #[tokio::test]
    async fn test_should_refuse_closing_unknown_loan() {
        let mut ledger = Ledger::new();
        ledger.open_loan(loan("l1", "b1")).expect("should open");
        assert!(ledger.close_loan("l2", "staff1", Utc::now().naive_utc(), false).is_err());
    }

    #[tokio::test]
    async fn test_should_not_reopen_closed_loan() {
        let mut ledger = Ledger::new();
        ledger.open_loan(loan("l1", "b1")).expect("should open");
        ledger.close_loan("l1", "staff1", Utc::now().naive_utc(), false).expect("should close");
        assert!(ledger.close_loan("l1", "staff1", Utc::now().naive_utc(), true).is_err());
    }

    #[tokio::test]
    async fn test_should_find_active_loan_by_borrower() {
        let mut ledger = Ledger::new();
        ledger.open_loan(loan("l1", "b1")).expect("should open");
        assert!(ledger.find_active_loan_for("b1").is_some());
        assert!(ledger.find_active_loan_for("b2").is_none());
    }

    #[tokio::test]
    async fn test_should_restore_history_with_single_active_loan() {
        let mut ledger = Ledger::new();
        let mut closed = loan("l1", "b1");
        closed.returned_at = Some(Utc::now().naive_utc());
        ledger.restore(closed).expect("should restore closed");
        ledger.restore(loan("l2", "b2")).expect("should restore active");
        assert!(ledger.restore(loan("l3", "b3")).is_err());
    }
}
