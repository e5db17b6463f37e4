use serde::{Deserialize, Serialize};

// BorrowerEntity is the engine-side view of an external, already-validated
// borrower identity: the loans currently out to them and the holds they are
// waiting on. Back-references only; the queue and ledger own the records.
// The engine creates this view lazily and never deletes a borrower.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BorrowerEntity {
    pub borrower_id: String,
    pub active_loans: Vec<String>,
    pub pending_holds: Vec<String>,
}

impl BorrowerEntity {
    pub fn new(borrower_id: &str) -> Self {
        Self {
            borrower_id: borrower_id.to_string(),
            active_loans: Vec::new(),
            pending_holds: Vec::new(),
        }
    }

    pub fn attach_loan(&mut self, loan_id: &str) {
        self.active_loans.push(loan_id.to_string());
    }

    pub fn detach_loan(&mut self, loan_id: &str) {
        self.active_loans.retain(|id| id != loan_id);
    }

    pub fn attach_hold(&mut self, hold_id: &str) {
        self.pending_holds.push(hold_id.to_string());
    }

    pub fn detach_hold(&mut self, hold_id: &str) {
        self.pending_holds.retain(|id| id != hold_id);
    }
}
