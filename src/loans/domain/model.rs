use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::domain::Identifiable;
use crate::utils::date::serializer;

// LoanEntity abstracts one issuance of a book to a borrower. Records are
// append-only: once returned_at is set the loan is closed and never
// reopened. The id is assigned by the store on first save.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LoanEntity {
    pub loan_id: String,
    pub version: i64,
    pub book_id: String,
    pub borrower_id: String,
    pub issuer_id: String,
    #[serde(with = "serializer")]
    pub issued_at: NaiveDateTime,
    pub receiver_id: Option<String>,
    pub returned_at: Option<NaiveDateTime>,
    pub fine_paid: bool,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl LoanEntity {
    pub fn new(book_id: &str, borrower_id: &str, issuer_id: &str, issued_at: NaiveDateTime) -> Self {
        Self {
            loan_id: "".to_string(),
            version: 0,
            book_id: book_id.to_string(),
            borrower_id: borrower_id.to_string(),
            issuer_id: issuer_id.to_string(),
            issued_at,
            receiver_id: None,
            returned_at: None,
            fine_paid: false,
            created_at: issued_at,
            updated_at: issued_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }
}

impl Identifiable for LoanEntity {
    fn id(&self) -> String {
        self.loan_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}
