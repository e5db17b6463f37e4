use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::books::domain::model::BookRecord;
use crate::core::library::BookStatus;
use crate::holds::domain::model::HoldRequestEntity;
use crate::loans::domain::model::LoanEntity;
use crate::utils::date::serializer;

// BookDto is the presentation view of a catalog entry; status is derived
// from the ledger at conversion time.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BookDto {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub subject: String,
    pub status: BookStatus,
    pub pending_holds: usize,
}

impl From<&BookRecord> for BookDto {
    fn from(other: &BookRecord) -> BookDto {
        BookDto {
            book_id: other.book.book_id.to_string(),
            title: other.book.title.to_string(),
            author: other.book.author.to_string(),
            subject: other.book.subject.to_string(),
            status: other.derived_status(),
            pending_holds: other.queue.len(),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LoanDto {
    pub loan_id: String,
    pub book_id: String,
    pub borrower_id: String,
    pub issuer_id: String,
    #[serde(with = "serializer")]
    pub issued_at: NaiveDateTime,
    pub receiver_id: Option<String>,
    pub returned_at: Option<NaiveDateTime>,
    pub fine_paid: bool,
}

impl From<&LoanEntity> for LoanDto {
    fn from(other: &LoanEntity) -> LoanDto {
        LoanDto {
            loan_id: other.loan_id.to_string(),
            book_id: other.book_id.to_string(),
            borrower_id: other.borrower_id.to_string(),
            issuer_id: other.issuer_id.to_string(),
            issued_at: other.issued_at,
            receiver_id: other.receiver_id.clone(),
            returned_at: other.returned_at,
            fine_paid: other.fine_paid,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct HoldDto {
    pub hold_id: String,
    pub book_id: String,
    pub borrower_id: String,
    #[serde(with = "serializer")]
    pub requested_at: NaiveDateTime,
}

impl From<&HoldRequestEntity> for HoldDto {
    fn from(other: &HoldRequestEntity) -> HoldDto {
        HoldDto {
            hold_id: other.hold_id.to_string(),
            book_id: other.book_id.to_string(),
            borrower_id: other.borrower_id.to_string(),
            requested_at: other.requested_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::books::domain::model::{BookEntity, BookRecord};
    use crate::circulation::dto::{BookDto, HoldDto, LoanDto};
    use crate::core::library::BookStatus;
    use crate::holds::domain::model::HoldRequestEntity;
    use crate::loans::domain::model::LoanEntity;

    #[tokio::test]
    async fn test_should_convert_book_record() {
        let now = Utc::now().naive_utc();
        let mut record = BookRecord::new(BookEntity::new("title", "author", "subject", now));
        record.book.book_id = "book1".to_string();
        let dto = BookDto::from(&record);
        assert_eq!("book1", dto.book_id.as_str());
        assert_eq!(BookStatus::Available, dto.status);
        assert_eq!(0, dto.pending_holds);
    }

    #[tokio::test]
    async fn test_should_convert_loan() {
        let now = Utc::now().naive_utc();
        let loan = LoanEntity::new("book1", "b1", "staff1", now);
        let dto = LoanDto::from(&loan);
        assert_eq!("book1", dto.book_id.as_str());
        assert_eq!("b1", dto.borrower_id.as_str());
        assert_eq!(None, dto.returned_at);
    }

    #[tokio::test]
    async fn test_should_convert_hold() {
        let now = Utc::now().naive_utc();
        let hold = HoldRequestEntity::new("book1", "b1", now);
        let dto = HoldDto::from(&hold);
        assert_eq!("book1", dto.book_id.as_str());
        assert_eq!(now, dto.requested_at);
    }
}
