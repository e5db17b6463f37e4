use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::domain::Identifiable;
use crate::core::library::BookStatus;
use crate::holds::domain::queue::HoldQueue;
use crate::loans::domain::ledger::Ledger;
use crate::utils::date::serializer;

// BookEntity abstracts one physical book in the catalog. The status field
// mirrors what the ledger derives; the circulation service keeps the two in
// lockstep and nothing else writes it.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BookEntity {
    pub book_id: String,
    pub version: i64,
    pub title: String,
    pub author: String,
    pub subject: String,
    pub book_status: BookStatus,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl BookEntity {
    pub fn new(title: &str, author: &str, subject: &str, created_at: NaiveDateTime) -> Self {
        Self {
            book_id: "".to_string(),
            version: 0,
            title: title.to_string(),
            author: author.to_string(),
            subject: subject.to_string(),
            book_status: BookStatus::Available,
            created_at,
            updated_at: created_at,
        }
    }
}

impl Identifiable for BookEntity {
    fn id(&self) -> String {
        self.book_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// BookRecord composes a catalog entry with its hold queue and loan ledger.
// Availability is derived, never set directly: Issued iff an unreturned
// loan exists.
#[derive(Debug)]
pub struct BookRecord {
    pub book: BookEntity,
    pub queue: HoldQueue,
    pub ledger: Ledger,
}

impl BookRecord {
    pub fn new(book: BookEntity) -> Self {
        Self {
            book,
            queue: HoldQueue::new(),
            ledger: Ledger::new(),
        }
    }

    pub fn derived_status(&self) -> BookStatus {
        if self.ledger.has_active_loan() {
            BookStatus::Issued
        } else {
            BookStatus::Available
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::books::domain::model::{BookEntity, BookRecord};
    use crate::core::library::BookStatus;
    use crate::loans::domain::model::LoanEntity;

    #[tokio::test]
    async fn test_should_build_book() {
        let now = Utc::now().naive_utc();
        let book = BookEntity::new("title", "author", "subject", now);
        assert_eq!("title", book.title.as_str());
        assert_eq!("author", book.author.as_str());
        assert_eq!("subject", book.subject.as_str());
        assert_eq!(BookStatus::Available, book.book_status);
    }

    #[tokio::test]
    async fn test_should_derive_status_from_ledger() {
        let now = Utc::now().naive_utc();
        let mut record = BookRecord::new(BookEntity::new("title", "author", "subject", now));
        assert_eq!(BookStatus::Available, record.derived_status());

        let mut loan = LoanEntity::new("book1", "borrower1", "staff1", now);
        loan.loan_id = "l1".to_string();
        record.ledger.open_loan(loan).expect("should open");
        assert_eq!(BookStatus::Issued, record.derived_status());

        record.ledger.close_loan("l1", "staff1", now, false).expect("should close");
        assert_eq!(BookStatus::Available, record.derived_status());
    }
}
