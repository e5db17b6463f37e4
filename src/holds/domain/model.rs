use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::domain::Identifiable;
use crate::utils::date::serializer;

// HoldRequestEntity abstracts a borrower's standing request to receive a
// book once it becomes available. The id is assigned by the store on first
// save and is empty until then.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct HoldRequestEntity {
    pub hold_id: String,
    pub version: i64,
    pub book_id: String,
    pub borrower_id: String,
    #[serde(with = "serializer")]
    pub requested_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl HoldRequestEntity {
    pub fn new(book_id: &str, borrower_id: &str, requested_at: NaiveDateTime) -> Self {
        Self {
            hold_id: "".to_string(),
            version: 0,
            book_id: book_id.to_string(),
            borrower_id: borrower_id.to_string(),
            requested_at,
            created_at: requested_at,
            updated_at: requested_at,
        }
    }
}

impl Identifiable for HoldRequestEntity {
    fn id(&self) -> String {
        self.hold_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::holds::domain::model::HoldRequestEntity;

    #[tokio::test]
    async fn test_should_build_hold_request() {
        let now = Utc::now().naive_utc();
        let hold = HoldRequestEntity::new("book1", "borrower1", now);
        assert_eq!("book1", hold.book_id.as_str());
        assert_eq!("borrower1", hold.borrower_id.as_str());
        assert_eq!(now, hold.requested_at);
        assert!(hold.hold_id.is_empty());
    }
}
