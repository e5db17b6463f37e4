use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::library::{LibraryError, LibraryResult};

// Identifiable defines common traits that can be shared by persistent objects
pub trait Identifiable: Sync + Send {
    fn id(&self) -> String;
    fn version(&self) -> i64;
}

// Configuration abstracts circulation policy knobs supplied by the embedder.
// The engine reads these values and never mutates them.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Configuration {
    // days a borrower may keep a book before a fine accrues
    pub deadline_days: i64,
    // fine charged per overdue day
    pub per_day_rate: Decimal,
    // days a pending hold survives before lazy expiry
    pub expiry_days: i64,
}

impl Configuration {
    pub fn new(deadline_days: i64, per_day_rate: Decimal, expiry_days: i64) -> Self {
        Configuration {
            deadline_days,
            per_day_rate,
            expiry_days,
        }
    }

    pub fn validate(&self) -> LibraryResult<()> {
        if self.deadline_days <= 0 {
            return Err(LibraryError::validation(
                format!("deadline_days must be positive, got {}", self.deadline_days).as_str(),
                Some("400".to_string())));
        }
        if self.per_day_rate < Decimal::ZERO {
            return Err(LibraryError::validation(
                format!("per_day_rate must not be negative, got {}", self.per_day_rate).as_str(),
                Some("400".to_string())));
        }
        if self.expiry_days < 0 {
            return Err(LibraryError::validation(
                format!("expiry_days must not be negative, got {}", self.expiry_days).as_str(),
                Some("400".to_string())));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::core::domain::Configuration;

    #[tokio::test]
    async fn test_should_build_config() {
        let config = Configuration::new(15, Decimal::from(20), 10);
        assert_eq!(15, config.deadline_days);
        assert_eq!(Decimal::from(20), config.per_day_rate);
        assert_eq!(10, config.expiry_days);
        config.validate().expect("should validate");
    }

    #[tokio::test]
    async fn test_should_reject_bad_config() {
        assert!(Configuration::new(0, Decimal::from(20), 10).validate().is_err());
        assert!(Configuration::new(15, Decimal::from(-1), 10).validate().is_err());
        assert!(Configuration::new(15, Decimal::from(20), -1).validate().is_err());
    }
}
