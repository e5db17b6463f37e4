use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::utils::date::days_between;

// Raw overdue fine for a loan: whole calendar days past the deadline times
// the configured per-day rate. Stateless; callers short-circuit to zero for
// loans whose fine has already been settled.
pub fn compute_fine(issued_at: NaiveDateTime, reference: NaiveDateTime,
                    deadline_days: i64, per_day_rate: Decimal) -> Decimal {
    let elapsed_days = days_between(issued_at, reference);
    let overdue_days = (elapsed_days - deadline_days).max(0);
    Decimal::from(overdue_days) * per_day_rate
}
