use std::collections::VecDeque;

use chrono::NaiveDateTime;

use crate::holds::domain::model::HoldRequestEntity;
use crate::utils::date::days_between;

#[derive(Debug, PartialEq)]
pub enum EnqueueOutcome {
    Accepted,
    RejectedDuplicate,
}

// HoldQueue keeps the pending hold requests of one book in pure insertion
// order. The order is never re-sorted; only the head may be admitted to
// receive the book.
#[derive(Debug, Default)]
pub struct HoldQueue {
    entries: VecDeque<HoldRequestEntity>,
}

impl HoldQueue {
    pub fn new() -> Self {
        Self { entries: VecDeque::new() }
    }

    // Appends at the tail unless the borrower already waits in this queue
    // (at most one hold per borrower per book).
    pub fn enqueue(&mut self, hold: HoldRequestEntity) -> EnqueueOutcome {
        if self.contains(hold.borrower_id.as_str()) {
            return EnqueueOutcome::RejectedDuplicate;
        }
        self.entries.push_back(hold);
        EnqueueOutcome::Accepted
    }

    // Removes and returns every entry older than expiry_days. Removal only
    // inspects age, never queue position, so younger entries behind an
    // expired head keep their relative order.
    pub fn purge_expired(&mut self, now: NaiveDateTime, expiry_days: i64) -> Vec<HoldRequestEntity> {
        let mut removed = Vec::new();
        let mut kept = VecDeque::with_capacity(self.entries.len());
        for hold in self.entries.drain(..) {
            if days_between(hold.requested_at, now) > expiry_days {
                removed.push(hold);
            } else {
                kept.push_back(hold);
            }
        }
        self.entries = kept;
        removed
    }

    pub fn position_of(&self, borrower_id: &str) -> Option<usize> {
        self.entries.iter().position(|h| h.borrower_id == borrower_id)
    }

    pub fn contains(&self, borrower_id: &str) -> bool {
        self.position_of(borrower_id).is_some()
    }

    pub fn dequeue_head(&mut self) -> Option<HoldRequestEntity> {
        self.entries.pop_front()
    }

    pub fn remove_all(&mut self) -> Vec<HoldRequestEntity> {
        self.entries.drain(..).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HoldRequestEntity> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDateTime, Utc};

    use crate::holds::domain::model::HoldRequestEntity;
    use crate::holds::domain::queue::{EnqueueOutcome, HoldQueue};

    fn hold(borrower_id: &str, requested_at: NaiveDateTime) -> HoldRequestEntity {
        let mut hold = HoldRequestEntity::new("book1", borrower_id, requested_at);
        hold.hold_id = format!("hold-{}", borrower_id);
        hold
    }

    #[tokio::test]
    async fn test_should_enqueue_in_insertion_order() {
        let now = Utc::now().naive_utc();
        let mut queue = HoldQueue::new();
        assert_eq!(EnqueueOutcome::Accepted, queue.enqueue(hold("b1", now)));
        assert_eq!(EnqueueOutcome::Accepted, queue.enqueue(hold("b2", now)));
        assert_eq!(EnqueueOutcome::Accepted, queue.enqueue(hold("b3", now)));
        assert_eq!(Some(0), queue.position_of("b1"));
        assert_eq!(Some(1), queue.position_of("b2"));
        assert_eq!(Some(2), queue.position_of("b3"));
        assert_eq!(None, queue.position_of("b4"));
    }

    #[tokio::test]
    async fn test_should_reject_duplicate_borrower() {
        let now = Utc::now().naive_utc();
        let mut queue = HoldQueue::new();
        assert_eq!(EnqueueOutcome::Accepted, queue.enqueue(hold("b1", now)));
        assert_eq!(EnqueueOutcome::RejectedDuplicate, queue.enqueue(hold("b1", now + Duration::hours(1))));
        assert_eq!(1, queue.len());
    }

    #[tokio::test]
    async fn test_should_purge_only_expired_entries() {
        let now = Utc::now().naive_utc();
        let mut queue = HoldQueue::new();
        queue.enqueue(hold("b1", now - Duration::days(10)));
        queue.enqueue(hold("b2", now - Duration::days(3)));
        queue.enqueue(hold("b3", now - Duration::days(8)));
        let removed = queue.purge_expired(now, 7);
        assert_eq!(2, removed.len());
        assert_eq!("b1", removed[0].borrower_id.as_str());
        assert_eq!("b3", removed[1].borrower_id.as_str());
        assert_eq!(Some(0), queue.position_of("b2"));
    }

    #[tokio::test]
    async fn test_should_keep_entry_at_exact_expiry_age() {
        let now = Utc::now().naive_utc();
        let mut queue = HoldQueue::new();
        queue.enqueue(hold("b1", now - Duration::days(7)));
        let removed = queue.purge_expired(now, 7);
        assert!(removed.is_empty());
        assert_eq!(1, queue.len());
    }

    #[tokio::test]
    async fn test_should_dequeue_head_only() {
        let now = Utc::now().naive_utc();
        let mut queue = HoldQueue::new();
        queue.enqueue(hold("b1", now));
        queue.enqueue(hold("b2", now));
        let head = queue.dequeue_head().expect("should dequeue");
        assert_eq!("b1", head.borrower_id.as_str());
        assert_eq!(Some(0), queue.position_of("b2"));
    }

    #[tokio::test]
    async fn test_should_remove_all() {
        let now = Utc::now().naive_utc();
        let mut queue = HoldQueue::new();
        queue.enqueue(hold("b1", now));
        queue.enqueue(hold("b2", now));
        let removed = queue.remove_all();
        assert_eq!(2, removed.len());
        assert!(queue.is_empty());
    }
}
