//! Delivery policy: decides when a failing message is dead-lettered.

/// Bounded-redelivery policy shared by both entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    /// この配信回数に達したら再試行せず poison に送る
    pub max_deliveries: u32,
}

impl DeliveryPolicy {
    pub const DEFAULT_MAX_DELIVERIES: u32 = 5;

    pub fn new(max_deliveries: u32) -> Self {
        Self { max_deliveries }
    }

    /// Whether a message that just failed on delivery `dequeue_count` must be
    /// moved to the dead-letter queue instead of being left for redelivery.
    ///
    /// The count is the queue's observed delivery count (first delivery = 1),
    /// so with `max_deliveries = 5` escalation happens on the fourth failed
    /// delivery: the fifth would be the last one the queue grants.
    pub fn should_dead_letter(&self, dequeue_count: u32) -> bool {
        dequeue_count.saturating_add(1) >= self.max_deliveries
    }
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_DELIVERIES)
    }
}
