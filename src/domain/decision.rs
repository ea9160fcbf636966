//! Outcome of an admission check.

/// Decision made for a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDecision {
    /// Both buckets had a token; one was taken from each
    Admit,
    /// A bucket was empty; the rejection was recorded in the ledger
    Throttle,
}

impl LimitDecision {
    /// Check if this decision is Admit.
    pub fn is_admit(&self) -> bool {
        matches!(self, LimitDecision::Admit)
    }

    /// Check if this decision is Throttle.
    pub fn is_throttle(&self) -> bool {
        matches!(self, LimitDecision::Throttle)
    }
}

impl From<LimitDecision> for bool {
    fn from(decision: LimitDecision) -> Self {
        decision.is_admit()
    }
}
