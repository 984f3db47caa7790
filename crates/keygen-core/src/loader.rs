//! Request-sequenced slot for the single displayed model
//!
//! Every load gets a [`LoadToken`] from a monotonically increasing counter.
//! Only a result carrying the latest token may become resident; anything
//! older is handed back to the caller for disposal. Starting a load evicts
//! the resident model immediately, so the slot is empty until the latest
//! load resolves.

/// Sequence number of a model load
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadToken(u64);

impl LoadToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Result of offering a loaded model to the slot
#[derive(Debug, PartialEq, Eq)]
pub enum Install<H> {
    /// The model is now resident; `evicted` must be disposed by the caller
    Applied { evicted: Option<H> },
    /// A newer load was issued; the model must be disposed by the caller
    Stale(H),
}

#[derive(Debug)]
pub struct ModelSlot<H> {
    issued: u64,
    resident: Option<H>,
}

impl<H> Default for ModelSlot<H> {
    fn default() -> Self {
        Self {
            issued: 0,
            resident: None,
        }
    }
}

impl<H> ModelSlot<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load: returns its token and the evicted resident, if any
    pub fn begin(&mut self) -> (LoadToken, Option<H>) {
        self.issued += 1;
        (LoadToken(self.issued), self.resident.take())
    }

    /// Whether `token` belongs to the most recently started load
    pub fn is_current(&self, token: LoadToken) -> bool {
        token.0 == self.issued
    }

    /// Offer a finished model for display
    pub fn install(&mut self, token: LoadToken, model: H) -> Install<H> {
        if !self.is_current(token) {
            tracing::debug!(
                "Discarding stale model load {} (latest is {})",
                token.0,
                self.issued
            );
            return Install::Stale(model);
        }

        let evicted = self.resident.replace(model);
        Install::Applied { evicted }
    }

    /// Record a failed load; returns true if it should be reported
    pub fn reject(&self, token: LoadToken) -> bool {
        self.is_current(token)
    }

    pub fn resident(&self) -> Option<&H> {
        self.resident.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.resident.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_evicts_resident() {
        let mut slot = ModelSlot::new();
        let (first, evicted) = slot.begin();
        assert!(evicted.is_none());
        assert_eq!(slot.install(first, "a"), Install::Applied { evicted: None });

        let (_second, evicted) = slot.begin();
        assert_eq!(evicted, Some("a"));
        assert!(slot.is_empty());
    }

    #[test]
    fn test_overlapping_loads_in_order() {
        let mut slot = ModelSlot::new();
        let (first, _) = slot.begin();
        let (second, _) = slot.begin();

        assert_eq!(slot.install(second, "new"), Install::Applied { evicted: None });
        assert_eq!(slot.install(first, "old"), Install::Stale("old"));
        assert_eq!(slot.resident(), Some(&"new"));
    }

    #[test]
    fn test_overlapping_loads_out_of_order() {
        let mut slot = ModelSlot::new();
        let (first, _) = slot.begin();
        let (second, _) = slot.begin();

        assert_eq!(slot.install(first, "old"), Install::Stale("old"));
        assert!(slot.is_empty());
        assert_eq!(slot.install(second, "new"), Install::Applied { evicted: None });
        assert_eq!(slot.resident(), Some(&"new"));
    }

    #[test]
    fn test_stale_failure_not_reported() {
        let mut slot: ModelSlot<()> = ModelSlot::new();
        let (first, _) = slot.begin();
        let (second, _) = slot.begin();
        assert!(!slot.reject(first));
        assert!(slot.reject(second));
    }

    #[test]
    fn test_tokens_increase() {
        let mut slot: ModelSlot<()> = ModelSlot::new();
        let (a, _) = slot.begin();
        let (b, _) = slot.begin();
        assert!(b > a);
        assert!(slot.is_current(b));
        assert!(!slot.is_current(a));
        assert_eq!(b.value(), 2);
    }
}
