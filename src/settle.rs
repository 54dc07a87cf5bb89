use std::sync::Mutex;

/// Single-assignment slot for the terminal outcome of a run.
///
/// Several completion signals may race (natural exit, timeout, runtime
/// fault); whichever settles first wins and every later settle is a
/// no-op. This is the guard that keeps one run from producing two
/// results.
#[derive(Debug, Default)]
pub struct SettleOnce<T> {
    slot: Mutex<Option<T>>,
}

impl<T> SettleOnce<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Stores `value` if nothing has settled yet. Returns whether this
    /// call won the race.
    pub fn settle(&self, value: T) -> bool {
        let mut slot = self.slot.lock().expect("settle slot poisoned");
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }

    pub fn into_inner(self) -> Option<T> {
        self.slot.into_inner().expect("settle slot poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_settle_wins() {
        let slot = SettleOnce::new();

        assert!(slot.settle("exited"));
        assert!(!slot.settle("timed out"));

        assert_eq!(slot.into_inner(), Some("exited"));
    }

    #[test]
    fn test_unsettled_slot_is_empty() {
        let slot: SettleOnce<i32> = SettleOnce::new();
        assert_eq!(slot.into_inner(), None);
    }

    #[tokio::test]
    async fn test_racing_settles_produce_one_value() {
        use std::sync::Arc;

        // Both completion signals fire in quick succession; exactly one
        // may claim the slot.
        let slot = Arc::new(SettleOnce::new());

        let a = {
            let slot = slot.clone();
            tokio::spawn(async move { slot.settle("natural exit") })
        };
        let b = {
            let slot = slot.clone();
            tokio::spawn(async move { slot.settle("timeout") })
        };

        let (a_won, b_won) = (a.await.unwrap(), b.await.unwrap());
        assert!(a_won ^ b_won);

        let value = Arc::try_unwrap(slot).unwrap().into_inner();
        assert!(matches!(value, Some("natural exit") | Some("timeout")));
    }
}
