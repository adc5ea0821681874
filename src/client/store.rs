use std::sync::{Arc, PoisonError, RwLock};

/// Pure state transition: never mutates the input.
pub type Reducer<S, A> = fn(&S, A) -> S;

/// Holds the latest immutable snapshot of some UI state.
///
/// `dispatch` runs the reducer against the current snapshot and swaps the
/// result in; readers holding an older `Arc` keep seeing the old value. The
/// reducer runs before anything is written, so a panicking reducer leaves the
/// previous snapshot in place and the lock is safe to recover.
pub struct Store<S, A> {
    state: RwLock<Arc<S>>,
    reducer: Reducer<S, A>,
}

impl<S, A> Store<S, A> {
    pub fn new(initial: S, reducer: Reducer<S, A>) -> Self {
        Self {
            state: RwLock::new(Arc::new(initial)),
            reducer,
        }
    }

    pub fn snapshot(&self) -> Arc<S> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn dispatch(&self, action: A) -> Arc<S> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new((self.reducer)(&**guard, action));
        *guard = next.clone();
        next
    }
}

impl<S: std::fmt::Debug, A> std::fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("state", &self.snapshot()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(state: &i64, by: i64) -> i64 {
        state + by
    }

    #[test]
    fn dispatch_swaps_snapshot_and_keeps_old_readers_intact() {
        let store = Store::new(1, add as Reducer<i64, i64>);
        let before = store.snapshot();
        let after = store.dispatch(2);
        assert_eq!(*before, 1);
        assert_eq!(*after, 3);
        assert_eq!(*store.snapshot(), 3);
        assert!(!Arc::ptr_eq(&before, &after));
    }
}
