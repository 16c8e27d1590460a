//! Single-assignment rendezvous between writer tasks.
//!
//! One producer calls [`OnceValue::set`] exactly once; any number of
//! consumers await [`OnceValue::get`], which parks until the value exists
//! and can be called repeatedly afterwards. The PUT pipeline creates one
//! per request to hand the master component's recurrence row id to the
//! override tasks; it is never shared beyond that request.

use tokio::sync::watch;

/// A write-once, await-many value cell.
#[derive(Debug)]
pub struct OnceValue<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> OnceValue<T> {
    /// Creates an empty cell.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Assigns the value. Must be called at most once; a second call
    /// replaces the value and later `get`s observe the replacement, which
    /// callers must not rely on.
    pub fn set(&self, value: T) {
        self.tx.send_replace(Some(value));
    }

    /// Returns the value immediately if it has been set.
    #[must_use]
    pub fn peek(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    /// Waits until the value is set and returns a clone of it.
    pub async fn get(&self) -> T {
        let mut rx = self.tx.subscribe();
        loop {
            {
                let guard = rx.borrow_and_update();
                if let Some(value) = guard.as_ref() {
                    return value.clone();
                }
            }
            // The sender lives in self, so changed() cannot fail while
            // this borrow is alive; park regardless if it ever does.
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl<T: Clone> Default for OnceValue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn get_after_set_returns_immediately() {
        let cell = OnceValue::new();
        cell.set(42);
        assert_eq!(cell.get().await, 42);
    }

    #[tokio::test]
    async fn get_is_repeatable() {
        let cell = OnceValue::new();
        cell.set("id".to_string());
        assert_eq!(cell.get().await, "id");
        assert_eq!(cell.get().await, "id");
    }

    #[tokio::test]
    async fn get_blocks_until_set() {
        let cell = Arc::new(OnceValue::new());

        let waiter = {
            let cell = Arc::clone(&cell);
            tokio::spawn(async move { cell.get().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        cell.set(7);
        assert_eq!(waiter.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn many_consumers_see_one_value() {
        let cell = Arc::new(OnceValue::new());

        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                tokio::spawn(async move { cell.get().await })
            })
            .collect();

        cell.set(99);

        for waiter in waiters {
            assert_eq!(waiter.await.unwrap(), 99);
        }
    }

    #[test]
    fn peek_reports_assignment() {
        let cell = OnceValue::new();
        assert_eq!(cell.peek(), None);
        cell.set(1);
        assert_eq!(cell.peek(), Some(1));
    }
}
