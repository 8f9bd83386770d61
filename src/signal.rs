//! # One-shot signals
//!
//! A [`Signal`] is a latch that fires once and carries a value. It is the hand-off
//! between the dispatcher, the elevators and the passenger journeys:
//! `assigned`, `picked-up`, `delivered` and the per-floor arrival signal.
//!
//! - Firing twice is legal and does nothing the second time.
//! - Firing before anybody waits is legal, a later waiter returns at once.
//! - Any number of tasks may wait on the same signal. They all see the same value.
//!
//! Built on a `tokio::sync::watch` channel holding `Option<T>`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::timeout;

/// Why a wait on a [`Signal`] ended without a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignalError {
    /// The bounded wait ran out
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// Every firing handle was dropped without firing
    #[error("signal dropped before it fired")]
    Closed,
}

/// Fire-once broadcast signal. Cloning gives another handle to the same signal.
#[derive(Debug, Clone)]
pub struct Signal<T> {
    tx: Arc<watch::Sender<Option<T>>>,
}

impl<T: Clone> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Signal<T> {
    /// A fresh, unfired signal
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Fires the signal with `value`.
    ///
    /// Returns `true` if this call fired it, `false` if it had already fired
    /// (the first value is kept).
    pub fn fire(&self, value: T) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(value);
                true
            } else {
                false
            }
        })
    }

    /// `true` once the signal has fired
    pub fn is_fired(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The fired value, without waiting
    pub fn value(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    /// A receive-only handle. Unlike a [`Signal`] clone it does not keep the signal
    /// alive, so its wait ends with [`SignalError::Closed`] if the signal is dropped
    /// unfired.
    pub fn subscribe(&self) -> SignalWaiter<T> {
        SignalWaiter { rx: self.tx.subscribe() }
    }

    /// Waits until the signal fires
    pub async fn wait(&self) -> Result<T, SignalError> {
        self.subscribe().wait().await
    }

    /// Waits until the signal fires, at most `limit`
    pub async fn wait_timeout(&self, limit: Duration) -> Result<T, SignalError> {
        self.subscribe().wait_timeout(limit).await
    }
}

/// Receive side of a [`Signal`], see [`Signal::subscribe`]
#[derive(Debug)]
pub struct SignalWaiter<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T: Clone> SignalWaiter<T> {
    /// Waits until the signal fires
    pub async fn wait(mut self) -> Result<T, SignalError> {
        let fired = self
            .rx
            .wait_for(|slot| slot.is_some())
            .await
            .map_err(|_| SignalError::Closed)?;
        let value = (*fired).clone();
        value.ok_or(SignalError::Closed)
    }

    /// Waits until the signal fires, at most `limit`
    pub async fn wait_timeout(self, limit: Duration) -> Result<T, SignalError> {
        match timeout(limit, self.wait()).await {
            Ok(result) => result,
            Err(_) => Err(SignalError::Timeout(limit)),
        }
    }

    /// `true` once the signal has fired
    pub fn is_fired(&self) -> bool {
        self.rx.borrow().is_some()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_fire_is_a_noop() {
        let signal = Signal::new();
        assert!(signal.fire(7u8));
        assert!(!signal.fire(9u8));
        assert_eq!(signal.value(), Some(7));
    }

    #[tokio::test]
    async fn waiting_after_fire_returns_at_once() {
        let signal = Signal::new();
        signal.fire("up");
        assert_eq!(signal.wait().await, Ok("up"));
        assert_eq!(signal.wait().await, Ok("up"));
    }

    #[tokio::test]
    async fn every_waiter_sees_the_value() {
        let signal: Signal<u8> = Signal::new();
        let a = tokio::spawn({
            let s = signal.clone();
            async move { s.wait().await }
        });
        let b = tokio::spawn({
            let s = signal.clone();
            async move { s.wait().await }
        });
        tokio::task::yield_now().await;
        signal.fire(3);
        assert_eq!(a.await.unwrap(), Ok(3));
        assert_eq!(b.await.unwrap(), Ok(3));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_wait_times_out() {
        let signal: Signal<()> = Signal::new();
        let limit = Duration::from_secs(30);
        assert_eq!(signal.wait_timeout(limit).await, Err(SignalError::Timeout(limit)));
        assert!(!signal.is_fired());
    }

    #[tokio::test]
    async fn waiter_reports_closed_when_signal_is_dropped_unfired() {
        let signal: Signal<()> = Signal::new();
        let waiter = signal.subscribe();
        drop(signal);
        assert_eq!(waiter.wait().await, Err(SignalError::Closed));
    }

    #[tokio::test]
    async fn waiter_keeps_a_value_fired_before_the_drop() {
        let signal: Signal<()> = Signal::new();
        let waiter = signal.subscribe();
        signal.fire(());
        drop(signal);
        assert!(waiter.is_fired());
        assert_eq!(waiter.wait().await, Ok(()));
    }
}
