use crate::coordinator::UiEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Viewport position reported by a front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSignal {
    /// Index of the last row currently on screen
    pub last_visible: usize,
    /// Rows materialized in the window
    pub shown: usize,
}

impl ViewportSignal {
    #[must_use]
    pub const fn at_end(shown: usize) -> Self {
        Self {
            last_visible: shown.saturating_sub(1),
            shown,
        }
    }

    #[must_use]
    pub const fn near_end(&self, threshold: usize) -> bool {
        self.last_visible
            .saturating_add(threshold)
            .saturating_add(1)
            >= self.shown
    }
}

/// Forwards near-end viewport signals as [`UiEvent::NearEnd`].
///
/// Dropping the subscription aborts the forwarding task.
#[derive(Debug)]
pub struct ScrollSubscription {
    task: JoinHandle<()>,
}

impl ScrollSubscription {
    #[must_use]
    pub fn spawn(
        mut signals: mpsc::Receiver<ViewportSignal>,
        events: mpsc::Sender<UiEvent>,
        threshold: usize,
    ) -> Self {
        let task = tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                if !signal.near_end(threshold) {
                    continue;
                }
                if events.send(UiEvent::NearEnd).await.is_err() {
                    break;
                }
            }
            log::debug!("Scroll subscription finished");
        });
        Self { task }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for ScrollSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn near_end_respects_threshold() {
        let far = ViewportSignal {
            last_visible: 10,
            shown: 50,
        };
        assert!(!far.near_end(10));
        assert!(far.near_end(39));
        assert!(!far.near_end(38));
        assert!(ViewportSignal::at_end(50).near_end(0));
        assert!(ViewportSignal::at_end(0).near_end(0));
    }

    #[tokio::test]
    async fn forwards_only_near_end_signals() {
        let (signal_tx, signal_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = mpsc::channel(8);
        let _subscription = ScrollSubscription::spawn(signal_rx, event_tx, 5);

        signal_tx
            .send(ViewportSignal {
                last_visible: 0,
                shown: 50,
            })
            .await
            .unwrap();
        signal_tx.send(ViewportSignal::at_end(50)).await.unwrap();

        let event = event_rx.recv().await.expect("forwarded event");
        assert!(matches!(event, UiEvent::NearEnd));
        assert!(event_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropping_subscription_stops_forwarding() {
        let (signal_tx, signal_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = mpsc::channel(8);
        let subscription = ScrollSubscription::spawn(signal_rx, event_tx, 5);
        assert!(subscription.is_active());
        drop(subscription);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(signal_tx.is_closed());
        let _ = signal_tx.send(ViewportSignal::at_end(50)).await;
        assert!(event_rx.recv().await.is_none());
    }
}
