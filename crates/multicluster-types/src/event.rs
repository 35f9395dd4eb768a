use std::sync::atomic::{Ordering, AtomicBool};

use event_listener::Event;

/// Latching notification: once notified, every current and future listener
/// returns immediately.
/// Used by watch caches to publish "initial sync completed".
#[derive(Debug, Default)]
pub struct StickyEvent {
    flag: AtomicBool,
    event: Event,
}

impl StickyEvent {
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// resolves once notified
    pub async fn listen(&self) {
        while !self.is_set() {
            let listener = self.event.listen();
            // notified between the check and registering the listener
            if self.is_set() {
                return;
            }
            listener.await;
        }
    }

    /// release every listener, later calls are no-ops
    pub fn notify(&self) {
        if !self.flag.swap(true, Ordering::AcqRel) {
            self.event.notify(usize::MAX);
        }
    }
}

#[cfg(test)]
mod test {

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use fluvio_future::task::spawn;
    use fluvio_future::timer::sleep;

    use super::StickyEvent;

    #[fluvio_future::test]
    async fn test_listen_after_notify_returns() {
        let event = StickyEvent::default();
        event.notify();
        event.notify();
        assert!(event.is_set());
        // must not block
        event.listen().await;
    }

    #[fluvio_future::test]
    async fn test_waiting_listener_released() {
        let event = Arc::new(StickyEvent::default());
        let released = Arc::new(AtomicBool::new(false));

        let listener_event = event.clone();
        let listener_flag = released.clone();
        spawn(async move {
            listener_event.listen().await;
            listener_flag.store(true, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(10)).await;
        assert!(!released.load(Ordering::SeqCst));

        event.notify();
        sleep(Duration::from_millis(50)).await;
        assert!(released.load(Ordering::SeqCst), "listener should be released");
    }
}
