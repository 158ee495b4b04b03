//! Event observer port
//!
//! Receives [`OrchestrationEvent`]s from the pool, the council and the
//! orchestrator. Separate from `tracing`: tracing carries human-readable
//! diagnostics, observers receive the structured event stream.

use conclave_domain::OrchestrationEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Callback for orchestration events
///
/// Synchronous and infallible so observers can never disturb execution.
pub trait EventObserver: Send + Sync {
    fn on_event(&self, event: &OrchestrationEvent);
}

/// No-op observer for when nobody is listening
pub struct NoObserver;

impl EventObserver for NoObserver {
    fn on_event(&self, _event: &OrchestrationEvent) {}
}

/// Fans every event out to several observers, in order.
#[derive(Default)]
pub struct CompositeObserver {
    delegates: Vec<Arc<dyn EventObserver>>,
}

impl CompositeObserver {
    pub fn new(delegates: Vec<Arc<dyn EventObserver>>) -> Self {
        Self { delegates }
    }

    pub fn with(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.delegates.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl EventObserver for CompositeObserver {
    fn on_event(&self, event: &OrchestrationEvent) {
        for d in &self.delegates {
            d.on_event(event);
        }
    }
}

/// Forwards events into an unbounded tokio channel.
///
/// Events sent after the receiver is dropped are discarded.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<OrchestrationEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<OrchestrationEvent>) -> Self {
        Self { tx }
    }

    /// Observer plus the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OrchestrationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl EventObserver for ChannelObserver {
    fn on_event(&self, event: &OrchestrationEvent) {
        let _ = self.tx.send(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<&'static str>>,
    }

    impl EventObserver for Recorder {
        fn on_event(&self, event: &OrchestrationEvent) {
            self.seen.lock().unwrap().push(event.event_type());
        }
    }

    fn skipped() -> OrchestrationEvent {
        OrchestrationEvent::StepSkipped {
            workflow_id: "wf".to_string(),
            step_id: "s".to_string(),
        }
    }

    #[test]
    fn test_composite_delegates_to_all() {
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        let composite = CompositeObserver::new(vec![a.clone()]).with(b.clone());

        composite.on_event(&skipped());

        assert_eq!(composite.len(), 2);
        assert_eq!(*a.seen.lock().unwrap(), vec!["step:skipped"]);
        assert_eq!(*b.seen.lock().unwrap(), vec!["step:skipped"]);
    }

    #[test]
    fn test_channel_observer_forwards() {
        let (observer, mut rx) = ChannelObserver::channel();
        observer.on_event(&skipped());

        assert_eq!(rx.try_recv().unwrap(), skipped());
    }

    #[test]
    fn test_channel_observer_ignores_closed_receiver() {
        let (observer, rx) = ChannelObserver::channel();
        drop(rx);
        observer.on_event(&skipped());
    }
}
