//! Audio subsystem event hub.
//!
//! The hub multiplexes device and source-reclamation events into a bounded
//! history plus async broadcast stream. It is owned by the facade rather
//! than held in a global static so tests can observe events in isolation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::device::AudioDevice;

const DEFAULT_CHANNEL_CAPACITY: usize = 64;
const DEFAULT_HISTORY_CAPACITY: usize = 128;

/// Event emitted by the audio facade.
#[derive(Debug, Clone)]
pub enum AudioEvent {
    /// The active output device changed to the requested device.
    ActiveDeviceChanged { device: AudioDevice },
    /// The requested device was unavailable; playback fell back to
    /// another device (normally the default).
    DeviceFallback {
        requested: String,
        fallback: AudioDevice,
    },
    /// The device list was re-enumerated and differs from the previous one.
    DeviceListRefreshed { count: usize },
    /// Finished fire-and-forget sources were reclaimed during an update.
    SourcesReclaimed { count: usize },
}

/// Broadcast-based hub retaining a bounded history of audio events.
pub struct AudioEventHub {
    tx: broadcast::Sender<AudioEvent>,
    history: Mutex<VecDeque<AudioEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
}

impl AudioEventHub {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer);
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
        }
    }

    /// Publish an event to subscribers and the bounded history.
    pub(crate) fn publish(&self, event: AudioEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut history) = self.history.lock() {
            if history.len() == self.history_capacity {
                history.pop_front();
            }
            history.push_back(event.clone());
        }
        // Send fails only when no subscriber exists, which is fine.
        let _ = self.tx.send(event);
    }

    /// Subscribe to live events.
    pub fn subscribe(&self) -> broadcast::Receiver<AudioEvent> {
        self.tx.subscribe()
    }

    /// Snapshot of the retained event history, oldest first.
    pub fn snapshot(&self) -> Vec<AudioEvent> {
        self.history
            .lock()
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Total number of events published since startup.
    pub fn total_events(&self) -> u64 {
        self.total_events.load(Ordering::Relaxed)
    }
}

impl Default for AudioEventHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY, DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_subscriber() {
        let hub = AudioEventHub::default();
        let mut rx = hub.subscribe();
        hub.publish(AudioEvent::SourcesReclaimed { count: 2 });

        match rx.try_recv() {
            Ok(AudioEvent::SourcesReclaimed { count }) => assert_eq!(count, 2),
            other => panic!("Expected SourcesReclaimed, got {:?}", other),
        }
    }

    #[test]
    fn test_history_is_bounded() {
        let hub = AudioEventHub::new(8, 3);
        for count in 0..5 {
            hub.publish(AudioEvent::SourcesReclaimed { count });
        }

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(hub.total_events(), 5);
        match &snapshot[0] {
            AudioEvent::SourcesReclaimed { count } => assert_eq!(*count, 2),
            other => panic!("Expected SourcesReclaimed, got {:?}", other),
        }
    }

    #[test]
    fn test_publish_without_subscribers_does_not_panic() {
        let hub = AudioEventHub::default();
        hub.publish(AudioEvent::DeviceListRefreshed { count: 1 });
        assert_eq!(hub.total_events(), 1);
    }
}
