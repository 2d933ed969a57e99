use crate::input::events::MapEvent;
use crate::prelude::HashMap;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::VecDeque;

/// Event listener callback type
pub type EventCallback = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Queues map events and fans them out to observers.
///
/// Observers either register a callback per event kind or hold a channel
/// receiver that sees every event. Nothing is delivered until
/// [`process_events`](Self::process_events) runs, so delivery always happens
/// on the thread driving the map.
#[derive(Default)]
pub struct EventManager {
    /// Event listeners by event kind
    listeners: HashMap<String, Vec<EventCallback>>,
    subscribers: Vec<Sender<MapEvent>>,
    /// Event queue for processing
    event_queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event listener for one event kind (see [`MapEvent::kind`])
    pub fn on<F>(&mut self, event_kind: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.listeners
            .entry(event_kind.to_string())
            .or_default()
            .push(Box::new(callback));
    }

    /// Opens a channel that receives every processed event
    pub fn subscribe(&mut self) -> Receiver<MapEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Emit an event to the queue
    pub fn emit(&mut self, event: MapEvent) {
        self.event_queue.push_back(event);
    }

    /// Process all queued events
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.event_queue.drain(..).collect();

        for event in &events {
            if let Some(callbacks) = self.listeners.get(event.kind()) {
                for callback in callbacks {
                    callback(event);
                }
            }
            // Receivers that were dropped are forgotten
            self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }

        events
    }

    /// Clear all events from the queue
    pub fn clear_events(&mut self) {
        self.event_queue.clear();
    }

    /// Get number of pending events
    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }
}
