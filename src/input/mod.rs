pub mod events;
pub mod handler;

// Re-export the essential types
pub use events::{AppNotification, EventHandled, GpsFix, InputEvent, MapEvent};
pub use handler::{EventCallback, EventManager};
