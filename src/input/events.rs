use crate::core::geo::{LatLng, Point};
use serde::{Deserialize, Serialize};

/// Pointer and window input the map reacts to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Single click/tap
    Click { position: Point },
    /// Press-and-hold selecting the square of `radius` pixels around `position`
    LongPress { position: Point, radius: f64 },
    /// Start of drag operation
    DragStart { position: Point },
    /// Drag in progress, movement since the previous drag event
    Drag { delta: Point },
    /// End of drag operation
    DragEnd,
    /// Scroll wheel; positive zooms in
    Scroll { delta: f64 },
    /// Viewport/window resize
    Resize { size: Point },
}

impl InputEvent {
    /// Gets the primary position associated with this event, if any
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::Click { position } => Some(*position),
            InputEvent::LongPress { position, .. } => Some(*position),
            InputEvent::DragStart { position } => Some(*position),
            _ => None,
        }
    }
}

/// Whether an event was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventHandled {
    Handled,
    NotHandled,
}

impl EventHandled {
    pub fn is_handled(self) -> bool {
        self == EventHandled::Handled
    }
}

/// Change notifications emitted by the map
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    CenterChanged { center: LatLng },
    ZoomChanged { zoom: u8 },
    /// Another tile provider became active
    TileLoaderChanged { name: String },
    /// A click that reached the map, with the coordinate under it
    Click { lat_lng: LatLng, pixel: Point },
    /// Something visible changed and the host should call `render`
    RedrawRequested,
}

impl MapEvent {
    /// Key used when registering callbacks with `Map::on`
    pub fn kind(&self) -> &'static str {
        match self {
            MapEvent::CenterChanged { .. } => "centerchanged",
            MapEvent::ZoomChanged { .. } => "zoomchanged",
            MapEvent::TileLoaderChanged { .. } => "tileloaderchanged",
            MapEvent::Click { .. } => "click",
            MapEvent::RedrawRequested => "redraw",
        }
    }
}

/// A position fix from the GPS collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub position: LatLng,
    /// Horizontal accuracy in meters
    pub error: f64,
    /// Heading in degrees, clockwise from north
    pub bearing: Option<f64>,
}

impl GpsFix {
    pub fn new(position: LatLng, error: f64) -> Self {
        Self {
            position,
            error,
            bearing: None,
        }
    }
}

/// Notifications from the surrounding application that layers consume
#[derive(Debug, Clone, PartialEq)]
pub enum AppNotification {
    TargetChanged { target: LatLng },
    GoodFix(GpsFix),
    NoFix,
    /// Changed settings as a JSON object
    SettingsChanged(serde_json::Value),
    /// The stored geocaches changed and layers showing them must refresh
    MarksChanged,
}

impl AppNotification {
    /// Reads a persisted target out of a settings payload
    pub fn target_from_settings(settings: &serde_json::Value) -> Option<LatLng> {
        let lat = settings.get("last_target_lat")?.as_f64()?;
        let lng = settings.get("last_target_lon")?.as_f64()?;
        Some(LatLng::new(lat, lng))
    }
}
