use crate::core::geo::{LatLng, Point};
use crate::core::viewport::Viewport;
use crate::input::events::{AppNotification, EventHandled};
use crate::layers::marker::MarkerContainer;
use crate::rendering::surface::Surface;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Osd,
    Marker,
    Position,
    Geocache,
    Custom,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Osd => write!(f, "osd"),
            LayerType::Marker => write!(f, "marker"),
            LayerType::Position => write!(f, "position"),
            LayerType::Geocache => write!(f, "geocache"),
            LayerType::Custom => write!(f, "custom"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub id: String,
    pub name: String,
    pub layer_type: LayerType,
    pub visible: bool,
}

impl LayerProperties {
    pub fn new(id: impl Into<String>, name: impl Into<String>, layer_type: LayerType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            layer_type,
            visible: true,
        }
    }
}

/// An overlay drawn above the tiles.
///
/// Layers do not keep a handle on their map. Every call that needs
/// coordinate conversions or the visible area receives the map's
/// [`Viewport`] instead. Capabilities a layer does not have keep the default
/// no-op implementation.
pub trait Layer: Send {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn layer_type(&self) -> LayerType;

    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    /// Called once when the layer is added to a map
    fn attach(&mut self, _viewport: &Viewport) {}

    fn draw(&mut self, surface: &mut dyn Surface, viewport: &Viewport) -> Result<()>;

    /// A click at a screen position
    fn clicked_screen(&mut self, _point: Point, _viewport: &Viewport) -> EventHandled {
        EventHandled::NotHandled
    }

    /// A click selecting a region around `center`
    fn clicked_coordinate(
        &mut self,
        _center: LatLng,
        _top_left: LatLng,
        _bottom_right: LatLng,
        _viewport: &Viewport,
    ) -> EventHandled {
        EventHandled::NotHandled
    }

    /// The view changed size
    fn resize(&mut self, _viewport: &Viewport) {}

    /// Reacts to a notification from the application. Returns whether the
    /// layer needs to be redrawn.
    fn handle_notification(&mut self, _notification: &AppNotification, _viewport: &Viewport) -> bool {
        false
    }

    /// Access to the marker-holding capability, if the layer has it
    fn as_marker_container_mut(&mut self) -> Option<&mut dyn MarkerContainer> {
        None
    }

    fn as_any(&self) -> &dyn std::any::Any;

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
