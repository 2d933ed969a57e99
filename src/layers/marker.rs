use crate::core::geo::{LatLng, Point};
use crate::core::viewport::Viewport;
use crate::layers::base::{Layer, LayerProperties, LayerType};
use crate::rendering::surface::{Color, MarkerStyle, Surface};
use crate::Result;

/// A pin at a geographic position
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    position: LatLng,
    style: MarkerStyle,
    label: Option<String>,
}

impl Marker {
    pub fn new(position: LatLng) -> Self {
        Self {
            position,
            style: MarkerStyle::default(),
            label: None,
        }
    }

    pub fn with_style(mut self, style: MarkerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn set_position(&mut self, position: LatLng) {
        self.position = position;
    }

    pub fn style(&self) -> &MarkerStyle {
        &self.style
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Draws the pin if any part of it is on screen. Returns its screen position.
    pub fn draw(&self, surface: &mut dyn Surface, viewport: &Viewport) -> Result<Option<Point>> {
        let at = viewport.coord_to_screen_point(&self.position);
        let r = self.style.radius;
        if at.x + r < 0.0 || at.y + r < 0.0 || at.x - r > viewport.width() || at.y - r > viewport.height() {
            return Ok(None);
        }

        surface.draw_marker(at, &self.style)?;
        if let Some(label) = &self.label {
            surface.draw_text(Point::new(at.x + r + 2.0, at.y - r), label, Color::BLACK)?;
        }
        Ok(Some(at))
    }
}

/// A layer that holds markers which the map can clear in one go
pub trait MarkerContainer {
    fn add_marker(&mut self, marker: Marker);

    fn markers(&self) -> &[Marker];

    /// Removes every marker while keeping the layer itself
    fn remove_all_markers(&mut self);
}

/// Layer with user-placed pins such as search results.
///
/// In single mode adding a marker replaces the previous one.
pub struct MarkerLayer {
    properties: LayerProperties,
    markers: Vec<Marker>,
    single: bool,
}

impl MarkerLayer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            properties: LayerProperties::new(id, "Markers", LayerType::Marker),
            markers: Vec::new(),
            single: false,
        }
    }

    /// Layer holding at most one marker
    pub fn single(id: impl Into<String>) -> Self {
        Self {
            single: true,
            ..Self::new(id)
        }
    }

    pub fn is_single(&self) -> bool {
        self.single
    }
}

impl MarkerContainer for MarkerLayer {
    fn add_marker(&mut self, marker: Marker) {
        if self.single {
            self.markers.clear();
        }
        self.markers.push(marker);
    }

    fn markers(&self) -> &[Marker] {
        &self.markers
    }

    fn remove_all_markers(&mut self) {
        self.markers.clear();
    }
}

impl Layer for MarkerLayer {
    crate::impl_layer_trait!(properties);

    fn draw(&mut self, surface: &mut dyn Surface, viewport: &Viewport) -> Result<()> {
        for marker in &self.markers {
            marker.draw(surface, viewport)?;
        }
        Ok(())
    }

    fn as_marker_container_mut(&mut self) -> Option<&mut dyn MarkerContainer> {
        Some(self)
    }
}
