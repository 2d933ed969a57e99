use crate::core::geo::{LatLng, Point};
use crate::core::viewport::Viewport;
use crate::input::events::{AppNotification, GpsFix};
use crate::layers::base::{Layer, LayerProperties, LayerType};
use crate::layers::marker::{Marker, MarkerContainer};
use crate::rendering::surface::{Color, MarkerStyle, Surface};
use crate::Result;

const HEADING_LENGTH: f64 = 24.0;

/// Current GPS position, heading and the navigation target.
///
/// After the fix is lost the last known position stays on screen in gray.
pub struct PositionLayer {
    properties: LayerProperties,
    fix: Option<GpsFix>,
    has_fix: bool,
    target: Option<Marker>,
}

impl PositionLayer {
    pub fn new() -> Self {
        Self {
            properties: LayerProperties::new("position", "Position", LayerType::Position),
            fix: None,
            has_fix: false,
            target: None,
        }
    }

    pub fn fix(&self) -> Option<&GpsFix> {
        self.fix.as_ref()
    }

    pub fn has_fix(&self) -> bool {
        self.has_fix
    }

    pub fn target(&self) -> Option<LatLng> {
        self.target.as_ref().map(Marker::position)
    }

    pub fn set_target(&mut self, target: LatLng) {
        self.target = Some(target_marker(target));
    }

    /// Distance from the last fix to the target in meters
    pub fn distance_to_target(&self) -> Option<f64> {
        let fix = self.fix.as_ref()?;
        let target = self.target()?;
        Some(fix.position.distance_to(&target))
    }
}

fn target_marker(position: LatLng) -> Marker {
    Marker::new(position).with_style(MarkerStyle::new(Color::GREEN, 7.0))
}

impl Default for PositionLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerContainer for PositionLayer {
    /// The target is the only marker this layer holds
    fn add_marker(&mut self, marker: Marker) {
        self.target = Some(marker);
    }

    fn markers(&self) -> &[Marker] {
        self.target.as_slice()
    }

    fn remove_all_markers(&mut self) {
        self.target = None;
    }
}

impl Layer for PositionLayer {
    crate::impl_layer_trait!(properties);

    fn draw(&mut self, surface: &mut dyn Surface, viewport: &Viewport) -> Result<()> {
        let target_at = match &self.target {
            Some(target) => target.draw(surface, viewport)?,
            None => None,
        };

        let Some(fix) = &self.fix else {
            return Ok(());
        };
        let at = viewport.coord_to_screen_point(&fix.position);
        let color = if self.has_fix { Color::BLUE } else { Color::GRAY };

        if self.has_fix {
            if let Some(target_at) = target_at {
                surface.draw_line(at, target_at, Color::rgba(40, 170, 60, 160), 2.0)?;
            }
            if let Some(bearing) = fix.bearing {
                let rad = bearing.to_radians();
                let tip = Point::new(at.x + rad.sin() * HEADING_LENGTH, at.y - rad.cos() * HEADING_LENGTH);
                surface.draw_line(at, tip, color, 3.0)?;
            }
        }
        surface.draw_marker(at, &MarkerStyle::new(color, 5.0))
    }

    fn handle_notification(&mut self, notification: &AppNotification, _viewport: &Viewport) -> bool {
        match notification {
            AppNotification::TargetChanged { target } => {
                self.set_target(*target);
                true
            }
            AppNotification::GoodFix(fix) => {
                self.fix = Some(*fix);
                self.has_fix = true;
                true
            }
            AppNotification::NoFix => {
                let changed = self.has_fix;
                self.has_fix = false;
                changed
            }
            _ => false,
        }
    }

    fn as_marker_container_mut(&mut self) -> Option<&mut dyn MarkerContainer> {
        Some(self)
    }
}
