use crate::core::geo::Point;
use crate::core::viewport::Viewport;
use crate::layers::base::{Layer, LayerProperties, LayerType};
use crate::rendering::surface::{Color, Surface};
use crate::Result;

pub const OSD_LAYER_ID: &str = "osd";

/// On-screen display: a short text message in the top-left corner
pub struct OsdLayer {
    properties: LayerProperties,
    message: Option<String>,
    color: Color,
}

impl OsdLayer {
    pub fn new() -> Self {
        Self {
            properties: LayerProperties::new(OSD_LAYER_ID, "On-screen display", LayerType::Osd),
            message: None,
            color: Color::BLACK,
        }
    }

    /// Replaces the message; an empty message hides it
    pub fn set_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.message = if message.is_empty() { None } else { Some(message) };
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl Default for OsdLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for OsdLayer {
    crate::impl_layer_trait!(properties);

    fn draw(&mut self, surface: &mut dyn Surface, _viewport: &Viewport) -> Result<()> {
        if let Some(message) = &self.message {
            surface.draw_text(Point::new(4.0, 4.0), message, self.color)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::context::RenderContext;

    #[test]
    fn test_message_lifecycle() {
        let viewport = Viewport::default();
        let mut osd = OsdLayer::new();
        let mut context = RenderContext::new(800, 600);

        osd.draw(&mut context, &viewport).unwrap();
        assert_eq!(context.texts().count(), 0);

        osd.set_message("Loading 3 tiles");
        osd.draw(&mut context, &viewport).unwrap();
        assert_eq!(context.texts().collect::<Vec<_>>(), vec!["Loading 3 tiles"]);

        osd.set_message("");
        assert_eq!(osd.message(), None);
    }
}
