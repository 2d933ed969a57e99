use crate::core::geo::Point;
use crate::rendering::surface::{Color, MarkerStyle, Surface};
use crate::tiles::TileImage;
use crate::Result;
use std::sync::Arc;

/// Commands issued to a [`RenderContext`]
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Tile {
        image: TileImage,
        position: Point,
    },
    Marker {
        position: Point,
        style: MarkerStyle,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f64,
    },
    Text {
        position: Point,
        text: String,
        color: Color,
    },
}

impl DrawCommand {
    /// Whether this command draws exactly `image` (same allocation)
    pub fn is_tile(&self, image: &TileImage) -> bool {
        matches!(self, DrawCommand::Tile { image: drawn, .. } if Arc::ptr_eq(drawn, image))
    }
}

/// Surface that records what was drawn instead of painting it.
///
/// Hosts that rasterize elsewhere replay the queue; tests inspect it.
#[derive(Debug, Default)]
pub struct RenderContext {
    pub width: u32,
    pub height: u32,
    /// Drawing primitives queue
    pub drawing_queue: Vec<DrawCommand>,
    /// Viewport clipping bounds (min, max) in screen coordinates
    pub clip_bounds: Option<(Point, Point)>,
}

impl RenderContext {
    /// Create a new render context clipping to `width` x `height`
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            drawing_queue: Vec::new(),
            clip_bounds: Some((
                Point::new(0.0, 0.0),
                Point::new(width as f64, height as f64),
            )),
        }
    }

    /// Begin a frame
    pub fn begin_frame(&mut self) {
        self.drawing_queue.clear();
    }

    /// Get the current drawing queue
    pub fn get_drawing_queue(&self) -> &[DrawCommand] {
        &self.drawing_queue
    }

    pub fn tiles(&self) -> impl Iterator<Item = (&TileImage, Point)> {
        self.drawing_queue.iter().filter_map(|command| match command {
            DrawCommand::Tile { image, position } => Some((image, *position)),
            _ => None,
        })
    }

    pub fn markers(&self) -> impl Iterator<Item = (Point, &MarkerStyle)> {
        self.drawing_queue.iter().filter_map(|command| match command {
            DrawCommand::Marker { position, style } => Some((*position, style)),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.drawing_queue.iter().filter_map(|command| match command {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Set viewport clipping bounds
    pub fn set_clip_bounds(&mut self, min: Point, max: Point) {
        self.clip_bounds = Some((min, max));
    }

    /// Clear clipping bounds
    pub fn clear_clip_bounds(&mut self) {
        self.clip_bounds = None;
    }

    /// Whether a rectangle touches the clip area
    fn intersects_clip(&self, min: Point, max: Point) -> bool {
        match self.clip_bounds {
            Some((clip_min, clip_max)) => {
                !(max.x < clip_min.x || min.x > clip_max.x || max.y < clip_min.y || min.y > clip_max.y)
            }
            None => true,
        }
    }
}

impl Surface for RenderContext {
    fn draw_tile(&mut self, image: &TileImage, at: Point) -> Result<()> {
        let max = Point::new(at.x + image.width() as f64, at.y + image.height() as f64);
        // Tiles completely outside the clip area are dropped
        if self.intersects_clip(at, max) {
            self.drawing_queue.push(DrawCommand::Tile {
                image: image.clone(),
                position: at,
            });
        }
        Ok(())
    }

    fn draw_marker(&mut self, at: Point, style: &MarkerStyle) -> Result<()> {
        self.drawing_queue.push(DrawCommand::Marker {
            position: at,
            style: *style,
        });
        Ok(())
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f64) -> Result<()> {
        self.drawing_queue.push(DrawCommand::Line {
            from,
            to,
            color,
            width,
        });
        Ok(())
    }

    fn draw_text(&mut self, at: Point, text: &str, color: Color) -> Result<()> {
        self.drawing_queue.push(DrawCommand::Text {
            position: at,
            text: text.to_string(),
            color,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_records_commands() {
        let mut context = RenderContext::new(512, 512);
        let tile: TileImage = Arc::new(RgbaImage::new(256, 256));

        context.draw_tile(&tile, Point::new(0.0, 0.0)).unwrap();
        context
            .draw_marker(Point::new(10.0, 10.0), &MarkerStyle::default())
            .unwrap();
        context
            .draw_text(Point::new(5.0, 5.0), "hello", Color::BLACK)
            .unwrap();

        assert_eq!(context.get_drawing_queue().len(), 3);
        assert!(context.get_drawing_queue()[0].is_tile(&tile));
        assert_eq!(context.markers().count(), 1);
        assert_eq!(context.texts().collect::<Vec<_>>(), vec!["hello"]);

        context.begin_frame();
        assert!(context.get_drawing_queue().is_empty());
    }

    #[test]
    fn test_tiles_outside_clip_are_dropped() {
        let mut context = RenderContext::new(300, 300);
        let tile: TileImage = Arc::new(RgbaImage::new(256, 256));

        context.draw_tile(&tile, Point::new(-300.0, 0.0)).unwrap();
        context.draw_tile(&tile, Point::new(-100.0, 0.0)).unwrap();
        assert_eq!(context.tiles().count(), 1);

        context.clear_clip_bounds();
        context.draw_tile(&tile, Point::new(-300.0, 0.0)).unwrap();
        assert_eq!(context.tiles().count(), 2);
    }
}
