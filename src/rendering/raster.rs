use crate::core::geo::Point;
use crate::rendering::surface::{Color, MarkerStyle, Surface};
use crate::tiles::TileImage;
use crate::Result;
use image::{imageops, Rgba, RgbaImage};
use std::path::Path;

/// Surface compositing onto an in-memory RGBA image.
///
/// There is no font rasterizer, so text is kept as labels next to the
/// image; hosts that need glyphs draw them from [`labels`](Self::labels).
pub struct ImageSurface {
    canvas: RgbaImage,
    labels: Vec<(Point, String)>,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_background(width, height, Color::WHITE)
    }

    pub fn with_background(width: u32, height: u32, background: Color) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(width, height, Rgba(background.to_array())),
            labels: Vec::new(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }

    pub fn labels(&self) -> &[(Point, String)] {
        &self.labels
    }

    /// Writes the canvas, format chosen by extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.canvas.save(path)?;
        Ok(())
    }

    fn put(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.canvas.width() as i64 || y >= self.canvas.height() as i64 {
            return;
        }
        let pixel = self.canvas.get_pixel_mut(x as u32, y as u32);
        blend(pixel, color);
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        let r = radius.ceil() as i64;
        let cx = center.x.round() as i64;
        let cy = center.y.round() as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                if ((dx * dx + dy * dy) as f64) <= radius * radius {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }
}

fn blend(pixel: &mut Rgba<u8>, color: Color) {
    let alpha = color.a as u32;
    if alpha == 255 {
        *pixel = Rgba(color.to_array());
        return;
    }
    let inverse = 255 - alpha;
    let [r, g, b, a] = pixel.0;
    pixel.0 = [
        ((color.r as u32 * alpha + r as u32 * inverse) / 255) as u8,
        ((color.g as u32 * alpha + g as u32 * inverse) / 255) as u8,
        ((color.b as u32 * alpha + b as u32 * inverse) / 255) as u8,
        a.max(color.a),
    ];
}

/// Cuts a segment down to the part inside the `min`..`max` rectangle
/// (Liang-Barsky). `None` when nothing of it is inside.
fn clip_segment(from: Point, to: Point, min: Point, max: Point) -> Option<(Point, Point)> {
    if ![from.x, from.y, to.x, to.y].iter().all(|v| v.is_finite()) {
        return None;
    }
    let delta = to.subtract(&from);
    let edges = [
        (-delta.x, from.x - min.x),
        (delta.x, max.x - from.x),
        (-delta.y, from.y - min.y),
        (delta.y, max.y - from.y),
    ];

    let (mut enter, mut leave) = (0.0_f64, 1.0_f64);
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            enter = enter.max(t);
        } else {
            leave = leave.min(t);
        }
        if enter > leave {
            return None;
        }
    }
    Some((from.add(&delta.multiply(enter)), from.add(&delta.multiply(leave))))
}

impl Surface for ImageSurface {
    fn draw_tile(&mut self, image: &TileImage, at: Point) -> Result<()> {
        imageops::overlay(
            &mut self.canvas,
            &**image,
            at.x.round() as i64,
            at.y.round() as i64,
        );
        Ok(())
    }

    fn draw_marker(&mut self, at: Point, style: &MarkerStyle) -> Result<()> {
        self.fill_circle(at, style.radius + 1.0, style.stroke);
        self.fill_circle(at, style.radius, style.fill);
        Ok(())
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f64) -> Result<()> {
        let half = (width / 2.0).max(0.5);
        let pad = half + 1.0;
        let bounds = (
            Point::new(-pad, -pad),
            Point::new(self.canvas.width() as f64 + pad, self.canvas.height() as f64 + pad),
        );
        let Some((from, to)) = clip_segment(from, to, bounds.0, bounds.1) else {
            return Ok(());
        };

        let delta = to.subtract(&from);
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            let p = from.add(&delta.multiply(t));
            if half <= 0.5 {
                self.put(p.x.round() as i64, p.y.round() as i64, color);
            } else {
                self.fill_circle(p, half, color);
            }
        }
        Ok(())
    }

    fn draw_text(&mut self, at: Point, text: &str, _color: Color) -> Result<()> {
        self.labels.push((at, text.to_string()));
        Ok(())
    }
}
