//! The drawing contract between the map and the host graphics surface.

use crate::core::geo::Point;
use crate::tiles::TileImage;
use crate::Result;
use serde::{Deserialize, Serialize};

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(220, 30, 30);
    pub const GREEN: Color = Color::rgb(40, 170, 60);
    pub const BLUE: Color = Color::rgb(40, 90, 220);
    pub const GRAY: Color = Color::rgb(128, 128, 128);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// How a pin is painted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub fill: Color,
    pub stroke: Color,
    /// Radius in pixels
    pub radius: f64,
}

impl MarkerStyle {
    pub fn new(fill: Color, radius: f64) -> Self {
        Self {
            fill,
            stroke: Color::BLACK,
            radius,
        }
    }
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self::new(Color::RED, 6.0)
    }
}

/// A host graphics surface the map paints on.
///
/// Positions are screen pixels relative to the map's top-left corner. The
/// map never blits pixels itself; everything it draws goes through here.
pub trait Surface {
    /// Draws a tile with its top-left corner at `at`
    fn draw_tile(&mut self, image: &TileImage, at: Point) -> Result<()>;

    /// Draws a pin centered on `at`
    fn draw_marker(&mut self, at: Point, style: &MarkerStyle) -> Result<()>;

    fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f64) -> Result<()>;

    /// Draws a text label anchored at its top-left corner
    fn draw_text(&mut self, at: Point, text: &str, color: Color) -> Result<()>;
}
