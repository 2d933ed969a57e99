pub mod context;
pub mod placeholder;
pub mod raster;
pub mod surface;

// Re-export main types
pub use context::{DrawCommand, RenderContext};
pub use placeholder::Placeholders;
pub use raster::ImageSurface;
pub use surface::{Color, MarkerStyle, Surface};
