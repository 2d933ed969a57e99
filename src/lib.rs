//! # cachemap
//!
//! The view engine of a slippy map for geocaching clients.
//!
//! It covers the Web-Mercator projection, tile addressing with horizontal
//! wrap-around, view state (center, zoom, drag and lazy recentering), tile
//! loading with placeholders, and a stack of overlay layers for markers,
//! the GPS position and geocaches. Drawing goes through the
//! [`Surface`](rendering::Surface) trait so any host toolkit can display it.

pub mod core;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod rendering;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    builder::MapBuilder,
    config::{MapConfig, ProviderConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord, TilePoint},
    map::{Map, RenderStats},
    tiling::VerticalPolicy,
    viewport::Viewport,
};

pub use crate::layers::{
    base::Layer, geocache::Geocache, geocache::GeocacheLayer, manager::LayerStack, marker::Marker,
    marker::MarkerContainer, marker::MarkerLayer, osd::OsdLayer, position::PositionLayer,
};

pub use crate::input::{AppNotification, EventHandled, GpsFix, InputEvent, MapEvent};

pub use crate::rendering::{Color, ImageSurface, MarkerStyle, Placeholders, RenderContext, Surface};

pub use crate::tiles::{MemoryTileLoader, ProviderRegistry, TileFetch, TileImage, TileLoader};

#[cfg(feature = "http")]
pub use crate::tiles::{HttpFetcher, HttpTileLoader, TileFetcher};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown map provider: {0}")]
    UnknownProvider(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Task error: {0}")]
    Task(String),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Initializes `env_logger`, reading the filter from `RUST_LOG` and
/// defaulting to `info`. Calling it twice is harmless.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
