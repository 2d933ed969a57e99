pub mod cache;
#[cfg(feature = "http")]
pub mod http;
pub mod loader;
pub mod provider;
pub mod source;

use image::RgbaImage;
use std::sync::Arc;

/// A decoded tile, shared between caches and surfaces without copying
pub type TileImage = Arc<RgbaImage>;

// Re-exports for convenience
pub use cache::TileCache;
#[cfg(feature = "http")]
pub use http::{HttpFetcher, HttpTileLoader, TileFetcher};
pub use loader::{MemoryTileLoader, TileFetch, TileLoader};
pub use provider::ProviderRegistry;
pub use source::{TileSource, UrlTemplate};
