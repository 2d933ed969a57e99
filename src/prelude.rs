//! Prelude module for common cachemap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use cachemap::prelude::*;`

pub use crate::core::{
    builder::MapBuilder,
    config::{MapConfig, ProviderConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord, TilePoint},
    map::{Map, RenderStats},
    tiling::VerticalPolicy,
    viewport::{Viewport, VisibleTile},
};

pub use crate::layers::{
    base::{Layer, LayerProperties, LayerType},
    geocache::{Geocache, GeocacheLayer},
    manager::LayerStack,
    marker::{Marker, MarkerContainer, MarkerLayer},
    osd::OsdLayer,
    position::PositionLayer,
};

pub use crate::input::{
    events::{AppNotification, EventHandled, GpsFix, InputEvent, MapEvent},
    handler::EventManager,
};

pub use crate::rendering::{
    context::RenderContext,
    placeholder::Placeholders,
    raster::ImageSurface,
    surface::{Color, MarkerStyle, Surface},
};

pub use crate::tiles::{
    loader::{MemoryTileLoader, TileFetch, TileLoader},
    provider::ProviderRegistry,
    TileImage,
};

#[cfg(feature = "http")]
pub use crate::tiles::http::{HttpFetcher, HttpTileLoader, TileFetcher};

pub use crate::{Error as MapError, Result};

pub use std::sync::Arc;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
