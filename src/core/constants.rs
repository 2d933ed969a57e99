//! Core constants shared by the projection, tiling and view code.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Smallest zoom level a view accepts unless configured otherwise.
pub const DEFAULT_MIN_ZOOM: u8 = 1;

/// Highest zoom level any tile pyramid may address (2^30 tiles per axis fits in u32).
pub const ABSOLUTE_MAX_ZOOM: u8 = 30;

/// Fraction of the viewport a lazy recenter has to exceed before the view moves.
pub const LAZY_SET_CENTER_DIFFERENCE: f64 = 0.5;

/// Latitude limit of the square Web-Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Mean earth radius in meters, used for ground resolution.
pub const RADIUS_EARTH: f64 = 6_371_000.0;

/// Hit radius around a pin, in screen pixels.
pub const MARKER_HIT_RADIUS: f64 = 12.0;

/// Default number of geocaches a layer asks its provider for.
pub const DEFAULT_MAX_RESULTS: usize = 500;
