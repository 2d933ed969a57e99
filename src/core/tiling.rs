//! Integer tile addressing and wrap-around in tile space.

use crate::core::geo::{LatLng, TileCoord, TilePoint};
use crate::core::projection::{tiles_per_axis, to_tile_space};
use serde::{Deserialize, Serialize};

/// How the vertical (latitude) tile axis behaves when a pan leaves the world.
///
/// Mercator `y` does not repeat: the world ends at ~±85.05°. `Clamp` keeps
/// the view inside `[0, 2^z)`. `Wrap` applies the same modulo as the
/// horizontal axis, so panning past the north edge re-enters from the south.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalPolicy {
    #[default]
    Clamp,
    Wrap,
}

/// Integer tile covering `coord` at `zoom`.
///
/// Longitudes outside [-180, 180] and latitudes beyond the Mercator limit
/// are folded back into the grid, so the result is always a valid tile.
pub fn tile_index(coord: &LatLng, zoom: u8) -> TileCoord {
    let point = to_tile_space(coord, zoom);
    let (x, y) = wrap(point.x, point.y, zoom);
    TileCoord::new(x.floor() as u32, y.floor() as u32, zoom)
}

/// Modulo both axes into `[0, 2^zoom)`.
pub fn wrap(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    (wrap_axis(x, zoom), wrap_axis(y, zoom))
}

/// Modulo one axis into `[0, 2^zoom)`, negative input included.
pub fn wrap_axis(value: f64, zoom: u8) -> f64 {
    let n = tiles_per_axis(zoom);
    let wrapped = value.rem_euclid(n);
    // rem_euclid can round up to exactly n for tiny negative input
    if wrapped >= n {
        0.0
    } else {
        wrapped
    }
}

/// Clamp one axis into `[0, 2^zoom]`.
pub fn clamp_axis(value: f64, zoom: u8) -> f64 {
    value.clamp(0.0, tiles_per_axis(zoom))
}

/// Normalize a tile-space position after a pan: the horizontal axis always
/// wraps, the vertical axis follows `policy`.
pub fn normalize(point: TilePoint, policy: VerticalPolicy) -> TilePoint {
    let y = match policy {
        VerticalPolicy::Clamp => clamp_axis(point.y, point.zoom),
        VerticalPolicy::Wrap => wrap_axis(point.y, point.zoom),
    };
    TilePoint::new(wrap_axis(point.x, point.zoom), y, point.zoom)
}

/// Maps a possibly out-of-range integer tile column/row onto the grid.
///
/// Columns always wrap. Rows wrap under [`VerticalPolicy::Wrap`] and are
/// rejected (`None`) under [`VerticalPolicy::Clamp`].
pub fn address(x: i64, y: i64, zoom: u8, policy: VerticalPolicy) -> Option<TileCoord> {
    let n = 1_i64 << zoom;
    let row = match policy {
        VerticalPolicy::Wrap => y.rem_euclid(n),
        VerticalPolicy::Clamp if (0..n).contains(&y) => y,
        VerticalPolicy::Clamp => return None,
    };
    Some(TileCoord::new(x.rem_euclid(n) as u32, row as u32, zoom))
}
