//! Web-Mercator forward and inverse projection between geographic
//! coordinates and fractional tile space.
//!
//! Tile space at zoom `z` is the square `[0, 2^z) x [0, 2^z)`, one unit per
//! tile edge, origin at the north-west corner (longitude -180, latitude
//! ~85.0511). The formulas are the usual slippy-map ones; the forward
//! projection clamps latitude to [`MAX_LATITUDE`] so polar input yields a
//! finite point on the top or bottom edge instead of NaN/inf.

use crate::core::constants::MAX_LATITUDE;
use crate::core::geo::{LatLng, TilePoint};
use std::f64::consts::PI;

/// Number of tiles along one axis at `zoom`.
pub fn tiles_per_axis(zoom: u8) -> f64 {
    2_f64.powi(zoom as i32)
}

/// Projects a coordinate into fractional tile space.
pub fn to_tile_space(coord: &LatLng, zoom: u8) -> TilePoint {
    let n = tiles_per_axis(zoom);
    let lat_rad = coord.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = (coord.lng + 180.0) / 360.0 * n;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;

    TilePoint::new(x, y, zoom)
}

/// Inverse projection from fractional tile space.
pub fn from_tile_space(x: f64, y: f64, zoom: u8) -> LatLng {
    let n = tiles_per_axis(zoom);
    let lng = x / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees();

    LatLng::new(lat, lng)
}

/// Inverse projection of a [`TilePoint`].
pub fn unproject(point: &TilePoint) -> LatLng {
    from_tile_space(point.x, point.y, point.zoom)
}
