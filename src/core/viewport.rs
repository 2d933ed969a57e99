use crate::core::constants::{
    ABSOLUTE_MAX_ZOOM, DEFAULT_MIN_ZOOM, LAZY_SET_CENTER_DIFFERENCE, RADIUS_EARTH, TILE_SIZE,
};
use crate::core::geo::{LatLng, LatLngBounds, Point, TileCoord, TilePoint};
use crate::core::projection::{from_tile_space, tiles_per_axis, to_tile_space, unproject};
use crate::core::tiling::{self, VerticalPolicy};

/// A raster tile that intersects the viewport and where to draw it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleTile {
    pub coord: TileCoord,
    /// Screen position of the tile's top-left corner
    pub screen: Point,
}

/// View state of one map: center, zoom, screen size and drag bookkeeping.
///
/// The center is held twice: as the geographic coordinate the caller asked
/// for and as its position in fractional tile space at the current zoom.
/// Both are always updated together. All screen positions are relative to
/// the top-left corner of the map area.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    center: LatLng,
    zoom: u8,
    size: Point,
    map_center: TilePoint,
    /// Pixel offset of the whole map while a drag is in progress
    draw_offset: Point,
    dragging: bool,
    tile_size: u32,
    min_zoom: u8,
    max_zoom: u8,
    lazy_threshold: f64,
    vertical_policy: VerticalPolicy,
}

impl Viewport {
    /// Creates a viewport for 256px tiles and zoom levels 1..=18.
    ///
    /// The initial zoom is clamped into that range.
    pub fn new(center: LatLng, zoom: u8, size: Point) -> Self {
        let zoom = zoom.clamp(DEFAULT_MIN_ZOOM, 18);
        Self {
            center,
            zoom,
            size,
            map_center: Self::project_center(&center, zoom),
            draw_offset: Point::default(),
            dragging: false,
            tile_size: TILE_SIZE,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: 18,
            lazy_threshold: LAZY_SET_CENTER_DIFFERENCE,
            vertical_policy: VerticalPolicy::default(),
        }
    }

    /// Sets tile edge length and the highest zoom of the active tile source
    pub fn with_tile_source(mut self, tile_size: u32, max_zoom: u8) -> Self {
        self.set_tile_source(tile_size, max_zoom);
        self
    }

    /// Sets the lowest zoom level. It never exceeds the tile source's maximum.
    pub fn with_min_zoom(mut self, min_zoom: u8) -> Self {
        if min_zoom > self.max_zoom {
            log::warn!(
                "minimum zoom {} is above the maximum {}, using {}",
                min_zoom,
                self.max_zoom,
                self.max_zoom
            );
        }
        self.min_zoom = min_zoom.min(self.max_zoom);
        self.zoom = self.zoom.clamp(self.min_zoom, self.max_zoom);
        self.recenter();
        self
    }

    pub fn with_lazy_threshold(mut self, threshold: f64) -> Self {
        self.lazy_threshold = threshold;
        self
    }

    pub fn with_vertical_policy(mut self, policy: VerticalPolicy) -> Self {
        self.vertical_policy = policy;
        self
    }

    /// Switches to a tile source with different geometry.
    ///
    /// The source's maximum zoom (at most [`ABSOLUTE_MAX_ZOOM`]) becomes the
    /// view's maximum. A minimum above it is lowered to it, and a zoom beyond
    /// it is pulled down. A drag in progress is folded into the center first;
    /// the geographic center is kept.
    pub fn set_tile_source(&mut self, tile_size: u32, max_zoom: u8) {
        self.fold_drag_offset();
        self.tile_size = tile_size.max(1);
        self.max_zoom = max_zoom.min(ABSOLUTE_MAX_ZOOM);
        if self.min_zoom > self.max_zoom {
            log::warn!(
                "tile source only reaches zoom {}, lowering minimum zoom from {}",
                self.max_zoom,
                self.min_zoom
            );
            self.min_zoom = self.max_zoom;
        }
        self.zoom = self.zoom.clamp(self.min_zoom, self.max_zoom);
        self.recenter();
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn size(&self) -> Point {
        self.size
    }

    pub fn width(&self) -> f64 {
        self.size.x
    }

    pub fn height(&self) -> f64 {
        self.size.y
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    pub fn lazy_threshold(&self) -> f64 {
        self.lazy_threshold
    }

    pub fn vertical_policy(&self) -> VerticalPolicy {
        self.vertical_policy
    }

    /// Center position in fractional tile space
    pub fn map_center(&self) -> TilePoint {
        self.map_center
    }

    pub fn draw_offset(&self) -> Point {
        self.draw_offset
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Width of the whole world in pixels at the current zoom
    pub fn total_map_width(&self) -> f64 {
        self.tile_size as f64 * tiles_per_axis(self.zoom)
    }

    fn project_center(center: &LatLng, zoom: u8) -> TilePoint {
        let point = to_tile_space(center, zoom);
        TilePoint::new(tiling::wrap_axis(point.x, zoom), point.y, zoom)
    }

    fn recenter(&mut self) {
        self.map_center = Self::project_center(&self.center, self.zoom);
        self.draw_offset = Point::default();
    }

    /// Centers the view on `coord`.
    ///
    /// Ignored while a drag is in progress; returns whether the view changed.
    pub fn set_center(&mut self, coord: LatLng) -> bool {
        if self.dragging {
            return false;
        }
        self.center = coord;
        self.recenter();
        true
    }

    /// Centers the view on `coord` only if it lies further from the current
    /// center than the lazy threshold (a fraction of the viewport) on either
    /// axis. Returns whether the view moved.
    pub fn set_center_lazy(&mut self, coord: LatLng) -> bool {
        if self.dragging {
            return false;
        }
        let shift = self.screen_shift(&self.center, &coord);

        if shift.x.abs() > self.size.x * self.lazy_threshold
            || shift.y.abs() > self.size.y * self.lazy_threshold
        {
            log::debug!("lazy recenter: moving by {:.1}/{:.1}px", shift.x, shift.y);
            self.set_center(coord)
        } else {
            log::debug!("lazy recenter: skipped {:.1}/{:.1}px", shift.x, shift.y);
            false
        }
    }

    /// Pixel displacement between two coordinates, taking the short way round
    /// the antimeridian.
    fn screen_shift(&self, from: &LatLng, to: &LatLng) -> Point {
        let size = self.tile_size as f64;
        let a = to_tile_space(from, self.zoom);
        let b = to_tile_space(to, self.zoom);
        let total = self.total_map_width();

        let dx = ((b.x - a.x) * size + total / 2.0).rem_euclid(total) - total / 2.0;
        let dy = (b.y - a.y) * size;
        Point::new(dx, dy)
    }

    /// Changes the zoom level, keeping the geographic center.
    ///
    /// Levels outside `[min_zoom, max_zoom]` are ignored, and so is any
    /// request while a drag is in progress; returns whether the zoom was
    /// accepted.
    pub fn set_zoom(&mut self, zoom: i32) -> bool {
        if self.dragging {
            return false;
        }
        if zoom < self.min_zoom as i32 || zoom > self.max_zoom as i32 {
            return false;
        }
        log::debug!("new zoom level: {}", zoom);
        self.zoom = zoom as u8;
        self.recenter();
        true
    }

    pub fn relative_zoom(&mut self, delta: i32) -> bool {
        self.set_zoom(self.zoom as i32 + delta)
    }

    /// Moves the center by a pixel offset and derives the new geographic
    /// center from the moved tile position.
    pub fn move_relative(&mut self, dx: f64, dy: f64) {
        let size = self.tile_size as f64;
        let moved = TilePoint::new(
            self.map_center.x + dx / size,
            self.map_center.y + dy / size,
            self.zoom,
        );
        self.map_center = tiling::normalize(moved, self.vertical_policy);
        self.center = unproject(&self.map_center);
    }

    /// Sets the viewport size in pixels
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Enters drag mode. While dragging, recenter and zoom requests are
    /// ignored. Starting again during a drag keeps the offset gathered so far.
    pub fn start_drag(&mut self) {
        if !self.dragging {
            self.dragging = true;
            self.draw_offset = Point::default();
        }
    }

    /// Adds a pointer movement to the pending drag offset
    pub fn drag_by(&mut self, delta: Point) {
        if self.dragging {
            self.draw_offset = self.draw_offset.add(&delta);
        }
    }

    /// Leaves drag mode and folds the accumulated offset into the center.
    ///
    /// Returns whether the center moved. Calling it without an active drag
    /// does nothing, so the offset is applied exactly once.
    pub fn end_drag(&mut self) -> bool {
        if !self.dragging {
            return false;
        }
        self.dragging = false;
        self.fold_drag_offset()
    }

    /// Moves the center by the pending drag offset and clears it
    fn fold_drag_offset(&mut self) -> bool {
        let offset = std::mem::take(&mut self.draw_offset);
        if offset.is_zero() {
            return false;
        }
        // Dragging the map to the right shows what lies west of the center
        self.move_relative(-offset.x, -offset.y);
        true
    }

    /// Screen position of a coordinate.
    ///
    /// The horizontal position is taken modulo the world width so a point
    /// is found on whichever copy of the world the view shows. The vertical
    /// position is not wrapped.
    pub fn coord_to_screen_point(&self, coord: &LatLng) -> Point {
        let size = self.tile_size as f64;
        let point = to_tile_space(coord, self.zoom);

        let x = (point.x - self.map_center.x) * size + self.size.x / 2.0 + self.draw_offset.x;
        let y = (point.y - self.map_center.y) * size + self.size.y / 2.0 + self.draw_offset.y;

        Point::new(x.rem_euclid(self.total_map_width()), y)
    }

    /// Geographic coordinate under a screen position, including any active
    /// drag offset.
    pub fn screen_point_to_coord(&self, point: &Point) -> LatLng {
        let size = self.tile_size as f64;
        let x = (point.x - self.draw_offset.x - self.size.x / 2.0) / size + self.map_center.x;
        let y = (point.y - self.draw_offset.y - self.size.y / 2.0) / size + self.map_center.y;
        from_tile_space(x, y, self.zoom)
    }

    pub fn is_point_visible(&self, point: &Point) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x < self.size.x && point.y < self.size.y
    }

    /// Top-left and bottom-right corners of the view
    pub fn visible_area(&self) -> (LatLng, LatLng) {
        (
            self.screen_point_to_coord(&Point::new(0.0, 0.0)),
            self.screen_point_to_coord(&self.size),
        )
    }

    /// The visible area as geographic bounds
    pub fn bounds(&self) -> LatLngBounds {
        let (top_left, bottom_right) = self.visible_area();
        LatLngBounds::from_corners(top_left, bottom_right)
    }

    /// Ground resolution at latitude `lat`
    pub fn meters_per_pixel(&self, lat: f64) -> f64 {
        lat.to_radians().cos() * 2.0 * std::f64::consts::PI * RADIUS_EARTH
            / self.total_map_width()
    }

    /// All tiles intersecting the view, row by row from the top-left.
    ///
    /// Columns wrap around the antimeridian. Rows outside the world are
    /// skipped under [`VerticalPolicy::Clamp`] and repeated under
    /// [`VerticalPolicy::Wrap`].
    pub fn visible_tiles(&self) -> Vec<VisibleTile> {
        if self.size.x <= 0.0 || self.size.y <= 0.0 {
            return Vec::new();
        }
        let size = self.tile_size as f64;
        let origin = Point::new(
            self.size.x / 2.0 + self.draw_offset.x - self.map_center.x * size,
            self.size.y / 2.0 + self.draw_offset.y - self.map_center.y * size,
        );

        let first_col = (-origin.x / size).floor() as i64;
        let last_col = ((self.size.x - origin.x) / size).ceil() as i64 - 1;
        let first_row = (-origin.y / size).floor() as i64;
        let last_row = ((self.size.y - origin.y) / size).ceil() as i64 - 1;

        let mut tiles = Vec::new();
        for row in first_row..=last_row {
            for col in first_col..=last_col {
                if let Some(coord) = tiling::address(col, row, self.zoom, self.vertical_policy) {
                    tiles.push(VisibleTile {
                        coord,
                        screen: Point::new(
                            origin.x + col as f64 * size,
                            origin.y + row as f64 * size,
                        ),
                    });
                }
            }
        }
        tiles
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), DEFAULT_MIN_ZOOM, Point::new(800.0, 600.0))
    }
}
