use crate::core::constants::TILE_SIZE;
use crate::core::geo::TileCoord;
use crate::prelude::HashMap;
use crate::tiles::TileImage;
use std::collections::VecDeque;

/// How many recent `fetch` calls a [`MemoryTileLoader`] remembers
const RECORDED_REQUESTS: usize = 1024;

/// Outcome of asking a loader for a tile
#[derive(Debug, Clone)]
pub enum TileFetch {
    /// The tile is decoded and can be drawn now
    Ready(TileImage),
    /// The tile is on its way; draw the loading placeholder
    Pending,
    /// The tile cannot be obtained; draw the can't-load placeholder
    Failed,
}

impl TileFetch {
    pub fn is_ready(&self) -> bool {
        matches!(self, TileFetch::Ready(_))
    }
}

/// A source of raster tiles.
///
/// `fetch` must never block: a tile that is not at hand is requested in the
/// background and reported as [`TileFetch::Pending`]. Once it arrives its
/// coordinate shows up in [`take_completed`](TileLoader::take_completed), which
/// tells the map to redraw.
pub trait TileLoader: Send {
    /// Edge length of a tile in pixels
    fn tile_size(&self) -> u32;

    /// Highest zoom level the loader serves
    fn max_zoom(&self) -> u8;

    fn fetch(&mut self, coord: TileCoord) -> TileFetch;

    /// Drains the coordinates whose download finished since the last call
    fn take_completed(&mut self) -> Vec<TileCoord>;
}

#[derive(Debug, Clone)]
enum MemoryTile {
    Ready(TileImage),
    Failed,
}

/// Loader serving tiles put into it explicitly.
///
/// Unknown tiles are reported as pending until [`set_tile`](Self::set_tile)
/// or [`set_failed`](Self::set_failed) is called for them, which is how a
/// download finishing later looks to the map. A fallback image, when set,
/// answers every unknown tile immediately.
#[derive(Debug, Clone)]
pub struct MemoryTileLoader {
    tile_size: u32,
    max_zoom: u8,
    tiles: HashMap<TileCoord, MemoryTile>,
    fallback: Option<TileImage>,
    completed: Vec<TileCoord>,
    requests: VecDeque<TileCoord>,
}

impl MemoryTileLoader {
    pub fn new(tile_size: u32, max_zoom: u8) -> Self {
        Self {
            tile_size,
            max_zoom,
            tiles: HashMap::default(),
            fallback: None,
            completed: Vec::new(),
            requests: VecDeque::new(),
        }
    }

    /// Serve `image` for every tile without an explicit entry
    pub fn with_fallback(mut self, image: TileImage) -> Self {
        self.fallback = Some(image);
        self
    }

    pub fn set_tile(&mut self, coord: TileCoord, image: TileImage) {
        self.tiles.insert(coord, MemoryTile::Ready(image));
        self.completed.push(coord);
    }

    pub fn set_failed(&mut self, coord: TileCoord) {
        self.tiles.insert(coord, MemoryTile::Failed);
        self.completed.push(coord);
    }

    /// The most recent coordinates passed to `fetch`, oldest first
    pub fn requests(&self) -> &VecDeque<TileCoord> {
        &self.requests
    }

    pub fn clear_requests(&mut self) {
        self.requests.clear();
    }
}

impl Default for MemoryTileLoader {
    fn default() -> Self {
        Self::new(TILE_SIZE, 18)
    }
}

impl TileLoader for MemoryTileLoader {
    fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    fn fetch(&mut self, coord: TileCoord) -> TileFetch {
        if self.requests.len() == RECORDED_REQUESTS {
            self.requests.pop_front();
        }
        self.requests.push_back(coord);
        match self.tiles.get(&coord) {
            Some(MemoryTile::Ready(image)) => TileFetch::Ready(image.clone()),
            Some(MemoryTile::Failed) => TileFetch::Failed,
            None => match &self.fallback {
                Some(image) => TileFetch::Ready(image.clone()),
                None => TileFetch::Pending,
            },
        }
    }

    fn take_completed(&mut self) -> Vec<TileCoord> {
        std::mem::take(&mut self.completed)
    }
}
