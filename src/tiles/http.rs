//! Network tile loading with an on-disk cache.
//!
//! Tiles are looked up in memory, then on disk below
//! `<map_path>/<provider>/<z>/<x>/<y>.png`, then downloaded. Disk reads and
//! downloads run as tasks on a tokio runtime (the caller's if there is one,
//! otherwise a shared background runtime) and report back over a channel,
//! so [`TileLoader::fetch`] never waits.

use crate::core::config::ProviderConfig;
use crate::core::geo::TileCoord;
use crate::prelude::HashSet;
use crate::tiles::cache::TileCache;
use crate::tiles::loader::{TileFetch, TileLoader};
use crate::tiles::source::{TileSource, UrlTemplate};
use crate::{MapError, Result};
use async_trait::async_trait;
use crossbeam_channel::{unbounded, Receiver, Sender};
use image::RgbaImage;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, Runtime};

/// Downloads raw tile bytes
#[async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Shared HTTP client with a User-Agent so public tile servers accept the requests.
static HTTP_CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

static RUNTIME: OnceCell<Runtime> = OnceCell::new();

fn runtime_handle() -> Result<Handle> {
    if let Ok(handle) = Handle::try_current() {
        return Ok(handle);
    }
    let runtime = RUNTIME.get_or_try_init(|| {
        log::debug!("starting shared tile runtime");
        Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("cachemap-tiles")
            .enable_all()
            .build()
    })?;
    Ok(runtime.handle().clone())
}

/// [`TileFetcher`] backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = HTTP_CLIENT.get_or_try_init(|| {
            reqwest::Client::builder()
                .user_agent(concat!("cachemap/", env!("CARGO_PKG_VERSION")))
                .build()
        })?;
        Ok(Self {
            client: client.clone(),
        })
    }
}

#[async_trait]
impl TileFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Tile loader for one named provider.
///
/// Every tile is attempted once. A tile that cannot be read or downloaded
/// stays failed for the lifetime of the loader, or until
/// [`retry_failed`](Self::retry_failed). The failed set holds at most one
/// entry per tile of the provider's pyramid that was actually requested.
pub struct HttpTileLoader {
    name: String,
    source: UrlTemplate,
    tile_size: u32,
    max_zoom: u8,
    cache_dir: PathBuf,
    memory: TileCache,
    fetcher: Arc<dyn TileFetcher>,
    handle: Handle,
    tx: Sender<(TileCoord, Option<RgbaImage>)>,
    rx: Receiver<(TileCoord, Option<RgbaImage>)>,
    in_flight: HashSet<TileCoord>,
    failed: HashSet<TileCoord>,
    completed: Vec<TileCoord>,
}

impl HttpTileLoader {
    /// Loader downloading with the shared reqwest client
    pub fn new(provider: &ProviderConfig, map_path: &Path, memory_tiles: usize) -> Result<Self> {
        Self::with_fetcher(
            provider,
            map_path,
            memory_tiles,
            Arc::new(HttpFetcher::new()?),
        )
    }

    pub fn with_fetcher(
        provider: &ProviderConfig,
        map_path: &Path,
        memory_tiles: usize,
        fetcher: Arc<dyn TileFetcher>,
    ) -> Result<Self> {
        let (tx, rx) = unbounded();
        Ok(Self {
            name: provider.name.clone(),
            source: UrlTemplate::from_provider(provider),
            tile_size: provider.tile_size,
            max_zoom: provider.max_zoom,
            cache_dir: map_path.join(&provider.name),
            memory: TileCache::new(memory_tiles),
            fetcher,
            handle: runtime_handle()?,
            tx,
            rx,
            in_flight: HashSet::default(),
            failed: HashSet::default(),
            completed: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the tile is stored on disk
    pub fn tile_path(&self, coord: TileCoord) -> PathBuf {
        self.cache_dir
            .join(coord.z.to_string())
            .join(coord.x.to_string())
            .join(format!("{}.png", coord.y))
    }

    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    pub fn failed(&self) -> usize {
        self.failed.len()
    }

    /// Forgets failed tiles so the next fetch tries them again, e.g. after
    /// the network came back.
    pub fn retry_failed(&mut self) {
        self.drain();
        if !self.failed.is_empty() {
            log::debug!("{}: retrying {} failed tiles", self.name, self.failed.len());
            self.failed.clear();
        }
    }

    fn drain(&mut self) {
        while let Ok((coord, image)) = self.rx.try_recv() {
            self.in_flight.remove(&coord);
            match image {
                Some(image) => self.memory.insert(coord, Arc::new(image)),
                None => {
                    self.failed.insert(coord);
                }
            }
            self.completed.push(coord);
        }
    }

    fn spawn_load(&self, coord: TileCoord) {
        let url = self.source.url(coord);
        let path = self.tile_path(coord);
        let fetcher = self.fetcher.clone();
        let tx = self.tx.clone();
        let name = self.name.clone();

        self.handle.spawn(async move {
            let image = match load_tile(fetcher.as_ref(), &url, &path).await {
                Ok(image) => Some(image),
                Err(e) => {
                    log::warn!("{}: tile {} failed: {}", name, coord, e);
                    None
                }
            };
            // The loader may be gone already
            let _ = tx.send((coord, image));
        });
    }
}

async fn load_tile(fetcher: &dyn TileFetcher, url: &str, path: &Path) -> Result<RgbaImage> {
    match tokio::fs::read(path).await {
        Ok(bytes) => match decode(bytes).await {
            Ok(image) => {
                log::trace!("tile from disk {}", path.display());
                return Ok(image);
            }
            Err(e) => log::warn!("ignoring unreadable cached tile {}: {}", path.display(), e),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("could not read cached tile {}: {}", path.display(), e),
    }

    log::info!("downloading {}", url);
    let bytes = fetcher.fetch(url).await?;
    let image = decode(bytes.clone()).await?;

    if let Err(e) = store(path, &bytes).await {
        log::warn!("could not cache tile at {}: {}", path.display(), e);
    }
    Ok(image)
}

async fn store(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Decodes on the blocking pool
async fn decode(bytes: Vec<u8>) -> Result<RgbaImage> {
    tokio::task::spawn_blocking(move || -> Result<RgbaImage> {
        Ok(image::load_from_memory(&bytes)?.to_rgba8())
    })
    .await
    .map_err(|e| MapError::Task(format!("tile decoding failed: {}", e)))?
}

impl TileLoader for HttpTileLoader {
    fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    fn fetch(&mut self, coord: TileCoord) -> TileFetch {
        self.drain();

        if !coord.is_valid() || coord.z > self.max_zoom {
            return TileFetch::Failed;
        }
        if let Some(image) = self.memory.get(&coord) {
            return TileFetch::Ready(image);
        }
        if self.failed.contains(&coord) {
            return TileFetch::Failed;
        }
        if self.in_flight.insert(coord) {
            self.spawn_load(coord);
        }
        TileFetch::Pending
    }

    fn take_completed(&mut self) -> Vec<TileCoord> {
        self.drain();
        std::mem::take(&mut self.completed)
    }
}
