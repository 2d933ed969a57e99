//! Headless viewer: renders one map view to a PNG file.
//!
//! ```text
//! cachemap-app [--config map.json] [--size WxH] [--out map.png] [LAT LON ZOOM]
//! ```

use anyhow::{bail, Context};
use cachemap::{
    AppNotification, Geocache, GeocacheLayer, GpsFix, ImageSurface, LatLng, MapBuilder, MapConfig,
    MapEvent, PositionLayer,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// How long to wait for tiles before saving whatever arrived
const TILE_TIMEOUT: Duration = Duration::from_secs(20);

struct Args {
    config: Option<PathBuf>,
    out: PathBuf,
    width: u32,
    height: u32,
    center: LatLng,
    zoom: u8,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        config: None,
        out: PathBuf::from("map.png"),
        width: 800,
        height: 600,
        center: LatLng::new(50.7374, 7.0982),
        zoom: 13,
    };
    let mut positional = Vec::new();

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().context("--config needs a path")?.into()),
            "--out" => args.out = iter.next().context("--out needs a path")?.into(),
            "--size" => {
                let size = iter.next().context("--size needs WxH")?;
                let (w, h) = size.split_once('x').context("size must look like 800x600")?;
                args.width = w.parse().context("invalid width")?;
                args.height = h.parse().context("invalid height")?;
            }
            _ => positional.push(arg),
        }
    }

    match positional.as_slice() {
        [] => {}
        [lat, lon, zoom] => {
            args.center = LatLng::new(lat.parse()?, lon.parse()?);
            args.zoom = zoom.parse()?;
        }
        _ => bail!("expected LAT LON ZOOM"),
    }
    if !args.center.is_valid() {
        bail!("coordinate out of range: {}", args.center);
    }
    Ok(args)
}

/// A few made-up geocaches around the requested center
fn demo_geocaches(center: LatLng) -> Vec<Geocache> {
    (0..8)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::PI / 4.0;
            let position = LatLng::new(
                center.lat + angle.sin() * 0.01,
                center.lng + angle.cos() * 0.015,
            );
            let mut geocache = Geocache::new(format!("GCDEMO{}", i), format!("Demo cache {}", i), position);
            geocache.found = i % 3 == 0;
            geocache
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cachemap::init_logging();
    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => MapConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => MapConfig::default(),
    };

    let geocaches = demo_geocaches(args.center);
    let geocache_layer = GeocacheLayer::new()
        .with_provider(move |bounds, max| {
            geocaches
                .iter()
                .filter(|geocache| bounds.contains(&geocache.position))
                .take(max)
                .cloned()
                .collect()
        })
        .on_select(|selection| {
            for geocache in selection {
                log::info!("selected {} ({})", geocache.name, geocache.title);
            }
        });

    let mut map = MapBuilder::from_config(config)
        .with_center_and_zoom(args.center, args.zoom)
        .with_size(args.width as f64, args.height as f64)
        .with_layer(Box::new(geocache_layer))
        .with_layer(Box::new(PositionLayer::new()))
        .build()?;

    map.on("zoomchanged", |event| {
        if let MapEvent::ZoomChanged { zoom } = event {
            log::info!("zoom is now {}", zoom);
        }
    });

    map.notify(AppNotification::GoodFix(GpsFix::new(args.center, 5.0)));
    map.notify(AppNotification::TargetChanged {
        target: LatLng::new(args.center.lat + 0.004, args.center.lng + 0.006),
    });

    let started = Instant::now();
    let stats = loop {
        map.update();
        let stats = map.render(&mut ImageSurface::new(args.width, args.height))?;
        map.process_events();

        if stats.pending == 0 {
            if stats.failed > 0 {
                log::warn!("{} tiles could not be loaded", stats.failed);
            }
            break stats;
        }
        if started.elapsed() > TILE_TIMEOUT {
            log::warn!("giving up on {} pending tiles", stats.pending);
            break stats;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    };

    let total = stats.ready + stats.pending + stats.failed;
    map.set_osd_message(&format!("{} / {} tiles", stats.ready, total));
    let mut surface = ImageSurface::new(args.width, args.height);
    map.render(&mut surface)?;
    map.process_events();

    surface
        .save(&args.out)
        .with_context(|| format!("writing {}", args.out.display()))?;

    let (top_left, bottom_right) = map.visible_area();
    println!("wrote {}", args.out.display());
    println!("center   {}", map.center());
    println!("zoom     {}", map.zoom());
    println!("area     {}  ..  {}", top_left, bottom_right);
    println!(
        "scale    {:.2} m/px",
        map.viewport().meters_per_pixel(map.center().lat)
    );
    for (_, label) in surface.labels() {
        println!("label    {}", label);
    }
    Ok(())
}
