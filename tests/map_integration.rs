use cachemap::prelude::*;
use cachemap::rendering::DrawCommand;
use image::{Rgba, RgbaImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Loader whose tiles can be filled in after the map took ownership of it,
/// the way background downloads finish.
#[derive(Clone, Default)]
struct SharedLoader(Arc<Mutex<MemoryTileLoader>>);

impl SharedLoader {
    fn set_tile(&self, coord: TileCoord, image: TileImage) {
        self.0.lock().unwrap().set_tile(coord, image);
    }

    fn set_failed(&self, coord: TileCoord) {
        self.0.lock().unwrap().set_failed(coord);
    }
}

impl TileLoader for SharedLoader {
    fn tile_size(&self) -> u32 {
        self.0.lock().unwrap().tile_size()
    }

    fn max_zoom(&self) -> u8 {
        self.0.lock().unwrap().max_zoom()
    }

    fn fetch(&mut self, coord: TileCoord) -> TileFetch {
        self.0.lock().unwrap().fetch(coord)
    }

    fn take_completed(&mut self) -> Vec<TileCoord> {
        self.0.lock().unwrap().take_completed()
    }
}

fn solid_tile(color: [u8; 4]) -> TileImage {
    Arc::new(RgbaImage::from_pixel(256, 256, Rgba(color)))
}

/// 512x512 view of the world at zoom 2: tiles 1..=2 on both axes
fn world_map(loader: SharedLoader) -> Map {
    MapBuilder::new()
        .with_tile_loader("memory", Box::new(loader))
        .with_center_and_zoom(LatLng::new(0.0, 0.0), 2)
        .with_size(512.0, 512.0)
        .build()
        .unwrap()
}

fn kinds(events: &[MapEvent]) -> Vec<&'static str> {
    events.iter().map(|event| event.kind()).collect()
}

#[test]
fn test_render_mixes_ready_pending_and_failed_tiles() {
    let loader = SharedLoader::default();
    let ready = solid_tile([0, 0, 255, 255]);
    loader.set_tile(TileCoord::new(1, 1, 2), ready.clone());
    loader.set_failed(TileCoord::new(2, 2, 2));

    let mut map = world_map(loader);
    let mut context = RenderContext::new(512, 512);
    let stats = map.render(&mut context).unwrap();

    assert_eq!(
        stats,
        RenderStats {
            ready: 1,
            pending: 2,
            failed: 1
        }
    );
    assert!(!stats.is_complete());

    let queue = context.get_drawing_queue();
    assert_eq!(queue.len(), 4);
    assert!(queue[0].is_tile(&ready));
    assert!(queue[1].is_tile(&map.placeholders().loading));
    assert!(queue[2].is_tile(&map.placeholders().loading));
    assert!(queue[3].is_tile(&map.placeholders().cant_load));

    let positions: Vec<Point> = context.tiles().map(|(_, at)| at).collect();
    assert_eq!(
        positions,
        vec![
            Point::new(0.0, 0.0),
            Point::new(256.0, 0.0),
            Point::new(0.0, 256.0),
            Point::new(256.0, 256.0),
        ]
    );
}

#[test]
fn test_arriving_tiles_trigger_one_redraw() {
    let loader = SharedLoader::default();
    let mut map = world_map(loader.clone());
    let events = map.subscribe();

    let mut context = RenderContext::new(512, 512);
    map.render(&mut context).unwrap();
    assert!(!map.needs_redraw());
    assert!(!map.update());

    loader.set_tile(TileCoord::new(1, 1, 2), solid_tile([10, 20, 30, 255]));
    loader.set_tile(TileCoord::new(2, 1, 2), solid_tile([10, 20, 30, 255]));
    assert!(map.update());
    assert!(map.update());
    map.process_events();

    let received: Vec<MapEvent> = events.try_iter().collect();
    assert_eq!(received, vec![MapEvent::RedrawRequested]);

    context.begin_frame();
    let stats = map.render(&mut context).unwrap();
    assert_eq!(stats.ready, 2);
    assert_eq!(stats.pending, 2);
}

#[tokio::test]
async fn test_background_download_reaches_the_map() {
    let loader = SharedLoader::default();
    let mut map = world_map(loader.clone());
    let mut context = RenderContext::new(512, 512);
    map.render(&mut context).unwrap();

    let worker = loader.clone();
    let download = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        for x in 1..=2 {
            for y in 1..=2 {
                worker.set_tile(TileCoord::new(x, y, 2), solid_tile([0, 128, 0, 255]));
            }
        }
    });

    let mut stats = RenderStats::default();
    for _ in 0..100 {
        if map.update() {
            context.begin_frame();
            stats = map.render(&mut context).unwrap();
            if stats.is_complete() {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    download.await.unwrap();

    assert!(stats.is_complete());
    assert_eq!(stats.ready, 4);
}

#[test]
fn test_image_surface_shows_tiles_and_markers() {
    let loader = MemoryTileLoader::new(256, 18).with_fallback(solid_tile([0, 0, 255, 255]));
    let mut pins = MarkerLayer::new("pins");
    pins.add_marker(Marker::new(LatLng::new(0.0, 0.0)).with_label("null island"));

    let mut map = MapBuilder::new()
        .with_tile_loader("memory", Box::new(loader))
        .with_center_and_zoom(LatLng::new(0.0, 0.0), 2)
        .with_size(512.0, 512.0)
        .with_layer(Box::new(pins))
        .build()
        .unwrap();

    let mut surface = ImageSurface::new(512, 512);
    let stats = map.render(&mut surface).unwrap();

    assert!(stats.is_complete());
    assert_eq!(surface.image().get_pixel(10, 10), &Rgba([0, 0, 255, 255]));
    assert_eq!(surface.image().get_pixel(256, 256), &Rgba(Color::RED.to_array()));
    assert_eq!(surface.labels().len(), 1);
    assert_eq!(surface.labels()[0].1, "null island");
}

#[test]
fn test_view_changes_are_reported() {
    let mut map = world_map(SharedLoader::default());
    let zooms = Arc::new(AtomicUsize::new(0));
    let counter = zooms.clone();
    map.on("zoomchanged", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let mut context = RenderContext::new(512, 512);
    map.render(&mut context).unwrap();

    assert!(map.zoom_in());
    assert!(map.set_center(LatLng::new(48.0, 11.0), true));
    assert!(!map.set_zoom(0));
    assert!(!map.set_zoom(19));

    let events = map.process_events();
    assert_eq!(kinds(&events), vec!["zoomchanged", "redraw", "centerchanged"]);
    assert_eq!(zooms.load(Ordering::SeqCst), 1);
    assert_eq!(map.zoom(), 3);
}

#[test]
fn test_drag_gesture_moves_center_once() {
    let mut map = world_map(SharedLoader::default());
    let start = map.center();
    let expected = map
        .viewport()
        .screen_point_to_coord(&Point::new(256.0 - 64.0, 256.0));

    assert!(map
        .handle_input(InputEvent::DragStart {
            position: Point::new(100.0, 100.0)
        })
        .is_handled());
    map.handle_input(InputEvent::Drag {
        delta: Point::new(64.0, 0.0),
    });
    assert!(!map.set_center(LatLng::new(10.0, 10.0), true));
    assert_eq!(map.center(), start);

    // The map is drawn shifted while the pointer is down
    let mut context = RenderContext::new(512, 512);
    map.render(&mut context).unwrap();
    assert!(context.tiles().any(|(_, at)| at == Point::new(64.0, 0.0)));

    map.process_events();
    assert!(map.handle_input(InputEvent::DragEnd).is_handled());
    assert!(!map.handle_input(InputEvent::DragEnd).is_handled());

    assert!((map.center().lng - expected.lng).abs() < 1e-9);
    assert!((map.center().lat - expected.lat).abs() < 1e-9);
    assert_eq!(kinds(&map.process_events()), vec!["centerchanged", "redraw"]);
}

#[test]
fn test_unhandled_click_becomes_map_event() {
    let mut map = world_map(SharedLoader::default());
    let handled = map.handle_input(InputEvent::Click {
        position: Point::new(256.0, 256.0),
    });
    assert!(!handled.is_handled());

    let events = map.process_events();
    match events.last() {
        Some(MapEvent::Click { lat_lng, pixel }) => {
            assert_eq!(*pixel, Point::new(256.0, 256.0));
            assert!(lat_lng.lat.abs() < 1e-9 && lat_lng.lng.abs() < 1e-9);
        }
        other => panic!("expected a click event, got {:?}", other),
    }
}

#[test]
fn test_geocache_clicks_and_region_selection() {
    let caches = vec![
        Geocache::new("GC1", "Center", LatLng::new(0.0, 0.0)),
        Geocache::new("GC2", "East", LatLng::new(0.0, 20.0)),
        Geocache::new("GC3", "Far", LatLng::new(60.0, 120.0)),
    ];
    let selected = Arc::new(Mutex::new(Vec::new()));
    let sink = selected.clone();

    let layer = GeocacheLayer::new()
        .with_provider(move |bounds, max| {
            caches
                .iter()
                .filter(|geocache| bounds.contains(&geocache.position))
                .take(max)
                .cloned()
                .collect()
        })
        .on_select(move |selection| {
            let mut sink = sink.lock().unwrap();
            sink.clear();
            sink.extend(selection.iter().map(|geocache| geocache.name.clone()));
        });

    let mut map = MapBuilder::new()
        .with_tile_loader("memory", Box::new(MemoryTileLoader::default()))
        .with_center_and_zoom(LatLng::new(0.0, 0.0), 3)
        .with_size(512.0, 512.0)
        .with_layer(Box::new(layer))
        .build()
        .unwrap();

    let shown = map
        .layers()
        .layer_as::<GeocacheLayer>("geocaches")
        .unwrap()
        .geocaches()
        .len();
    assert_eq!(shown, 2);

    let handled = map.handle_input(InputEvent::Click {
        position: Point::new(258.0, 255.0),
    });
    assert!(handled.is_handled());
    assert_eq!(*selected.lock().unwrap(), vec!["GC1".to_string()]);
    assert!(map.process_events().iter().all(|e| e.kind() != "click"));

    let handled = map.handle_input(InputEvent::LongPress {
        position: Point::new(256.0, 256.0),
        radius: 200.0,
    });
    assert!(handled.is_handled());
    assert_eq!(
        *selected.lock().unwrap(),
        vec!["GC1".to_string(), "GC2".to_string()]
    );
}

#[test]
fn test_switching_provider_clamps_zoom() {
    let mut map = MapBuilder::new()
        .with_tile_loader("street", Box::new(MemoryTileLoader::new(256, 18)))
        .with_tile_loader("topo", Box::new(MemoryTileLoader::new(512, 10)))
        .with_center_and_zoom(LatLng::new(46.5, 8.0), 15)
        .build()
        .unwrap();
    assert_eq!(map.zoom(), 15);
    assert_eq!(map.providers().active_name(), "street");

    let mut context = RenderContext::new(800, 600);
    map.render(&mut context).unwrap();

    map.set_tile_loader("topo").unwrap();
    assert_eq!(map.zoom(), 10);
    assert_eq!(map.max_zoom(), 10);
    assert_eq!(map.tile_size(), 512);
    assert!((map.center().lat - 46.5).abs() < 1e-9);
    assert_eq!(
        kinds(&map.process_events()),
        vec!["tileloaderchanged", "zoomchanged", "redraw"]
    );

    assert!(matches!(
        map.set_tile_loader("satellite"),
        Err(MapError::UnknownProvider(_))
    ));
    assert_eq!(map.providers().active_name(), "topo");
}

#[test]
fn test_notifications_update_position_layer() {
    let mut map = world_map(SharedLoader::default());
    map.add_layer(Box::new(PositionLayer::new()));

    map.notify(AppNotification::SettingsChanged(serde_json::json!({
        "last_target_lat": 10.5,
        "last_target_lon": -20.25,
    })));
    map.notify(AppNotification::GoodFix(GpsFix::new(LatLng::new(10.0, -20.0), 4.0)));

    let position = map.layers().layer_as::<PositionLayer>("position").unwrap();
    assert_eq!(position.target(), Some(LatLng::new(10.5, -20.25)));
    assert!(position.has_fix());
    assert!(position.distance_to_target().unwrap() > 50_000.0);

    let mut context = RenderContext::new(512, 512);
    map.render(&mut context).unwrap();
    let lines = context
        .get_drawing_queue()
        .iter()
        .filter(|command| matches!(command, DrawCommand::Line { .. }))
        .count();
    assert_eq!(lines, 1);

    map.remove_all_markers();
    let position = map.layers().layer_as::<PositionLayer>("position").unwrap();
    assert_eq!(position.target(), None);
}

#[test]
fn test_osd_message_is_drawn_last() {
    let mut map = world_map(SharedLoader::default());
    map.set_osd_message("Loading geocaches");

    let mut context = RenderContext::new(512, 512);
    map.render(&mut context).unwrap();
    assert_eq!(context.texts().collect::<Vec<_>>(), vec!["Loading geocaches"]);

    map.set_osd_message("");
    context.begin_frame();
    map.render(&mut context).unwrap();
    assert_eq!(context.texts().count(), 0);
    assert_eq!(map.layers().len(), 1);
}

#[test]
fn test_config_round_trip_into_builder() {
    let json = r#"{
        "providers": [
            { "name": "osm", "url_template": "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png" }
        ],
        "min_zoom": 3,
        "lazy_threshold": 0.25,
        "vertical_policy": "wrap"
    }"#;
    let config = MapConfig::from_json_str(json).unwrap();
    assert_eq!(config.vertical_policy, VerticalPolicy::Wrap);

    let map = MapBuilder::from_config(config)
        .with_tile_loader("memory", Box::new(MemoryTileLoader::default()))
        .with_center_and_zoom(LatLng::new(0.0, 0.0), 1)
        .build()
        .unwrap();

    assert_eq!(map.zoom(), 3);
    assert_eq!(map.min_zoom(), 3);
    assert_eq!(map.viewport().lazy_threshold(), 0.25);
    assert_eq!(map.viewport().vertical_policy(), VerticalPolicy::Wrap);
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = MapConfig::from_json_str(r#"{ "providers": [] }"#).unwrap_err();
    assert!(matches!(err, MapError::Config(_)));

    let err = MapConfig::from_json_str("not json").unwrap_err();
    assert!(matches!(err, MapError::Serialization(_)));
}
