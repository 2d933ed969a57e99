use crate::{
    core::{
        geo::{LatLng, Point},
        viewport::Viewport,
    },
    input::{AppNotification, EventHandled, EventManager, InputEvent, MapEvent},
    layers::{
        base::Layer,
        manager::LayerStack,
        osd::{OsdLayer, OSD_LAYER_ID},
    },
    rendering::{placeholder::Placeholders, surface::Surface},
    tiles::{
        loader::{TileFetch, TileLoader},
        provider::ProviderRegistry,
    },
    MapError, Result,
};
use crossbeam_channel::Receiver;

/// What one render pass drew for the tile raster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub ready: usize,
    pub pending: usize,
    pub failed: usize,
}

impl RenderStats {
    /// Whether every visible tile was drawn from real imagery
    pub fn is_complete(&self) -> bool {
        self.pending == 0 && self.failed == 0
    }
}

/// A slippy map: view state, tile providers, overlays and change events.
///
/// All mutation happens on the thread that owns the map. Tile downloads may
/// finish in the background; [`update`](Self::update) picks them up and
/// requests a redraw. Observers learn about changes through
/// [`on`](Self::on) callbacks or [`subscribe`](Self::subscribe) channels once
/// [`process_events`](Self::process_events) runs.
pub struct Map {
    viewport: Viewport,
    layers: LayerStack,
    providers: ProviderRegistry,
    placeholders: Placeholders,
    event_manager: EventManager,
    needs_redraw: bool,
}

impl Map {
    /// Creates a map; the viewport takes tile size and zoom limit from the
    /// active loader.
    pub fn new(mut viewport: Viewport, providers: ProviderRegistry, placeholders: Placeholders) -> Self {
        let loader = providers.active();
        viewport.set_tile_source(loader.tile_size(), loader.max_zoom());
        Self {
            viewport,
            layers: LayerStack::new(),
            providers,
            placeholders,
            event_manager: EventManager::new(),
            needs_redraw: true,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn center(&self) -> LatLng {
        self.viewport.center()
    }

    pub fn zoom(&self) -> u8 {
        self.viewport.zoom()
    }

    pub fn min_zoom(&self) -> u8 {
        self.viewport.min_zoom()
    }

    pub fn max_zoom(&self) -> u8 {
        self.viewport.max_zoom()
    }

    pub fn tile_size(&self) -> u32 {
        self.viewport.tile_size()
    }

    /// Top-left and bottom-right corners of the view
    pub fn visible_area(&self) -> (LatLng, LatLng) {
        self.viewport.visible_area()
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerStack {
        &mut self.layers
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn placeholders(&self) -> &Placeholders {
        &self.placeholders
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Asks the host to render again
    pub fn request_redraw(&mut self) {
        if !self.needs_redraw {
            self.needs_redraw = true;
            self.event_manager.emit(MapEvent::RedrawRequested);
        }
    }

    fn center_changed(&mut self) {
        self.event_manager.emit(MapEvent::CenterChanged {
            center: self.viewport.center(),
        });
    }

    fn zoom_changed(&mut self) {
        self.event_manager.emit(MapEvent::ZoomChanged {
            zoom: self.viewport.zoom(),
        });
    }

    /// Centers the map on `coord`. Ignored while dragging.
    pub fn set_center(&mut self, coord: LatLng, redraw: bool) -> bool {
        if !self.viewport.set_center(coord) {
            return false;
        }
        self.center_changed();
        if redraw {
            self.request_redraw();
        }
        true
    }

    /// Centers the map on `coord` only if it is far enough from the current center
    pub fn set_center_lazy(&mut self, coord: LatLng) -> bool {
        if !self.viewport.set_center_lazy(coord) {
            return false;
        }
        self.center_changed();
        self.request_redraw();
        true
    }

    /// Changes the zoom; levels outside the allowed range are ignored
    pub fn set_zoom(&mut self, zoom: i32) -> bool {
        if !self.viewport.set_zoom(zoom) {
            return false;
        }
        self.zoom_changed();
        self.request_redraw();
        true
    }

    pub fn relative_zoom(&mut self, delta: i32) -> bool {
        self.set_zoom(self.viewport.zoom() as i32 + delta)
    }

    pub fn zoom_in(&mut self) -> bool {
        self.relative_zoom(1)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.relative_zoom(-1)
    }

    /// Pans by a pixel offset
    pub fn move_relative(&mut self, dx: f64, dy: f64) {
        self.viewport.move_relative(dx, dy);
        self.center_changed();
        self.request_redraw();
    }

    /// Adds a layer on top of the existing ones
    pub fn add_layer(&mut self, layer: Box<dyn Layer>) {
        self.layers.add_layer(layer, &self.viewport);
        self.request_redraw();
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn Layer>> {
        let removed = self.layers.remove_layer(layer_id);
        if removed.is_some() {
            self.request_redraw();
        }
        removed
    }

    /// Clears the markers of every marker-holding layer
    pub fn remove_all_markers(&mut self) {
        self.layers.remove_all_markers();
        self.request_redraw();
    }

    /// Shows a message on screen; an empty message hides it.
    ///
    /// The on-screen display layer is created on first use.
    pub fn set_osd_message(&mut self, message: &str) {
        match self.layers.layer_as_mut::<OsdLayer>(OSD_LAYER_ID) {
            Some(osd) => osd.set_message(message),
            None => {
                let mut osd = OsdLayer::new();
                osd.set_message(message);
                self.layers.add_layer(Box::new(osd), &self.viewport);
            }
        }
        self.request_redraw();
    }

    /// Registers another tile loader under `name` without activating it
    pub fn register_tile_loader(&mut self, name: &str, loader: Box<dyn TileLoader>) {
        self.providers.register(name, loader);
    }

    /// Switches to the tile loader registered as `name`.
    ///
    /// The zoom is re-validated against the new loader, which may pull it
    /// down to the loader's maximum. A loader whose maximum zoom lies below
    /// the map's minimum zoom is refused.
    pub fn set_tile_loader(&mut self, name: &str) -> Result<()> {
        let loader = self
            .providers
            .get(name)
            .ok_or_else(|| MapError::UnknownProvider(name.to_string()))?;
        if loader.max_zoom() < self.viewport.min_zoom() {
            return Err(MapError::Config(format!(
                "tile loader '{}' stops at zoom {}, below the minimum zoom {}",
                name,
                loader.max_zoom(),
                self.viewport.min_zoom()
            )));
        }
        if !self.providers.set_active(name)? {
            return Ok(());
        }
        log::info!("switching tile loader to {}", name);

        let old_zoom = self.viewport.zoom();
        let old_center = self.viewport.center();
        let loader = self.providers.active();
        self.viewport.set_tile_source(loader.tile_size(), loader.max_zoom());

        self.event_manager.emit(MapEvent::TileLoaderChanged {
            name: name.to_string(),
        });
        if self.viewport.center() != old_center {
            self.center_changed();
        }
        if self.viewport.zoom() != old_zoom {
            self.zoom_changed();
        }
        self.request_redraw();
        Ok(())
    }

    /// Applies pointer and window input
    pub fn handle_input(&mut self, input: InputEvent) -> EventHandled {
        match input {
            InputEvent::Click { position } => {
                if self.viewport.is_dragging() {
                    return EventHandled::NotHandled;
                }
                let handled = self.layers.dispatch_click(position, &self.viewport);
                if handled.is_handled() {
                    self.request_redraw();
                } else {
                    self.event_manager.emit(MapEvent::Click {
                        lat_lng: self.viewport.screen_point_to_coord(&position),
                        pixel: position,
                    });
                }
                handled
            }
            InputEvent::LongPress { position, radius } => {
                let center = self.viewport.screen_point_to_coord(&position);
                let top_left = self
                    .viewport
                    .screen_point_to_coord(&Point::new(position.x - radius, position.y - radius));
                let bottom_right = self
                    .viewport
                    .screen_point_to_coord(&Point::new(position.x + radius, position.y + radius));
                let handled =
                    self.layers
                        .dispatch_click_region(center, top_left, bottom_right, &self.viewport);
                if handled.is_handled() {
                    self.request_redraw();
                }
                handled
            }
            InputEvent::DragStart { .. } => {
                self.viewport.start_drag();
                EventHandled::Handled
            }
            InputEvent::Drag { delta } => {
                if !self.viewport.is_dragging() {
                    return EventHandled::NotHandled;
                }
                self.viewport.drag_by(delta);
                self.request_redraw();
                EventHandled::Handled
            }
            InputEvent::DragEnd => {
                if self.viewport.end_drag() {
                    self.center_changed();
                    self.request_redraw();
                    EventHandled::Handled
                } else {
                    EventHandled::NotHandled
                }
            }
            InputEvent::Scroll { delta } => {
                let zoomed = if delta > 0.0 {
                    self.zoom_in()
                } else if delta < 0.0 {
                    self.zoom_out()
                } else {
                    false
                };
                if zoomed {
                    EventHandled::Handled
                } else {
                    EventHandled::NotHandled
                }
            }
            InputEvent::Resize { size } => {
                self.viewport.set_size(size);
                self.layers.resize_all(&self.viewport);
                self.request_redraw();
                EventHandled::Handled
            }
        }
    }

    /// Passes an application notification on to the layers.
    ///
    /// Settings that carry a persisted target become a target change.
    pub fn notify(&mut self, notification: AppNotification) {
        let notification = match notification {
            AppNotification::SettingsChanged(settings) => {
                match AppNotification::target_from_settings(&settings) {
                    Some(target) => AppNotification::TargetChanged { target },
                    None => AppNotification::SettingsChanged(settings),
                }
            }
            other => other,
        };
        if self.layers.notify_all(&notification, &self.viewport) {
            self.request_redraw();
        }
    }

    /// Collects finished tile downloads. Returns whether a redraw is due.
    pub fn update(&mut self) -> bool {
        let completed = self.providers.active_mut().take_completed();
        if !completed.is_empty() {
            log::trace!("{} tiles arrived", completed.len());
            self.request_redraw();
        }
        self.needs_redraw
    }

    /// Draws tiles, placeholders for missing tiles, and the layers on top.
    ///
    /// Never waits for a tile: anything not ready is drawn as a placeholder
    /// and shows up in a later pass.
    pub fn render(&mut self, surface: &mut dyn Surface) -> Result<RenderStats> {
        let mut stats = RenderStats::default();
        let loader = self.providers.active_mut();

        for tile in self.viewport.visible_tiles() {
            let image = match loader.fetch(tile.coord) {
                TileFetch::Ready(image) => {
                    stats.ready += 1;
                    image
                }
                TileFetch::Pending => {
                    stats.pending += 1;
                    self.placeholders.loading.clone()
                }
                TileFetch::Failed => {
                    stats.failed += 1;
                    self.placeholders.cant_load.clone()
                }
            };
            surface.draw_tile(&image, tile.screen)?;
        }

        self.layers.draw_all(surface, &self.viewport)?;
        self.needs_redraw = false;

        log::trace!(
            "rendered {} tiles ({} pending, {} failed)",
            stats.ready + stats.pending + stats.failed,
            stats.pending,
            stats.failed
        );
        Ok(stats)
    }

    /// Register an event listener for one event kind (see [`MapEvent::kind`])
    pub fn on<F>(&mut self, event_kind: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.event_manager.on(event_kind, callback);
    }

    /// Opens a channel receiving every event
    pub fn subscribe(&mut self) -> Receiver<MapEvent> {
        self.event_manager.subscribe()
    }

    /// Delivers queued events to listeners and subscribers
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.event_manager.process_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::marker::{Marker, MarkerContainer, MarkerLayer};
    use crate::rendering::context::RenderContext;
    use crate::tiles::loader::MemoryTileLoader;
    use image::RgbaImage;
    use std::sync::Arc;

    fn test_map(center: LatLng, zoom: u8) -> Map {
        let providers = ProviderRegistry::new("memory", Box::new(MemoryTileLoader::new(256, 18)));
        Map::new(
            Viewport::new(center, zoom, Point::new(800.0, 600.0)),
            providers,
            Placeholders::solid(256),
        )
    }

    fn kinds(events: &[MapEvent]) -> Vec<&'static str> {
        events.iter().map(|event| event.kind()).collect()
    }

    #[test]
    fn test_map_creation() {
        let map = test_map(LatLng::new(50.0, 7.0), 10);

        assert_eq!(map.center(), LatLng::new(50.0, 7.0));
        assert_eq!(map.zoom(), 10);
        assert_eq!(map.min_zoom(), 1);
        assert_eq!(map.max_zoom(), 18);
        assert!(map.needs_redraw());
    }

    #[test]
    fn test_zoom_events_and_limits() {
        let mut map = test_map(LatLng::new(50.0, 7.0), 10);

        assert!(map.set_zoom(12));
        assert!(!map.set_zoom(0));
        assert!(!map.set_zoom(19));
        assert!(map.zoom_out());
        assert_eq!(map.zoom(), 11);

        let events = map.process_events();
        assert_eq!(kinds(&events), vec!["zoomchanged", "zoomchanged"]);
    }

    #[test]
    fn test_render_uses_placeholders_without_blocking() {
        let mut map = test_map(LatLng::new(50.0, 7.0), 10);
        let mut context = RenderContext::new(800, 600);

        let stats = map.render(&mut context).unwrap();

        assert_eq!(stats.ready, 0);
        assert!(stats.pending > 0);
        assert!(!stats.is_complete());
        assert!(context
            .get_drawing_queue()
            .iter()
            .all(|command| command.is_tile(&map.placeholders().loading)));
        assert!(!map.needs_redraw());
    }

    #[test]
    fn test_drag_reconciles_once() {
        let mut map = test_map(LatLng::new(50.0, 7.0), 10);
        let before = map.viewport().map_center();

        map.handle_input(InputEvent::DragStart {
            position: Point::new(400.0, 300.0),
        });
        map.handle_input(InputEvent::Drag {
            delta: Point::new(100.0, 0.0),
        });
        map.handle_input(InputEvent::Drag {
            delta: Point::new(28.0, 0.0),
        });
        assert!(!map.set_center(LatLng::new(0.0, 0.0), true));
        assert_eq!(map.center(), LatLng::new(50.0, 7.0));

        assert_eq!(map.handle_input(InputEvent::DragEnd), EventHandled::Handled);
        assert_eq!(map.handle_input(InputEvent::DragEnd), EventHandled::NotHandled);

        let after = map.viewport().map_center();
        assert!((before.x - after.x - 0.5).abs() < 1e-9);
        assert!(map.center().lng < 7.0);
    }

    #[test]
    fn test_unhandled_click_becomes_event() {
        let mut map = test_map(LatLng::new(50.0, 7.0), 10);
        let rx = map.subscribe();

        let handled = map.handle_input(InputEvent::Click {
            position: Point::new(400.0, 300.0),
        });
        assert_eq!(handled, EventHandled::NotHandled);
        map.process_events();

        let mut clicked = None;
        while let Ok(event) = rx.try_recv() {
            if let MapEvent::Click { lat_lng, .. } = event {
                clicked = Some(lat_lng);
            }
        }
        let clicked = clicked.unwrap();
        assert!((clicked.lat - 50.0).abs() < 1e-9);
        assert!((clicked.lng - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_settings_become_target_change() {
        use crate::layers::position::PositionLayer;

        let mut map = test_map(LatLng::new(50.0, 7.0), 10);
        map.add_layer(Box::new(PositionLayer::new()));

        map.notify(AppNotification::SettingsChanged(serde_json::json!({
            "last_target_lat": 49.0,
            "last_target_lon": 8.0
        })));

        let position = map.layers().layer_as::<PositionLayer>("position").unwrap();
        assert_eq!(position.target(), Some(LatLng::new(49.0, 8.0)));
    }

    #[test]
    fn test_tile_loader_switch_clamps_zoom() {
        let mut map = test_map(LatLng::new(50.0, 7.0), 17);
        map.register_tile_loader("topo", Box::new(MemoryTileLoader::new(256, 15)));
        map.render(&mut RenderContext::new(800, 600)).unwrap();

        map.set_tile_loader("topo").unwrap();
        assert_eq!(map.zoom(), 15);
        assert!(map.set_tile_loader("missing").is_err());

        let events = map.process_events();
        assert_eq!(kinds(&events), vec!["tileloaderchanged", "zoomchanged", "redraw"]);
    }

    #[test]
    fn test_tile_loader_below_min_zoom_is_refused() {
        let providers = ProviderRegistry::new("memory", Box::new(MemoryTileLoader::new(256, 18)));
        let viewport = Viewport::new(LatLng::new(50.0, 7.0), 17, Point::new(800.0, 600.0))
            .with_tile_source(256, 18)
            .with_min_zoom(17);
        let mut map = Map::new(viewport, providers, Placeholders::solid(256));
        map.register_tile_loader("coarse", Box::new(MemoryTileLoader::new(256, 16)));
        map.process_events();

        assert!(matches!(
            map.set_tile_loader("coarse"),
            Err(MapError::Config(_))
        ));
        assert_eq!(map.providers().active_name(), "memory");
        assert_eq!(map.max_zoom(), 18);
        assert_eq!(map.zoom(), 17);
        assert!(map.process_events().is_empty());
    }

    #[test]
    fn test_scroll_during_drag_keeps_offset() {
        let mut map = test_map(LatLng::new(50.0, 7.0), 13);
        let expected = map.viewport().screen_point_to_coord(&Point::new(200.0, 300.0));
        map.render(&mut RenderContext::new(800, 600)).unwrap();

        map.handle_input(InputEvent::DragStart {
            position: Point::new(400.0, 300.0),
        });
        map.handle_input(InputEvent::Drag {
            delta: Point::new(200.0, 0.0),
        });
        assert_eq!(
            map.handle_input(InputEvent::Scroll { delta: 1.0 }),
            EventHandled::NotHandled
        );
        assert_eq!(map.zoom(), 13);

        assert_eq!(map.handle_input(InputEvent::DragEnd), EventHandled::Handled);
        let center = map.center();
        assert!((center.lat - expected.lat).abs() < 1e-9);
        assert!((center.lng - expected.lng).abs() < 1e-9);

        let events = map.process_events();
        assert!(kinds(&events).contains(&"centerchanged"));
        assert!(!kinds(&events).contains(&"zoomchanged"));

        assert_eq!(
            map.handle_input(InputEvent::Scroll { delta: 1.0 }),
            EventHandled::Handled
        );
        assert_eq!(map.zoom(), 14);
    }

    #[test]
    fn test_completed_tiles_request_redraw() {
        let mut loader = MemoryTileLoader::new(256, 18);
        loader.set_tile(
            crate::core::geo::TileCoord::new(0, 0, 1),
            Arc::new(RgbaImage::new(256, 256)),
        );
        let providers = ProviderRegistry::new("memory", Box::new(loader));
        let mut map = Map::new(
            Viewport::new(LatLng::new(0.0, 0.0), 1, Point::new(512.0, 512.0)),
            providers,
            Placeholders::solid(256),
        );
        let mut context = RenderContext::new(512, 512);
        map.render(&mut context).unwrap();
        assert!(!map.needs_redraw());

        assert!(map.update());
        let stats = map.render(&mut context).unwrap();
        assert_eq!(stats.ready, 1);
        assert!(!map.update());
    }

    #[test]
    fn test_osd_and_markers() {
        let mut map = test_map(LatLng::new(50.0, 7.0), 10);
        let mut pins = MarkerLayer::new("pins");
        pins.add_marker(Marker::new(LatLng::new(50.0, 7.0)));
        map.add_layer(Box::new(pins));

        map.set_osd_message("Downloading");
        map.set_osd_message("Done");
        assert_eq!(map.layers().len(), 2);
        assert_eq!(
            map.layers().layer_as::<OsdLayer>("osd").unwrap().message(),
            Some("Done")
        );

        map.remove_all_markers();
        assert!(map
            .layers()
            .layer_as::<MarkerLayer>("pins")
            .unwrap()
            .markers()
            .is_empty());
    }
}
