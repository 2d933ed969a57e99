use crate::core::constants::{DEFAULT_MAX_RESULTS, MARKER_HIT_RADIUS};
use crate::core::geo::{LatLng, LatLngBounds, Point};
use crate::core::viewport::Viewport;
use crate::input::events::{AppNotification, EventHandled};
use crate::layers::base::{Layer, LayerProperties, LayerType};
use crate::rendering::surface::{Color, MarkerStyle, Surface};
use crate::Result;
use serde::{Deserialize, Serialize};

/// A geocache as shown on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geocache {
    /// Listing code, e.g. `GC1234`
    pub name: String,
    pub title: String,
    pub position: LatLng,
    #[serde(default)]
    pub found: bool,
}

impl Geocache {
    pub fn new(name: impl Into<String>, title: impl Into<String>, position: LatLng) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            position,
            found: false,
        }
    }
}

/// Looks up the geocaches inside an area, returning at most the given number
pub type GeocacheProvider = Box<dyn Fn(&LatLngBounds, usize) -> Vec<Geocache> + Send>;

/// Receives the geocaches the user clicked on
pub type SelectionCallback = Box<dyn Fn(&[Geocache]) + Send>;

/// Pins for the geocaches in the visible area.
///
/// The geocaches are queried from the provider whenever the visible area
/// changed since the last query, after a resize, and after the stored
/// geocaches changed.
pub struct GeocacheLayer {
    properties: LayerProperties,
    provider: Option<GeocacheProvider>,
    on_select: Option<SelectionCallback>,
    geocaches: Vec<Geocache>,
    queried_bounds: Option<LatLngBounds>,
    dirty: bool,
    truncated: bool,
    max_results: usize,
    hit_radius: f64,
}

impl GeocacheLayer {
    pub fn new() -> Self {
        Self {
            properties: LayerProperties::new("geocaches", "Geocaches", LayerType::Geocache),
            provider: None,
            on_select: None,
            geocaches: Vec::new(),
            queried_bounds: None,
            dirty: true,
            truncated: false,
            max_results: DEFAULT_MAX_RESULTS,
            hit_radius: MARKER_HIT_RADIUS,
        }
    }

    pub fn with_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn(&LatLngBounds, usize) -> Vec<Geocache> + Send + 'static,
    {
        self.provider = Some(Box::new(provider));
        self.dirty = true;
        self
    }

    pub fn on_select<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[Geocache]) + Send + 'static,
    {
        self.on_select = Some(Box::new(callback));
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_hit_radius(mut self, radius: f64) -> Self {
        self.hit_radius = radius;
        self
    }

    pub fn geocaches(&self) -> &[Geocache] {
        &self.geocaches
    }

    /// Whether the last query returned more geocaches than are shown
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Queries the provider for the visible area
    pub fn refresh(&mut self, viewport: &Viewport) {
        let bounds = viewport.bounds();
        self.queried_bounds = Some(bounds);
        self.dirty = false;

        let Some(provider) = &self.provider else {
            self.geocaches.clear();
            return;
        };

        // One more than shown tells whether the area holds too many
        let mut found = provider(&bounds, self.max_results.saturating_add(1));
        self.truncated = found.len() > self.max_results;
        found.truncate(self.max_results);
        log::debug!(
            "{} geocaches in view{}",
            found.len(),
            if self.truncated { " (truncated)" } else { "" }
        );
        self.geocaches = found;
    }

    fn needs_refresh(&self, viewport: &Viewport) -> bool {
        self.dirty || self.queried_bounds != Some(viewport.bounds())
    }

    fn select(&self, selection: &[Geocache]) {
        if let Some(callback) = &self.on_select {
            callback(selection);
        }
    }

    fn style(geocache: &Geocache) -> MarkerStyle {
        if geocache.found {
            MarkerStyle::new(Color::GRAY, 5.0)
        } else {
            MarkerStyle::new(Color::GREEN, 6.0)
        }
    }
}

impl Default for GeocacheLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for GeocacheLayer {
    crate::impl_layer_trait!(properties);

    fn attach(&mut self, viewport: &Viewport) {
        self.refresh(viewport);
    }

    fn draw(&mut self, surface: &mut dyn Surface, viewport: &Viewport) -> Result<()> {
        if self.needs_refresh(viewport) {
            self.refresh(viewport);
        }

        for geocache in &self.geocaches {
            let at = viewport.coord_to_screen_point(&geocache.position);
            if viewport.is_point_visible(&at) {
                surface.draw_marker(at, &Self::style(geocache))?;
            }
        }
        if self.truncated {
            let at = Point::new(4.0, viewport.height() - 20.0);
            surface.draw_text(at, "Too many geocaches to display all", Color::RED)?;
        }
        Ok(())
    }

    fn clicked_screen(&mut self, point: Point, viewport: &Viewport) -> EventHandled {
        let nearest = self
            .geocaches
            .iter()
            .map(|geocache| {
                let at = viewport.coord_to_screen_point(&geocache.position);
                (at.distance_to(&point), geocache)
            })
            .filter(|(distance, _)| *distance <= self.hit_radius)
            .min_by(|a, b| a.0.total_cmp(&b.0));

        match nearest {
            Some((_, geocache)) => {
                log::debug!("clicked geocache {}", geocache.name);
                self.select(std::slice::from_ref(geocache));
                EventHandled::Handled
            }
            None => EventHandled::NotHandled,
        }
    }

    fn clicked_coordinate(
        &mut self,
        _center: LatLng,
        top_left: LatLng,
        bottom_right: LatLng,
        _viewport: &Viewport,
    ) -> EventHandled {
        let region = LatLngBounds::from_corners(top_left, bottom_right);
        let selection: Vec<Geocache> = self
            .geocaches
            .iter()
            .filter(|geocache| region.contains(&geocache.position))
            .cloned()
            .collect();

        if selection.is_empty() {
            return EventHandled::NotHandled;
        }
        self.select(&selection);
        EventHandled::Handled
    }

    fn resize(&mut self, _viewport: &Viewport) {
        self.dirty = true;
    }

    fn handle_notification(&mut self, notification: &AppNotification, _viewport: &Viewport) -> bool {
        match notification {
            AppNotification::MarksChanged => {
                self.dirty = true;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::context::RenderContext;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn viewport() -> Viewport {
        Viewport::new(LatLng::new(50.0, 7.0), 14, Point::new(400.0, 300.0))
    }

    fn caches() -> Vec<Geocache> {
        vec![
            Geocache::new("GC1", "Center", LatLng::new(50.0, 7.0)),
            Geocache::new("GC2", "East", LatLng::new(50.0, 7.003)),
            Geocache::new("GC3", "Far away", LatLng::new(10.0, 7.0)),
        ]
    }

    fn provider(calls: Arc<AtomicUsize>) -> impl Fn(&LatLngBounds, usize) -> Vec<Geocache> + Send {
        move |bounds, max| {
            calls.fetch_add(1, Ordering::SeqCst);
            caches()
                .into_iter()
                .filter(|geocache| bounds.contains(&geocache.position))
                .take(max)
                .collect()
        }
    }

    #[test]
    fn test_queries_visible_area_once_per_view() {
        let viewport = viewport();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut layer = GeocacheLayer::new().with_provider(provider(calls.clone()));
        let mut context = RenderContext::new(400, 300);

        layer.draw(&mut context, &viewport).unwrap();
        layer.draw(&mut context, &viewport).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(layer.geocaches().len(), 2);
        assert_eq!(context.markers().count(), 4);

        assert!(layer.handle_notification(&AppNotification::MarksChanged, &viewport));
        layer.draw(&mut context, &viewport).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let mut moved = viewport.clone();
        moved.move_relative(50.0, 0.0);
        layer.draw(&mut context, &moved).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_results_are_bounded() {
        let viewport = viewport();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut layer = GeocacheLayer::new()
            .with_provider(provider(calls))
            .with_max_results(1);

        layer.refresh(&viewport);
        assert_eq!(layer.geocaches().len(), 1);
        assert!(layer.is_truncated());
    }

    #[test]
    fn test_unlimited_results() {
        let viewport = viewport();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut layer = GeocacheLayer::new()
            .with_provider(provider(calls))
            .with_max_results(usize::MAX);

        layer.refresh(&viewport);
        assert_eq!(layer.geocaches().len(), 2);
        assert!(!layer.is_truncated());
    }

    #[test]
    fn test_click_selects_nearest_geocache() {
        let viewport = viewport();
        let selected = Arc::new(Mutex::new(Vec::new()));
        let sink = selected.clone();
        let mut layer = GeocacheLayer::new()
            .with_provider(provider(Arc::new(AtomicUsize::new(0))))
            .on_select(move |caches| {
                sink.lock()
                    .unwrap()
                    .extend(caches.iter().map(|c| c.name.clone()))
            });
        layer.attach(&viewport);

        let center = viewport.coord_to_screen_point(&LatLng::new(50.0, 7.0));
        let near = Point::new(center.x + 3.0, center.y - 2.0);
        assert_eq!(layer.clicked_screen(near, &viewport), EventHandled::Handled);
        assert_eq!(
            layer.clicked_screen(Point::new(5.0, 5.0), &viewport),
            EventHandled::NotHandled
        );
        assert_eq!(*selected.lock().unwrap(), vec!["GC1".to_string()]);
    }

    #[test]
    fn test_region_selects_all_inside() {
        let viewport = viewport();
        let selected = Arc::new(Mutex::new(Vec::new()));
        let sink = selected.clone();
        let mut layer = GeocacheLayer::new()
            .with_provider(provider(Arc::new(AtomicUsize::new(0))))
            .on_select(move |caches| sink.lock().unwrap().push(caches.len()));
        layer.attach(&viewport);

        let (top_left, bottom_right) = viewport.visible_area();
        let handled = layer.clicked_coordinate(viewport.center(), top_left, bottom_right, &viewport);
        assert_eq!(handled, EventHandled::Handled);

        let empty = layer.clicked_coordinate(
            LatLng::new(0.0, 0.0),
            LatLng::new(1.0, -1.0),
            LatLng::new(-1.0, 1.0),
            &viewport,
        );
        assert_eq!(empty, EventHandled::NotHandled);
        assert_eq!(*selected.lock().unwrap(), vec![2]);
    }
}
