use crate::core::geo::{LatLng, Point};
use crate::core::viewport::Viewport;
use crate::input::events::{AppNotification, EventHandled};
use crate::layers::base::Layer;
use crate::rendering::surface::Surface;
use crate::Result;

/// The overlays of one map in paint order.
///
/// The first layer added is painted first and so lies at the bottom. Clicks
/// travel the other way: the top-most layer is asked first and the first
/// one that handles the click ends the dispatch.
pub struct LayerStack {
    layers: Vec<Box<dyn Layer>>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Appends a layer on top and attaches it to the view
    pub fn add_layer(&mut self, mut layer: Box<dyn Layer>, viewport: &Viewport) {
        log::debug!("adding {} layer '{}'", layer.layer_type(), layer.id());
        layer.attach(viewport);
        self.layers.push(layer);
    }

    /// Removes a layer by ID
    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn Layer>> {
        let idx = self.layers.iter().position(|layer| layer.id() == layer_id)?;
        Some(self.layers.remove(idx))
    }

    /// Gets a reference to a layer by ID
    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn Layer> {
        self.layers
            .iter()
            .find(|layer| layer.id() == layer_id)
            .map(|layer| layer.as_ref())
    }

    /// Applies a function to a specific layer mutably
    pub fn with_layer_mut<F, R>(&mut self, layer_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn Layer) -> R,
    {
        self.layers
            .iter_mut()
            .find(|layer| layer.id() == layer_id)
            .map(|layer| f(layer.as_mut()))
    }

    /// Downcasts a layer to its concrete type
    pub fn layer_as<T: 'static>(&self, layer_id: &str) -> Option<&T> {
        self.get_layer(layer_id)?.as_any().downcast_ref::<T>()
    }

    pub fn layer_as_mut<T: 'static>(&mut self, layer_id: &str) -> Option<&mut T> {
        self.layers
            .iter_mut()
            .find(|layer| layer.id() == layer_id)?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Lists layer IDs in paint order
    pub fn list_layers(&self) -> Vec<String> {
        self.layers.iter().map(|layer| layer.id().to_string()).collect()
    }

    /// Applies a function to each layer mutably in paint order
    pub fn for_each_layer_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut dyn Layer),
    {
        for layer in &mut self.layers {
            f(layer.as_mut());
        }
    }

    /// Offers a click to the visible layers, top-most first
    pub fn dispatch_click(&mut self, point: Point, viewport: &Viewport) -> EventHandled {
        for layer in self.layers.iter_mut().rev().filter(|layer| layer.is_visible()) {
            if layer.clicked_screen(point, viewport).is_handled() {
                log::debug!("click at {:?} handled by '{}'", point, layer.id());
                return EventHandled::Handled;
            }
        }
        EventHandled::NotHandled
    }

    /// Offers a region selection to the visible layers, top-most first
    pub fn dispatch_click_region(
        &mut self,
        center: LatLng,
        top_left: LatLng,
        bottom_right: LatLng,
        viewport: &Viewport,
    ) -> EventHandled {
        for layer in self.layers.iter_mut().rev().filter(|layer| layer.is_visible()) {
            if layer
                .clicked_coordinate(center, top_left, bottom_right, viewport)
                .is_handled()
            {
                return EventHandled::Handled;
            }
        }
        EventHandled::NotHandled
    }

    pub fn resize_all(&mut self, viewport: &Viewport) {
        for layer in &mut self.layers {
            layer.resize(viewport);
        }
    }

    /// Draws the visible layers bottom to top
    pub fn draw_all(&mut self, surface: &mut dyn Surface, viewport: &Viewport) -> Result<()> {
        for layer in self.layers.iter_mut().filter(|layer| layer.is_visible()) {
            layer.draw(surface, viewport)?;
        }
        Ok(())
    }

    /// Hands a notification to every layer. Returns whether any layer needs a redraw.
    pub fn notify_all(&mut self, notification: &AppNotification, viewport: &Viewport) -> bool {
        let mut redraw = false;
        for layer in &mut self.layers {
            redraw |= layer.handle_notification(notification, viewport);
        }
        redraw
    }

    /// Clears every layer that holds markers; the layers themselves stay
    pub fn remove_all_markers(&mut self) {
        for layer in &mut self.layers {
            if let Some(container) = layer.as_marker_container_mut() {
                container.remove_all_markers();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::base::{LayerProperties, LayerType};
    use crate::layers::marker::{Marker, MarkerContainer, MarkerLayer};
    use crate::layers::osd::OsdLayer;
    use crate::rendering::context::RenderContext;
    use std::sync::{Arc, Mutex};

    /// Records which layers saw a click and answers with a fixed result
    struct RecordingLayer {
        properties: LayerProperties,
        answer: EventHandled,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingLayer {
        fn boxed(id: &str, answer: EventHandled, log: &Arc<Mutex<Vec<String>>>) -> Box<dyn Layer> {
            Box::new(Self {
                properties: LayerProperties::new(id, id, LayerType::Custom),
                answer,
                log: log.clone(),
            })
        }
    }

    impl Layer for RecordingLayer {
        crate::impl_layer_trait!(properties);

        fn draw(&mut self, _surface: &mut dyn Surface, _viewport: &Viewport) -> Result<()> {
            self.log.lock().unwrap().push(format!("draw {}", self.properties.id));
            Ok(())
        }

        fn clicked_screen(&mut self, _point: Point, _viewport: &Viewport) -> EventHandled {
            self.log.lock().unwrap().push(format!("click {}", self.properties.id));
            self.answer
        }
    }

    #[test]
    fn test_paint_order_is_insertion_order() {
        let viewport = Viewport::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = LayerStack::new();
        stack.add_layer(RecordingLayer::boxed("bottom", EventHandled::NotHandled, &log), &viewport);
        stack.add_layer(RecordingLayer::boxed("top", EventHandled::NotHandled, &log), &viewport);

        let mut context = RenderContext::new(800, 600);
        stack.draw_all(&mut context, &viewport).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["draw bottom", "draw top"]);
        assert_eq!(stack.list_layers(), vec!["bottom", "top"]);
    }

    #[test]
    fn test_click_goes_top_down_and_stops_when_handled() {
        let viewport = Viewport::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = LayerStack::new();
        stack.add_layer(RecordingLayer::boxed("a", EventHandled::Handled, &log), &viewport);
        stack.add_layer(RecordingLayer::boxed("b", EventHandled::Handled, &log), &viewport);
        stack.add_layer(RecordingLayer::boxed("c", EventHandled::NotHandled, &log), &viewport);

        let handled = stack.dispatch_click(Point::new(1.0, 1.0), &viewport);

        assert_eq!(handled, EventHandled::Handled);
        assert_eq!(*log.lock().unwrap(), vec!["click c", "click b"]);
    }

    #[test]
    fn test_hidden_layers_are_skipped() {
        let viewport = Viewport::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = LayerStack::new();
        stack.add_layer(RecordingLayer::boxed("hidden", EventHandled::Handled, &log), &viewport);
        stack.with_layer_mut("hidden", |layer| layer.set_visible(false));

        assert_eq!(
            stack.dispatch_click(Point::new(1.0, 1.0), &viewport),
            EventHandled::NotHandled
        );
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remove_all_markers_keeps_layers() {
        let viewport = Viewport::default();
        let mut stack = LayerStack::new();
        let mut pins = MarkerLayer::new("pins");
        pins.add_marker(Marker::new(LatLng::new(1.0, 1.0)));
        stack.add_layer(Box::new(pins), &viewport);
        stack.add_layer(Box::new(OsdLayer::new()), &viewport);

        stack.remove_all_markers();

        assert_eq!(stack.len(), 2);
        assert!(stack.layer_as::<MarkerLayer>("pins").unwrap().markers().is_empty());
        assert!(stack.remove_layer("osd").is_some());
        assert_eq!(stack.len(), 1);
    }
}
