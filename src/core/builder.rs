//! Map builder for fluent configuration
//!
//! The builder is the one place where a [`MapConfig`] turns into a running
//! [`Map`]: it validates the configuration, creates one tile loader per
//! provider (unless loaders are supplied directly), decodes the placeholder
//! images and sets up the viewport.

use crate::{
    core::{
        config::MapConfig,
        geo::{LatLng, Point},
        map::Map,
        viewport::Viewport,
    },
    layers::base::Layer,
    rendering::placeholder::Placeholders,
    tiles::{loader::TileLoader, provider::ProviderRegistry},
    MapError, Result,
};

/// Builder for creating and configuring Map instances
pub struct MapBuilder {
    config: MapConfig,
    center: LatLng,
    zoom: u8,
    size: Point,
    loaders: Vec<(String, Box<dyn TileLoader>)>,
    active_provider: Option<String>,
    placeholders: Option<Placeholders>,
    layers: Vec<Box<dyn Layer>>,
}

impl MapBuilder {
    /// Create a new MapBuilder with the default configuration
    pub fn new() -> Self {
        Self::from_config(MapConfig::default())
    }

    pub fn from_config(config: MapConfig) -> Self {
        Self {
            config,
            center: LatLng::default(),
            zoom: 1,
            size: Point::new(800.0, 600.0),
            loaders: Vec::new(),
            active_provider: None,
            placeholders: None,
            layers: Vec::new(),
        }
    }

    /// Set the initial center and zoom level
    pub fn with_center_and_zoom(mut self, center: LatLng, zoom: u8) -> Self {
        self.center = center;
        self.zoom = zoom;
        self
    }

    /// Set the size of the map area in pixels
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Point::new(width, height);
        self
    }

    /// Supplies a loader directly instead of building one from the configuration.
    ///
    /// As soon as one loader is supplied, none are built from the configured
    /// providers.
    pub fn with_tile_loader(mut self, name: impl Into<String>, loader: Box<dyn TileLoader>) -> Self {
        self.loaders.push((name.into(), loader));
        self
    }

    /// Selects the initially active provider; defaults to the first one
    pub fn with_active_provider(mut self, name: impl Into<String>) -> Self {
        self.active_provider = Some(name.into());
        self
    }

    pub fn with_placeholders(mut self, placeholders: Placeholders) -> Self {
        self.placeholders = Some(placeholders);
        self
    }

    /// Adds a layer; layers are stacked in the order they are added
    pub fn with_layer(mut self, layer: Box<dyn Layer>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Build the map
    pub fn build(self) -> Result<Map> {
        self.config.validate()?;

        let loaders = if self.loaders.is_empty() {
            Self::loaders_from_config(&self.config)?
        } else {
            self.loaders
        };

        let mut loaders = loaders.into_iter();
        let (first_name, first_loader) = loaders
            .next()
            .ok_or_else(|| MapError::Config("no tile loader available".into()))?;
        let mut providers = ProviderRegistry::new(first_name, first_loader);
        for (name, loader) in loaders {
            providers.register(name, loader);
        }
        if let Some(name) = &self.active_provider {
            providers.set_active(name)?;
        }

        let max_zoom = providers.active().max_zoom();
        if self.config.min_zoom > max_zoom {
            return Err(MapError::Config(format!(
                "min_zoom {} is above the max_zoom {} of provider '{}'",
                self.config.min_zoom,
                max_zoom,
                providers.active_name()
            )));
        }

        let tile_size = providers.active().tile_size();
        let placeholders = self
            .placeholders
            .unwrap_or_else(|| Placeholders::from_config(&self.config, tile_size));

        let mut viewport = Viewport::new(self.center, self.zoom, self.size)
            .with_tile_source(tile_size, max_zoom)
            .with_min_zoom(self.config.min_zoom)
            .with_lazy_threshold(self.config.lazy_threshold)
            .with_vertical_policy(self.config.vertical_policy);
        // The first clamp assumed the default maximum; the loader may allow more
        viewport.set_zoom(self.zoom as i32);

        log::info!(
            "map at {} zoom {} using {}",
            self.center,
            viewport.zoom(),
            providers.active_name()
        );

        let mut map = Map::new(viewport, providers, placeholders);
        for layer in self.layers {
            map.add_layer(layer);
        }
        Ok(map)
    }

    #[cfg(feature = "http")]
    fn loaders_from_config(config: &MapConfig) -> Result<Vec<(String, Box<dyn TileLoader>)>> {
        use crate::tiles::http::HttpTileLoader;

        config
            .providers
            .iter()
            .map(|provider| {
                let loader =
                    HttpTileLoader::new(provider, &config.map_path, config.memory_cache_tiles)?;
                Ok((provider.name.clone(), Box::new(loader) as Box<dyn TileLoader>))
            })
            .collect()
    }

    #[cfg(not(feature = "http"))]
    fn loaders_from_config(_config: &MapConfig) -> Result<Vec<(String, Box<dyn TileLoader>)>> {
        Err(MapError::Config(
            "network tile loading is disabled; supply a tile loader".into(),
        ))
    }
}

impl Default for MapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tiling::VerticalPolicy;
    use crate::layers::osd::OsdLayer;
    use crate::tiles::loader::MemoryTileLoader;

    #[test]
    fn test_builder_with_memory_loaders() {
        let map = MapBuilder::new()
            .with_center_and_zoom(LatLng::new(50.0, 7.0), 19)
            .with_size(640.0, 480.0)
            .with_tile_loader("street", Box::new(MemoryTileLoader::new(256, 19)))
            .with_tile_loader("topo", Box::new(MemoryTileLoader::new(512, 16)))
            .with_layer(Box::new(OsdLayer::new()))
            .build()
            .unwrap();

        assert_eq!(map.providers().active_name(), "street");
        assert_eq!(map.zoom(), 19);
        assert_eq!(map.viewport().width(), 640.0);
        assert_eq!(map.layers().len(), 1);
    }

    #[test]
    fn test_builder_applies_config() {
        let mut config = MapConfig::default()
            .with_vertical_policy(VerticalPolicy::Wrap)
            .with_lazy_threshold(0.25);
        config.min_zoom = 3;

        let map = MapBuilder::from_config(config)
            .with_center_and_zoom(LatLng::new(50.0, 7.0), 2)
            .with_tile_loader("street", Box::new(MemoryTileLoader::new(256, 18)))
            .with_tile_loader("topo", Box::new(MemoryTileLoader::new(512, 16)))
            .with_active_provider("topo")
            .build()
            .unwrap();

        assert_eq!(map.providers().active_name(), "topo");
        assert_eq!(map.tile_size(), 512);
        assert_eq!(map.max_zoom(), 16);
        assert_eq!(map.zoom(), 3);
        assert_eq!(map.viewport().vertical_policy(), VerticalPolicy::Wrap);
        assert_eq!(map.viewport().lazy_threshold(), 0.25);
        assert_eq!(map.placeholders().loading.width(), 512);
    }

    #[test]
    fn test_builder_rejects_bad_input() {
        let mut empty = MapConfig::default();
        empty.providers.clear();
        assert!(matches!(
            MapBuilder::from_config(empty).build(),
            Err(MapError::Config(_))
        ));

        let unknown = MapBuilder::new()
            .with_tile_loader("street", Box::new(MemoryTileLoader::default()))
            .with_active_provider("satellite")
            .build();
        assert!(matches!(unknown, Err(MapError::UnknownProvider(_))));
    }

    #[test]
    fn test_builder_rejects_min_zoom_above_loader() {
        let mut config = MapConfig::default();
        config.min_zoom = 17;

        let result = MapBuilder::from_config(config.clone())
            .with_center_and_zoom(LatLng::new(50.0, 7.0), 17)
            .with_tile_loader("street", Box::new(MemoryTileLoader::new(256, 16)))
            .build();
        assert!(matches!(result, Err(MapError::Config(_))));

        let map = MapBuilder::from_config(config)
            .with_center_and_zoom(LatLng::new(50.0, 7.0), 19)
            .with_tile_loader("street", Box::new(MemoryTileLoader::new(256, 17)))
            .build()
            .unwrap();
        assert_eq!(map.max_zoom(), 17);
        assert_eq!(map.zoom(), 17);
        assert_eq!(map.viewport().min_zoom(), 17);
    }
}
