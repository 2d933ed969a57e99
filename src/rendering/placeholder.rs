use crate::core::config::MapConfig;
use crate::rendering::surface::Color;
use crate::tiles::TileImage;
use crate::Result;
use image::{Rgba, RgbaImage};
use std::path::Path;
use std::sync::Arc;

/// Images drawn in place of tiles that are not available yet or failed.
#[derive(Debug, Clone)]
pub struct Placeholders {
    pub loading: TileImage,
    pub cant_load: TileImage,
}

impl Placeholders {
    /// Flat placeholder tiles, light gray while loading and a crossed tile on failure
    pub fn solid(tile_size: u32) -> Self {
        let loading = RgbaImage::from_pixel(tile_size, tile_size, Rgba([230, 230, 230, 255]));

        let mut cant_load = RgbaImage::from_pixel(tile_size, tile_size, Rgba([200, 200, 200, 255]));
        let cross = Rgba(Color::rgb(170, 60, 60).to_array());
        for i in 0..tile_size {
            cant_load.put_pixel(i, i, cross);
            cant_load.put_pixel(tile_size - 1 - i, i, cross);
        }

        Self {
            loading: Arc::new(loading),
            cant_load: Arc::new(cant_load),
        }
    }

    /// Decodes both placeholders from image files
    pub fn load(loading: impl AsRef<Path>, cant_load: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            loading: Arc::new(image::open(loading)?.to_rgba8()),
            cant_load: Arc::new(image::open(cant_load)?.to_rgba8()),
        })
    }

    /// Uses the configured image files, falling back to solid tiles when
    /// they are missing or undecodable
    pub fn from_config(config: &MapConfig, tile_size: u32) -> Self {
        match (&config.placeholder_loading, &config.placeholder_cant_load) {
            (Some(loading), Some(cant_load)) => match Self::load(loading, cant_load) {
                Ok(placeholders) => placeholders,
                Err(e) => {
                    log::warn!("Failed to load placeholder images: {}", e);
                    Self::solid(tile_size)
                }
            },
            _ => Self::solid(tile_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_placeholders() {
        let placeholders = Placeholders::solid(64);
        assert_eq!(placeholders.loading.dimensions(), (64, 64));
        assert_eq!(placeholders.cant_load.dimensions(), (64, 64));
        assert_ne!(
            placeholders.cant_load.get_pixel(0, 0),
            placeholders.cant_load.get_pixel(10, 0)
        );
    }

    #[test]
    fn test_missing_files_fall_back() {
        let mut config = MapConfig::default();
        config.placeholder_loading = Some("/nonexistent/loading.png".into());
        config.placeholder_cant_load = Some("/nonexistent/cant_load.png".into());

        assert!(Placeholders::load("/nonexistent/a.png", "/nonexistent/b.png").is_err());
        let placeholders = Placeholders::from_config(&config, 32);
        assert_eq!(placeholders.loading.dimensions(), (32, 32));
    }
}
