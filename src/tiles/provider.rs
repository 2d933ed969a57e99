use crate::tiles::loader::TileLoader;
use crate::{MapError, Result};

/// Named tile loaders with exactly one active at a time.
pub struct ProviderRegistry {
    loaders: Vec<(String, Box<dyn TileLoader>)>,
    active: usize,
}

impl ProviderRegistry {
    /// Creates a registry whose first and active loader is `loader`
    pub fn new(name: impl Into<String>, loader: Box<dyn TileLoader>) -> Self {
        Self {
            loaders: vec![(name.into(), loader)],
            active: 0,
        }
    }

    /// Adds a loader, replacing any loader registered under the same name
    pub fn register(&mut self, name: impl Into<String>, loader: Box<dyn TileLoader>) {
        let name = name.into();
        match self.loaders.iter().position(|(existing, _)| *existing == name) {
            Some(idx) => self.loaders[idx].1 = loader,
            None => self.loaders.push((name, loader)),
        }
    }

    /// Makes `name` the active loader. Returns whether the active loader changed.
    pub fn set_active(&mut self, name: &str) -> Result<bool> {
        let idx = self
            .loaders
            .iter()
            .position(|(existing, _)| existing == name)
            .ok_or_else(|| MapError::UnknownProvider(name.to_string()))?;
        let changed = idx != self.active;
        self.active = idx;
        Ok(changed)
    }

    /// Looks up a registered loader without activating it
    pub fn get(&self, name: &str) -> Option<&dyn TileLoader> {
        self.loaders
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, loader)| loader.as_ref())
    }

    pub fn active(&self) -> &dyn TileLoader {
        self.loaders[self.active].1.as_ref()
    }

    pub fn active_mut(&mut self) -> &mut dyn TileLoader {
        self.loaders[self.active].1.as_mut()
    }

    pub fn active_name(&self) -> &str {
        &self.loaders[self.active].0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.loaders.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}
