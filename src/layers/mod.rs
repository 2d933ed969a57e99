#[macro_use]
pub mod macros;

pub mod base;
pub mod geocache;
pub mod manager;
pub mod marker;
pub mod osd;
pub mod position;

pub use base::{Layer, LayerProperties, LayerType};
pub use geocache::{Geocache, GeocacheLayer, GeocacheProvider, SelectionCallback};
pub use manager::LayerStack;
pub use marker::{Marker, MarkerContainer, MarkerLayer};
pub use osd::OsdLayer;
pub use position::PositionLayer;
