pub mod folder;
pub mod tags;

pub use folder::{discover_pairs, VideoPair};
pub use tags::{parse_fps, parse_name, DiscoveryConfig};
