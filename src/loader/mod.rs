//! Format-specific model loaders.
//!
//! The header decides which loader handles a file. The choice is made once
//! per session and the two loaders share no state.

use crate::config::ViewerConfig;
use crate::error::FormatError;
use crate::format::{FormatVersion, ModelHeader};
use crate::progress::{resource_percent, LoadStatus};
use crate::scene_graph::Scene;

pub mod current;
pub mod legacy;

pub use current::CurrentLoader;
pub use legacy::LegacyLoader;

pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

pub struct LoadedScene {
    pub scene: Scene,
    pub version: FormatVersion,
    pub mesh_count: usize,
}

pub trait ModelLoader {
    fn version(&self) -> FormatVersion;

    /// Parses `bytes` into a scene graph carrying per-node mesh bounds.
    fn load(&self, bytes: &[u8], status: &mut dyn LoadStatus) -> Result<LoadedScene, FormatError>;
}

pub fn select_loader(header: &ModelHeader, config: &ViewerConfig) -> Box<dyn ModelLoader> {
    match header.version {
        FormatVersion::Legacy => Box::new(LegacyLoader::new(config.download_phase_ceiling)),
        FormatVersion::Current => Box::new(CurrentLoader::new(
            config.download_phase_ceiling,
            config.compressed_geometry,
            header.requires_extension(DRACO_EXTENSION),
        )),
    }
}

/// Reports one loaded mesh during the resource phase.
pub(crate) fn report_resource(status: &mut dyn LoadStatus, loaded: usize, total: usize, ceiling: u8) {
    status.set_label("Loading object resources ...");
    status.set_progress(Some(resource_percent(loaded, total, ceiling)));
}
