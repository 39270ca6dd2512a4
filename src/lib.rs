pub mod camera;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod loader;
pub mod math;
pub mod progress;
pub mod routing;
pub mod scene_graph;
pub mod units;
pub mod viewer;

pub use config::ViewerConfig;
pub use error::{FormatError, ViewerError};
pub use fetch::ModelSource;
pub use format::FormatVersion;
pub use viewer::ViewerSession;
