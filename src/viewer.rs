use std::fmt;

use log::{error, info};

use crate::camera::Camera;
use crate::config::ViewerConfig;
use crate::error::{FormatError, ViewerError};
use crate::fetch::fetch_model;
use crate::format::{FormatVersion, ModelHeader};
use crate::loader::select_loader;
use crate::math::Aabb;
use crate::progress::LoadStatus;
use crate::routing::ModelConfig;
use crate::scene_graph::Scene;
use crate::units::{GridOverlay, GridPlane, Measurements, UnitScale};

/// A loaded, framed model.
pub struct ViewerSession {
    pub model: ModelConfig,
    pub config: ViewerConfig,
    pub header: ModelHeader,
    pub scene: Scene,
    pub bounds: Aabb,
    pub camera: Camera,
    /// `None` when the model's unit is unknown.
    pub measurements: Option<Measurements>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugReport {
    pub box_size: f32,
    pub camera_near: f32,
    pub camera_far: f32,
}

impl fmt::Display for DebugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "box size:    {:.3}", self.box_size)?;
        writeln!(f, "camera near: {:.3}", self.camera_near)?;
        write!(f, "camera far:  {:.3}", self.camera_far)
    }
}

impl ViewerSession {
    pub async fn open(
        model: ModelConfig,
        config: ViewerConfig,
        status: &mut dyn LoadStatus,
    ) -> Result<Self, ViewerError> {
        let fetched = fetch_model(&model.source, &config, status).await?;

        let loader = select_loader(&fetched.header, &config);
        let loaded = loader
            .load(&fetched.bytes, status)
            .and_then(|loaded| {
                let bounds = loaded.scene.world_bounds();
                if bounds.is_empty() {
                    Err(FormatError::NoGeometry)
                } else {
                    Ok((loaded, bounds))
                }
            })
            .map_err(ViewerError::from);

        let (loaded, bounds) = match loaded {
            Ok(result) => result,
            Err(err) => {
                error!("{}", err);
                status.set_label(&err.status_message());
                return Err(err);
            }
        };

        let box_size = bounds.diagonal();
        let mut camera = Camera::new(config.initial_camera_position, config.field_of_view);
        camera.frame_area(box_size, box_size, bounds.center());

        let measurements = Measurements::from_bounds(&bounds, model.scale, config.grid_divisions);
        if measurements.is_none() {
            info!("Model unit is unknown, hiding measurements");
        }

        info!(
            "Loaded {} ({}), box size {:.3}",
            model.metadata.name, loaded.version, box_size
        );
        status.set_label("Loaded");
        status.set_progress(Some(100));

        Ok(Self {
            model,
            config,
            header: fetched.header,
            scene: loaded.scene,
            bounds,
            camera,
            measurements,
        })
    }

    pub fn version(&self) -> FormatVersion {
        self.header.version
    }

    pub fn box_size(&self) -> f32 {
        self.bounds.diagonal()
    }

    /// Frames the whole object again from the current heading.
    pub fn reset_camera(&mut self) {
        let box_size = self.box_size();
        self.camera
            .frame_area(box_size, box_size, self.bounds.center());
    }

    pub fn debug_report(&self) -> DebugReport {
        DebugReport {
            box_size: self.box_size(),
            camera_near: self.camera.near,
            camera_far: self.camera.far,
        }
    }

    pub fn grid(&self, plane: GridPlane) -> GridOverlay {
        GridOverlay::for_bounds(&self.bounds, plane, self.config.grid_divisions)
    }

    /// Unit the measurement panel starts in.
    pub fn default_display_unit(&self) -> UnitScale {
        self.model.scale
    }
}
