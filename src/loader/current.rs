use std::collections::HashMap;

use glam::Vec3;
use gltf::json::validation::{self, Validate};
use gltf::json::Path;
use gltf::Gltf;
use log::{info, warn};

use crate::error::FormatError;
use crate::format::FormatVersion;
use crate::loader::{report_resource, LoadedScene, ModelLoader, DRACO_EXTENSION};
use crate::math::Aabb;
use crate::progress::LoadStatus;
use crate::scene_graph::Scene;

/// glTF 2 loader backed by the `gltf` crate.
pub struct CurrentLoader {
    ceiling: u8,
    compressed_geometry: bool,
    draco_required: bool,
}

impl CurrentLoader {
    pub fn new(ceiling: u8, compressed_geometry: bool, draco_required: bool) -> Self {
        Self {
            ceiling,
            compressed_geometry,
            draco_required,
        }
    }

    fn parse(&self, bytes: &[u8]) -> Result<Gltf, FormatError> {
        if self.draco_required && !self.compressed_geometry {
            return Err(FormatError::UnsupportedExtension(DRACO_EXTENSION.to_string()));
        }

        let gltf = Gltf::from_slice_without_validation(bytes)?;

        // Compressed primitives have no buffer views of their own and the
        // gltf crate cannot decode the extension. Bounds only need accessor
        // min/max, which compressed primitives still carry.
        if self.draco_required {
            return Ok(gltf);
        }

        let root = gltf.as_json();
        let mut errors = Vec::new();
        root.validate(root, Path::new, &mut |path, error| errors.push((path(), error)));

        let (tolerated, errors): (Vec<_>, Vec<_>) = errors
            .into_iter()
            .partition(|(path, error)| is_missing_position_bound(path, *error));
        for (path, _) in &tolerated {
            warn!("{} is missing, reading positions instead", path.as_str());
        }

        if errors.is_empty() {
            Ok(gltf)
        } else {
            Err(gltf::Error::Validation(errors).into())
        }
    }
}

/// Exporters often leave out POSITION min/max although glTF 2 requires them.
/// The bounds can still be computed from the positions themselves.
fn is_missing_position_bound(path: &Path, error: validation::Error) -> bool {
    let path = path.as_str();
    error == validation::Error::Missing
        && (path.ends_with(r#"["POSITION"].min"#) || path.ends_with(r#"["POSITION"].max"#))
}

fn accessor_bound(value: Option<gltf::json::Value>) -> Option<Vec3> {
    let components: Vec<f32> = serde_json::from_value(value?).ok()?;
    match components.as_slice() {
        [x, y, z, ..] => Some(Vec3::new(*x, *y, *z)),
        _ => None,
    }
}

fn primitive_bounds(gltf: &Gltf, primitive: &gltf::Primitive) -> Option<Aabb> {
    let positions = primitive.get(&gltf::Semantic::Positions)?;

    if let (Some(min), Some(max)) = (
        accessor_bound(positions.min()),
        accessor_bound(positions.max()),
    ) {
        return Some(Aabb::new(min, max));
    }

    let reader = primitive.reader(|buffer| match buffer.source() {
        gltf::buffer::Source::Bin => gltf.blob.as_deref(),
        gltf::buffer::Source::Uri(_) => None,
    });

    reader
        .read_positions()
        .map(|positions| Aabb::from_points(positions.map(Vec3::from)))
        .filter(|bounds| !bounds.is_empty())
}

impl ModelLoader for CurrentLoader {
    fn version(&self) -> FormatVersion {
        FormatVersion::Current
    }

    fn load(&self, bytes: &[u8], status: &mut dyn LoadStatus) -> Result<LoadedScene, FormatError> {
        let gltf = self.parse(bytes)?;

        let gltf_scene = gltf
            .default_scene()
            .or_else(|| gltf.scenes().next())
            .ok_or(FormatError::MissingScene)?;

        let mesh_count = gltf.meshes().len();
        let mut mesh_bounds = HashMap::with_capacity(mesh_count);

        for (loaded, mesh) in gltf.meshes().enumerate() {
            let mut bounds = Aabb::empty();

            for primitive in mesh.primitives() {
                match primitive_bounds(&gltf, &primitive) {
                    Some(primitive_bounds) => bounds = bounds.union(&primitive_bounds),
                    None => warn!(
                        "Skipping primitive {} of mesh {}: no readable positions",
                        primitive.index(),
                        mesh.name().unwrap_or("unnamed")
                    ),
                }
            }

            mesh_bounds.insert(mesh.index(), bounds);
            report_resource(status, loaded + 1, mesh_count, self.ceiling);
        }

        if mesh_count == 0 {
            report_resource(status, 0, 0, self.ceiling);
        }

        let mut scene = Scene::new();
        scene.spawn_gltf_scene(&gltf_scene, &mesh_bounds);

        info!(
            "Loaded glTF 2 scene with {} nodes and {} meshes",
            scene.len(),
            mesh_count
        );

        Ok(LoadedScene {
            scene,
            version: FormatVersion::Current,
            mesh_count,
        })
    }
}
