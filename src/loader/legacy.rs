//! glTF 1.x loader.
//!
//! glTF 1.0 keys every top-level collection by string id instead of array
//! index, and may arrive wrapped in the KHR_binary_glTF container.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use glam::{Mat4, Quat, Vec3};
use log::{info, warn};
use serde::Deserialize;

use crate::error::FormatError;
use crate::format::{json_content, FormatVersion};
use crate::loader::{report_resource, LoadedScene, ModelLoader};
use crate::math::Aabb;
use crate::progress::LoadStatus;
use crate::scene_graph::{Object3D, ObjectId, Scene, Transform};

#[derive(Debug, Deserialize)]
struct LegacyDocument {
    scene: Option<String>,
    #[serde(default)]
    scenes: BTreeMap<String, LegacyScene>,
    #[serde(default)]
    nodes: BTreeMap<String, LegacyNode>,
    #[serde(default)]
    meshes: BTreeMap<String, LegacyMesh>,
    #[serde(default)]
    accessors: BTreeMap<String, LegacyAccessor>,
}

#[derive(Debug, Deserialize)]
struct LegacyScene {
    #[serde(default)]
    nodes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyNode {
    name: Option<String>,
    #[serde(default)]
    children: Vec<String>,
    matrix: Option<[f32; 16]>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
    #[serde(default)]
    meshes: Vec<String>,
}

impl LegacyNode {
    fn transform(&self) -> Transform {
        match self.matrix {
            Some(matrix) => Transform::from_matrix(Mat4::from_cols_array(&matrix)),
            None => Transform::from_trs(
                self.translation.map(Vec3::from).unwrap_or(Vec3::ZERO),
                self.rotation.map(Quat::from_array).unwrap_or(Quat::IDENTITY),
                self.scale.map(Vec3::from).unwrap_or(Vec3::ONE),
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LegacyMesh {
    #[serde(default)]
    primitives: Vec<LegacyPrimitive>,
}

#[derive(Debug, Deserialize)]
struct LegacyPrimitive {
    #[serde(default)]
    attributes: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct LegacyAccessor {
    min: Option<Vec<f32>>,
    max: Option<Vec<f32>>,
}

impl LegacyAccessor {
    fn bounds(&self) -> Option<Aabb> {
        match (self.min.as_deref(), self.max.as_deref()) {
            (Some([min_x, min_y, min_z, ..]), Some([max_x, max_y, max_z, ..])) => Some(Aabb::new(
                Vec3::new(*min_x, *min_y, *min_z),
                Vec3::new(*max_x, *max_y, *max_z),
            )),
            _ => None,
        }
    }
}

fn missing(kind: &'static str, id: &str) -> FormatError {
    FormatError::MissingReference {
        kind,
        id: id.to_string(),
    }
}

/// glTF 1.x loader over `serde_json`.
pub struct LegacyLoader {
    ceiling: u8,
}

impl LegacyLoader {
    pub fn new(ceiling: u8) -> Self {
        Self { ceiling }
    }

    fn mesh_bounds(
        &self,
        document: &LegacyDocument,
        status: &mut dyn LoadStatus,
    ) -> Result<HashMap<String, Aabb>, FormatError> {
        let total = document.meshes.len();
        let mut all_bounds = HashMap::with_capacity(total);

        for (loaded, (mesh_id, mesh)) in document.meshes.iter().enumerate() {
            let mut bounds = Aabb::empty();

            for (index, primitive) in mesh.primitives.iter().enumerate() {
                let Some(accessor_id) = primitive.attributes.get("POSITION") else {
                    warn!("Skipping primitive {} of mesh {}: no POSITION", index, mesh_id);
                    continue;
                };

                let accessor = document
                    .accessors
                    .get(accessor_id)
                    .ok_or_else(|| missing("accessor", accessor_id))?;

                match accessor.bounds() {
                    Some(primitive_bounds) => bounds = bounds.union(&primitive_bounds),
                    None => warn!(
                        "Skipping primitive {} of mesh {}: accessor {} has no min/max",
                        index, mesh_id, accessor_id
                    ),
                }
            }

            all_bounds.insert(mesh_id.clone(), bounds);
            report_resource(status, loaded + 1, total, self.ceiling);
        }

        if total == 0 {
            report_resource(status, 0, 0, self.ceiling);
        }

        Ok(all_bounds)
    }

    fn root_nodes(document: &LegacyDocument) -> Result<Vec<String>, FormatError> {
        if let Some(scene_id) = &document.scene {
            let scene = document
                .scenes
                .get(scene_id)
                .ok_or_else(|| missing("scene", scene_id))?;
            return Ok(scene.nodes.clone());
        }

        if let Some(scene) = document.scenes.values().next() {
            return Ok(scene.nodes.clone());
        }

        // No scenes at all: every node nobody claims as a child is a root.
        let children: BTreeSet<&String> = document
            .nodes
            .values()
            .flat_map(|node| node.children.iter())
            .collect();

        Ok(document
            .nodes
            .keys()
            .filter(|id| !children.contains(id))
            .cloned()
            .collect())
    }

    /// Spawns the hierarchy under `roots`. A node reached a second time,
    /// through a cycle or a shared child, is skipped.
    fn spawn_nodes(
        scene: &mut Scene,
        document: &LegacyDocument,
        mesh_bounds: &HashMap<String, Aabb>,
        roots: &[String],
    ) -> Result<(), FormatError> {
        let mut visited = HashSet::new();
        let mut pending: Vec<(&str, Option<ObjectId>)> =
            roots.iter().rev().map(|id| (id.as_str(), None)).collect();

        while let Some((node_id, parent)) = pending.pop() {
            if !visited.insert(node_id) {
                warn!("Node {} appears more than once in the hierarchy, ignoring repeat", node_id);
                continue;
            }

            let node = document
                .nodes
                .get(node_id)
                .ok_or_else(|| missing("node", node_id))?;

            let mut object = Object3D::named(
                node.name.clone().unwrap_or_else(|| node_id.to_string()),
                node.transform(),
            );

            for mesh_id in &node.meshes {
                let bounds = mesh_bounds
                    .get(mesh_id)
                    .ok_or_else(|| missing("mesh", mesh_id))?;
                object.local_bounds = object.local_bounds.union(bounds);
            }

            let object_id = scene.add_object(object);
            if parent.is_some() {
                scene.set_object_parent(object_id, parent);
            }

            pending.extend(
                node.children
                    .iter()
                    .rev()
                    .map(|child_id| (child_id.as_str(), Some(object_id))),
            );
        }

        Ok(())
    }
}

impl ModelLoader for LegacyLoader {
    fn version(&self) -> FormatVersion {
        FormatVersion::Legacy
    }

    fn load(&self, bytes: &[u8], status: &mut dyn LoadStatus) -> Result<LoadedScene, FormatError> {
        let (_, content) = json_content(bytes)?;
        let document: LegacyDocument = serde_json::from_slice(content)?;

        let mesh_bounds = self.mesh_bounds(&document, status)?;
        let roots = Self::root_nodes(&document)?;
        if roots.is_empty() {
            return Err(FormatError::MissingScene);
        }

        let mut scene = Scene::new();
        Self::spawn_nodes(&mut scene, &document, &mesh_bounds, &roots)?;

        info!(
            "Loaded glTF 1 scene with {} nodes and {} meshes",
            scene.len(),
            document.meshes.len()
        );

        Ok(LoadedScene {
            scene,
            version: FormatVersion::Legacy,
            mesh_count: document.meshes.len(),
        })
    }
}
