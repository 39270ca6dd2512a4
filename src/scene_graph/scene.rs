use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;
use log::warn;
use std::collections::{HashMap, HashSet};

use crate::math::Aabb;
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::transform::Transform;

pub struct Scene {
    pub objects: Arena<Object3D>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.len() == 0
    }

    /// Spawns every root node of a glTF 2 scene. `mesh_bounds` maps mesh
    /// index to the local bounds computed by the loader. A node reached a
    /// second time, through a cycle or a shared child, is skipped.
    pub fn spawn_gltf_scene(
        &mut self,
        scene: &gltf::Scene,
        mesh_bounds: &HashMap<usize, Aabb>,
    ) -> Vec<ObjectId> {
        let mut roots = Vec::new();
        let mut visited = HashSet::new();
        let mut pending: Vec<(gltf::Node<'_>, Option<ObjectId>)> =
            scene.nodes().map(|node| (node, None)).collect();
        pending.reverse();

        while let Some((node, parent)) = pending.pop() {
            if !visited.insert(node.index()) {
                warn!("Node {} appears more than once in the hierarchy, ignoring repeat", node.index());
                continue;
            }

            let object_id = self.add_object(Self::gltf_object(&node, mesh_bounds));
            match parent {
                Some(parent_id) => self.set_object_parent(object_id, Some(parent_id)),
                None => roots.push(object_id),
            }

            let first_child = pending.len();
            pending.extend(node.children().map(|child| (child, Some(object_id))));
            pending[first_child..].reverse();
        }

        roots
    }

    fn gltf_object(node: &gltf::Node<'_>, mesh_bounds: &HashMap<usize, Aabb>) -> Object3D {
        let node_name = node
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("Node {}", node.index()));
        let (translation, rotation, scale) = node.transform().decomposed();

        let mut object = Object3D::named(
            node_name,
            Transform::from_trs(
                translation.into(),
                Quat::from_array(rotation),
                scale.into(),
            ),
        );

        if let Some(bounds) = node
            .mesh()
            .and_then(|mesh| mesh_bounds.get(&mesh.index()))
        {
            object.local_bounds = *bounds;
        }

        object
    }

    /// Updates all object transforms in hierarchical order
    fn update_transforms(&self) {
        let mut pending: Vec<(ObjectId, Mat4)> = self
            .objects
            .iter()
            .filter(|(_, object)| object.parent_id.is_none())
            .map(|(id, _)| (id, Mat4::IDENTITY))
            .collect();

        while let Some((object_id, parent_world_matrix)) = pending.pop() {
            let Some(object) = self.objects.get(object_id) else {
                continue;
            };

            if object.transform.is_world_dirty() {
                let local_matrix = *object.transform.get_local_matrix();
                object
                    .transform
                    .set_world_matrix(parent_world_matrix * local_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            pending.extend(object.child_ids.iter().map(|&child_id| (child_id, world_matrix)));
        }
    }

    /// Invalidates world transforms for an object and all its descendants
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        let mut pending = vec![object_id];

        while let Some(object_id) = pending.pop() {
            if let Some(object) = self.objects.get(object_id) {
                object.transform.invalidate_world();
                pending.extend_from_slice(&object.child_ids);
            }
        }
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(child) = self.objects.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn set_object_transform(
        &mut self,
        object_id: ObjectId,
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_transform(translation, rotation, scale);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    /// World-space bounds of every mesh in the scene. Empty if no node
    /// carries geometry.
    pub fn world_bounds(&self) -> Aabb {
        self.update_transforms();

        self.objects
            .iter()
            .filter(|(_, object)| !object.local_bounds.is_empty())
            .fold(Aabb::empty(), |bounds, (_, object)| {
                let world_matrix = *object.transform.get_world_matrix();
                bounds.union(&object.local_bounds.transformed(&world_matrix))
            })
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
