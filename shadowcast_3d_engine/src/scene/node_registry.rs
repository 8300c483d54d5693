/// Registry owning every drawable node of a scene
///
/// Nodes live in a `SlotMap` and are iterated in creation order, which is the
/// draw order of every pass. Transform mutators work in place on the stored
/// world matrix: nothing is allocated after the node has been created.
///
/// Mutators on an unknown handle panic. Handles only come from
/// `create_node`, so an unknown handle is a programming error.

use glam::{Mat4, Vec3, Vec4};
use slotmap::SlotMap;
use crate::error::Result;
use crate::graphics_device::GraphicsDevice;
use crate::scene::{GeometryData, GpuGeometry, Node, NodeKey, TextureKey};

#[derive(Default)]
pub struct NodeRegistry {
    nodes: SlotMap<NodeKey, Node>,
    order: Vec<NodeKey>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload `geometry` and register a node with an identity world matrix
    pub fn create_node(
        &mut self,
        device: &mut dyn GraphicsDevice,
        name: &str,
        geometry: &GeometryData,
        color: Vec4,
    ) -> Result<NodeKey> {
        let geometry = GpuGeometry::upload(device, name, geometry)?;
        let key = self.nodes.insert(Node {
            name: name.to_string(),
            world: Mat4::IDENTITY,
            color,
            geometry,
            texture: None,
            parent: None,
            children: Vec::new(),
        });
        self.order.push(key);
        Ok(key)
    }

    fn node_mut(&mut self, key: NodeKey) -> &mut Node {
        match self.nodes.get_mut(key) {
            Some(node) => node,
            None => panic!("NodeRegistry: unknown node handle {:?}", key),
        }
    }

    /// # Panics
    ///
    /// If `key` was not returned by this registry.
    pub fn node(&self, key: NodeKey) -> &Node {
        match self.nodes.get(key) {
            Some(node) => node,
            None => panic!("NodeRegistry: unknown node handle {:?}", key),
        }
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Nodes in draw order
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.order.iter().filter_map(|&key| self.nodes.get(key).map(|node| (key, node)))
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeKey> {
        self.iter().find(|(_, node)| node.name == name).map(|(key, _)| key)
    }

    // ===== TRANSFORMS =====

    /// Post-multiply a translation: the offset is expressed in the node's local frame
    pub fn translate(&mut self, key: NodeKey, offset: Vec3) {
        let node = self.node_mut(key);
        node.world *= Mat4::from_translation(offset);
    }

    /// Post-multiply a rotation of `angle` radians about `axis` (local frame)
    ///
    /// A zero or non-finite axis is treated as no rotation.
    pub fn rotate_axis(&mut self, key: NodeKey, angle: f32, axis: Vec3) {
        let node = self.node_mut(key);
        node.world *= axis_rotation(angle, axis);
    }

    pub fn rotate_y(&mut self, key: NodeKey, angle: f32) {
        let node = self.node_mut(key);
        node.world *= Mat4::from_rotation_y(angle);
    }

    /// Replace the whole world matrix by a pure rotation (translation is discarded)
    pub fn set_rotation(&mut self, key: NodeKey, angle: f32, axis: Vec3) {
        let node = self.node_mut(key);
        node.world = axis_rotation(angle, axis);
    }

    /// Overwrite the translation column, keeping rotation and scale
    pub fn set_translation(&mut self, key: NodeKey, translation: Vec3) {
        let node = self.node_mut(key);
        node.world.w_axis = translation.extend(1.0);
    }

    /// Overwrite one component (0 = x, 1 = y, 2 = z) of the translation column
    pub fn set_translation_component(&mut self, key: NodeKey, component: usize, value: f32) {
        let node = self.node_mut(key);
        node.world.w_axis[component] = value;
    }

    pub fn translation(&self, key: NodeKey) -> Vec3 {
        self.node(key).world.w_axis.truncate()
    }

    pub fn world(&self, key: NodeKey) -> &Mat4 {
        &self.node(key).world
    }

    // ===== APPEARANCE =====

    pub fn set_color(&mut self, key: NodeKey, color: Vec4) {
        self.node_mut(key).color = color;
    }

    pub fn set_texture(&mut self, key: NodeKey, texture: Option<TextureKey>) {
        self.node_mut(key).texture = texture;
    }

    // ===== GROUPING =====

    /// Record `children` as organizational children of `parent`
    ///
    /// Metadata only: a child's world matrix is never composed with its
    /// parent's. A child already grouped elsewhere is moved.
    pub fn group(&mut self, parent: NodeKey, children: &[NodeKey]) {
        assert!(self.contains(parent), "NodeRegistry: unknown node handle {:?}", parent);
        for &child in children {
            if child == parent {
                panic!("NodeRegistry: node {:?} cannot be its own parent", parent);
            }
            if let Some(previous) = self.node_mut(child).parent.replace(parent) {
                self.node_mut(previous).children.retain(|&c| c != child);
            }
            let siblings = &mut self.node_mut(parent).children;
            if !siblings.contains(&child) {
                siblings.push(child);
            }
        }
    }
}

fn axis_rotation(angle: f32, axis: Vec3) -> Mat4 {
    match axis.try_normalize() {
        Some(axis) => Mat4::from_axis_angle(axis, angle),
        None => Mat4::IDENTITY,
    }
}

#[cfg(test)]
#[path = "node_registry_tests.rs"]
mod tests;
