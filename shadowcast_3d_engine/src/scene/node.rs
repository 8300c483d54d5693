/// Scene node: a drawable mesh instance with its world transform

use glam::{Mat4, Vec4};
use slotmap::new_key_type;
use crate::scene::{GpuGeometry, TextureKey};

new_key_type! {
    /// Stable handle of a node in a [`NodeRegistry`](crate::scene::NodeRegistry)
    pub struct NodeKey;
}

pub struct Node {
    pub(crate) name: String,
    pub(crate) world: Mat4,
    pub(crate) color: Vec4,
    pub(crate) geometry: GpuGeometry,
    pub(crate) texture: Option<TextureKey>,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world(&self) -> &Mat4 {
        &self.world
    }

    /// Base color used when the node has no texture
    pub fn color(&self) -> Vec4 {
        self.color
    }

    pub fn geometry(&self) -> &GpuGeometry {
        &self.geometry
    }

    /// Texture slot sampled by the shading pass, if the node is textured
    pub fn texture(&self) -> Option<TextureKey> {
        self.texture
    }

    /// Organizational parent; carries no transform semantics
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}
