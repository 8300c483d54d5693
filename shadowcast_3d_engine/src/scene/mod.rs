//! Scene content: geometry, the node registry, semantic roles and texture slots

mod geometry;
mod node;
mod node_registry;
mod scene_description;
mod scene_role;
mod texture_slots;

pub use geometry::{GeometryData, GpuGeometry};
pub use node::{Node, NodeKey};
pub use node_registry::NodeRegistry;
pub use scene_description::{NodeRecord, SceneDescription};
pub use scene_role::{match_roles, RoleMap, RoleSpec, SceneRole, ROLE_GROUPS, ROLE_TABLE};
pub use texture_slots::{TextureKey, TextureSlots, PLACEHOLDER_RGBA, WHITE_RGBA};
