/// Semantic roles of the scene layout
///
/// Each role is matched by exact name against the scene description. The role
/// table lists every role once, in draw order, with its base color and
/// optional texture; the group table records organizational hierarchies.
/// Several roles may share one source record (both light anchors use the
/// light bulb mesh), each getting its own node.

use glam::Vec4;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::graphics_device::GraphicsDevice;
use crate::scene::{NodeKey, NodeRecord, NodeRegistry, SceneDescription, TextureSlots};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneRole {
    PointLightAnchor,
    SpotLightAnchor,
    Walls,
    Drone,
    DroneRotorRight,
    DroneRotorLeft,
    DroneRotorRight2,
    DroneRotorLeft2,
    Monster,
    MonsterRightHand,
    MonsterLeftHand,
    MonsterLeftLeg,
    MonsterRightLeg,
    MonsterHead,
    MonsterEyes,
    Bike,
    BikeFrontWheel,
    BikeRearWheel,
    Tree1,
    Tree2,
    Tree3,
    Rock1,
    Rock2,
    Rock3,
    Rock4,
    Rock5,
    Rock6,
    Rock7,
    Chair,
    Floor,
    Mountain1,
    Mountain2,
    Mountain3,
}

impl SceneRole {
    /// Name of the scene-description record this role is built from
    pub fn source_name(self) -> &'static str {
        match self {
            SceneRole::PointLightAnchor | SceneRole::SpotLightAnchor => "LightBulb",
            SceneRole::Walls => "Room",
            SceneRole::Drone => "Drone",
            SceneRole::DroneRotorRight => "RotorRDrone",
            SceneRole::DroneRotorLeft => "RotorLDrone",
            SceneRole::DroneRotorRight2 => "RotorR2Drone",
            SceneRole::DroneRotorLeft2 => "RotorL2Drone",
            SceneRole::Monster => "Monster",
            SceneRole::MonsterRightHand => "RightHandMonster",
            SceneRole::MonsterLeftHand => "LeftHandMonster",
            SceneRole::MonsterLeftLeg => "LeftLegMonster",
            SceneRole::MonsterRightLeg => "RightLegMonster",
            SceneRole::MonsterHead => "HeadMonster",
            SceneRole::MonsterEyes => "EyesMonster",
            SceneRole::Bike => "Bike",
            SceneRole::BikeFrontWheel => "FrontWheelBike",
            SceneRole::BikeRearWheel => "RearWheelBike",
            SceneRole::Tree1 => "Tree1",
            SceneRole::Tree2 => "Tree2",
            SceneRole::Tree3 => "Tree3",
            SceneRole::Rock1 => "Rock1",
            SceneRole::Rock2 => "Rock2",
            SceneRole::Rock3 => "Rock3",
            SceneRole::Rock4 => "Rock4",
            SceneRole::Rock5 => "Rock5",
            SceneRole::Rock6 => "Rock6",
            SceneRole::Rock7 => "Rock7",
            SceneRole::Chair => "Chair",
            SceneRole::Floor => "Floor",
            SceneRole::Mountain1 => "Mountain",
            SceneRole::Mountain2 => "Mountain.001",
            SceneRole::Mountain3 => "Mountain.002",
        }
    }
}

/// Appearance of one role
#[derive(Debug, Clone, Copy)]
pub struct RoleSpec {
    pub role: SceneRole,
    pub color: [f32; 4],
    /// Texture slot name; the record must carry texture coordinates
    pub texture: Option<&'static str>,
}

const fn flat(role: SceneRole, color: [f32; 4]) -> RoleSpec {
    RoleSpec { role, color, texture: None }
}

const EMISSIVE: [f32; 4] = [4.0, 4.0, 4.0, 1.0];
const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const STONE: [f32; 4] = [0.4, 0.4, 0.4, 1.0];
const WOOD: [f32; 4] = [0.8, 0.6, 0.2, 1.0];
const RUBBER: [f32; 4] = [0.2, 0.2, 0.2, 1.0];
const FOLIAGE: [f32; 4] = [0.0, 1.0, 0.0, 1.0];

/// Every role, in draw order
pub const ROLE_TABLE: [RoleSpec; 33] = [
    flat(SceneRole::PointLightAnchor, EMISSIVE),
    flat(SceneRole::SpotLightAnchor, EMISSIVE),
    flat(SceneRole::Walls, [0.3, 0.3, 0.3, 1.0]),
    flat(SceneRole::Drone, WHITE),
    flat(SceneRole::DroneRotorRight, WHITE),
    flat(SceneRole::DroneRotorLeft, WHITE),
    flat(SceneRole::DroneRotorRight2, WHITE),
    flat(SceneRole::DroneRotorLeft2, WHITE),
    flat(SceneRole::Monster, STONE),
    flat(SceneRole::MonsterRightHand, STONE),
    flat(SceneRole::MonsterLeftHand, STONE),
    flat(SceneRole::MonsterLeftLeg, STONE),
    flat(SceneRole::MonsterRightLeg, STONE),
    flat(SceneRole::MonsterHead, STONE),
    flat(SceneRole::MonsterEyes, [1.0, 0.0, 0.0, 1.0]),
    flat(SceneRole::Bike, WOOD),
    flat(SceneRole::BikeFrontWheel, RUBBER),
    flat(SceneRole::BikeRearWheel, RUBBER),
    flat(SceneRole::Tree1, FOLIAGE),
    flat(SceneRole::Tree2, FOLIAGE),
    flat(SceneRole::Tree3, FOLIAGE),
    flat(SceneRole::Rock1, WHITE),
    flat(SceneRole::Rock2, WHITE),
    flat(SceneRole::Rock3, WHITE),
    flat(SceneRole::Rock4, WHITE),
    flat(SceneRole::Rock5, WHITE),
    flat(SceneRole::Rock6, WHITE),
    flat(SceneRole::Rock7, WHITE),
    RoleSpec { role: SceneRole::Chair, color: WOOD, texture: Some("bricks") },
    flat(SceneRole::Floor, WHITE),
    flat(SceneRole::Mountain1, WHITE),
    flat(SceneRole::Mountain2, WHITE),
    flat(SceneRole::Mountain3, WHITE),
];

/// Organizational parent → children
pub const ROLE_GROUPS: [(SceneRole, &[SceneRole]); 4] = [
    (SceneRole::Bike, &[SceneRole::BikeFrontWheel, SceneRole::BikeRearWheel]),
    (SceneRole::MonsterHead, &[SceneRole::MonsterEyes]),
    (
        SceneRole::Monster,
        &[
            SceneRole::MonsterHead,
            SceneRole::MonsterRightLeg,
            SceneRole::MonsterLeftLeg,
            SceneRole::MonsterRightHand,
            SceneRole::MonsterLeftHand,
        ],
    ),
    (
        SceneRole::Drone,
        &[
            SceneRole::DroneRotorLeft,
            SceneRole::DroneRotorLeft2,
            SceneRole::DroneRotorRight,
            SceneRole::DroneRotorRight2,
        ],
    ),
];

/// Match every role against `description` without touching the GPU
///
/// # Errors
///
/// `SceneIntegrity` for the first role, in table order, whose record is absent.
pub fn match_roles(description: &SceneDescription) -> Result<Vec<(RoleSpec, &NodeRecord)>> {
    ROLE_TABLE.iter()
        .map(|spec| {
            description.find(spec.role.source_name())
                .map(|record| (*spec, record))
                .ok_or(Error::SceneIntegrity { role: spec.role })
        })
        .collect()
}

/// Role → node handle, filled once at load
#[derive(Debug, Clone, Default)]
pub struct RoleMap {
    nodes: FxHashMap<SceneRole, NodeKey>,
}

impl RoleMap {
    pub fn get(&self, role: SceneRole) -> Option<NodeKey> {
        self.nodes.get(&role).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create one node per matched role, assign textures and record groups
    ///
    /// A textured role whose record lacks texture coordinates falls back to
    /// its flat color.
    pub fn instantiate(
        matched: &[(RoleSpec, &NodeRecord)],
        registry: &mut NodeRegistry,
        textures: &mut TextureSlots,
        device: &mut dyn GraphicsDevice,
    ) -> Result<Self> {
        let mut map = RoleMap::default();
        for (spec, record) in matched {
            let key = registry.create_node(
                device,
                &record.name,
                &record.geometry,
                Vec4::from_array(spec.color),
            )?;
            if let Some(texture_name) = spec.texture {
                if record.geometry.tex_coords.is_some() {
                    let texture = textures.reserve(device, texture_name)?;
                    registry.set_texture(key, Some(texture));
                } else {
                    crate::engine_warn!(
                        "shadowcast3d::SceneRole",
                        "Node '{}' has no texture coordinates, '{}' not applied",
                        record.name,
                        texture_name
                    );
                }
            }
            map.nodes.insert(spec.role, key);
        }

        for (parent, children) in ROLE_GROUPS.iter() {
            let Some(parent_key) = map.get(*parent) else { continue };
            let child_keys: Vec<NodeKey> = children.iter().filter_map(|&child| map.get(child)).collect();
            registry.group(parent_key, &child_keys);
        }
        Ok(map)
    }
}

#[cfg(test)]
#[path = "scene_role_tests.rs"]
mod tests;
