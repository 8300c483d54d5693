/// Flat scene description handed over by the asset source

use crate::scene::GeometryData;

/// One named mesh record
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub name: String,
    pub geometry: GeometryData,
}

/// Every mesh record of a scene file, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDescription {
    pub nodes: Vec<NodeRecord>,
}

/// (record name, center, half extents) of the built-in block-out layout
const PROCEDURAL_LAYOUT: [(&str, [f32; 3], [f32; 3]); 32] = [
    ("LightBulb", [0.0, 0.0, 0.0], [0.1, 0.1, 0.1]),
    ("Room", [0.0, 2.0, 0.0], [8.0, 4.0, 8.0]),
    ("Drone", [0.0, 1.2, 0.0], [0.3, 0.08, 0.3]),
    ("RotorRDrone", [0.3, 1.3, -0.3], [0.12, 0.01, 0.03]),
    ("RotorLDrone", [-0.3, 1.3, -0.3], [0.12, 0.01, 0.03]),
    ("RotorR2Drone", [0.3, 1.3, 0.3], [0.12, 0.01, 0.03]),
    ("RotorL2Drone", [-0.3, 1.3, 0.3], [0.12, 0.01, 0.03]),
    ("Monster", [2.5, 1.0, -2.0], [0.4, 0.5, 0.3]),
    ("RightHandMonster", [3.0, 1.1, -2.0], [0.1, 0.35, 0.1]),
    ("LeftHandMonster", [2.0, 1.1, -2.0], [0.1, 0.35, 0.1]),
    ("LeftLegMonster", [2.3, 0.3, -2.0], [0.12, 0.3, 0.12]),
    ("RightLegMonster", [2.7, 0.3, -2.0], [0.12, 0.3, 0.12]),
    ("HeadMonster", [2.5, 1.8, -2.0], [0.25, 0.25, 0.25]),
    ("EyesMonster", [2.5, 1.85, -1.74], [0.15, 0.04, 0.02]),
    ("Bike", [-2.5, 0.6, -1.5], [0.8, 0.2, 0.1]),
    ("FrontWheelBike", [-1.8, 0.35, -1.5], [0.35, 0.35, 0.05]),
    ("RearWheelBike", [-3.2, 0.35, -1.5], [0.35, 0.35, 0.05]),
    ("Tree1", [-5.0, 1.5, -5.0], [0.4, 1.5, 0.4]),
    ("Tree2", [5.0, 1.5, -5.0], [0.4, 1.5, 0.4]),
    ("Tree3", [-5.0, 1.5, 5.0], [0.4, 1.5, 0.4]),
    ("Rock1", [1.0, 0.15, 3.0], [0.3, 0.15, 0.25]),
    ("Rock2", [-1.5, 0.2, 2.5], [0.35, 0.2, 0.3]),
    ("Rock3", [3.5, 0.1, 1.0], [0.2, 0.1, 0.2]),
    ("Rock4", [-3.5, 0.15, 0.5], [0.25, 0.15, 0.3]),
    ("Rock5", [0.5, 0.1, -4.0], [0.2, 0.1, 0.15]),
    ("Rock6", [4.5, 0.2, 4.0], [0.4, 0.2, 0.3]),
    ("Rock7", [-4.0, 0.1, -3.0], [0.15, 0.1, 0.15]),
    ("Chair", [1.0, 0.5, 1.0], [0.3, 0.5, 0.3]),
    ("Floor", [0.0, -0.05, 0.0], [8.0, 0.05, 8.0]),
    ("Mountain", [0.0, 3.0, -7.0], [3.0, 3.0, 0.8]),
    ("Mountain.001", [-6.0, 2.0, -7.0], [2.0, 2.0, 0.8]),
    ("Mountain.002", [6.0, 2.5, -7.0], [2.5, 2.5, 0.8]),
];

impl SceneDescription {
    pub fn find(&self, name: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|record| record.name == name)
    }

    pub fn push(&mut self, name: impl Into<String>, geometry: GeometryData) {
        self.nodes.push(NodeRecord { name: name.into(), geometry });
    }

    /// Remove a record by name, returning it
    pub fn remove(&mut self, name: &str) -> Option<NodeRecord> {
        let index = self.nodes.iter().position(|record| record.name == name)?;
        Some(self.nodes.remove(index))
    }

    /// Block-out scene with one box per record name of the standard layout
    pub fn procedural() -> Self {
        let mut description = SceneDescription::default();
        for (name, center, half) in PROCEDURAL_LAYOUT {
            let mut geometry = GeometryData::cuboid(half[0], half[1], half[2]);
            for position in geometry.positions.iter_mut() {
                for axis in 0..3 {
                    position[axis] += center[axis];
                }
            }
            description.push(name, geometry);
        }
        description
    }
}
