/// Node geometry: CPU-side records and their one-time GPU upload

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{as_bytes, Buffer, BufferDesc, GraphicsDevice, IndexType};

/// Triangle mesh as delivered by the scene description
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub indices: Vec<[u16; 3]>,
}

impl GeometryData {
    /// Check stream lengths and index bounds
    ///
    /// # Errors
    ///
    /// `ResourceLoad` naming `source` when the record is malformed.
    pub fn validate(&self, source: &str) -> Result<()> {
        let malformed = |reason: String| Error::resource_load(source, reason);

        if self.positions.is_empty() || self.indices.is_empty() {
            return Err(malformed("geometry has no vertices or no faces".to_string()));
        }
        if self.positions.len() > u16::MAX as usize + 1 {
            return Err(malformed(format!(
                "{} vertices exceed 16-bit indexing",
                self.positions.len()
            )));
        }
        if self.normals.len() != self.positions.len() {
            return Err(malformed(format!(
                "{} normals for {} positions",
                self.normals.len(),
                self.positions.len()
            )));
        }
        if let Some(tex_coords) = &self.tex_coords {
            if tex_coords.len() != self.positions.len() {
                return Err(malformed(format!(
                    "{} texture coordinates for {} positions",
                    tex_coords.len(),
                    self.positions.len()
                )));
            }
        }
        let vertex_count = self.positions.len();
        if let Some(index) = self.indices.iter().flatten().find(|&&i| i as usize >= vertex_count) {
            return Err(malformed(format!("index {} out of range ({} vertices)", index, vertex_count)));
        }
        Ok(())
    }

    pub fn index_count(&self) -> u32 {
        (self.indices.len() * 3) as u32
    }

    /// Axis-aligned box centered on the origin, with per-face normals and UVs
    pub fn cuboid(half_x: f32, half_y: f32, half_z: f32) -> Self {
        // (normal, u axis, v axis) per face
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        let half = [half_x, half_y, half_z];
        let mut geometry = GeometryData {
            tex_coords: Some(Vec::with_capacity(24)),
            ..Default::default()
        };

        for (face, (normal, u, v)) in faces.iter().enumerate() {
            let base = (face * 4) as u16;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = std::array::from_fn(|axis| {
                    (normal[axis] + u[axis] * su + v[axis] * sv) * half[axis]
                });
                geometry.positions.push(position);
                geometry.normals.push(*normal);
                if let Some(tex_coords) = geometry.tex_coords.as_mut() {
                    tex_coords.push([(su + 1.0) * 0.5, (sv + 1.0) * 0.5]);
                }
            }
            geometry.indices.push([base, base + 1, base + 2]);
            geometry.indices.push([base, base + 2, base + 3]);
        }
        geometry
    }
}

/// GPU buffers of one node; written once, never modified
#[derive(Clone)]
pub struct GpuGeometry {
    pub positions: Arc<dyn Buffer>,
    pub normals: Arc<dyn Buffer>,
    pub tex_coords: Option<Arc<dyn Buffer>>,
    pub indices: Arc<dyn Buffer>,
    pub index_count: u32,
    pub index_type: IndexType,
}

impl GpuGeometry {
    pub fn upload(device: &mut dyn GraphicsDevice, name: &str, data: &GeometryData) -> Result<Self> {
        data.validate(name)?;

        let positions = device.create_buffer(
            BufferDesc::vertex(format!("{}.positions", name)),
            as_bytes(&data.positions),
        )?;
        let normals = device.create_buffer(
            BufferDesc::vertex(format!("{}.normals", name)),
            as_bytes(&data.normals),
        )?;
        let tex_coords = match &data.tex_coords {
            Some(tex_coords) => Some(device.create_buffer(
                BufferDesc::vertex(format!("{}.tex_coords", name)),
                as_bytes(tex_coords),
            )?),
            None => None,
        };
        let indices = device.create_buffer(
            BufferDesc::index(format!("{}.indices", name)),
            as_bytes(&data.indices),
        )?;

        Ok(Self {
            positions,
            normals,
            tex_coords,
            indices,
            index_count: data.index_count(),
            index_type: IndexType::U16,
        })
    }
}

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
