/// Six-face shadow frustum of an omnidirectional light

use glam::{Mat4, Vec3};
use crate::camera::{Camera, ClipRange, Projection};
use crate::error::Result;

/// Cube map face, in layer order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Texture layer of this face
    pub fn layer(self) -> u32 {
        self as u32
    }

    /// Viewing direction from the light
    pub fn direction(self) -> Vec3 {
        match self {
            CubeFace::PositiveX => Vec3::X,
            CubeFace::NegativeX => Vec3::NEG_X,
            CubeFace::PositiveY => Vec3::Y,
            CubeFace::NegativeY => Vec3::NEG_Y,
            CubeFace::PositiveZ => Vec3::Z,
            CubeFace::NegativeZ => Vec3::NEG_Z,
        }
    }

    /// Up vector matching the cube map sampling convention
    pub fn up(self) -> Vec3 {
        match self {
            CubeFace::PositiveY => Vec3::Z,
            CubeFace::NegativeY => Vec3::NEG_Z,
            _ => Vec3::NEG_Y,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CubeFace::PositiveX => "+X",
            CubeFace::NegativeX => "-X",
            CubeFace::PositiveY => "+Y",
            CubeFace::NegativeY => "-Y",
            CubeFace::PositiveZ => "+Z",
            CubeFace::NegativeZ => "-Z",
        }
    }
}

/// Six face cameras sharing one 90° square projection
#[derive(Debug, Clone)]
pub struct OmniShadowFrustum {
    projection: Projection,
    projection_matrix: Mat4,
    cameras: [Camera; 6],
    views: [Mat4; 6],
}

impl OmniShadowFrustum {
    pub fn new(position: Vec3, clip: ClipRange) -> Result<Self> {
        clip.validate()?;
        let projection = Projection::cube_face(clip);

        let seed = CubeFace::PositiveX;
        let mut cameras = [Camera::new(position, position + seed.direction(), seed.up())?; 6];
        for face in CubeFace::ALL {
            cameras[face.layer() as usize] = Camera::new(position, position + face.direction(), face.up())?;
        }

        let mut frustum = Self {
            projection,
            projection_matrix: projection.matrix(),
            cameras,
            views: [Mat4::IDENTITY; 6],
        };
        frustum.recompute(position);
        Ok(frustum)
    }

    /// Move every face camera to `position` and rewrite the view matrices in place
    pub fn recompute(&mut self, position: Vec3) {
        for (camera, view) in self.cameras.iter_mut().zip(self.views.iter_mut()) {
            camera.set_position(position);
            camera.view_matrix_into(view);
        }
    }

    pub fn view(&self, face: CubeFace) -> &Mat4 {
        &self.views[face.layer() as usize]
    }

    pub fn camera(&self, face: CubeFace) -> &Camera {
        &self.cameras[face.layer() as usize]
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    pub fn clip_near_far(&self) -> [f32; 2] {
        self.projection.clip_near_far()
    }
}
