/// Buffer trait and descriptors for GPU vertex/index storage

use bytemuck::Pod;

/// GPU buffer resource
///
/// Geometry buffers are uploaded once at node creation and never rewritten.
pub trait Buffer: Send + Sync {
    fn label(&self) -> &str;
    fn size(&self) -> u64;
    fn usage(&self) -> BufferUsage;
}

/// Buffer usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Per-vertex attribute stream (positions, normals, texture coordinates)
    Vertex,
    /// Triangle index list
    Index,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    pub label: String,
    pub usage: BufferUsage,
}

impl BufferDesc {
    pub fn vertex(label: impl Into<String>) -> Self {
        Self { label: label.into(), usage: BufferUsage::Vertex }
    }

    pub fn index(label: impl Into<String>) -> Self {
        Self { label: label.into(), usage: BufferUsage::Index }
    }
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    pub fn size_bytes(self) -> u64 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Primitive assembly used by indexed draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    TriangleList,
    /// Wireframe rendering reuses the triangle index buffer as line pairs
    LineList,
}

/// Reinterpret a slice of plain vertex data as raw bytes for upload
pub fn as_bytes<T: Pod>(data: &[T]) -> &[u8] {
    bytemuck::cast_slice(data)
}
