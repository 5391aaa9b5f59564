//! Octagon vertex data and its GPU upload
//!
//! The octagon outline is a fixed payload of 8 vertices with 3 float
//! components each. It is uploaded once and never modified.

use wgpu::util::DeviceExt;

use crate::frame::{DrawCall, Topology};

/// Octagon outline in the XY plane, starting at a corner
#[rustfmt::skip]
pub const OCTAGON_POSITIONS: [f32; 24] = [
    0.0,   0.0,   0.0,
    1.0,   1.0,   0.0,
    2.25,  1.0,   0.0,
    3.25,  0.0,   0.0,
    3.25, -1.25,  0.0,
    2.25, -2.25,  0.0,
    1.0,  -2.25,  0.0,
    0.0,  -1.25,  0.0,
];

/// Floats per octagon vertex
pub const OCTAGON_ITEM_SIZE: u32 = 3;

/// CPU-side description of a static vertex buffer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexData {
    positions: &'static [f32],
    item_size: u32,
}

impl VertexData {
    /// Wrap a flat position array with `item_size` floats per vertex
    pub fn new(positions: &'static [f32], item_size: u32) -> Self {
        debug_assert!(item_size > 0 && positions.len() % item_size as usize == 0);
        Self { positions, item_size }
    }

    /// The octagon outline
    pub fn octagon() -> Self {
        Self::new(&OCTAGON_POSITIONS, OCTAGON_ITEM_SIZE)
    }

    /// Flat positions
    pub fn positions(&self) -> &'static [f32] {
        self.positions
    }

    /// Floats per vertex
    pub fn item_size(&self) -> u32 {
        self.item_size
    }

    /// Number of vertices
    pub fn item_count(&self) -> u32 {
        self.positions.len() as u32 / self.item_size
    }

    /// Bytes between consecutive vertices
    pub fn stride(&self) -> u64 {
        self.item_size as u64 * std::mem::size_of::<f32>() as u64
    }

    /// Raw bytes as uploaded to the GPU
    pub fn as_bytes(&self) -> &'static [u8] {
        bytemuck::cast_slice(self.positions)
    }

    /// Vertex `index` as a slice of `item_size` floats
    pub fn vertex(&self, index: u32) -> &'static [f32] {
        let start = (index * self.item_size) as usize;
        &self.positions[start..start + self.item_size as usize]
    }
}

/// Expand a triangle fan over `count` vertices into triangle-list indices.
///
/// Every triangle shares vertex 0: (0, 1, 2), (0, 2, 3), ...
pub fn fan_indices(count: u32) -> Vec<u16> {
    if count < 3 {
        return Vec::new();
    }
    (1..count - 1)
        .flat_map(|i| [0, i as u16, (i + 1) as u16])
        .collect()
}

/// Indices needed to draw `draw` from a mesh holding `mesh_vertices` vertices
///
/// `None` when the draw reaches past the end of the mesh.
pub fn draw_index_count(draw: DrawCall, mesh_vertices: u32) -> Option<u32> {
    let end = draw.first_vertex.checked_add(draw.vertex_count)?;
    if end > mesh_vertices {
        return None;
    }
    match draw.topology {
        Topology::TriangleFan => Some(draw.vertex_count.saturating_sub(2) * 3),
    }
}

/// Vertex data uploaded to the GPU
///
/// wgpu has no fan topology, so the mesh also carries an index buffer that
/// replays the logical topology as a triangle list.
pub struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    vertex_count: u32,
}

impl GpuMesh {
    /// Allocate the buffers and upload `data` once
    pub fn upload(device: &wgpu::Device, data: &VertexData, topology: Topology) -> Self {
        // No COPY_DST: the contents are fixed after creation
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Octagon Vertex Buffer"),
            contents: data.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let indices = match topology {
            Topology::TriangleFan => fan_indices(data.item_count()),
        };
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Octagon Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::info!(
            "Uploaded {} vertices ({} floats each) as {} {:?} indices",
            data.item_count(),
            data.item_size(),
            indices.len(),
            topology
        );

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            vertex_count: data.item_count(),
        }
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}
