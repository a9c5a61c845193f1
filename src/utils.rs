use wgpu::util::DeviceExt;
use bytemuck::{NoUninit};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    /// Append an axis-aligned box with flat per-face normals (CCW, outward).
    pub fn push_box(&mut self, min: [f32; 3], max: [f32; 3], color: [f32; 4]) {
        let [x0, y0, z0] = min;
        let [x1, y1, z1] = max;
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[x0, y0, z1], [x1, y0, z1], [x1, y1, z1], [x0, y1, z1]]),
            ([0.0, 0.0, -1.0], [[x1, y0, z0], [x0, y0, z0], [x0, y1, z0], [x1, y1, z0]]),
            ([1.0, 0.0, 0.0], [[x1, y0, z1], [x1, y0, z0], [x1, y1, z0], [x1, y1, z1]]),
            ([-1.0, 0.0, 0.0], [[x0, y0, z0], [x0, y0, z1], [x0, y1, z1], [x0, y1, z0]]),
            ([0.0, 1.0, 0.0], [[x0, y1, z1], [x1, y1, z1], [x1, y1, z0], [x0, y1, z0]]),
            ([0.0, -1.0, 0.0], [[x0, y0, z0], [x1, y0, z0], [x1, y0, z1], [x0, y0, z1]]),
        ];
        for (normal, corners) in faces {
            self.push_quad(corners, normal, color);
        }
    }

    fn push_quad(&mut self, corners: [[f32; 3]; 4], normal: [f32; 3], color: [f32; 4]) {
        let base = self.vertices.len() as u32;
        for pos in corners {
            self.vertices.push(Vertex { pos, normal, color });
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {

        let vertices = bytemuck::cast_slice(&self.vertices);
        let indices = bytemuck::cast_slice(&self.indices);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: indices,
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// Checkerboard ground plane at y = 0, centred on the origin.
pub fn create_ground_mesh(half_extent: i32, tile: f32) -> Mesh {
    let light = [0.42, 0.62, 0.35, 1.0];
    let dark = [0.36, 0.55, 0.30, 1.0];
    let up = [0.0, 1.0, 0.0];

    let mut mesh = Mesh::empty();
    for ix in -half_extent..half_extent {
        for iz in -half_extent..half_extent {
            let x0 = ix as f32 * tile;
            let z0 = iz as f32 * tile;
            let (x1, z1) = (x0 + tile, z0 + tile);
            let color = if (ix + iz).rem_euclid(2) == 0 { light } else { dark };
            mesh.push_quad([[x0, 0.0, z1], [x1, 0.0, z1], [x1, 0.0, z0], [x0, 0.0, z0]], up, color);
        }
    }
    mesh
}

/// Blocky stand-in character: feet at the origin, facing +Z.
pub fn create_character_mesh() -> Mesh {
    let body = [0.25, 0.45, 0.85, 1.0];
    let skin = [0.95, 0.80, 0.65, 1.0];
    let boots = [0.20, 0.15, 0.10, 1.0];

    let mut mesh = Mesh::empty();
    mesh.push_box([-0.25, 0.0, -0.15], [-0.05, 0.7, 0.15], boots);
    mesh.push_box([0.05, 0.0, -0.15], [0.25, 0.7, 0.15], boots);
    mesh.push_box([-0.3, 0.7, -0.2], [0.3, 1.4, 0.2], body);
    mesh.push_box([-0.2, 1.4, -0.2], [0.2, 1.8, 0.2], skin);
    // nose marks the facing direction
    mesh.push_box([-0.05, 1.55, 0.2], [0.05, 1.65, 0.3], skin);
    mesh
}
