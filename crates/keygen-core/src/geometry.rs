//! STL decoding into a flat triangle soup
//!
//! Positions and normals are expanded per vertex (three per triangle) with
//! the facet normal repeated, which is the layout a flat-shaded mesh needs.

use std::io::Cursor;

use crate::error::ModelError;

/// Axis-aligned bounds of a geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }
}

/// Decoded key geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
}

impl KeyGeometry {
    /// Decode a binary or ASCII STL file
    pub fn from_stl(bytes: &[u8]) -> Result<Self, ModelError> {
        let mut reader = Cursor::new(bytes);
        let mesh = stl_io::read_stl(&mut reader).map_err(|e| ModelError::Decode(e.to_string()))?;

        if mesh.faces.is_empty() {
            return Err(ModelError::Empty);
        }

        let mut positions = Vec::with_capacity(mesh.faces.len() * 3);
        let mut normals = Vec::with_capacity(mesh.faces.len() * 3);

        for face in &mesh.faces {
            let mut corners = [[0.0f32; 3]; 3];
            for (corner, &index) in corners.iter_mut().zip(face.vertices.iter()) {
                let v = mesh
                    .vertices
                    .get(index)
                    .ok_or_else(|| ModelError::Decode(format!("vertex index {} out of range", index)))?;
                *corner = [v[0], v[1], v[2]];
            }

            let stored = [face.normal[0], face.normal[1], face.normal[2]];
            let normal = if length(stored) > f32::EPSILON {
                stored
            } else {
                // Some writers leave the facet normal zeroed
                facet_normal(&corners)
            };

            positions.extend_from_slice(&corners);
            normals.extend_from_slice(&[normal; 3]);
        }

        tracing::debug!("Decoded STL: {} triangles", mesh.faces.len());
        Ok(Self { positions, normals })
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = *self.positions.first()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for p in &self.positions[1..] {
            for axis in 0..3 {
                bounds.min[axis] = bounds.min[axis].min(p[axis]);
                bounds.max[axis] = bounds.max[axis].max(p[axis]);
            }
        }
        Some(bounds)
    }

    /// Translate the geometry so its bounding box is centred on the origin
    pub fn center(&mut self) {
        let Some(bounds) = self.bounds() else { return };
        let c = bounds.center();
        for p in &mut self.positions {
            p[0] -= c[0];
            p[1] -= c[1];
            p[2] -= c[2];
        }
    }

    /// Decode and recenter in one step
    pub fn centered_from_stl(bytes: &[u8]) -> Result<Self, ModelError> {
        let mut geometry = Self::from_stl(bytes)?;
        geometry.center();
        Ok(geometry)
    }
}

fn length(v: [f32; 3]) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn facet_normal(corners: &[[f32; 3]; 3]) -> [f32; 3] {
    let [a, b, c] = corners;
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let len = length(n);
    if len > f32::EPSILON {
        [n[0] / len, n[1] / len, n[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}
