//! CAD Kernel trait definitions
//!
//! These traits define the interface that all CAD kernels must implement.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::sketch::SketchPlane;

/// Error type for CAD kernel operations
#[derive(Debug, Clone, Error)]
pub enum CadError {
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Boolean operation failed: {0}")]
    BooleanFailed(String),

    #[error("Tessellation failed: {0}")]
    TessellationFailed(String),

    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("Solid not found: {0}")]
    SolidNotFound(Uuid),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for CAD operations
pub type CadResult<T> = Result<T, CadError>;

/// A tessellated mesh output from the CAD kernel
#[derive(Debug, Clone, Default)]
pub struct TessellatedMesh {
    /// Vertex positions (3 floats per vertex)
    pub vertices: Vec<[f32; 3]>,
    /// Vertex normals (3 floats per vertex)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (3 indices per triangle)
    pub indices: Vec<u32>,
}

impl TessellatedMesh {
    /// Create an empty tessellated mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Append another mesh, re-basing its indices
    pub fn append(&mut self, other: &TessellatedMesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }
}

/// A full circle in sketch coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle2D {
    /// Center in sketch coordinates
    pub center: Vec2,
    /// Radius (always positive)
    pub radius: f32,
}

impl Circle2D {
    /// Create a new circle
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Whether `other` lies inside this circle, allowing tangency within `tol`
    pub fn contains(&self, other: &Circle2D, tol: f32) -> bool {
        let d = self.center.distance(other.center);
        other.radius < self.radius && d + other.radius <= self.radius + tol
    }

    /// Whether the two boundaries cross (tangency within `tol` does not count)
    pub fn crosses(&self, other: &Circle2D, tol: f32) -> bool {
        let d = self.center.distance(other.center);
        d < self.radius + other.radius - tol && d > (self.radius - other.radius).abs() + tol
    }
}

/// A closed region of a sketch: one outer loop minus zero or more holes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile2D {
    /// Outer boundary
    pub outer: Circle2D,
    /// Inner boundaries, directly nested in `outer`
    pub holes: Vec<Circle2D>,
}

impl Profile2D {
    /// A solid disc profile
    pub fn disc(outer: Circle2D) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Number of boundary loops (outer plus holes)
    pub fn loop_count(&self) -> usize {
        1 + self.holes.len()
    }
}

/// A 3D solid body
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Solid {
    /// Unique identifier
    pub id: Uuid,
    /// Internal marker for kernel data (actual data stored in kernel)
    #[serde(skip)]
    has_kernel_data: bool,
}

impl Clone for Solid {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            has_kernel_data: self.has_kernel_data,
        }
    }
}

impl Solid {
    /// Create a new solid with the given ID
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            has_kernel_data: false,
        }
    }

    /// Mark that this solid has kernel data
    pub fn with_kernel_data(mut self) -> Self {
        self.has_kernel_data = true;
        self
    }

    /// Check if this solid has kernel data
    pub fn has_kernel_data(&self) -> bool {
        self.has_kernel_data
    }
}

/// Boolean operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanType {
    /// Union (add)
    Union,
    /// Subtraction (cut)
    Subtract,
    /// Intersection (common)
    Intersect,
}

/// The main CAD kernel trait
///
/// Implementations of this trait provide the actual geometry operations
/// using different backends (Truck, a recording mock, etc.)
pub trait CadKernel: Send + Sync {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;

    /// Extrude a closed profile lying on `plane`
    ///
    /// # Arguments
    /// * `profile` - The region to extrude, in sketch coordinates
    /// * `plane` - The sketch plane the profile lies on
    /// * `distance` - Signed extrusion distance along the plane normal
    fn extrude(&self, profile: &Profile2D, plane: &SketchPlane, distance: f32)
    -> CadResult<Solid>;

    /// Perform a boolean operation on two solids
    ///
    /// # Arguments
    /// * `a` - The target solid
    /// * `b` - The tool solid
    /// * `op` - The boolean operation type
    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid>;

    /// Move a solid by an offset, returning the moved solid
    fn translate(&self, solid: &Solid, offset: Vec3) -> CadResult<Solid>;

    /// Tessellate a solid into triangles
    ///
    /// # Arguments
    /// * `solid` - The solid to tessellate
    /// * `tolerance` - The tessellation tolerance (lower = more triangles)
    fn tessellate(&self, solid: &Solid, tolerance: f32) -> CadResult<TessellatedMesh>;

    /// Drop the kernel data behind a solid that is no longer referenced
    ///
    /// Unknown solids are ignored.
    fn release(&self, solid: &Solid);
}

/// A null kernel that always returns errors (used when no kernel is available)
#[derive(Debug, Default)]
pub struct NullKernel;

impl CadKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn extrude(
        &self,
        _profile: &Profile2D,
        _plane: &SketchPlane,
        _distance: f32,
    ) -> CadResult<Solid> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel available".into(),
        ))
    }

    fn boolean(&self, _a: &Solid, _b: &Solid, _op: BooleanType) -> CadResult<Solid> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel available".into(),
        ))
    }

    fn translate(&self, _solid: &Solid, _offset: Vec3) -> CadResult<Solid> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel available".into(),
        ))
    }

    fn tessellate(&self, _solid: &Solid, _tolerance: f32) -> CadResult<TessellatedMesh> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel available".into(),
        ))
    }

    fn release(&self, _solid: &Solid) {}
}

/// Get the default CAD kernel based on available features
pub fn default_kernel() -> Box<dyn CadKernel> {
    #[cfg(feature = "truck")]
    {
        Box::new(super::TruckKernel::new())
    }

    #[cfg(not(feature = "truck"))]
    {
        Box::new(NullKernel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_containment() {
        let outer = Circle2D::new(Vec2::ZERO, 2.0);
        let inner = Circle2D::new(Vec2::new(0.5, 0.0), 1.0);
        assert!(outer.contains(&inner, 1e-5));
        assert!(!inner.contains(&outer, 1e-5));
        assert!(!outer.crosses(&inner, 1e-5));
    }

    #[test]
    fn test_internal_tangency_is_containment() {
        let outer = Circle2D::new(Vec2::ZERO, 2.0);
        let inner = Circle2D::new(Vec2::new(1.0, 0.0), 1.0);
        assert!(outer.contains(&inner, 1e-5));
        assert!(!outer.crosses(&inner, 1e-5));
    }

    #[test]
    fn test_circle_crossing() {
        let a = Circle2D::new(Vec2::ZERO, 1.0);
        let b = Circle2D::new(Vec2::new(1.5, 0.0), 1.0);
        assert!(a.crosses(&b, 1e-5));
        assert!(!a.contains(&b, 1e-5));

        let far = Circle2D::new(Vec2::new(5.0, 0.0), 1.0);
        assert!(!a.crosses(&far, 1e-5));
    }

    #[test]
    fn test_profile_loop_count() {
        let ring = Profile2D {
            outer: Circle2D::new(Vec2::ZERO, 2.0),
            holes: vec![Circle2D::new(Vec2::ZERO, 1.0)],
        };
        assert_eq!(ring.loop_count(), 2);
        assert_eq!(Profile2D::disc(ring.outer).loop_count(), 1);
    }

    #[test]
    fn test_mesh_append_rebases_indices() {
        let mut a = TessellatedMesh {
            vertices: vec![[0.0; 3]; 3],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            indices: vec![0, 1, 2],
        };
        let b = a.clone();
        a.append(&b);
        assert_eq!(a.triangle_count(), 2);
        assert_eq!(&a.indices[3..], &[3, 4, 5]);
    }

    #[test]
    fn test_null_kernel_rejects() {
        let kernel = NullKernel;
        assert!(!kernel.is_available());
        let profile = Profile2D::disc(Circle2D::new(Vec2::ZERO, 1.0));
        let result = kernel.extrude(&profile, &SketchPlane::xy(), 1.0);
        assert!(matches!(result, Err(CadError::KernelNotAvailable(_))));
    }
}
