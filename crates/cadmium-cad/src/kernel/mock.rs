//! MockKernel - deterministic recording double for the CAD kernel.
//!
//! Every operation succeeds (unless configured to fail) and is recorded, so
//! replay logic can be tested and dry-run without a geometry backend.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use parking_lot::Mutex;
use uuid::Uuid;

use super::{BooleanType, CadError, CadKernel, CadResult, Profile2D, Solid, TessellatedMesh};
use crate::sketch::SketchPlane;

/// Segments used to approximate circles in mock tessellation
const MOCK_SEGMENTS: u32 = 8;

/// A recorded kernel call
#[derive(Debug, Clone, PartialEq)]
pub enum KernelCall {
    Extrude {
        profile: Profile2D,
        plane: SketchPlane,
        distance: f32,
        result: Uuid,
    },
    Boolean {
        target: Uuid,
        tool: Uuid,
        op: BooleanType,
        result: Uuid,
    },
    Translate {
        solid: Uuid,
        offset: Vec3,
        result: Uuid,
    },
    Tessellate {
        solid: Uuid,
    },
}

/// Synthetic solid: an outer-circle prism plus accumulated translation
#[derive(Debug, Clone)]
struct MockSolid {
    profile: Profile2D,
    plane: SketchPlane,
    distance: f32,
}

#[derive(Default)]
struct MockState {
    solids: HashMap<Uuid, MockSolid>,
    calls: Vec<KernelCall>,
}

/// Deterministic test double for the geometry kernel
#[derive(Default)]
pub struct MockKernel {
    state: Mutex<MockState>,
    fail_booleans: bool,
}

impl MockKernel {
    /// Create a new mock kernel
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every boolean operation fail
    pub fn failing_booleans() -> Self {
        Self {
            fail_booleans: true,
            ..Self::default()
        }
    }

    /// All calls recorded so far
    pub fn calls(&self) -> Vec<KernelCall> {
        self.state.lock().calls.clone()
    }

    /// Number of live solids
    pub fn solid_count(&self) -> usize {
        self.state.lock().solids.len()
    }

    fn store(state: &mut MockState, solid: MockSolid) -> Solid {
        let id = Uuid::new_v4();
        state.solids.insert(id, solid);
        Solid::new(id).with_kernel_data()
    }

    fn lookup(state: &MockState, solid: &Solid) -> CadResult<MockSolid> {
        state
            .solids
            .get(&solid.id)
            .cloned()
            .ok_or(CadError::SolidNotFound(solid.id))
    }
}

impl CadKernel for MockKernel {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn extrude(
        &self,
        profile: &Profile2D,
        plane: &SketchPlane,
        distance: f32,
    ) -> CadResult<Solid> {
        if distance == 0.0 {
            return Err(CadError::InvalidProfile("Zero extrusion distance".into()));
        }

        let mut state = self.state.lock();
        let solid = Self::store(
            &mut state,
            MockSolid {
                profile: profile.clone(),
                plane: *plane,
                distance,
            },
        );
        state.calls.push(KernelCall::Extrude {
            profile: profile.clone(),
            plane: *plane,
            distance,
            result: solid.id,
        });
        Ok(solid)
    }

    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid> {
        if self.fail_booleans {
            return Err(CadError::BooleanFailed(format!("{:?} rejected by mock", op)));
        }

        let mut state = self.state.lock();
        let target = Self::lookup(&state, a)?;
        Self::lookup(&state, b)?;

        let solid = Self::store(&mut state, target);
        state.calls.push(KernelCall::Boolean {
            target: a.id,
            tool: b.id,
            op,
            result: solid.id,
        });
        Ok(solid)
    }

    fn translate(&self, solid: &Solid, offset: Vec3) -> CadResult<Solid> {
        let mut state = self.state.lock();
        let mut moved = Self::lookup(&state, solid)?;
        moved.plane.origin += offset;

        let result = Self::store(&mut state, moved);
        state.calls.push(KernelCall::Translate {
            solid: solid.id,
            offset,
            result: result.id,
        });
        Ok(result)
    }

    fn tessellate(&self, solid: &Solid, _tolerance: f32) -> CadResult<TessellatedMesh> {
        let mut state = self.state.lock();
        let shape = Self::lookup(&state, solid)?;
        state.calls.push(KernelCall::Tessellate { solid: solid.id });
        Ok(prism_mesh(&shape))
    }

    fn release(&self, solid: &Solid) {
        self.state.lock().solids.remove(&solid.id);
    }
}

/// Coarse prism over the outer circle, holes ignored
fn prism_mesh(shape: &MockSolid) -> TessellatedMesh {
    let plane = &shape.plane;
    let lift = plane.normal * shape.distance;
    let outer = shape.profile.outer;

    let ring: Vec<Vec3> = (0..MOCK_SEGMENTS)
        .map(|i| {
            let angle = (i as f32 / MOCK_SEGMENTS as f32) * std::f32::consts::TAU;
            plane.to_world(outer.center + Vec2::new(angle.cos(), angle.sin()) * outer.radius)
        })
        .collect();
    let bottom_center = plane.to_world(outer.center);
    let top_center = bottom_center + lift;

    let mut mesh = TessellatedMesh::new();
    let mut push_tri = |a: Vec3, b: Vec3, c: Vec3| {
        let n = (b - a).cross(c - a).normalize_or_zero();
        for p in [a, b, c] {
            mesh.indices.push(mesh.vertices.len() as u32);
            mesh.vertices.push(p.to_array());
            mesh.normals.push(n.to_array());
        }
    };

    let n = ring.len();
    for i in 0..n {
        let p0 = ring[i];
        let p1 = ring[(i + 1) % n];
        push_tri(bottom_center, p1, p0);
        push_tri(top_center, p0 + lift, p1 + lift);
        push_tri(p0, p1, p1 + lift);
        push_tri(p0, p1 + lift, p0 + lift);
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Circle2D;

    fn disc() -> Profile2D {
        Profile2D::disc(Circle2D::new(Vec2::ZERO, 1.0))
    }

    #[test]
    fn test_records_calls_in_order() {
        let kernel = MockKernel::new();
        let a = kernel.extrude(&disc(), &SketchPlane::xy(), 2.0).unwrap();
        let b = kernel.translate(&a, Vec3::Z).unwrap();
        kernel.boolean(&a, &b, BooleanType::Union).unwrap();

        let calls = kernel.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], KernelCall::Extrude { distance, .. } if distance == 2.0));
        assert!(matches!(calls[1], KernelCall::Translate { solid, .. } if solid == a.id));
        assert!(matches!(
            calls[2],
            KernelCall::Boolean {
                op: BooleanType::Union,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_solid() {
        let kernel = MockKernel::new();
        let ghost = Solid::new(Uuid::new_v4());
        assert!(matches!(
            kernel.translate(&ghost, Vec3::X),
            Err(CadError::SolidNotFound(_))
        ));
    }

    #[test]
    fn test_failing_booleans() {
        let kernel = MockKernel::failing_booleans();
        let a = kernel.extrude(&disc(), &SketchPlane::xy(), 1.0).unwrap();
        let b = kernel.extrude(&disc(), &SketchPlane::xy(), 1.0).unwrap();
        assert!(matches!(
            kernel.boolean(&a, &b, BooleanType::Subtract),
            Err(CadError::BooleanFailed(_))
        ));
    }

    #[test]
    fn test_release_is_not_recorded() {
        let kernel = MockKernel::new();
        let a = kernel.extrude(&disc(), &SketchPlane::xy(), 1.0).unwrap();
        let b = kernel.extrude(&disc(), &SketchPlane::xy(), 1.0).unwrap();
        assert_eq!(kernel.solid_count(), 2);

        kernel.release(&a);
        kernel.release(&a);
        assert_eq!(kernel.solid_count(), 1);
        assert_eq!(kernel.calls().len(), 2);
        assert!(matches!(
            kernel.tessellate(&a, 0.1),
            Err(CadError::SolidNotFound(_))
        ));
        assert!(kernel.tessellate(&b, 0.1).is_ok());
    }

    #[test]
    fn test_prism_tessellation() {
        let kernel = MockKernel::new();
        let a = kernel.extrude(&disc(), &SketchPlane::xy(), 3.0).unwrap();
        let moved = kernel.translate(&a, Vec3::new(0.0, 0.0, 5.0)).unwrap();
        let mesh = kernel.tessellate(&moved, 0.1).unwrap();

        assert_eq!(mesh.triangle_count(), 4 * MOCK_SEGMENTS as usize);
        let max_z = mesh
            .vertices
            .iter()
            .map(|v| v[2])
            .fold(f32::MIN, f32::max);
        approx::assert_relative_eq!(max_z, 8.0, epsilon = 1e-5);
    }
}
