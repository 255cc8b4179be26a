//! Truck CAD Kernel Backend
//!
//! Pure Rust B-Rep kernel using the Truck library.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use parking_lot::Mutex;
use uuid::Uuid;

use truck_meshalgo::prelude::*;
use truck_meshalgo::tessellation::{MeshableShape, MeshedShape};
use truck_modeling::topology::Wire;
use truck_modeling::{InnerSpace, Point3, Rad, Solid as TruckSolid, Vector3, builder};

use super::{BooleanType, CadError, CadKernel, CadResult, Circle2D, Profile2D, Solid, TessellatedMesh};
use crate::sketch::SketchPlane;

/// Tolerance handed to truck-shapeops
const BOOLEAN_TOLERANCE: f64 = 0.05;

/// Truck-based CAD kernel
pub struct TruckKernel {
    /// Storage for solid data (keyed by UUID)
    solids: Mutex<HashMap<Uuid, TruckSolid>>,
}

impl TruckKernel {
    /// Create a new Truck kernel
    pub fn new() -> Self {
        Self {
            solids: Mutex::new(HashMap::new()),
        }
    }

    /// Store a solid and return a Solid reference
    fn store_solid(&self, solid: TruckSolid) -> Solid {
        let id = Uuid::new_v4();
        self.solids.lock().insert(id, solid);
        Solid::new(id).with_kernel_data()
    }

    /// Get a stored solid by ID
    fn get_solid(&self, solid: &Solid) -> CadResult<TruckSolid> {
        self.solids
            .lock()
            .get(&solid.id)
            .cloned()
            .ok_or(CadError::SolidNotFound(solid.id))
    }

    /// Full-circle wire, counter-clockwise around the plane normal
    fn circle_wire(&self, circle: &Circle2D, plane: &SketchPlane) -> Wire {
        let center = to_point(plane.to_world(circle.center));
        let start = to_point(plane.to_world(circle.center + Vec2::X * circle.radius));
        let vertex = builder::vertex(start);
        builder::rsweep(
            &vertex,
            center,
            to_vector(plane.normal).normalize(),
            Rad(std::f64::consts::TAU),
        )
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn to_point(v: Vec3) -> Point3 {
    Point3::new(v.x as f64, v.y as f64, v.z as f64)
}

fn to_vector(v: Vec3) -> Vector3 {
    Vector3::new(v.x as f64, v.y as f64, v.z as f64)
}

impl CadKernel for TruckKernel {
    fn name(&self) -> &str {
        "truck"
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
        if distance == 0.0 || !distance.is_finite() {
            return Err(CadError::InvalidProfile(format!(
                "Invalid extrusion distance: {}",
                distance
            )));
        }

        // Sweep along the face normal only; a negative distance starts from the far plane
        let base = if distance < 0.0 {
            plane.offset(distance)
        } else {
            *plane
        };

        let mut wires = vec![self.circle_wire(&profile.outer, &base)];
        wires.extend(
            profile
                .holes
                .iter()
                .map(|hole| self.circle_wire(hole, &base).inverse()),
        );

        let face = builder::try_attach_plane(&wires)
            .map_err(|e| CadError::OperationFailed(format!("Failed to create face: {:?}", e)))?;

        let sweep = to_vector(base.normal).normalize() * distance.abs() as f64;
        let solid = builder::tsweep(&face, sweep);

        Ok(self.store_solid(solid))
    }

    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid> {
        let target = self.get_solid(a)?;
        let mut tool = self.get_solid(b)?;

        let result = match op {
            BooleanType::Union => truck_shapeops::or(&target, &tool, BOOLEAN_TOLERANCE),
            BooleanType::Subtract => {
                // A - B = A ∩ ¬B
                tool.not();
                truck_shapeops::and(&target, &tool, BOOLEAN_TOLERANCE)
            }
            BooleanType::Intersect => truck_shapeops::and(&target, &tool, BOOLEAN_TOLERANCE),
        };

        let solid = result
            .ok_or_else(|| CadError::BooleanFailed(format!("truck {:?} returned no solid", op)))?;
        Ok(self.store_solid(solid))
    }

    fn translate(&self, solid: &Solid, offset: Vec3) -> CadResult<Solid> {
        let source = self.get_solid(solid)?;
        let moved = builder::translated(&source, to_vector(offset));
        Ok(self.store_solid(moved))
    }

    fn tessellate(&self, solid: &Solid, tolerance: f32) -> CadResult<TessellatedMesh> {
        if tolerance <= 0.0 {
            return Err(CadError::TessellationFailed(format!(
                "Tolerance must be positive, got {}",
                tolerance
            )));
        }

        let source = self.get_solid(solid)?;
        let polygon = source.triangulation(tolerance as f64).to_polygon();

        let positions = polygon.positions();
        let normals = polygon.normals();

        let mut mesh = TessellatedMesh::new();
        for tri in polygon.tri_faces() {
            let corners = tri.map(|v| {
                let p = positions[v.pos];
                Vec3::new(p.x as f32, p.y as f32, p.z as f32)
            });
            let face_normal = (corners[1] - corners[0])
                .cross(corners[2] - corners[0])
                .normalize_or_zero();

            for (v, corner) in tri.iter().zip(corners) {
                let normal = v
                    .nor
                    .and_then(|i| normals.get(i))
                    .map(|n| Vec3::new(n.x as f32, n.y as f32, n.z as f32))
                    .unwrap_or(face_normal);
                mesh.indices.push(mesh.vertices.len() as u32);
                mesh.vertices.push(corner.to_array());
                mesh.normals.push(normal.to_array());
            }
        }

        if mesh.is_empty() {
            return Err(CadError::TessellationFailed(
                "Triangulation produced no triangles".into(),
            ));
        }

        Ok(mesh)
    }

    fn release(&self, solid: &Solid) {
        self.solids.lock().remove(&solid.id);
    }
}
