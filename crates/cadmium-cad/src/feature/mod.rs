//! Feature Operations
//!
//! Extrude features that turn circle sketches into solids, optionally
//! reposition them, and combine them with existing bodies.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::kernel::{BooleanType, CadKernel, Solid, TessellatedMesh};
use crate::sketch::Sketch;

/// Feature-related errors
#[derive(Debug, Clone, Error)]
pub enum FeatureError {
    #[error("Sketch error: {0}")]
    SketchError(#[from] crate::sketch::SketchError),

    #[error("CAD kernel error: {0}")]
    CadError(#[from] crate::kernel::CadError),

    #[error("Invalid feature: {0}")]
    InvalidFeature(String),

    #[error("Sketch not found: {0}")]
    SketchNotFound(Uuid),

    #[error("Body not found: {0}")]
    BodyNotFound(Uuid),

    #[error("{0:?} requires a target body but none exists")]
    NoTargetBody(BooleanOp),
}

/// Result type for feature operations
pub type FeatureResult<T> = Result<T, FeatureError>;

/// How an extrusion combines with existing bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BooleanOp {
    /// Create new body
    #[default]
    New,
    /// Add to existing body
    Join,
    /// Remove from existing body
    Cut,
    /// Keep only intersection
    Intersect,
}

impl From<BooleanOp> for Option<BooleanType> {
    fn from(op: BooleanOp) -> Self {
        match op {
            BooleanOp::New => None,
            BooleanOp::Join => Some(BooleanType::Union),
            BooleanOp::Cut => Some(BooleanType::Subtract),
            BooleanOp::Intersect => Some(BooleanType::Intersect),
        }
    }
}

/// Extrusion of one sketch profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtrudeFeature {
    /// Unique identifier
    pub id: Uuid,
    /// Name of the feature (also given to the resulting body)
    pub name: String,
    /// Reference to the sketch
    pub sketch_id: Uuid,
    /// Index into the sketch's extracted profiles
    pub profile_index: usize,
    /// Signed extrusion distance along the sketch normal
    pub distance: f32,
    /// Offset of the extrusion start plane along the sketch normal
    #[serde(default)]
    pub start_offset: f32,
    /// Translation applied to the extruded solid before combining
    #[serde(default)]
    pub translation: Option<Vec3>,
    /// Boolean operation with existing body
    pub boolean_op: BooleanOp,
    /// Target body ID (for boolean operations, None = most recent body)
    pub target_body: Option<Uuid>,
}

impl ExtrudeFeature {
    /// Create a new extrude feature creating a new body
    pub fn new(
        name: impl Into<String>,
        sketch_id: Uuid,
        profile_index: usize,
        distance: f32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            sketch_id,
            profile_index,
            distance,
            start_offset: 0.0,
            translation: None,
            boolean_op: BooleanOp::New,
            target_body: None,
        }
    }

    /// Start the extrusion from a plane offset along the sketch normal
    pub fn with_start_offset(mut self, offset: f32) -> Self {
        self.start_offset = offset;
        self
    }

    /// Translate the extruded solid before it is combined
    pub fn with_translation(mut self, offset: Vec3) -> Self {
        self.translation = Some(offset);
        self
    }

    /// Combine with an existing body
    pub fn with_boolean(mut self, op: BooleanOp, target_body: Option<Uuid>) -> Self {
        self.boolean_op = op;
        self.target_body = target_body;
        self
    }

    /// Build the tool solid: extrude the profile and apply the translation
    pub fn build_tool(&self, kernel: &dyn CadKernel, sketch: &Sketch) -> FeatureResult<Solid> {
        let profiles = sketch.extract_profiles()?;
        let profile = profiles.get(self.profile_index).ok_or_else(|| {
            FeatureError::InvalidFeature(format!(
                "Profile {} out of range ({} profiles in sketch {})",
                self.profile_index,
                profiles.len(),
                sketch.name
            ))
        })?;

        let plane = sketch.plane.offset(self.start_offset);
        let solid = kernel.extrude(profile, &plane, self.distance)?;
        let Some(offset) = self.translation else {
            return Ok(solid);
        };

        // The unmoved solid is never referenced again
        let moved = kernel.translate(&solid, offset);
        kernel.release(&solid);
        Ok(moved?)
    }
}

/// A body produced by features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadBody {
    /// Unique identifier
    pub id: Uuid,
    /// Name of the body
    pub name: String,
    /// The solid geometry (not serialized)
    #[serde(skip)]
    pub solid: Option<Solid>,
    /// Cached tessellation
    #[serde(skip)]
    pub mesh_cache: Option<TessellatedMesh>,
    /// Feature that created this body
    pub source_feature: Option<Uuid>,
}

impl Default for CadBody {
    fn default() -> Self {
        Self::new("Body")
    }
}

impl CadBody {
    /// Create a new body with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            solid: None,
            mesh_cache: None,
            source_feature: None,
        }
    }

    /// Replace the solid, dropping any cached mesh
    pub fn set_solid(&mut self, solid: Solid) {
        self.solid = Some(solid);
        self.mesh_cache = None;
    }

    /// Get the tessellated mesh, tessellating if needed
    pub fn get_mesh(&mut self, kernel: &dyn CadKernel, tolerance: f32) -> Option<&TessellatedMesh> {
        if self.mesh_cache.is_none()
            && let Some(ref solid) = self.solid
        {
            match kernel.tessellate(solid, tolerance) {
                Ok(mesh) => self.mesh_cache = Some(mesh),
                Err(e) => tracing::warn!("Tessellation of {} failed: {}", self.name, e),
            }
        }
        self.mesh_cache.as_ref()
    }
}
