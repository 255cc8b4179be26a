//! Replay of CADmium parts into kernel solids
//!
//! Each part becomes one sketch on the XY plane and one extrude feature.
//! Parts are independent: a part that cannot be built is reported and
//! the remaining parts still run.

use cadmium_cad::{
    BooleanOp, CadKernel, ExtrudeFeature, FeatureError, FeatureHistory, Profile2D, Sketch,
    SketchError, SketchPlane,
};
use glam::{Vec2, Vec3};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ReplayConfig;
use crate::schema::{CadmiumDocument, SketchCircle, Extrusion, PartDescription, SchemaError};

/// Errors that stop the whole replay
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("No \"parts\" found in JSON.")]
    NoParts,

    #[error("CAD kernel '{0}' is not available")]
    KernelUnavailable(String),
}

/// Errors that fail a single part
#[derive(Debug, Error)]
pub enum PartError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Sketch error: {0}")]
    Sketch(#[from] SketchError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error("Extrusion has zero depth")]
    ZeroExtrusion,
}

/// Why a part was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The sketch map held no circles
    NoCircles,
    /// The circles bound no closed region
    NoProfile,
}

/// Result of replaying one part
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PartOutcome {
    Built {
        body_id: Uuid,
        operation: BooleanOp,
        flipped: bool,
        circles: usize,
        loops: usize,
    },
    Skipped(SkipReason),
    Failed(String),
}

/// Replay outcome of one named part
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartReport {
    pub name: String,
    pub outcome: PartOutcome,
}

/// Outcome of a whole replay run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    /// Kernel that built the geometry
    pub kernel: String,
    /// One report per part, in file order
    pub parts: Vec<PartReport>,
}

impl ReplayReport {
    pub fn built_count(&self) -> usize {
        self.count(|o| matches!(o, PartOutcome::Built { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, PartOutcome::Skipped(_)))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, PartOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&PartOutcome) -> bool) -> usize {
        self.parts.iter().filter(|p| pred(&p.outcome)).count()
    }

    /// User-facing message: one line per part that was not built, then
    /// the totals.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for part in &self.parts {
            match &part.outcome {
                PartOutcome::Built { .. } => {}
                PartOutcome::Skipped(SkipReason::NoCircles) => {
                    lines.push(format!("No circles drawn for {}; check JSON.", part.name));
                }
                PartOutcome::Skipped(SkipReason::NoProfile) => {
                    lines.push(format!("No valid profile for {}.", part.name));
                }
                PartOutcome::Failed(message) => {
                    lines.push(format!("{} failed: {}", part.name, message));
                }
            }
        }
        lines.push(format!(
            "Built {} of {} parts ({} skipped, {} failed).",
            self.built_count(),
            self.parts.len(),
            self.skipped_count(),
            self.failed_count()
        ));
        lines.push("Replay complete.".to_string());
        lines.join("\n")
    }
}

/// Replays documents into a feature history using one kernel
pub struct Replayer<'k> {
    kernel: &'k dyn CadKernel,
    config: ReplayConfig,
    history: FeatureHistory,
}

impl<'k> Replayer<'k> {
    pub fn new(kernel: &'k dyn CadKernel, config: ReplayConfig) -> Self {
        Self {
            kernel,
            config,
            history: FeatureHistory::new(),
        }
    }

    /// The features and bodies built so far
    pub fn history(&self) -> &FeatureHistory {
        &self.history
    }

    pub fn into_history(self) -> FeatureHistory {
        self.history
    }

    /// Replay every part of the document in file order
    pub fn replay(&mut self, doc: &CadmiumDocument) -> Result<ReplayReport, ReplayError> {
        if !self.kernel.is_available() {
            return Err(ReplayError::KernelUnavailable(self.kernel.name().to_string()));
        }
        if doc.part_count() == 0 {
            return Err(ReplayError::NoParts);
        }

        let mut report = ReplayReport {
            kernel: self.kernel.name().to_string(),
            parts: Vec::with_capacity(doc.part_count()),
        };

        for (name, part) in doc.parts() {
            let outcome = match part
                .map_err(PartError::from)
                .and_then(|part| self.replay_part(name, &part))
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!("Part {} failed: {}", name, e);
                    PartOutcome::Failed(e.to_string())
                }
            };

            match &outcome {
                PartOutcome::Built {
                    operation, loops, ..
                } => tracing::info!("Built {} ({:?}, {} loop profile)", name, operation, loops),
                PartOutcome::Skipped(reason) => tracing::info!("Skipped {}: {:?}", name, reason),
                PartOutcome::Failed(_) => {}
            }

            report.parts.push(PartReport {
                name: name.to_string(),
                outcome,
            });
        }

        Ok(report)
    }

    /// Sketch, extrude, move and combine a single part
    fn replay_part(
        &mut self,
        name: &str,
        part: &PartDescription,
    ) -> Result<PartOutcome, PartError> {
        if let Some(label) = part.display_name() {
            tracing::debug!("Replaying {} ({})", name, label);
        }

        let unit = self.config.unit_scale();
        let [tx, ty, tz] = part.coordinate_system.translation;
        let circles = part.circles()?;

        let mut sketch = Sketch::new(format!("{name} sketch"), SketchPlane::xy())
            .with_tolerance(self.config.tangency_tolerance);
        for circle in &circles {
            let (center, radius) =
                circle_to_kernel(circle, [tx, ty], part.extrusion.sketch_scale, unit);
            sketch.add_circle(center, radius)?;
        }
        if sketch.is_empty() {
            return Ok(PartOutcome::Skipped(SkipReason::NoCircles));
        }

        let profiles = sketch.extract_profiles()?;
        let Some(profile_index) = pick_profile(&profiles) else {
            return Ok(PartOutcome::Skipped(SkipReason::NoProfile));
        };
        let loops = profiles[profile_index].loop_count();

        let flipped = is_flipped(
            &part.coordinate_system.euler_angles,
            self.config.flip_tolerance_deg,
        );
        let (start_offset, distance) =
            extrusion_extent(&part.extrusion, flipped, unit).ok_or(PartError::ZeroExtrusion)?;

        let mut feature = ExtrudeFeature::new(name, sketch.id, profile_index, distance)
            .with_start_offset(start_offset)
            .with_boolean(map_operation(&part.extrusion.operation), None);
        if let Some(offset) = move_offset(tz, unit, self.config.move_epsilon) {
            feature = feature.with_translation(offset);
        }

        let sketch_id = self.history.add_sketch(sketch);
        let body_id = match self.history.extrude(self.kernel, feature) {
            Ok(id) => id,
            Err(e) => {
                self.history.remove_sketch(sketch_id);
                return Err(e.into());
            }
        };
        if let Err(e) = self.history.rename_body(body_id, name) {
            tracing::debug!("Could not name body after {}: {}", name, e);
        }

        let operation = self
            .history
            .entries()
            .last()
            .map(|entry| entry.feature.boolean_op)
            .unwrap_or_default();

        Ok(PartOutcome::Built {
            body_id,
            operation,
            flipped,
            circles: circles.len(),
            loops,
        })
    }
}

/// Map a Fusion feature operation name to a boolean.
///
/// Unknown names create a new body.
pub fn map_operation(name: &str) -> BooleanOp {
    match name {
        "NewBodyFeatureOperation" => BooleanOp::New,
        "JoinFeatureOperation" => BooleanOp::Join,
        "CutFeatureOperation" => BooleanOp::Cut,
        "IntersectFeatureOperation" => BooleanOp::Intersect,
        other => {
            tracing::warn!("Unknown operation '{}', creating a new body", other);
            BooleanOp::New
        }
    }
}

/// Prefer the first annulus (two loops), else the first profile
pub fn pick_profile(profiles: &[Profile2D]) -> Option<usize> {
    if profiles.is_empty() {
        return None;
    }
    profiles
        .iter()
        .position(|p| p.loop_count() == 2)
        .or(Some(0))
}

/// Whether the part is rotated 180° about X, which reverses the
/// extrusion direction. Only a full three-angle set is considered.
pub fn is_flipped(euler_deg: &[f64], tolerance: f64) -> bool {
    let [ex, _, _] = euler_deg else {
        return false;
    };
    (ex.rem_euclid(360.0) - 180.0).abs() < tolerance
}

/// Translation along +Z, if it is large enough to apply
pub fn move_offset(tz: f64, unit: f64, epsilon: f64) -> Option<Vec3> {
    let dz = tz * unit;
    (dz.abs() > epsilon).then(|| Vec3::new(0.0, 0.0, dz as f32))
}

/// Kernel-space center and radius of a JSON circle.
///
/// The sketch scale applies to the circle only; the part translation is
/// added unscaled.
pub fn circle_to_kernel(
    circle: &SketchCircle,
    translation_xy: [f64; 2],
    sketch_scale: f64,
    unit: f64,
) -> (Vec2, f32) {
    let [tx, ty] = translation_xy;
    let [cx, cy] = circle.center;
    let center = Vec2::new(
        ((tx + sketch_scale * cx) * unit) as f32,
        ((ty + sketch_scale * cy) * unit) as f32,
    );
    let radius = (sketch_scale * circle.radius * unit) as f32;
    (center, radius)
}

/// Start offset and signed distance of the extrusion along the sketch
/// normal, or `None` if it has no extent.
///
/// A positive opposite depth makes the extrusion two-sided: it starts
/// that far behind the sketch plane and runs through it.
pub fn extrusion_extent(extrusion: &Extrusion, flipped: bool, unit: f64) -> Option<(f32, f32)> {
    let sign = if flipped { -1.0 } else { 1.0 };
    let towards = extrusion.extrude_depth_towards_normal * unit;
    let opposite = extrusion.extrude_depth_opposite_normal.max(0.0) * unit;

    let start_offset = (-sign * opposite) as f32;
    let distance = (sign * (towards + opposite)) as f32;
    (distance != 0.0).then_some((start_offset, distance))
}
