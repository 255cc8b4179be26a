//! Feature History
//!
//! Keeps the ordered list of extrude features that built the model along
//! with the sketches they reference and the bodies they produced. The
//! history can be saved without geometry and rebuilt against any kernel.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::feature::{BooleanOp, CadBody, ExtrudeFeature, FeatureError, FeatureResult};
use crate::kernel::{BooleanType, CadKernel, Solid};
use crate::sketch::Sketch;

/// An entry in the feature history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The feature, with its target body resolved
    pub feature: ExtrudeFeature,
    /// Bodies created by this feature
    pub created_bodies: Vec<Uuid>,
    /// Bodies modified by this feature
    pub modified_bodies: Vec<Uuid>,
}

impl HistoryEntry {
    /// Create a new history entry
    pub fn new(feature: ExtrudeFeature) -> Self {
        Self {
            feature,
            created_bodies: Vec::new(),
            modified_bodies: Vec::new(),
        }
    }
}

/// Bodies keyed by ID plus their creation order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BodySet {
    bodies: HashMap<Uuid, CadBody>,
    order: Vec<Uuid>,
}

impl BodySet {
    fn clear(&mut self) {
        self.bodies.clear();
        self.order.clear();
    }

    fn insert(&mut self, body: CadBody) {
        self.order.push(body.id);
        self.bodies.insert(body.id, body);
    }

    fn last(&self) -> Option<Uuid> {
        self.order.last().copied()
    }
}

/// Manages the feature history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureHistory {
    /// Ordered list of features
    entries: Vec<HistoryEntry>,
    /// All sketches in the model
    sketches: HashMap<Uuid, Sketch>,
    /// All bodies in the model (geometry is not serialized)
    bodies: BodySet,
}

impl FeatureHistory {
    /// Create a new empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of features
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get all history entries
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    // ============== Sketch Management ==============

    /// Add a sketch
    pub fn add_sketch(&mut self, sketch: Sketch) -> Uuid {
        let id = sketch.id;
        self.sketches.insert(id, sketch);
        id
    }

    /// Remove a sketch no feature refers to
    pub fn remove_sketch(&mut self, id: Uuid) -> Option<Sketch> {
        if self.entries.iter().any(|e| e.feature.sketch_id == id) {
            return None;
        }
        self.sketches.remove(&id)
    }

    /// Get all sketches
    pub fn sketches(&self) -> &HashMap<Uuid, Sketch> {
        &self.sketches
    }

    // ============== Body Management ==============

    /// Get a body by ID
    pub fn get_body(&self, id: Uuid) -> Option<&CadBody> {
        self.bodies.bodies.get(&id)
    }

    /// Get a mutable body by ID
    pub fn get_body_mut(&mut self, id: Uuid) -> Option<&mut CadBody> {
        self.bodies.bodies.get_mut(&id)
    }

    /// Bodies in creation order
    pub fn bodies_in_order(&self) -> impl Iterator<Item = &CadBody> {
        self.bodies
            .order
            .iter()
            .filter_map(|id| self.bodies.bodies.get(id))
    }

    /// Body IDs in creation order
    pub fn body_ids(&self) -> &[Uuid] {
        &self.bodies.order
    }

    /// Number of bodies
    pub fn body_count(&self) -> usize {
        self.bodies.order.len()
    }

    /// The most recently created body
    pub fn last_body(&self) -> Option<&CadBody> {
        self.bodies.last().and_then(|id| self.get_body(id))
    }

    /// Rename a body
    pub fn rename_body(&mut self, id: Uuid, name: impl Into<String>) -> FeatureResult<()> {
        let body = self
            .bodies
            .bodies
            .get_mut(&id)
            .ok_or(FeatureError::BodyNotFound(id))?;
        body.name = name.into();
        Ok(())
    }

    // ============== Execution ==============

    /// Execute an extrude feature and append it to the history.
    ///
    /// Boolean features without an explicit target use the most recent
    /// body. A join with nothing to join to creates a new body instead.
    /// Returns the ID of the created or modified body.
    pub fn extrude(
        &mut self,
        kernel: &dyn CadKernel,
        mut feature: ExtrudeFeature,
    ) -> FeatureResult<Uuid> {
        if feature.boolean_op != BooleanOp::New && feature.target_body.is_none() {
            feature.target_body = self.bodies.last();
            if feature.target_body.is_none() {
                if feature.boolean_op != BooleanOp::Join {
                    return Err(FeatureError::NoTargetBody(feature.boolean_op));
                }
                tracing::warn!(
                    "{}: nothing to join, creating a new body instead",
                    feature.name
                );
                feature.boolean_op = BooleanOp::New;
            }
        }

        let mut entry = HistoryEntry::new(feature);
        execute(kernel, &self.sketches, &mut self.bodies, &mut entry, None)?;
        let body_id = entry
            .created_bodies
            .first()
            .or(entry.modified_bodies.first())
            .copied()
            .ok_or_else(|| FeatureError::InvalidFeature("Feature produced no body".into()))?;

        self.entries.push(entry);
        Ok(body_id)
    }

    /// Rebuild all geometry from the recorded features.
    ///
    /// Body IDs are preserved so saved references stay valid. Failed
    /// features are logged and skipped.
    pub fn rebuild(&mut self, kernel: &dyn CadKernel) -> FeatureResult<()> {
        let names: HashMap<Uuid, String> = self
            .bodies
            .bodies
            .iter()
            .map(|(id, body)| (*id, body.name.clone()))
            .collect();
        for solid in self.bodies.bodies.values().filter_map(|b| b.solid.as_ref()) {
            kernel.release(solid);
        }
        self.bodies.clear();

        for entry in &mut self.entries {
            let reuse = entry.created_bodies.first().copied();
            if let Err(e) = execute(kernel, &self.sketches, &mut self.bodies, entry, reuse) {
                tracing::warn!("Feature {} failed: {}", entry.feature.name, e);
            }
        }

        for (id, name) in names {
            if let Some(body) = self.bodies.bodies.get_mut(&id) {
                body.name = name;
            }
        }

        Ok(())
    }
}

/// Run one feature against the current body set, recording its effect on `entry`
fn execute(
    kernel: &dyn CadKernel,
    sketches: &HashMap<Uuid, Sketch>,
    bodies: &mut BodySet,
    entry: &mut HistoryEntry,
    reuse_id: Option<Uuid>,
) -> FeatureResult<()> {
    let feature = &entry.feature;
    let sketch = sketches
        .get(&feature.sketch_id)
        .ok_or(FeatureError::SketchNotFound(feature.sketch_id))?;

    let tool = feature.build_tool(kernel, sketch)?;

    entry.created_bodies.clear();
    entry.modified_bodies.clear();

    match (Option::<BooleanType>::from(feature.boolean_op), feature.target_body) {
        (None, _) => {
            let mut body = CadBody::new(feature.name.clone());
            if let Some(id) = reuse_id {
                body.id = id;
            }
            body.source_feature = Some(feature.id);
            body.set_solid(tool);
            entry.created_bodies.push(body.id);
            bodies.insert(body);
        }
        (Some(op), Some(target_id)) => {
            let combined = combine(kernel, bodies, target_id, &tool, op);
            kernel.release(&tool);
            combined?;
            entry.modified_bodies.push(target_id);
        }
        (Some(_), None) => {
            kernel.release(&tool);
            return Err(FeatureError::NoTargetBody(feature.boolean_op));
        }
    }

    Ok(())
}

/// Replace the target body's solid with `target op tool`.
///
/// On failure the target keeps its previous solid.
fn combine(
    kernel: &dyn CadKernel,
    bodies: &mut BodySet,
    target_id: Uuid,
    tool: &Solid,
    op: BooleanType,
) -> FeatureResult<()> {
    let target = bodies
        .bodies
        .get_mut(&target_id)
        .ok_or(FeatureError::BodyNotFound(target_id))?;
    let current = target.solid.as_ref().ok_or_else(|| {
        FeatureError::InvalidFeature(format!("Body {} has no geometry", target.name))
    })?;
    let combined = kernel.boolean(current, tool, op)?;

    let previous = target.solid.take();
    target.set_solid(combined);
    if let Some(previous) = previous {
        kernel.release(&previous);
    }
    Ok(())
}
