//! Circle Sketches
//!
//! A sketch is a set of full circles on a plane. Closed regions bounded by
//! those circles become the profiles that extrusions consume.

mod profile;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::kernel::{Circle2D, Profile2D};

/// Default linear tolerance for coincidence and tangency tests
pub const DEFAULT_TOLERANCE: f32 = 1e-5;

/// Sketch-related errors
#[derive(Debug, Clone, Error)]
pub enum SketchError {
    #[error("Invalid circle radius: {0}")]
    InvalidRadius(f32),

    #[error("Invalid circle center: ({0}, {1})")]
    InvalidCenter(f32, f32),

    #[error("Circles {first} and {second} intersect; only nested or disjoint circles are supported")]
    IntersectingCircles { first: usize, second: usize },
}

/// A plane that sketch geometry lives on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SketchPlane {
    /// Origin of the plane in world space
    pub origin: Vec3,
    /// Unit normal (x_axis × y_axis)
    pub normal: Vec3,
    /// Local X direction
    pub x_axis: Vec3,
    /// Local Y direction
    pub y_axis: Vec3,
}

impl Default for SketchPlane {
    fn default() -> Self {
        Self::xy()
    }
}

impl SketchPlane {
    /// The world XY plane at z = 0
    pub fn xy() -> Self {
        Self {
            origin: Vec3::ZERO,
            normal: Vec3::Z,
            x_axis: Vec3::X,
            y_axis: Vec3::Y,
        }
    }

    /// The same plane shifted along its normal
    pub fn offset(&self, distance: f32) -> Self {
        Self {
            origin: self.origin + self.normal * distance,
            ..*self
        }
    }

    /// Map a sketch-space point to world space
    pub fn to_world(&self, point: Vec2) -> Vec3 {
        self.origin + self.x_axis * point.x + self.y_axis * point.y
    }
}

fn default_tolerance() -> f32 {
    DEFAULT_TOLERANCE
}

/// A 2D sketch made of circles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sketch {
    /// Unique identifier
    pub id: Uuid,
    /// Name of the sketch
    pub name: String,
    /// Plane the sketch is drawn on
    pub plane: SketchPlane,
    /// Circles in drawing order
    pub circles: Vec<Circle2D>,
    /// Linear tolerance for duplicate and tangency checks
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,
}

impl Sketch {
    /// Create an empty sketch on a plane
    pub fn new(name: impl Into<String>, plane: SketchPlane) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            plane,
            circles: Vec::new(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Override the linear tolerance
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Add a circle and return its index.
    ///
    /// A circle coincident with an existing one is merged into it.
    pub fn add_circle(&mut self, center: Vec2, radius: f32) -> Result<usize, SketchError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SketchError::InvalidRadius(radius));
        }
        if !center.is_finite() {
            return Err(SketchError::InvalidCenter(center.x, center.y));
        }

        if let Some(existing) = self.circles.iter().position(|c| {
            c.center.distance(center) <= self.tolerance
                && (c.radius - radius).abs() <= self.tolerance
        }) {
            tracing::debug!(
                "Sketch {}: merged duplicate circle at ({}, {}) r={}",
                self.name,
                center.x,
                center.y,
                radius
            );
            return Ok(existing);
        }

        self.circles.push(Circle2D::new(center, radius));
        Ok(self.circles.len() - 1)
    }

    /// Number of distinct circles
    pub fn circle_count(&self) -> usize {
        self.circles.len()
    }

    /// Check if the sketch has no geometry
    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }

    /// Extract the closed regions bounded by the sketch circles
    pub fn extract_profiles(&self) -> Result<Vec<Profile2D>, SketchError> {
        profile::regions(&self.circles, self.tolerance)
    }
}
