//! CAD Kernel Abstraction for CADmium Replay
//!
//! This crate provides:
//! - Abstract CAD kernel trait for the geometry operations replay needs
//! - Truck B-rep backend, a null kernel and a recording mock kernel
//! - Circle sketches with closed-profile extraction
//! - Extrude features recorded in an ordered, rebuildable history

pub mod feature;
pub mod history;
pub mod kernel;
pub mod sketch;

// Re-exports for convenience
pub use feature::{BooleanOp, CadBody, ExtrudeFeature, FeatureError, FeatureResult};
pub use history::{FeatureHistory, HistoryEntry};
pub use kernel::{
    BooleanType, CadError, CadKernel, CadResult, Circle2D, KernelCall, MockKernel, NullKernel,
    Profile2D, Solid, TessellatedMesh, default_kernel,
};
#[cfg(feature = "truck")]
pub use kernel::TruckKernel;
pub use sketch::{Sketch, SketchError, SketchPlane};
