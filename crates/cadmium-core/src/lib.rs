//! CADmium Replay Core
//!
//! This crate turns CADmium / Fusion360-ds JSON part descriptions into
//! solids through a [`cadmium_cad::CadKernel`]:
//! - Schema: lenient walk over the JSON part layout
//! - Units: source length units and kernel scaling
//! - Config: RON-backed replay settings
//! - Replay: sketch, extrude, move and combine, one part at a time
//! - Export: STL of the replayed bodies and RON of the feature history

pub mod config;
pub mod export;
pub mod replay;
pub mod schema;
pub mod units;

pub use config::*;
pub use export::*;
pub use replay::*;
pub use schema::*;
pub use units::*;
