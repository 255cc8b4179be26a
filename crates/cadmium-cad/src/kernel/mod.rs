//! CAD kernel backends

mod mock;
mod traits;
#[cfg(feature = "truck")]
mod truck;

pub use mock::{KernelCall, MockKernel};
pub use traits::*;
#[cfg(feature = "truck")]
pub use truck::TruckKernel;
