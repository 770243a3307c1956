//! Reading sources - pluggable producers of power readings

mod traits;
mod simulator;
mod replay;

pub use traits::{PowerSource, Reading};
pub use simulator::{PowerSimulator, DEFAULT_MAX_WATTS, DEFAULT_MIN_WATTS};
pub use replay::ReplaySource;
