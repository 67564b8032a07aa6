//! Utility modules

pub mod amount;
pub mod calendar;
pub mod csv_source;
pub mod memory_source;
pub mod validation;

pub use amount::*;
pub use calendar::*;
pub use csv_source::*;
pub use memory_source::*;
pub use validation::*;
