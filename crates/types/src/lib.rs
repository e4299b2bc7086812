mod contract;
mod lifecycle;
mod plan;

pub use contract::*;
pub use lifecycle::*;
pub use plan::*;
