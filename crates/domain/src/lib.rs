pub mod entities;
pub mod ports;
pub mod repositories;

pub use dispatch_core::{DispatchError, DispatchResult};
pub use entities::*;
pub use ports::*;
pub use repositories::*;
