//! Domain models for MedMonitor.

mod dose;
mod forms;
mod medication;
mod user;

pub use dose::*;
pub use forms::*;
pub use medication::*;
pub use user::*;
