//! Export functionality for the dose history log.

mod history;

pub use history::*;
