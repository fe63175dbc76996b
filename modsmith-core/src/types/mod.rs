//! Core data model shared by discovery, planning and execution

mod artifact;
mod operation;
mod project;

pub use artifact::*;
pub use operation::*;
pub use project::*;
