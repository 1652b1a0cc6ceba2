//! CFG-to-source emission.
//!
//! [`CodeBuilder`] turns a structured CFG into the body of a program whose
//! runtime execution visits exactly the blocks the path oracle predicts;
//! [`SourceProgram`] wraps that body in the target's program skeleton.

mod builder;
mod fleshing;
pub mod format;
mod program;

pub use builder::{CodeBuilder, MergeFrame};
pub use fleshing::Fleshing;
pub use program::{glsl_shader_test, SourceProgram};
