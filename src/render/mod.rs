//! Render output: page-level diff protocol

mod diff;

pub use diff::{RenderDiff, RenderPatch};
