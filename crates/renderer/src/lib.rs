//! Rendering side of the Eco Chart widget
//!
//! The chart engine itself is an external collaborator reached through
//! [`ChartEngine`]. This crate owns everything on our side of that seam:
//! the static option, patch encoding, projection of summary parameters into
//! a series, and the user-visible formatting rules.

pub mod engine;
pub mod format;
pub mod patch;
pub mod pipeline;
pub mod projection;
pub mod tooltip;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use engine::ChartEngine;
pub use format::{format_time, format_value};
pub use patch::{ChartPatch, RenderedFrame, RenderedSeries, SeriesPatch};
pub use pipeline::RenderPipeline;
pub use projection::Projection;
