//! Cluster-aware force-directed layout for signal relationship graphs.
//!
//! A host loads a [`GraphSnapshot`] into a [`GraphView`], supplies a
//! [`Viewport`], and either ticks the run once per frame (continuous
//! surfaces) or reads the finished layout straight away (batch surfaces).
//! Each tick yields a [`RenderFrame`] ready for drawing.

pub mod config;
pub mod demo;
pub mod error;
pub mod frame;
pub mod highlight;
pub mod labels;
pub mod layout;
pub mod model;
pub mod physics;
pub mod session;

pub use config::{ExecutionMode, HighlightStyle, SimulationConfig, Surface};
pub use error::{EngineError, Result};
pub use frame::RenderFrame;
pub use layout::Viewport;
pub use model::{GraphSnapshot, IngestReport, SignalGraph};
pub use physics::{Simulation, SimulationStatus};
pub use session::{GraphEvent, GraphView, RunId, TickOutcome};
