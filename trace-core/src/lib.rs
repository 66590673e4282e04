// trace-core/src/lib.rs

//! The core logic for the tonic-relative pitch tracer.
//! This crate owns audio capture, pitch detection, the observation trace,
//! tonic-relative theory and plot layout. It is completely headless
//! and contains no GUI code.

pub mod audio;
pub mod config;
pub mod drone;
pub mod engine;
pub mod freq;
pub mod layout;
pub mod pitch;
pub mod theory;
pub mod trace;

pub use config::{PlotConfig, RangeAdjustment};
pub use engine::{RenderFrame, TraceEngine};
pub use pitch::{Confidence, PitchEstimate, SampleBlock};
pub use theory::{EnharmonicPreference, Tonic};
