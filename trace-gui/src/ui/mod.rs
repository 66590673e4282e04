//! # UI Module
//!
//! This module contains all UI components for the Tonic Tracer application.

pub mod main_display;
pub mod plot;
