//! File Combiner Backend Library
//!
//! This library exposes modules for testing and external use.
//! The main binary is in `src/main.rs`.

pub mod api;
/// Upload, filter, render and deliver pipeline
pub mod combine;
pub mod config;
pub mod error;
