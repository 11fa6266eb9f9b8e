//! # PTM Common Library
//!
//! Shared code for the Piano Technique Montréal data tools:
//! - Error types
//! - Configuration loading (TOML bootstrap with built-in defaults)
//! - Technician roster

pub mod config;
pub mod error;
pub mod technicians;

pub use error::{Error, Result};
pub use technicians::{Technician, TechnicianRoster};
