//! Common test infrastructure
//!
//! Builds temporary song_data/log_data trees and opens a warehouse database
//! next to them. Tests should only import from this module.

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::{log_line, song_line, TestWarehouse};
