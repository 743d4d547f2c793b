//! Output formatting for the inventory document.
//!
//! - [`json`] - JSON rendering and emission

mod json;

pub use json::{emit, render};
