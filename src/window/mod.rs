//! Foreground window tracking

mod tracker;

pub use tracker::{rule, WindowTracker};
