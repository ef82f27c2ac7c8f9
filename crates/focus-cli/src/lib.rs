//! CLI library components for focus-mapper.

pub mod io;
pub mod logging;
pub mod pipeline;
