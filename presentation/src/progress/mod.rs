//! Live progress rendering

pub mod renderer;
