// Application layer: the pipeline entry point and report rendering.

pub mod display;
pub mod pipelines;
