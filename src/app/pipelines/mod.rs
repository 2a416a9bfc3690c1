pub mod ingest_pipeline;

pub use ingest_pipeline::{IngestPipeline, PipelineOutput};
