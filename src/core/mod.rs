pub mod metrics;
pub mod transformer;

pub use metrics::processing_days;
pub use transformer::RowTransformer;
