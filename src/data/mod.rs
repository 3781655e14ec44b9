mod batch;
mod dataset;
mod sampler;

pub use batch::Batch;
pub use dataset::KeyDataset;
pub use sampler::MinibatchSampler;
