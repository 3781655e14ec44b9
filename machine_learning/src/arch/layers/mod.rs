mod activation;
mod dense;
mod layer;

pub use activation::Activation;
pub use dense::Dense;
pub use layer::Layer;
