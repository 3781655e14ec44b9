mod huber;
mod loss_fn;
mod mse;

pub use huber::Huber;
pub use loss_fn::LossFn;
pub use mse::Mse;
