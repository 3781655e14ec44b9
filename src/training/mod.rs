mod builder;
mod evaluation;
mod model_trainer;
mod scale;
mod trainer;

pub use builder::TrainerBuilder;
pub use evaluation::{Evaluation, Prediction};
pub use model_trainer::ModelTrainer;
pub use scale::PositionScale;
pub use trainer::Trainer;
