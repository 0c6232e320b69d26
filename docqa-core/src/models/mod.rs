//! Known embedding models and their vector sizes.

mod registry;

pub use registry::{default_models, EmbeddingModel, ModelRegistry};
