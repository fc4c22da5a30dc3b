pub mod factory;
pub mod sled_store;
pub mod store;

pub use factory::{create_in_memory_store, create_model_store};
pub use sled_store::SledModelStore;
pub use store::*;
