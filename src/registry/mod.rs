pub mod defaults;
pub mod error;
pub mod parameter_registry;
