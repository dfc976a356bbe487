pub mod parameter_config;
pub mod run_config;
