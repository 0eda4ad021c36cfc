pub mod app_config;
pub mod assistant;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod registry;
pub mod system;
pub mod zenoh_bridge;
