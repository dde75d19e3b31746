pub mod calibration;
pub mod config;
pub mod control;
pub mod display;
pub mod error;
pub mod geometry;
pub mod model_download;
pub mod orchestrator;
pub mod pipeline;
pub mod queue;
pub mod types;
pub mod worker;

pub use config::Config;
pub use orchestrator::Orchestrator;
