pub mod animation;
pub mod config;
pub mod evaluator;
pub mod logging;
pub mod model;
pub mod particles;
pub mod rate;
pub mod session;
pub mod slider;
pub mod web;

pub use config::LabConfig;
pub use model::{GrowthModel, ModelError, ParameterRecord, Parameters};
pub use session::{Session, UiAction};
