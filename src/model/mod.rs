pub mod config;
pub mod evaluation;
pub mod requests;
pub mod rubric;

pub use config::{Config, JudgeConfig};
pub use evaluation::*;
pub use rubric::*;
