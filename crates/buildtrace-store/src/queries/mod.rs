pub mod config;
pub mod package;
pub mod run;
pub mod task;
