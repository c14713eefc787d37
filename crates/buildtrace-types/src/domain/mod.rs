pub mod config;
pub mod package;
pub mod run;
pub mod task;

pub use config::*;
pub use package::*;
pub use run::*;
pub use task::*;
