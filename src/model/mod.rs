pub mod board;
pub mod config;
pub mod ident;
pub mod note;
pub mod task;

pub use board::*;
pub use config::*;
pub use note::*;
pub use task::*;
