pub mod cli;
pub mod engine;
pub mod io;
pub mod model;
pub mod ops;
