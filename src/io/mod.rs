pub mod board_io;
pub mod bridge;
pub mod config_io;

pub use board_io::BoardIoError;
pub use bridge::PersistenceBridge;
