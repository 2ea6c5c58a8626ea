pub mod action;
pub mod history;
pub mod reduce;
pub mod store;

pub use action::Action;
pub use history::RestoreError;
pub use reduce::{Outcome, Reduction, reduce};
pub use store::Store;
