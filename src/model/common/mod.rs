pub mod scope;
pub mod state;
pub mod student;

pub use scope::{College, Scope};
pub use state::ElectionState;
pub use student::StudentId;
