//! CLI command implementations

pub mod check;
pub mod sync;

pub use check::CheckArgs;
pub use sync::SyncArgs;
