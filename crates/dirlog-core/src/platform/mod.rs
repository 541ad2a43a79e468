/// Platform-specific functionality: host identity lookups and
/// recoverable deletion through the OS trash / Recycle Bin.

pub mod identity;
pub mod trash;

pub use identity::{hostname, username};
pub use trash::{Disposal, Disposer, TrashDisposer};
