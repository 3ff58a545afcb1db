use thiserror::Error;

/// Errors returned by extent table and controller operations.
///
/// All of them indicate misuse. A failed call never leaves partial state behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ExtentError {
    /// The controller has no engine attached (the list has not been laid out yet).
    #[error("extent list is not attached to a layout driver")]
    NotAttached,

    /// A mutation was attempted while a layout pass holds the lock.
    #[error("extent list is locked by an in-progress layout pass")]
    Locked,

    /// An index is outside the valid range for the operation.
    #[error("index {index} is out of range for {len} items")]
    Index { index: usize, len: usize },
}
