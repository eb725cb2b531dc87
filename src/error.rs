use thiserror::Error;

/// Error returned by the fallible reservation methods when the requested
/// table size cannot be represented.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    /// Doubling the bucket count overflowed `usize`, or the bucket array would
    /// exceed `isize::MAX` bytes.
    #[error("capacity overflow")]
    CapacityOverflow,
}
