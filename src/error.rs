//! Errors returned by the tree and the address codec.

/// Error returned by the mutating operations of a [`crate::RadixTree`], and by the CIDR parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// The text or the raw bytes do not describe a valid address or prefix. The tree is never
    /// touched when this error is returned.
    BadAddress,
    /// An exclusive insert targeted a prefix that already carries a value. The old value is kept.
    Busy,
    /// The prefix has no path into the tree, or (for a plain delete) its node carries no value.
    NotFound,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::BadAddress => write!(f, "Bad IP address or mask"),
            Error::Busy => write!(f, "Node busy"),
            Error::NotFound => write!(f, "No such node"),
        }
    }
}

impl std::error::Error for Error {}
