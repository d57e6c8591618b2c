use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    InvalidArgument(String),
    OutOfRange(String),
    Internal(String),
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Error::OutOfRange(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// Error for a part name that is not a calendar part at all.
    pub fn invalid_part(function_name: &str, part: impl fmt::Display) -> Self {
        Error::InvalidArgument(format!("Invalid part in {}: {}", function_name, part))
    }

    /// Error for a valid part that the given operation does not accept.
    pub fn unsupported_part(function_name: &str, part: impl fmt::Display) -> Self {
        Error::InvalidArgument(format!("Unsupported part in {}: {}", function_name, part))
    }

    pub fn parse_failure(input: &str) -> Self {
        Error::InvalidArgument(format!("Failed to parse input string \"{}\"", input))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::OutOfRange(msg) => write!(f, "Out of range: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
