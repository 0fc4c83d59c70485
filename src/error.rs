use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed document: {0}")]
    MalformedInput(String),
    #[error("document must be a mapping, got {0}")]
    NotAMapping(&'static str),
    #[error("document nesting depth {depth} exceeds the limit of {limit}")]
    TooDeep { depth: usize, limit: usize },
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("cannot serialize {0}")]
    UnsupportedType(String),
    #[error("{0}")]
    Serde(String),

    #[error("no config file at {}", .0.display())]
    NotFound(PathBuf),
    #[error("i/o error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse classification of [`Error`], used to pick a response for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    Serialization,
    Io,
    NotFound,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MalformedInput(_)
            | Error::NotAMapping(_)
            | Error::TooDeep { .. }
            | Error::Yaml(_) => ErrorKind::MalformedInput,
            Error::UnsupportedType(_) | Error::Serde(_) => ErrorKind::Serialization,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::IoError(_) => ErrorKind::Io,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T>(t: T) -> Self
    where
        T: std::fmt::Display,
    {
        Error::Serde(t.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T>(t: T) -> Self
    where
        T: std::fmt::Display,
    {
        Error::Serde(t.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            Error::MalformedInput("eof".into()).kind(),
            ErrorKind::MalformedInput
        );
        assert_eq!(Error::NotAMapping("a sequence").kind(), ErrorKind::MalformedInput);
        let yaml = serde_yaml::from_str::<u8>("[").unwrap_err();
        assert_eq!(Error::from(yaml).kind(), ErrorKind::MalformedInput);
        assert_eq!(
            Error::UnsupportedType("bytes".into()).kind(),
            ErrorKind::Serialization
        );
        assert_eq!(
            Error::NotFound(PathBuf::from("config.yaml")).kind(),
            ErrorKind::NotFound
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(Error::from(io).kind(), ErrorKind::Io);
    }
}
