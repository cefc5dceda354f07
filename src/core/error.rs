// Error kinds and the builder-style error value shared by every core module.
use std::error::Error as StdError;
use std::fmt;
use std::ops::Range;

use crate::core::validate::ValidateResult;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    DuplicateTable,
    RecordNotFound,
    ValidationFailed,
    MalformedContainer,
    Codec,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    table: Option<String>,
    key: Option<String>,
    range: Option<Range<u64>>,
    validation: Option<ValidateResult>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            table: None,
            key: None,
            range: None,
            validation: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn range(&self) -> Option<Range<u64>> {
        self.range.clone()
    }

    /// Failures carried by a `ValidationFailed` error.
    pub fn validation(&self) -> Option<&ValidateResult> {
        self.validation.as_ref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_key(mut self, key: impl fmt::Debug) -> Self {
        self.key = Some(format!("{key:?}"));
        self
    }

    pub fn with_range(mut self, range: Range<u64>) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_validation(mut self, result: ValidateResult) -> Self {
        self.validation = Some(result);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {table})")?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {key})")?;
        }
        if let Some(range) = &self.range {
            write!(f, " (bytes: {}..{})", range.start, range.end)?;
        }
        if let Some(result) = &self.validation {
            write!(f, " ({} validation failures)", result.len())?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::RecordNotFound => 3,
        ErrorKind::DuplicateTable => 4,
        ErrorKind::ValidationFailed => 5,
        ErrorKind::MalformedContainer => 6,
        ErrorKind::Codec => 7,
        ErrorKind::Io => 8,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::RecordNotFound, 3),
            (ErrorKind::DuplicateTable, 4),
            (ErrorKind::ValidationFailed, 5),
            (ErrorKind::MalformedContainer, 6),
            (ErrorKind::Codec, 7),
            (ErrorKind::Io, 8),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_context() {
        let err = Error::new(ErrorKind::MalformedContainer)
            .with_message("span out of bounds")
            .with_table("Item")
            .with_range(12..40);
        assert_eq!(
            err.to_string(),
            "MalformedContainer: span out of bounds (table: Item) (bytes: 12..40)"
        );
    }

    #[test]
    fn key_is_rendered_with_debug() {
        let err = Error::new(ErrorKind::RecordNotFound).with_key("sword");
        assert_eq!(err.key(), Some("\"sword\""));
    }
}
