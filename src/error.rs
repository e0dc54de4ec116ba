use std::fmt;
use thiserror::Error;

/// Which side of a codec a value lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// External, wire-facing shape (renamed keys).
    Encoded,
    /// In-memory shape (original keys).
    Decoded,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Encoded => Side::Decoded,
            Side::Decoded => Side::Encoded,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Encoded => f.write_str("encoded"),
            Side::Decoded => f.write_str("decoded"),
        }
    }
}

/// Failures while building a rewritten tree. No partial tree is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// Two fields of one struct would share an encoded key.
    #[error("fields `{first}` and `{second}` both encode to `{encoded}`")]
    AnnotationConflict {
        encoded: String,
        first: String,
        second: String,
    },
}

/// Per-call failures of encode/decode. `path` is a JSON pointer into the
/// value being transcoded (empty for the root).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    #[error("missing {side} key `{key}` at {}", pointer(.path))]
    StructuralMismatch {
        path: String,
        key: String,
        side: Side,
    },

    #[error("expected {expected}, found {found} at {}", pointer(.path))]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("expected {expected} tuple element(s), found {found} at {}", pointer(.path))]
    TupleArity {
        path: String,
        expected: String,
        found: usize,
    },

    #[error("conversion `{conversion}` failed at {}: {message}", pointer(.path))]
    Conversion {
        path: String,
        conversion: String,
        message: String,
    },

    /// An undeclared key would overwrite a declared field on the output side.
    #[error("undeclared key `{key}` collides with a declared field at {}", pointer(.path))]
    KeyCollision {
        path: String,
        key: String,
    },
}

impl TranscodeError {
    pub fn path(&self) -> &str {
        match self {
            TranscodeError::StructuralMismatch { path, .. }
            | TranscodeError::TypeMismatch { path, .. }
            | TranscodeError::TupleArity { path, .. }
            | TranscodeError::Conversion { path, .. }
            | TranscodeError::KeyCollision { path, .. } => path.as_str(),
        }
    }

    /// Re-anchor an error raised relative to a subtree at `prefix`.
    pub fn prefixed(mut self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self;
        }
        let path = match &mut self {
            TranscodeError::StructuralMismatch { path, .. }
            | TranscodeError::TypeMismatch { path, .. }
            | TranscodeError::TupleArity { path, .. }
            | TranscodeError::Conversion { path, .. }
            | TranscodeError::KeyCollision { path, .. } => path,
        };
        path.insert_str(0, prefix);
        self
    }
}

fn pointer(path: &str) -> &str {
    if path.is_empty() { "/" } else { path }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixing_nests_paths() {
        let err = TranscodeError::StructuralMismatch {
            path: "/b".into(),
            key: "c_1".into(),
            side: Side::Encoded,
        };
        let err = err.prefixed("/a_1");
        assert_eq!(err.path(), "/a_1/b");
        assert_eq!(err.to_string(), "missing encoded key `c_1` at /a_1/b");
    }

    #[test]
    fn root_path_renders_as_slash() {
        let err = TranscodeError::TypeMismatch {
            path: String::new(),
            expected: "object",
            found: "string",
        };
        assert_eq!(err.to_string(), "expected object, found string at /");
    }
}
