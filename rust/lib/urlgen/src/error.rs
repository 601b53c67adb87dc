use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    /// A page declares its query shape more than once.
    #[error("query is declared more than once: file={}", path.display())]
    DuplicateQuery { path: PathBuf },

    /// The declared query literal is not a `{ field: codec, ... }` object.
    #[error("invalid query declaration in {}: {message}", path.display())]
    InvalidQuery { path: PathBuf, message: String },

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A decoder argument the Rust target cannot reference by name.
    #[error("cannot translate decoder `{expr}` of page {page}")]
    Untranslatable { page: String, expr: String },

    #[error("`{first}` and `{second}` both map to identifier `{ident}`")]
    NameClash {
        ident: String,
        first: String,
        second: String,
    },

    #[error("unsupported target: {0}")]
    UnsupportedTarget(String),
}

impl GenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::Io {
            path: path.into(),
            source,
        }
    }
}
