//! Engine error types.

use mapper_core::{ArgumentError, SchemaError, StreamDescriptor};

/// Configuration errors raised while validating mapper chains or generating a
/// destination catalog. None of them is retried; all point at configuration
/// that must be fixed upstream.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    #[error("unknown mapper: {name}")]
    UnknownMapper { name: String },
    #[error("invalid configuration for mapper '{mapper}': {}", .errors.join("; "))]
    InvalidConfig { mapper: String, errors: Vec<String> },
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("{reference} of stream '{stream}' references removed field '{field}'")]
    DanglingReference {
        stream: StreamDescriptor,
        reference: &'static str,
        field: String,
    },
    #[error("configuration schema of mapper '{mapper}' does not compile: {message}")]
    SpecCompilation { mapper: String, message: String },
    #[error("stream '{stream}': {source}")]
    Stream {
        stream: StreamDescriptor,
        #[source]
        source: Box<MapperError>,
    },
}

impl MapperError {
    pub(crate) fn invalid_config(mapper: impl Into<String>, error: impl ToString) -> Self {
        Self::InvalidConfig {
            mapper: mapper.into(),
            errors: vec![error.to_string()],
        }
    }

    /// Attaches the stream being processed.
    #[must_use]
    pub fn with_stream(self, stream: &StreamDescriptor) -> Self {
        match self {
            already @ (Self::Stream { .. } | Self::DanglingReference { .. }) => already,
            other => Self::Stream {
                stream: stream.clone(),
                source: Box::new(other),
            },
        }
    }

    /// The error without its stream context.
    #[must_use]
    pub fn root(&self) -> &MapperError {
        match self {
            Self::Stream { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_joins_all_messages() {
        let err = MapperError::InvalidConfig {
            mapper: "hashing".into(),
            errors: vec!["/config: a".into(), "/config: b".into()],
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration for mapper 'hashing': /config: a; /config: b"
        );
    }

    #[test]
    fn stream_context_is_added_once() {
        let stream = StreamDescriptor::new("users", None);
        let err = MapperError::UnknownMapper { name: "x".into() }
            .with_stream(&stream)
            .with_stream(&stream);
        assert_eq!(err.to_string(), "stream 'users': unknown mapper: x");
        assert!(matches!(err.root(), MapperError::UnknownMapper { .. }));
    }
}
