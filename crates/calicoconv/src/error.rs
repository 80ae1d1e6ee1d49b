use calicoconv_core::DecodeError;

/// Failures of the shell itself, before or after the core runs.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Document {document} is not valid YAML")]
    Yaml {
        document: usize,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Document {document} is not valid JSON")]
    Json {
        document: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Document {document} is not a v1 resource")]
    InvalidDocument {
        document: usize,
        #[source]
        source: DecodeError,
    },
}
