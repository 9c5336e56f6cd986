#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("bill file does not exist: {0}")]
    NotFound(std::path::PathBuf),

    #[error("could not read bill file {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse bill xml at {path}: {source}")]
    Xml {
        path: std::path::PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed identifier: {0}")]
    Validation(String),
}
