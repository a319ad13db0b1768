use miette::Diagnostic;
use nvim_remote_api::ApiError;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to parse KDL")]
    #[diagnostic(code(nvim_remote::config::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source]
        source: kdl::KdlError,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(nvim_remote::config::invalid))]
    Invalid { message: String },

    /// A layout parsed but would be rejected before reaching nvim
    #[error("Layout '{layout}' is not a valid window config")]
    #[diagnostic(
        code(nvim_remote::config::invalid_layout),
        help("a manual border lists exactly 8 cells, clockwise from the top")
    )]
    InvalidLayout {
        layout: String,
        #[source]
        source: ApiError,
    },

    #[error("Missing required field: {field}")]
    #[diagnostic(code(nvim_remote::config::missing_field))]
    MissingField { field: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
