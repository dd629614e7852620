use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad threshold, weight sum, etc.).
    ConfigValidation(String),
    /// A configured weight, tolerance or critical-field key does not name
    /// a known attribute.
    UnknownField { key: String, context: &'static str },
    /// Missing required column in input data.
    MissingColumn { source: String, column: String },
    /// IO error (CSV read, etc.).
    Io(String),
    /// Report serialization error.
    Json(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownField { key, context } => {
                write!(f, "unknown field '{key}' in {context}")
            }
            Self::MissingColumn { source, column } => {
                write!(f, "source '{source}': missing column '{column}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Json(msg) => write!(f, "JSON error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
