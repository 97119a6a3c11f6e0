use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoprobeError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Data error: {0}")]
    Data(#[from] geoprobe_data::DataError),
    #[error("DataFrame error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GeoprobeError>;
