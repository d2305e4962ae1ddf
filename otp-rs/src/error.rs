use thiserror::Error;

#[derive(Error, Debug)]
pub enum OtpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    #[error("SMTP protocol error: {0}")]
    Smtp(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Delivery rejected: {0}")]
    Delivery(String),
}

pub type Result<T> = std::result::Result<T, OtpError>;
