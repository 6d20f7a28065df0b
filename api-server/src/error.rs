use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] figment::Error),
    #[error("Server error: {0}")]
    Rocket(#[from] rocket::Error),
}
