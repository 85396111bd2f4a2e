use aurora_core::DriverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Host list cannot be empty")]
    EmptyHostList,

    #[error("Invalid database URL: {0}")]
    InvalidUrl(#[source] sqlx::Error),

    #[error("Failed to start driver runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Failed to connect to {url} with protocol {protocol}")]
    Connect {
        url: String,
        protocol: String,
        #[source]
        source: DriverError,
    },
}
