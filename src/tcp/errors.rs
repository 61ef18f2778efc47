use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum TcpError {
    #[error("Invalid capacity: {0} must be greater than zero")]
    ZeroCapacity(&'static str),

    #[error("Invalid timeout: initial RTO must be greater than zero")]
    ZeroTimeout,

    #[error("Invalid payload size: expected 1..={max} bytes, found {found}")]
    InvalidPayloadSize { max: usize, found: usize },
}
