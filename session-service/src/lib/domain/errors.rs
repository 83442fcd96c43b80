use thiserror::Error;

/// Error for cache backend operations.
///
/// Never surfaced to callers of the domain: every cache failure degrades to a miss.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Error for outbound mail delivery.
#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("Invalid email address: {0}")]
    Address(String),

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Failed to deliver message: {0}")]
    Send(String),

    #[error("Invalid mailer configuration: {0}")]
    Config(String),
}
