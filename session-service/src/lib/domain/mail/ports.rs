use async_trait::async_trait;

use crate::domain::errors::MailerError;
use crate::domain::mail::models::Mail;

/// Outbound mail delivery.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Deliver a templated mail.
    ///
    /// # Arguments
    /// * `recipient` - Destination address
    /// * `mail` - Template and its data
    ///
    /// # Errors
    /// * `Address` - Recipient is not a valid mailbox
    /// * `Message` / `Send` - Building or delivering failed
    async fn send(&self, recipient: &str, mail: &Mail) -> Result<(), MailerError>;
}
