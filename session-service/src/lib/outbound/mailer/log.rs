use async_trait::async_trait;

use crate::domain::errors::MailerError;
use crate::domain::mail::models::Mail;
use crate::domain::mail::ports::Mailer;

/// Mailer used when delivery is disabled; records each mail in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, recipient: &str, mail: &Mail) -> Result<(), MailerError> {
        tracing::info!(
            recipient,
            template = mail.template_name(),
            subject = mail.subject(),
            "Mail delivery disabled, not sending"
        );
        Ok(())
    }
}
