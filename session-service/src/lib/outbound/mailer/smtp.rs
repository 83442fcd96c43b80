use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::config::MailConfig;
use crate::domain::errors::MailerError;
use crate::domain::mail::models::Mail;
use crate::domain::mail::ports::Mailer;

const SEND_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Mailer delivering through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    /// Build the transport. No connection is opened until the first send.
    ///
    /// # Errors
    /// * `Address` - Sender is not a valid mailbox
    /// * `Config` - Relay host rejected for STARTTLS
    pub fn new(config: &MailConfig) -> Result<Self, MailerError> {
        let sender: Mailbox = config
            .sender
            .parse()
            .map_err(|e| MailerError::Address(format!("{e}")))?;

        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailerError::Config(format!("{e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let mut builder = builder.port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        tracing::debug!(host = %config.host, port = config.port, "SMTP mailer initialized");

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }

    fn build_message(&self, recipient: &str, mail: &Mail) -> Result<Message, MailerError> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| MailerError::Address(format!("{e}")))?;

        Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(mail.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body())
            .map_err(|e| MailerError::Message(format!("{e}")))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, recipient: &str, mail: &Mail) -> Result<(), MailerError> {
        let message = self.build_message(recipient, mail)?;

        let mut attempt = 1;
        loop {
            match self.transport.send(message.clone()).await {
                Ok(_) => {
                    tracing::info!(template = mail.template_name(), "Mail sent");
                    return Ok(());
                }
                Err(e) if attempt < SEND_ATTEMPTS => {
                    tracing::warn!(attempt, error = %e, "Mail delivery failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => return Err(MailerError::Send(format!("{e}"))),
            }
        }
    }
}
