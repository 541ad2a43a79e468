/// Dispatch seam between the pipeline and the mail transport.
use crate::config::Config;
use crate::error::DispatchError;
use crate::mail::{Address, Attachment, OutgoingMessage, SmtpClient};
use std::path::Path;
use tracing::{info, warn};

/// Sends the artifact at `artifact` to `recipient`.
pub trait Dispatcher {
    fn dispatch(&self, recipient: &str, artifact: &Path) -> Result<(), DispatchError>;
}

/// Sends through the configured SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpDispatcher {
    config: Config,
}

impl SmtpDispatcher {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Validate inputs and assemble the message without touching the network.
    pub fn build_message(
        &self,
        recipient: &str,
        artifact: &Path,
    ) -> Result<OutgoingMessage, DispatchError> {
        let to = Address::new(recipient)?;

        let sender = self
            .config
            .sender()
            .ok_or(DispatchError::MissingCredentials)?;
        let from = Address::new(sender)?;

        let data = std::fs::read(artifact).map_err(|source| DispatchError::Attachment {
            path: artifact.to_path_buf(),
            source,
        })?;
        let filename = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "log.txt".to_string());

        let message = &self.config.message;
        Ok(OutgoingMessage::new(
            from,
            to,
            &message.subject,
            &message.body,
            Attachment::text(filename, data),
        ))
    }
}

impl Dispatcher for SmtpDispatcher {
    fn dispatch(&self, recipient: &str, artifact: &Path) -> Result<(), DispatchError> {
        let message = self.build_message(recipient, artifact)?;
        let (username, password) = self
            .config
            .credentials()
            .ok_or(DispatchError::MissingCredentials)?;

        let smtp = &self.config.smtp;
        let mut client =
            SmtpClient::connect(&smtp.host, smtp.port, smtp.security, &smtp.helo_name)?;
        client.authenticate(username, password)?;
        client.send(&message)?;

        // The message is already accepted; a failed QUIT is not a dispatch failure.
        if let Err(err) = client.quit() {
            warn!("QUIT failed after successful send: {err}");
        }
        info!("Sent {} to {}", artifact.display(), message.to);
        Ok(())
    }
}
