//! Delivery gateways
//!
//! A gateway receives the envelope and the assembled message stream and
//! performs (or skips) the actual transmission. There is no retry: a failure
//! is reported to the caller as is.

use std::io::Read;

use lettre::address::Envelope;
use lettre::{SmtpTransport, Transport};

use crate::sendmail::address::Address;
use crate::sendmail::config::Config;
use crate::sendmail::error::SendmailError;

/// Something that can transmit a message
pub trait DeliveryGateway {
    fn send(
        &self,
        sender: &Address,
        recipients: &[Address],
        message: &mut dyn Read,
    ) -> Result<(), SendmailError>;
}

/// Hands messages to an SMTP relay
pub struct SmtpGateway {
    transport: SmtpTransport,
    relay: String,
    port: u16,
}

impl SmtpGateway {
    pub fn from_config(config: &Config) -> Result<Self, SendmailError> {
        let builder = if config.starttls {
            SmtpTransport::starttls_relay(&config.relay).map_err(|e| {
                SendmailError::Config(format!("cannot use relay {}: {e}", config.relay))
            })?
        } else {
            SmtpTransport::builder_dangerous(&config.relay)
        };

        Ok(Self {
            transport: builder.port(config.port).build(),
            relay: config.relay.clone(),
            port: config.port,
        })
    }
}

impl DeliveryGateway for SmtpGateway {
    fn send(
        &self,
        sender: &Address,
        recipients: &[Address],
        message: &mut dyn Read,
    ) -> Result<(), SendmailError> {
        let envelope = envelope(sender, recipients)?;

        let mut data = Vec::new();
        message.read_to_end(&mut data)?;
        let data = normalize_line_endings(&data);

        tracing::debug!(
            relay = %self.relay,
            port = self.port,
            bytes = data.len(),
            "sending message"
        );

        let response = self
            .transport
            .send_raw(&envelope, &data)
            .map_err(|e| SendmailError::Delivery(format!("{}:{}: {e}", self.relay, self.port)))?;

        tracing::info!(relay = %self.relay, code = %response.code(), "message accepted");
        Ok(())
    }
}

impl std::fmt::Debug for SmtpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpGateway")
            .field("relay", &self.relay)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

/// Reads and drops messages, for `-d nosend`
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardGateway;

impl DeliveryGateway for DiscardGateway {
    fn send(
        &self,
        sender: &Address,
        recipients: &[Address],
        message: &mut dyn Read,
    ) -> Result<(), SendmailError> {
        let mut data = Vec::new();
        let bytes = message.read_to_end(&mut data)?;

        tracing::info!(
            sender = %sender,
            recipients = recipients.len(),
            bytes,
            "nosend: message discarded"
        );
        Ok(())
    }
}

fn envelope(sender: &Address, recipients: &[Address]) -> Result<Envelope, SendmailError> {
    Envelope::new(
        Some(sender.envelope_address()),
        recipients.iter().map(Address::envelope_address).collect(),
    )
    .map_err(|e| SendmailError::AddressResolution(format!("invalid envelope: {e}")))
}

/// Turn bare LF line endings into CRLF, leaving existing CRLF alone
pub fn normalize_line_endings(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 32);
    let mut prev = 0u8;
    for &b in data {
        if b == b'\n' && prev != b'\r' {
            out.push(b'\r');
        }
        out.push(b);
        prev = b;
    }
    out
}
