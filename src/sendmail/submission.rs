//! Message submission pipeline

use std::env;
use std::io::{self, BufRead, IsTerminal};

use crate::sendmail::address::{Address, is_local_part};
use crate::sendmail::cli::{Cli, Options};
use crate::sendmail::config::Config;
use crate::sendmail::envelope::{BodyFilter, EnvelopeAssembler};
use crate::sendmail::error::SendmailError;
use crate::sendmail::gateway::{DeliveryGateway, DiscardGateway, SmtpGateway};
use crate::sendmail::logging;
use crate::sendmail::message::Message;

/// Sender identity taken from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// Login name, used when no sender address is given
    pub user: Option<String>,
    /// Domain appended to bare user names
    pub domain: Option<String>,
}

impl Identity {
    /// `$USER` and the configured (or host) domain
    pub fn from_env(config: &Config) -> Self {
        Self {
            user: env::var("USER").ok().filter(|user| !user.is_empty()),
            domain: config.default_domain(),
        }
    }

    /// Append the default domain to a bare user name
    pub fn qualify(&self, addr: &str) -> Result<String, SendmailError> {
        let addr = addr.trim();
        if !is_local_part(addr) {
            return Ok(addr.to_string());
        }

        match &self.domain {
            Some(domain) => Ok(format!("{addr}@{domain}")),
            None => Err(SendmailError::AddressResolution(format!(
                "cannot qualify {addr:?}: no domain configured and host name unknown"
            ))),
        }
    }

    /// Sender from `-f`/`-r` or `$USER`, with the `-F` display name
    pub fn resolve_sender(
        &self,
        address: Option<&str>,
        name: Option<&str>,
    ) -> Result<Address, SendmailError> {
        let raw = address
            .map(str::to_owned)
            .or_else(|| self.user.clone())
            .ok_or_else(|| {
                SendmailError::AddressResolution(
                    "cannot determine From address: -f/-r not used, and $USER not set"
                        .to_string(),
                )
            })?;

        let qualified = self.qualify(&raw)?;
        let sender = Address::parse(&qualified).map_err(|e| {
            SendmailError::AddressResolution(format!("cannot parse From address {raw:?}: {e}"))
        })?;

        Ok(match name {
            Some(name) => sender.with_name(Some(name.to_string())),
            None => sender,
        })
    }

    /// Parse a recipient given on the command line
    pub fn parse_recipient(&self, addr: &str) -> Result<Address, SendmailError> {
        let qualified = self.qualify(addr)?;
        Address::parse(&qualified)
            .map_err(|e| SendmailError::Usage(format!("cannot parse To: address {addr:?}: {e}")))
    }
}

/// Assemble the message read from `input` and hand it to `gateway`.
///
/// `interactive` tells whether the input is a terminal, which decides if a
/// single-dot line ends the message.
pub fn submit<R: BufRead>(
    options: &Options,
    identity: &Identity,
    input: R,
    interactive: bool,
    gateway: &dyn DeliveryGateway,
) -> Result<(), SendmailError> {
    let sender = identity.resolve_sender(
        options.sender_address.as_deref(),
        options.sender_name.as_deref(),
    )?;
    let recipients = options
        .recipients
        .iter()
        .map(|addr| identity.parse_recipient(addr))
        .collect::<Result<Vec<_>, _>>()?;

    let message = Message::read_from(input)?;
    let body_filter = BodyFilter::for_input(interactive, options.preserve_single_dots);

    let assembled = EnvelopeAssembler::new(sender)
        .recipients(recipients)
        .derive_from_headers(options.recipients_from_headers)
        .body_filter(body_filter)
        .assemble(message)?;

    tracing::info!(
        sender = %assembled.sender(),
        recipients = assembled.recipients().len(),
        headers = assembled.headers().len(),
        subject = assembled.headers().get("Subject").unwrap_or_default(),
        stop_at_dot = body_filter == BodyFilter::StopAtDot,
        "submitting message"
    );

    let sender = assembled.sender().clone();
    let recipients = assembled.recipients().clone();
    let mut stream = assembled.into_reader();

    gateway.send(&sender, recipients.as_slice(), &mut stream)?;

    tracing::info!(sender = %sender, recipients = recipients.len(), "message sent");
    Ok(())
}

/// Run the command line program against stdin.
///
/// Logging is set up first so that every failure, including an invalid
/// command line or a broken configuration file, ends up in the log file.
pub fn run(cli: Cli) -> Result<(), SendmailError> {
    let config = Config::load();
    let log_file = match &config {
        Ok(config) => config.log_file.clone(),
        Err(_) => Config::default().log_file,
    };
    logging::init(
        cli.verbose,
        cli.debug.iter().any(|value| value == "smtp"),
        log_file.as_deref(),
    )?;

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    logged(config.and_then(|config| execute(cli, &config, stdin.lock(), interactive)))
}

/// Validate the command line, pick a gateway and submit `input`
fn execute<R: BufRead>(
    cli: Cli,
    config: &Config,
    input: R,
    interactive: bool,
) -> Result<(), SendmailError> {
    let options = cli.into_options()?;

    let gateway: Box<dyn DeliveryGateway> = if options.debug.nosend {
        Box::new(DiscardGateway)
    } else {
        Box::new(SmtpGateway::from_config(config)?)
    };
    let identity = Identity::from_env(config);

    submit(&options, &identity, input, interactive, gateway.as_ref())
}

/// Record a failure before it is reported to the caller
fn logged(result: Result<(), SendmailError>) -> Result<(), SendmailError> {
    if let Err(e) = &result {
        if e.is_usage() {
            tracing::error!(error = %e, "invalid command line");
        } else {
            tracing::error!(error = %e, "mogisend failed");
        }
    }
    result
}
