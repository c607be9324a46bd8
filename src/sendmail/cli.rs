//! Command line definition
//!
//! The options are the subset of the traditional sendmail flags that make
//! sense for a relay-only front end.

use clap::Parser;

use crate::sendmail::error::SendmailError;

/// Send a message read from standard input through an SMTP relay
#[derive(Parser, Debug)]
#[command(name = "mogisend", version, about)]
pub struct Cli {
    /// Set body type (ignored)
    #[arg(short = 'B', value_name = "TYPE")]
    pub body_type: Option<String>,

    /// Run operation named by CODE (must be m, deliver a message from stdin)
    #[arg(short = 'b', value_name = "CODE", default_value = "m")]
    pub mode: String,

    /// Set debugging value (smtp, nosend)
    #[arg(short = 'd', value_name = "VALUE")]
    pub debug: Vec<String>,

    /// Set the full name of the sender
    #[arg(short = 'F', value_name = "NAME")]
    pub full_name: Option<String>,

    /// Set the envelope sender address
    #[arg(short = 'f', value_name = "ADDR")]
    pub from: Option<String>,

    /// Archaic alias for -f
    #[arg(short = 'r', value_name = "ADDR", hide = true)]
    pub return_path: Option<String>,

    /// Ignore single dot lines on incoming message (default unless stdin is a TTY)
    #[arg(short = 'i')]
    pub ignore_dots: bool,

    /// Read To:, Cc:, Bcc: lines from the message
    #[arg(short = 't')]
    pub read_recipients: bool,

    /// Verbose mode
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Recipient addresses
    #[arg(value_name = "ADDR")]
    pub addresses: Vec<String>,
}

/// Debug toggles selected with `-d`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugFlags {
    /// Log the SMTP conversation with the relay
    pub smtp: bool,
    /// Assemble the message but do not deliver it
    pub nosend: bool,
}

/// Validated command line options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub sender_name: Option<String>,
    pub sender_address: Option<String>,
    pub preserve_single_dots: bool,
    pub recipients_from_headers: bool,
    pub verbose: bool,
    pub debug: DebugFlags,
    pub recipients: Vec<String>,
}

impl Cli {
    /// Check flag combinations and turn the raw flags into options
    pub fn into_options(self) -> Result<Options, SendmailError> {
        if self.mode != "m" {
            return Err(SendmailError::Usage(
                "only sendmail -bm is supported".to_string(),
            ));
        }

        let mut debug = DebugFlags::default();
        for value in &self.debug {
            match value.as_str() {
                "smtp" => debug.smtp = true,
                "nosend" => debug.nosend = true,
                other => {
                    return Err(SendmailError::Usage(format!(
                        "unknown debug value -d {other}"
                    )));
                }
            }
        }

        if self.addresses.is_empty() && !self.read_recipients {
            return Err(SendmailError::Usage(
                "no delivery addresses given".to_string(),
            ));
        }

        Ok(Options {
            sender_name: self.full_name.filter(|name| !name.is_empty()),
            sender_address: self.from.or(self.return_path),
            preserve_single_dots: self.ignore_dots,
            recipients_from_headers: self.read_recipients,
            verbose: self.verbose,
            debug,
            recipients: self.addresses,
        })
    }
}
