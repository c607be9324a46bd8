//! # mogisend
//!
//! mogisend is a drop-in replacement for the classic `sendmail` command.
//!
//! It reads a message from standard input, tidies up its header and hands it
//! to an SMTP relay.
//!
//! ## Quick Start
//!
//! ```sh
//! # recipients on the command line
//! printf 'Subject: hello\n\nHi there\n' | mogisend bob@example.com
//!
//! # recipients taken from the message
//! mogisend -t < message.eml
//! ```
//!
//! The pipeline can also be driven as a library:
//!
//! ```rust
//! use mogisend::{Address, EnvelopeAssembler, Message};
//! use std::io::{Cursor, Read};
//!
//! let input = Cursor::new(b"to: bob@example.com\nbcc: eve@example.com\n\nHi Bob\n".to_vec());
//! let message = Message::read_from(input).unwrap();
//!
//! let assembled = EnvelopeAssembler::new(Address::parse("alice@example.com").unwrap())
//!     .derive_from_headers(true)
//!     .assemble(message)
//!     .unwrap();
//! assert_eq!(assembled.recipients().len(), 2);
//!
//! let mut outgoing = String::new();
//! assembled.into_reader().read_to_string(&mut outgoing).unwrap();
//! assert_eq!(outgoing, "From: alice@example.com\nTo: bob@example.com\n\nHi Bob\n");
//! ```
//!
//! ## Supported options
//!
//! - `-i` - Ignore single dot lines on incoming message (default unless stdin is a TTY)
//! - `-t` - Use To:, Cc: and Bcc: lines from the message
//! - `-v` - Verbose mode
//! - `-B type` - Set body type (ignored)
//! - `-b code` - Set mode code (must be `m`, deliver a message from standard input)
//! - `-d value` - Set debugging value (`smtp`, `nosend`)
//! - `-F name` - Set full name of sender
//! - `-f addr` - Set address of sender
//! - `-r addr` - Archaic equivalent of `-f`
//!
//! ## Message Handling
//!
//! - Header field names are normalized (`content-type` becomes `Content-Type`)
//!   and written out sorted by name.
//! - A missing `From:` is filled in from `-f`/`-F` or `$USER`.
//! - `Bcc:` is always removed; its addresses only reach the envelope.
//! - When standard input is a terminal, a line with a single `.` ends the
//!   message, unless `-i` is given.
//!
//! ## Configuration
//!
//! The relay is read from `$MOGISEND_CONFIG`, `~/.mogisend.toml` or
//! `/etc/mogisend.toml` (first one found), and `$MOGISEND_RELAY`
//! (`host[:port]`) overrides it. Without configuration, mail goes to
//! `localhost:25`.
//!
//! ## Diagnostics
//!
//! If the configured log file (`/var/log/mogisend.log` by default) can be
//! opened for writing, mogisend logs its actions, successes and failures
//! there.
//!
//! ## Notes
//!
//! - There is no retry; a relay failure ends the command with an error.
//! - SMTP authentication is not supported.
//! - Message bodies are passed on as they are: no MIME or charset handling.

mod sendmail;

pub use sendmail::{
    Address, AssembledMessage, BodyFilter, Cli, Config, DebugFlags, DeliveryGateway,
    DiscardGateway, EnvelopeAssembler, FilterState, HeaderBlock, Identity, MIN_READ_LEN,
    Message, MessageLimits, Options, RecipientSet, SendmailError, SmtpGateway, TerminatorFilter,
    run, submit,
};
