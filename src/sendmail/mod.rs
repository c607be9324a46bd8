//! sendmail front end implementation

pub mod address;
pub mod cli;
pub mod config;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod headers;
pub mod logging;
pub mod message;
pub mod submission;

pub use address::{Address, RecipientSet};
pub use cli::{Cli, DebugFlags, Options};
pub use config::Config;
pub use envelope::{AssembledMessage, BodyFilter, EnvelopeAssembler};
pub use error::{MessageLimits, SendmailError};
pub use filter::{FilterState, MIN_READ_LEN, TerminatorFilter};
pub use gateway::{DeliveryGateway, DiscardGateway, SmtpGateway};
pub use headers::HeaderBlock;
pub use message::Message;
pub use submission::{Identity, run, submit};
