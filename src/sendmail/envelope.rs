//! Envelope and header assembly for outgoing messages

use std::io::{BufReader, Cursor, Read};

use crate::sendmail::address::{Address, RecipientSet};
use crate::sendmail::error::{MessageLimits, SendmailError};
use crate::sendmail::filter::TerminatorFilter;
use crate::sendmail::headers::HeaderBlock;
use crate::sendmail::message::Message;

/// Header fields recipients are taken from, in order
pub const RECIPIENT_FIELDS: [&str; 3] = ["To", "Cc", "Bcc"];

/// How the message body is passed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFilter {
    /// Deliver the body as read
    Passthrough,
    /// End the body at a line containing a single dot
    StopAtDot,
}

impl BodyFilter {
    /// Only a person typing at a terminal ends a message with a dot line,
    /// and only when single dots were not asked to be preserved.
    pub fn for_input(interactive: bool, preserve_single_dots: bool) -> Self {
        if interactive && !preserve_single_dots {
            BodyFilter::StopAtDot
        } else {
            BodyFilter::Passthrough
        }
    }
}

/// Builds the envelope and final header block for a message
#[derive(Debug, Clone)]
pub struct EnvelopeAssembler {
    sender: Address,
    recipients: Vec<Address>,
    derive_from_headers: bool,
    body_filter: BodyFilter,
}

impl EnvelopeAssembler {
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            recipients: Vec::new(),
            derive_from_headers: false,
            body_filter: BodyFilter::Passthrough,
        }
    }

    /// Recipients given explicitly, e.g. on the command line
    pub fn recipients(mut self, recipients: Vec<Address>) -> Self {
        self.recipients = recipients;
        self
    }

    /// Also take recipients from the To, Cc and Bcc fields
    pub fn derive_from_headers(mut self, derive: bool) -> Self {
        self.derive_from_headers = derive;
        self
    }

    pub fn body_filter(mut self, body_filter: BodyFilter) -> Self {
        self.body_filter = body_filter;
        self
    }

    /// Resolve recipients, finalize the headers and attach the body
    pub fn assemble<'a, R: Read + 'a>(
        self,
        message: Message<R>,
    ) -> Result<AssembledMessage<'a>, SendmailError> {
        let (mut headers, body) = message.into_parts();

        let mut recipients = RecipientSet::from(self.recipients);
        if self.derive_from_headers {
            for field in RECIPIENT_FIELDS {
                for value in headers.get_all(field) {
                    let value = std::str::from_utf8(value).map_err(|_| {
                        SendmailError::HeaderParse(format!(
                            "cannot parse {field}: list: not valid UTF-8"
                        ))
                    })?;
                    let addresses = Address::parse_list(value).map_err(|e| {
                        SendmailError::HeaderParse(format!("cannot parse {field}: list: {e}"))
                    })?;
                    recipients.extend(addresses);
                }
            }
            if recipients.is_empty() {
                return Err(SendmailError::AddressResolution(
                    "no recipients found in message".to_string(),
                ));
            }
        } else if recipients.is_empty() {
            return Err(SendmailError::AddressResolution(
                "no delivery addresses given".to_string(),
            ));
        }

        if !headers.contains("From") {
            headers.set("From", self.sender.to_string());
        }
        headers.remove("Bcc");

        let body: Box<dyn Read + 'a> = match self.body_filter {
            BodyFilter::Passthrough => Box::new(body),
            // Reads reach the filter only through the buffer, never shorter
            // than MIN_READ_LEN
            BodyFilter::StopAtDot => Box::new(BufReader::with_capacity(
                MessageLimits::READ_CHUNK_SIZE,
                TerminatorFilter::new(body),
            )),
        };

        Ok(AssembledMessage {
            sender: self.sender,
            recipients,
            header_bytes: headers.to_bytes(),
            headers,
            body_filter: self.body_filter,
            body,
        })
    }
}

/// A message ready to be handed to a delivery gateway
pub struct AssembledMessage<'a> {
    sender: Address,
    recipients: RecipientSet,
    headers: HeaderBlock,
    header_bytes: Vec<u8>,
    body_filter: BodyFilter,
    body: Box<dyn Read + 'a>,
}

impl<'a> AssembledMessage<'a> {
    /// Envelope sender
    pub fn sender(&self) -> &Address {
        &self.sender
    }

    /// Envelope recipients, including any taken from Bcc
    pub fn recipients(&self) -> &RecipientSet {
        &self.recipients
    }

    /// Final header block, without Bcc
    pub fn headers(&self) -> &HeaderBlock {
        &self.headers
    }

    /// Serialized header block including the blank separator line
    pub fn header_bytes(&self) -> &[u8] {
        &self.header_bytes
    }

    pub fn body_filter(&self) -> BodyFilter {
        self.body_filter
    }

    /// The outgoing stream: header block followed by the body
    pub fn into_reader(self) -> impl Read + 'a {
        Cursor::new(self.header_bytes).chain(self.body)
    }
}

impl std::fmt::Debug for AssembledMessage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssembledMessage")
            .field("sender", &self.sender)
            .field("recipients", &self.recipients)
            .field("headers", &self.headers)
            .field("body_filter", &self.body_filter)
            .finish_non_exhaustive()
    }
}
