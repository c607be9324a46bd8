//! Mailbox addresses and recipient lists

use std::fmt;
use std::str::FromStr;

use lettre::address::AddressError;
use lettre::message::{Mailbox, Mailboxes};

/// A parsed mailbox: optional display name plus `local@domain`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    mailbox: Mailbox,
}

impl Address {
    /// Parse a single address such as `Jane <jane@example.com>`
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        s.parse()
    }

    /// Parse a comma separated address list as found in To/Cc/Bcc headers
    pub fn parse_list(s: &str) -> Result<Vec<Self>, AddressError> {
        let mailboxes = Mailboxes::from_str(s)?;
        Ok(mailboxes.into_iter().map(Address::from).collect())
    }

    /// Replace the display name
    pub fn with_name(self, name: Option<String>) -> Self {
        Self {
            mailbox: Mailbox::new(name, self.mailbox.email),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.mailbox.name.as_deref()
    }

    /// The bare `local@domain` part
    pub fn email(&self) -> &str {
        self.mailbox.email.as_ref()
    }

    /// Address as used in the SMTP envelope (display name dropped)
    pub fn envelope_address(&self) -> lettre::Address {
        self.mailbox.email.clone()
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            mailbox: s.trim().parse()?,
        })
    }
}

impl From<Mailbox> for Address {
    fn from(mailbox: Mailbox) -> Self {
        Self { mailbox }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.mailbox, f)
    }
}

/// Whether `s` lacks a domain and must be qualified before parsing
pub fn is_local_part(s: &str) -> bool {
    !s.contains('@')
}

/// Ordered list of envelope recipients.
///
/// Duplicates are kept: a recipient named twice is sent to twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientSet {
    addresses: Vec<Address>,
}

impl RecipientSet {
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Address> {
        self.addresses.iter()
    }

    pub fn as_slice(&self) -> &[Address] {
        &self.addresses
    }
}

impl From<Vec<Address>> for RecipientSet {
    fn from(addresses: Vec<Address>) -> Self {
        Self { addresses }
    }
}

impl Extend<Address> for RecipientSet {
    fn extend<T: IntoIterator<Item = Address>>(&mut self, iter: T) {
        self.addresses.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_address() {
        let addr = Address::parse("user@example.com").unwrap();
        assert_eq!(addr.email(), "user@example.com");
        assert_eq!(addr.name(), None);
        assert_eq!(addr.to_string(), "user@example.com");
    }

    #[test]
    fn test_parse_named_address() {
        let addr = Address::parse("Jane Doe <jane@example.com>").unwrap();
        assert_eq!(addr.email(), "jane@example.com");
        assert_eq!(addr.name(), Some("Jane Doe"));
        assert_eq!(addr.to_string(), "Jane Doe <jane@example.com>");
    }

    #[test]
    fn test_parse_invalid_address() {
        assert!(Address::parse("not an address").is_err());
        assert!(Address::parse("").is_err());
    }

    #[test]
    fn test_parse_list_keeps_order_and_duplicates() {
        let list =
            Address::parse_list("a@example.com, B <b@example.com>, a@example.com").unwrap();
        let emails: Vec<&str> = list.iter().map(Address::email).collect();
        assert_eq!(emails, vec!["a@example.com", "b@example.com", "a@example.com"]);
        assert_eq!(list[1].name(), Some("B"));
    }

    #[test]
    fn test_with_name() {
        let addr = Address::parse("root@example.com")
            .unwrap()
            .with_name(Some("Charlie Root".to_string()));
        assert_eq!(addr.to_string(), "Charlie Root <root@example.com>");
        assert_eq!(addr.envelope_address().to_string(), "root@example.com");
    }

    #[test]
    fn test_is_local_part() {
        assert!(is_local_part("root"));
        assert!(!is_local_part("root@example.com"));
    }

    #[test]
    fn test_recipient_set() {
        let mut set = RecipientSet::default();
        assert!(set.is_empty());

        set.extend(Address::parse_list("a@example.com, b@example.com, a@example.com").unwrap());

        assert_eq!(set.len(), 3);
        let emails: Vec<&str> = set.iter().map(Address::email).collect();
        assert_eq!(emails, ["a@example.com", "b@example.com", "a@example.com"]);
        assert_eq!(set.as_slice()[2].email(), "a@example.com");
    }
}
