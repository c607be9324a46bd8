//! Header fields keyed by canonical name

use std::collections::BTreeMap;
use std::io::{self, Write};

/// Whether `b` may appear in a header field name
pub(crate) fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Normalize a field name: `content-type` becomes `Content-Type`.
///
/// Names containing bytes outside the header token set are returned as they
/// are.
pub fn canonical_name(name: &str) -> String {
    if name.is_empty() || !name.bytes().all(is_token_byte) {
        return name.to_owned();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let c = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            c
        })
        .collect()
}

/// Message header fields.
///
/// Values are kept as raw bytes so that text in any character set passes
/// through unchanged. Repeated fields keep their values in insertion order.
/// Iteration and serialization are ordered by canonical field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    fields: BTreeMap<String, Vec<Vec<u8>>>,
}

impl HeaderBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to a field
    pub fn add(&mut self, name: &str, value: impl Into<Vec<u8>>) {
        self.fields
            .entry(canonical_name(name))
            .or_default()
            .push(value.into());
    }

    /// Replace all values of a field with a single one
    pub fn set(&mut self, name: &str, value: impl Into<Vec<u8>>) {
        self.fields.insert(canonical_name(name), vec![value.into()]);
    }

    /// First value of a field as text, `None` when absent or not UTF-8
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name)
            .first()
            .and_then(|value| std::str::from_utf8(value).ok())
    }

    pub fn get_all(&self, name: &str) -> &[Vec<u8>] {
        self.fields
            .get(&canonical_name(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        !self.get_all(name).is_empty()
    }

    /// Remove a field, returning its values
    pub fn remove(&mut self, name: &str) -> Vec<Vec<u8>> {
        self.fields.remove(&canonical_name(name)).unwrap_or_default()
    }

    /// Number of distinct fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `(name, value)` pairs in serialization order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.fields.iter().flat_map(|(name, values)| {
            values
                .iter()
                .map(move |value| (name.as_str(), value.as_slice()))
        })
    }

    /// Write `Name: value` lines followed by the blank separator line
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (name, value) in self.iter() {
            out.write_all(name.as_bytes())?;
            out.write_all(b": ")?;
            out.write_all(value)?;
            out.write_all(b"\n")?;
        }
        out.write_all(b"\n")
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_to(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("subject"), "Subject");
        assert_eq!(canonical_name("BCC"), "Bcc");
        assert_eq!(canonical_name("content-type"), "Content-Type");
        assert_eq!(canonical_name("MESSAGE-ID"), "Message-Id");
        assert_eq!(canonical_name("x-mailer"), "X-Mailer");
        // Not a valid field name, left alone
        assert_eq!(canonical_name("bad name"), "bad name");
    }

    #[test]
    fn test_repeated_fields_keep_order() {
        let mut headers = HeaderBlock::new();
        headers.add("Received", "from a");
        headers.add("received", "from b");
        headers.add("RECEIVED", "from c");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get_all("Received"), [b"from a", b"from b", b"from c"]);
        assert_eq!(headers.get("received"), Some("from a"));
    }

    #[test]
    fn test_set_and_remove() {
        let mut headers = HeaderBlock::new();
        headers.add("To", "a@example.com");
        headers.add("To", "b@example.com");
        headers.set("to", "c@example.com");
        assert_eq!(headers.get_all("To"), [b"c@example.com"]);

        assert_eq!(headers.remove("TO"), vec![b"c@example.com".to_vec()]);
        assert!(!headers.contains("To"));
        assert!(headers.remove("To").is_empty());
        assert!(headers.get_all("To").is_empty());
    }

    #[test]
    fn test_serialized_in_name_order() {
        let mut headers = HeaderBlock::new();
        headers.add("subject", "hi");
        headers.add("to", "a@x.com");
        headers.add("X-Trace", "2");
        headers.add("Date", "today");
        headers.add("x-trace", "1");

        assert_eq!(
            String::from_utf8(headers.to_bytes()).unwrap(),
            "Date: today\nSubject: hi\nTo: a@x.com\nX-Trace: 2\nX-Trace: 1\n\n"
        );
    }

    #[test]
    fn test_non_utf8_value_kept_verbatim() {
        let mut headers = HeaderBlock::new();
        headers.add("subject", b"caf\xe9".to_vec());

        assert_eq!(headers.get("Subject"), None);
        assert_eq!(headers.get_all("Subject"), [b"caf\xe9"]);
        assert_eq!(headers.to_bytes(), b"Subject: caf\xe9\n\n");
    }

    #[test]
    fn test_empty_block_serializes_separator() {
        assert_eq!(HeaderBlock::new().to_bytes(), b"\n");
    }
}
