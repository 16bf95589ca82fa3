//! HTTP headers handling
//!
//! Header names are kept exactly as received and looked up case-sensitively.
//! Only `Content-Length` has meaning to this implementation; every other
//! header is carried through untouched.

use super::{Error, Result, CONTENT_LENGTH, CRLF, MAX_HEADERS};
use bytes::{BufMut, BytesMut};

/// HTTP headers collection
///
/// A name→value mapping that preserves insertion order. Inserting a name
/// that is already present replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<(String, String)>,
}

impl Headers {
    /// Create a new empty headers collection
    pub fn new() -> Self {
        Headers {
            headers: Vec::new(),
        }
    }

    /// Insert a header, replacing any previous value under the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        if let Some(slot) = self.headers.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
            return;
        }

        if self.headers.len() >= MAX_HEADERS && name != CONTENT_LENGTH {
            return;
        }

        self.headers.push((name, value));
    }

    /// Get the value for a header (exact name match)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get the number of headers
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Check if there are no headers
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Clear all headers
    pub fn clear(&mut self) {
        self.headers.clear();
    }

    /// Iterate over all headers
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Parse the `Content-Length` value as a non-negative integer
    ///
    /// Returns `Ok(None)` when the header is absent.
    pub fn content_length(&self) -> Result<Option<usize>> {
        match self.get(CONTENT_LENGTH) {
            Some(raw) => raw
                .parse::<usize>()
                .map(Some)
                .map_err(|_| Error::InvalidContentLength(raw.to_string())),
            None => Ok(None),
        }
    }

    /// Serialize every header as `Name: Value CRLF`
    ///
    /// The terminating blank line is written by the message, not here.
    pub fn write_to(&self, buf: &mut BytesMut) {
        for (name, value) in &self.headers {
            buf.put_slice(name.as_bytes());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(CRLF.as_bytes());
        }
    }

    /// Parse a header line into name and value
    ///
    /// Splits on the first colon; the name is kept verbatim and the value
    /// is trimmed.
    pub fn parse_header_line(line: &str) -> Result<(String, String)> {
        let Some((name, value)) = line.split_once(':') else {
            return Err(Error::InvalidHeader(format!("No colon in header: {}", line)));
        };

        if name.trim().is_empty() {
            return Err(Error::InvalidHeader("Empty header name".to_string()));
        }

        Ok((name.to_string(), value.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/html");
        headers.insert("Content-Length", "42");

        assert_eq!(headers.get("Content-Type"), Some("text/html"));
        assert_eq!(headers.get("Content-Length"), Some("42"));
        assert_eq!(headers.get("Missing"), None);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut headers = Headers::new();
        headers.insert("content-length", "7");

        assert_eq!(headers.get("content-length"), Some("7"));
        assert_eq!(headers.get("Content-Length"), None);
        assert_eq!(headers.get("CONTENT-LENGTH"), None);
    }

    #[test]
    fn test_insert_replaces() {
        let mut headers = Headers::new();
        headers.insert("X-Custom", "first");
        headers.insert("X-Custom", "second");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("X-Custom"), Some("second"));
    }

    #[test]
    fn test_iter_preserves_order() {
        let mut headers = Headers::new();
        headers.insert("A", "1");
        headers.insert("B", "2");
        headers.insert("C", "3");

        let collected: Vec<_> = headers.iter().collect();
        assert_eq!(collected, vec![("A", "1"), ("B", "2"), ("C", "3")]);
    }

    #[test]
    fn test_parse_header_line() {
        let (name, value) = Headers::parse_header_line("Content-Length: 12").unwrap();
        assert_eq!(name, "Content-Length");
        assert_eq!(value, "12");

        let (name, value) = Headers::parse_header_line("X-Custom:  value  ").unwrap();
        assert_eq!(name, "X-Custom");
        assert_eq!(value, "value");

        // Only the first colon splits
        let (name, value) = Headers::parse_header_line("Host: example.com:5000").unwrap();
        assert_eq!(name, "Host");
        assert_eq!(value, "example.com:5000");

        assert!(Headers::parse_header_line("Invalid").is_err());
        assert!(Headers::parse_header_line(": value").is_err());
    }

    #[test]
    fn test_content_length() {
        let mut headers = Headers::new();
        assert_eq!(headers.content_length().unwrap(), None);

        headers.insert("Content-Length", "5");
        assert_eq!(headers.content_length().unwrap(), Some(5));

        headers.insert("Content-Length", "-1");
        assert!(matches!(
            headers.content_length(),
            Err(Error::InvalidContentLength(v)) if v == "-1"
        ));

        headers.insert("Content-Length", "abc");
        assert!(headers.content_length().is_err());
    }

    #[test]
    fn test_write_to() {
        let mut headers = Headers::new();
        headers.insert("Content-Length", "4");
        headers.insert("X-A", "b");

        let mut buf = BytesMut::new();
        headers.write_to(&mut buf);
        assert_eq!(&buf[..], b"Content-Length: 4\r\nX-A: b\r\n");
    }

    #[test]
    fn test_max_headers() {
        let mut headers = Headers::new();
        for i in 0..MAX_HEADERS + 10 {
            headers.insert(format!("Header-{}", i), "value");
        }
        assert_eq!(headers.len(), MAX_HEADERS);
        assert_eq!(headers.get("Header-70"), None);

        headers.insert("Content-Length", "4");
        assert_eq!(headers.len(), MAX_HEADERS + 1);
        assert_eq!(headers.content_length().unwrap(), Some(4));
    }
}
