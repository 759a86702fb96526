//! The HTTP response header the serializer prepends to the block-framed
//! payload.
//!
//! The `Content-Length` value is written into a fixed-width, zero-padded
//! 16-digit decimal field so a later rewrite (e.g. after the LZ4 envelope
//! changes the payload size) never shifts any byte that follows it.

const STATUS_LINE: &str = "HTTP/1.1 200 OK\r\n";
const CONTENT_TYPE_LINE: &str = "Content-Type: application/octet-stream\r\n";
const CONTENT_LENGTH_PREFIX: &str = "Content-Length: ";
const CRLF: &str = "\r\n";

/// Width of the zero-padded decimal `Content-Length` field.
pub const CONTENT_LENGTH_DIGITS: usize = 16;

/// Build the header for a payload of `content_length` bytes.
pub fn build(content_length: u64) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(STATUS_LINE.as_bytes());
    out.extend_from_slice(CONTENT_TYPE_LINE.as_bytes());
    out.extend_from_slice(CONTENT_LENGTH_PREFIX.as_bytes());
    out.extend_from_slice(format!("{:0width$}", content_length, width = CONTENT_LENGTH_DIGITS).as_bytes());
    out.extend_from_slice(CRLF.as_bytes());
    out.extend_from_slice(CRLF.as_bytes());
    out
}

/// Locate the end of the header (`\r\n\r\n`, inclusive) in `bytes`. Returns
/// `0` if no header is present, so the block stream starts at offset 0.
pub fn skip(bytes: &[u8]) -> usize {
    const SEP: &[u8] = b"\r\n\r\n";
    bytes
        .windows(SEP.len())
        .position(|w| w == SEP)
        .map(|pos| pos + SEP.len())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_contains_zero_padded_length() {
        let header = build(123);
        let text = String::from_utf8(header.clone()).unwrap();
        assert!(text.contains("Content-Length: 0000000000000123\r\n\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn skip_finds_terminator() {
        let header = build(0);
        let mut stream = header.clone();
        stream.extend_from_slice(b"payload");
        assert_eq!(skip(&stream), header.len());
    }

    #[test]
    fn skip_without_header_returns_zero() {
        assert_eq!(skip(b"no header here"), 0);
    }
}
