//! Client upgrade request.
//!
//! From [RFC-6455 Section 4.1](https://datatracker.ietf.org/doc/html/rfc6455#section-4.1):
//!
//! Example:
//!
//! ```text
//! GET /path HTTP/1.1
//! host: www.example.com
//! upgrade: websocket
//! connection: upgrade
//! sec-websocket-key: dGhlIHNhbXBsZSBub25jZQ==
//! sec-websocket-version: 13
//! ```
//!
//! Only header names and values are of interest here. Names are lower-cased,
//! values are trimmed, and lines which do not look like a header are skipped.

use std::collections::HashMap;

use super::HTTP_LINE_BREAK;

/// Lower-cased header name to trimmed value.
pub type Headers = HashMap<String, String>;

/// Parse the header block of a raw request, starting at the request line.
///
/// The block is handed to `httparse`, with invalid header lines ignored.
/// A block that `httparse` refuses as a whole (e.g. a malformed request
/// line) is scanned line by line instead, skipping the first line.
pub fn parse_headers(block: &[u8]) -> Headers {
    let lines = block
        .windows(HTTP_LINE_BREAK.len())
        .filter(|w| *w == HTTP_LINE_BREAK)
        .count();

    let mut storage = vec![httparse::EMPTY_HEADER; lines.max(1)];
    let mut request = httparse::Request::new(&mut storage);
    let mut config = httparse::ParserConfig::default();
    config.ignore_invalid_headers_in_requests(true);

    match config.parse_request(&mut request, block) {
        Ok(httparse::Status::Complete(_)) => request
            .headers
            .iter()
            .map(|h| {
                (
                    h.name.trim().to_ascii_lowercase(),
                    String::from_utf8_lossy(h.value).trim().to_string(),
                )
            })
            .collect(),
        _ => {
            let mut headers = Headers::new();
            scan_lines(block, true, &mut headers);
            headers
        }
    }
}

/// Parse headers from already decoded text.
///
/// Every CRLF-terminated line containing a colon is taken as a header,
/// empty lines are ignored.
pub fn parse_headers_str(text: &str) -> Headers {
    let mut headers = Headers::new();
    scan_lines(text.as_bytes(), false, &mut headers);
    headers
}

fn scan_lines(buf: &[u8], skip_first: bool, headers: &mut Headers) {
    let mut lines = LineIter { buf };

    if skip_first && lines.next().is_none() {
        return;
    }

    for line in lines {
        if line.is_empty() {
            // the raw variant stops at the end of the header block
            if skip_first {
                break;
            }
            continue;
        }

        let Some(colon) = line.iter().position(|b| *b == b':') else {
            continue;
        };

        let name = String::from_utf8_lossy(&line[..colon]);
        let value = String::from_utf8_lossy(&line[colon + 1..]);
        headers.insert(name.trim().to_lowercase(), value.trim().to_string());
    }
}

/// CRLF-terminated lines. A trailing line without CRLF is not yielded.
struct LineIter<'b> {
    buf: &'b [u8],
}

impl<'b> Iterator for LineIter<'b> {
    type Item = &'b [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let end = self
            .buf
            .windows(HTTP_LINE_BREAK.len())
            .position(|w| w == HTTP_LINE_BREAK)?;
        let line = &self.buf[..end];
        self.buf = &self.buf[end + HTTP_LINE_BREAK.len()..];
        Some(line)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use super::super::test::{make_headers, TEMPLATE_HEADERS};

    #[test]
    fn parse_raw() {
        let request = b"GET /chat HTTP/1.1\r\n\
            Host: localhost\r\n\
            Connection: Upgrade\r\n\
            Sec-WebSocket-Key:   dGhlIHNhbXBsZSBub25jZQ==  \r\n\r\n";

        let headers = parse_headers(request);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers["connection"], "Upgrade");
        assert_eq!(headers["host"], "localhost");
        assert_eq!(headers["sec-websocket-key"], "dGhlIHNhbXBsZSBub25jZQ==");
    }

    #[test]
    fn parse_raw_skip_malformed() {
        let request = b"GET / HTTP/1.1\r\n\
            Upgrade: websocket\r\n\
            NoColonHere\r\n\
            Sec-WebSocket-Key: abc\r\n\r\n";

        let headers = parse_headers(request);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["upgrade"], "websocket");
        assert_eq!(headers["sec-websocket-key"], "abc");
    }

    #[test]
    fn parse_raw_fallback() {
        // not a request line httparse accepts
        let request = b"GARBAGE\r\nConnection: Upgrade\r\nX-Key : v\r\n\r\nignored: yes\r\n";

        let headers = parse_headers(request);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["connection"], "Upgrade");
        assert_eq!(headers["x-key"], "v");
    }

    #[test]
    fn parse_random_headers() {
        for i in 0..64 {
            let block = format!(
                "GET / HTTP/1.1\r\n{}\r\n",
                make_headers(i, 32, TEMPLATE_HEADERS)
            );

            let headers = parse_headers(block.as_bytes());
            assert_eq!(headers["host"], "www.example.com");
            assert_eq!(headers["upgrade"], "websocket");
            assert_eq!(headers["sec-websocket-key"], "dGhlIHNhbXBsZSBub25jZQ==");
            assert_eq!(headers["sec-websocket-version"], "13");
        }
    }

    #[test]
    fn parse_text() {
        let request = "GET /chat HTTP/1.1\r\n\
            Connection:   Upgrade \r\n\
            \r\n\
            UPGRADE: websocket\r\n\
            broken line\r\n\
            Unterminated: x";

        let headers = parse_headers_str(request);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["connection"], "Upgrade");
        assert_eq!(headers["upgrade"], "websocket");
    }
}
