/// Outgoing message assembly.
///
/// Produces a `multipart/mixed` RFC 5322 document: one `text/plain` body
/// part and one base64-encoded attachment. Non-ASCII header values are
/// RFC 2047 encoded.
use crate::mail::Address;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Local};
use std::fmt::Write as _;

/// Base64 output is wrapped at this many columns (RFC 2045).
const BASE64_LINE_LEN: usize = 76;

/// A file carried by the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    /// A UTF-8 text attachment.
    pub fn text(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "text/plain; charset=utf-8".to_string(),
            data,
        }
    }
}

/// One message, one recipient, one attachment.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub from: Address,
    pub to: Address,
    pub subject: String,
    pub body: String,
    pub date: DateTime<Local>,
    pub attachment: Attachment,
}

impl OutgoingMessage {
    pub fn new(
        from: Address,
        to: Address,
        subject: impl Into<String>,
        body: impl Into<String>,
        attachment: Attachment,
    ) -> Self {
        Self {
            from,
            to,
            subject: subject.into(),
            body: body.into(),
            date: Local::now(),
            attachment,
        }
    }

    /// Boundary string derived from the timestamp. Base64 output and the
    /// fixed body text cannot contain `=_`, so it never collides.
    fn boundary(&self) -> String {
        format!(
            "=_dirlog_{:x}_{:x}",
            self.date.timestamp_nanos_opt().unwrap_or_default(),
            std::process::id()
        )
    }

    fn message_id(&self) -> String {
        format!(
            "<{}.{}@{}>",
            self.date.timestamp_micros(),
            std::process::id(),
            self.from.domain()
        )
    }

    /// Render with CRLF line endings.
    pub fn to_rfc5322(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "From: {}\r\n", self.from);
        let _ = write!(out, "To: {}\r\n", self.to);
        let _ = write!(out, "Subject: {}\r\n", encode_header_value(&self.subject));
        let _ = write!(out, "Date: {}\r\n", self.date.to_rfc2822());
        let _ = write!(out, "Message-ID: {}\r\n", self.message_id());
        out.push_str("MIME-Version: 1.0\r\n");

        let attachment = &self.attachment;
        let boundary = self.boundary();
        let _ = write!(
            out,
            "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n"
        );
        out.push_str("This is a multi-part message in MIME format.\r\n");

        let _ = write!(out, "\r\n--{boundary}\r\n");
        write_text_part_headers(&mut out, &self.body);
        out.push_str("\r\n");
        push_crlf_text(&mut out, &self.body);

        let filename = encode_header_value(&attachment.filename).replace('"', "");
        let _ = write!(out, "\r\n--{boundary}\r\n");
        let _ = write!(
            out,
            "Content-Type: {}; name=\"{filename}\"\r\n",
            attachment.content_type
        );
        out.push_str("Content-Transfer-Encoding: base64\r\n");
        let _ = write!(
            out,
            "Content-Disposition: attachment; filename=\"{filename}\"\r\n\r\n"
        );
        push_base64_lines(&mut out, &attachment.data);

        let _ = write!(out, "\r\n--{boundary}--\r\n");
        out
    }
}

fn write_text_part_headers(out: &mut String, body: &str) {
    out.push_str("Content-Type: text/plain; charset=utf-8\r\n");
    let encoding = if body.is_ascii() { "7bit" } else { "8bit" };
    let _ = write!(out, "Content-Transfer-Encoding: {encoding}\r\n");
}

/// Append `text` with every line ending normalised to CRLF.
fn push_crlf_text(out: &mut String, text: &str) {
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push_str("\r\n");
        }
        out.push_str(line);
    }
}

fn push_base64_lines(out: &mut String, data: &[u8]) {
    let encoded = STANDARD.encode(data);
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(BASE64_LINE_LEN));
        out.push_str(line);
        if !tail.is_empty() {
            out.push_str("\r\n");
        }
        rest = tail;
    }
}

/// RFC 2047 `B` encoding for non-ASCII header values; ASCII passes through.
fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?utf-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(log: Vec<u8>) -> OutgoingMessage {
        OutgoingMessage::new(
            Address::new("sender@example.com").unwrap(),
            Address::new("rcpt@example.org").unwrap(),
            "Directory log",
            "This is a system generated email, kindly do not reply.",
            Attachment::text("directory_traversal_log.txt", log),
        )
    }

    #[test]
    fn test_headers_and_body_part() {
        let text = message(Vec::new()).to_rfc5322();
        assert!(text.starts_with("From: sender@example.com\r\nTo: rcpt@example.org\r\n"));
        assert!(text.contains("Subject: Directory log\r\n"));
        assert!(text.contains("MIME-Version: 1.0\r\n"));
        assert!(text.contains(
            "Content-Type: text/plain; charset=utf-8\r\nContent-Transfer-Encoding: 7bit\r\n\r\n\
             This is a system generated email, kindly do not reply.\r\n"
        ));
    }

    #[test]
    fn test_multipart_with_attachment() {
        let log = b"THE DIRECTORY TRAVERSAL LOG:\n\nDate: 2025-04-21".to_vec();
        let msg = message(log.clone());
        let boundary = msg.boundary();
        let text = msg.to_rfc5322();

        assert!(text.contains(&format!("boundary=\"{boundary}\"")));
        assert!(text.contains(
            "Content-Disposition: attachment; filename=\"directory_traversal_log.txt\"\r\n"
        ));
        assert!(text.contains("Content-Transfer-Encoding: base64\r\n"));
        assert!(text.ends_with(&format!("--{boundary}--\r\n")));

        // Decode the attachment back out of the rendered message.
        let start = text.find("filename=\"directory_traversal_log.txt\"\r\n\r\n").unwrap();
        let after = &text[start..];
        let payload_start = after.find("\r\n\r\n").unwrap() + 4;
        let payload_end = after.find(&format!("\r\n--{boundary}--")).unwrap();
        let b64: String = after[payload_start..payload_end]
            .split("\r\n")
            .collect();
        assert_eq!(STANDARD.decode(b64).unwrap(), log);
    }

    #[test]
    fn test_base64_lines_are_wrapped() {
        let mut out = String::new();
        push_base64_lines(&mut out, &[0u8; 200]);
        let lines: Vec<&str> = out.split("\r\n").collect();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= BASE64_LINE_LEN));
        assert_eq!(lines[0].len(), BASE64_LINE_LEN);
    }

    #[test]
    fn test_non_ascii_subject_is_encoded() {
        assert_eq!(encode_header_value("plain"), "plain");
        let encoded = encode_header_value("Journal répertoire");
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert!(encoded.ends_with("?="));
    }

    #[test]
    fn test_body_line_endings_normalised() {
        let mut out = String::new();
        push_crlf_text(&mut out, "a\nb\r\nc");
        assert_eq!(out, "a\r\nb\r\nc");
    }
}
