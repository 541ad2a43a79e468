/// SMTP reply parsing.
///
/// Replies are one or more lines of `NNN<sep>text`, where `<sep>` is `-` on
/// every line but the last and a space (or nothing) on the last:
///
/// ```text
/// 250-smtp.example.com at your service
/// 250-AUTH LOGIN PLAIN
/// 250 8BITMIME
/// ```
use crate::error::DispatchError;

/// A complete server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    /// Text of each line with the code and separator removed.
    pub lines: Vec<String>,
}

impl Reply {
    /// Parse the collected lines of one reply.
    pub fn parse(lines: &[String]) -> Result<Self, DispatchError> {
        let first = lines
            .first()
            .ok_or_else(|| DispatchError::Protocol("empty reply".into()))?;
        let code = parse_code(first)?;

        let mut text = Vec::with_capacity(lines.len());
        for line in lines {
            if parse_code(line)? != code {
                return Err(DispatchError::Protocol(format!(
                    "reply code changed mid-reply: {line:?}"
                )));
            }
            text.push(line.get(4..).unwrap_or("").to_string());
        }

        Ok(Self { code, lines: text })
    }

    /// 2xx.
    pub fn is_positive(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// 3xx: the server wants more input (DATA body, AUTH challenge).
    pub fn is_intermediate(&self) -> bool {
        (300..400).contains(&self.code)
    }

    /// All lines joined with spaces.
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }

    /// Turn a non-matching reply into a [`DispatchError::Rejected`].
    pub fn expect(self, stage: &'static str, ok: impl Fn(&Self) -> bool) -> Result<Self, DispatchError> {
        if ok(&self) {
            Ok(self)
        } else {
            Err(DispatchError::Rejected {
                stage,
                code: self.code,
                message: self.text(),
            })
        }
    }
}

/// `true` when `line` ends a (possibly multi-line) reply.
pub fn is_last_line(line: &str) -> bool {
    line.len() == 3 || line.as_bytes().get(3) == Some(&b' ')
}

fn parse_code(line: &str) -> Result<u16, DispatchError> {
    let digits = line
        .get(..3)
        .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| DispatchError::Protocol(format!("malformed reply line {line:?}")))?;
    match line.as_bytes().get(3) {
        None | Some(b' ') | Some(b'-') => {}
        Some(_) => {
            return Err(DispatchError::Protocol(format!(
                "malformed reply line {line:?}"
            )))
        }
    }
    digits
        .parse()
        .map_err(|_| DispatchError::Protocol(format!("malformed reply code in {line:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_line() {
        let reply = Reply::parse(&lines(&["250 OK"])).unwrap();
        assert_eq!(reply.code, 250);
        assert_eq!(reply.lines, vec!["OK"]);
        assert!(reply.is_positive());
    }

    #[test]
    fn test_multi_line() {
        let reply = Reply::parse(&lines(&["250-mx.example", "250-AUTH PLAIN LOGIN", "250 SIZE 100"]))
            .unwrap();
        assert_eq!(reply.lines, vec!["mx.example", "AUTH PLAIN LOGIN", "SIZE 100"]);
        assert_eq!(reply.text(), "mx.example AUTH PLAIN LOGIN SIZE 100");
    }

    #[test]
    fn test_bare_code() {
        let reply = Reply::parse(&lines(&["354"])).unwrap();
        assert!(reply.is_intermediate());
        assert_eq!(reply.lines, vec![""]);
    }

    #[test]
    fn test_malformed() {
        assert!(Reply::parse(&[]).is_err());
        assert!(Reply::parse(&lines(&["25"])).is_err());
        assert!(Reply::parse(&lines(&["abc OK"])).is_err());
        assert!(Reply::parse(&lines(&["250xOK"])).is_err());
        assert!(Reply::parse(&lines(&["250-a", "550 b"])).is_err());
    }

    #[test]
    fn test_last_line_detection() {
        assert!(is_last_line("250 OK"));
        assert!(is_last_line("250"));
        assert!(!is_last_line("250-more"));
    }

    #[test]
    fn test_expect_maps_to_rejected() {
        let reply = Reply::parse(&lines(&["550 no such user"])).unwrap();
        let err = reply.expect("RCPT TO", Reply::is_positive).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Rejected { stage: "RCPT TO", code: 550, .. }
        ));
    }
}
