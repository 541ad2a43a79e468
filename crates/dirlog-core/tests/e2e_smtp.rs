/// End-to-end SMTP dispatch tests.
///
/// A scripted SMTP server runs on a loopback `TcpListener` thread and the
/// real `SmtpDispatcher` talks to it over a plain connection, so the whole
/// session (greeting, EHLO, AUTH, envelope, DATA, QUIT) is exercised
/// without any mocking of the client. The server never speaks TLS, which
/// is enough to check how the TLS and STARTTLS modes fail against it.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dirlog_core::config::{Config, Security};
use dirlog_core::mail::{Dispatcher, SmtpDispatcher};
use dirlog_core::DispatchError;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::thread::{self, JoinHandle};
use tempfile::TempDir;

// ── Fake server ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct Script {
    /// Mechanisms advertised after `AUTH`.
    auth: &'static str,
    accept_login: bool,
    accept_recipient: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            auth: "PLAIN LOGIN",
            accept_login: true,
            accept_recipient: true,
        }
    }
}

/// What the server saw.
#[derive(Debug, Default)]
struct Transcript {
    commands: Vec<String>,
    data: Vec<String>,
}

/// Write failures mean the client already hung up; the transcript says
/// what happened, so they are ignored here.
fn send(stream: &mut TcpStream, reply: &str) {
    let _ = stream.write_all(reply.as_bytes());
    let _ = stream.flush();
}

fn spawn_server(script: Script) -> (u16, JoinHandle<Transcript>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut transcript = Transcript::default();
        // Binary input (a TLS handshake) or a reset ends the session.
        let read = |reader: &mut BufReader<TcpStream>| {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(n) if n > 0 => Some(line.trim_end_matches(['\r', '\n']).to_string()),
                _ => None,
            }
        };

        send(&mut stream, "220 fake.test ESMTP ready\r\n");
        while let Some(line) = read(&mut reader) {
            transcript.commands.push(line.clone());
            let upper = line.to_ascii_uppercase();
            if upper.starts_with("EHLO") {
                send(
                    &mut stream,
                    &format!("250-fake.test\r\n250-AUTH {}\r\n250 8BITMIME\r\n", script.auth),
                );
            } else if upper.starts_with("AUTH PLAIN") {
                if script.accept_login {
                    send(&mut stream, "235 2.7.0 Authentication successful\r\n");
                } else {
                    send(&mut stream, "535 5.7.8 Bad credentials\r\n");
                }
            } else if upper == "AUTH LOGIN" {
                send(&mut stream, "334 VXNlcm5hbWU6\r\n");
                let user = read(&mut reader).unwrap();
                transcript.commands.push(user);
                send(&mut stream, "334 UGFzc3dvcmQ6\r\n");
                let pass = read(&mut reader).unwrap();
                transcript.commands.push(pass);
                send(&mut stream, "235 2.7.0 Authentication successful\r\n");
            } else if upper.starts_with("MAIL FROM") {
                send(&mut stream, "250 2.1.0 OK\r\n");
            } else if upper.starts_with("RCPT TO") {
                if script.accept_recipient {
                    send(&mut stream, "250 2.1.5 OK\r\n");
                } else {
                    send(&mut stream, "550 5.1.1 No such user\r\n");
                }
            } else if upper == "DATA" {
                send(&mut stream, "354 End data with <CR><LF>.<CR><LF>\r\n");
                while let Some(data_line) = read(&mut reader) {
                    if data_line == "." {
                        break;
                    }
                    transcript.data.push(data_line);
                }
                send(&mut stream, "250 2.0.0 Queued\r\n");
            } else if upper == "QUIT" {
                send(&mut stream, "221 2.0.0 Bye\r\n");
                break;
            } else {
                send(&mut stream, "502 5.5.2 Command not recognized\r\n");
            }
        }
        transcript
    });

    (port, handle)
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn config_for(port: u16) -> Config {
    let mut cfg = Config::default();
    cfg.smtp.host = "127.0.0.1".to_string();
    cfg.smtp.port = port;
    cfg.smtp.security = Security::None;
    cfg.smtp.username = Some("sender@example.com".to_string());
    cfg.smtp.password = Some("app-password".to_string());
    cfg
}

fn write_artifact(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("directory_traversal_log.txt");
    fs::write(
        &path,
        "THE DIRECTORY TRAVERSAL LOG:\n\nDate: 2025-04-21\n------> .hidden",
    )
    .unwrap();
    path
}

/// Reassemble the base64 attachment payload from the DATA lines.
fn attachment_from(data: &[String]) -> Vec<u8> {
    let start = data
        .iter()
        .position(|l| l.starts_with("Content-Disposition: attachment"))
        .expect("attachment part present")
        + 2; // skip the blank line after the part headers
    let b64: String = data[start..]
        .iter()
        .take_while(|l| !l.starts_with("--"))
        .map(String::as_str)
        .collect();
    STANDARD.decode(b64).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Full happy path: the artifact arrives intact as an attachment.
#[test]
fn dispatch_delivers_artifact_as_attachment() {
    let tmp = TempDir::new().unwrap();
    let artifact = write_artifact(tmp.path());
    let (port, server) = spawn_server(Script::default());

    SmtpDispatcher::new(&config_for(port))
        .dispatch("rcpt@example.org", &artifact)
        .expect("dispatch should succeed");

    let transcript = server.join().unwrap();
    let expected_token = STANDARD.encode("\0sender@example.com\0app-password");
    assert_eq!(
        transcript.commands,
        vec![
            "EHLO localhost".to_string(),
            format!("AUTH PLAIN {expected_token}"),
            "MAIL FROM:<sender@example.com>".to_string(),
            "RCPT TO:<rcpt@example.org>".to_string(),
            "DATA".to_string(),
            "QUIT".to_string(),
        ]
    );
    assert!(transcript.data.contains(&"Subject: Directory log".to_string()));
    assert!(transcript
        .data
        .contains(&"This is a system generated email, kindly do not reply.".to_string()));
    assert_eq!(
        attachment_from(&transcript.data),
        fs::read(&artifact).unwrap()
    );
}

/// Servers that only offer LOGIN get the two-step exchange.
#[test]
fn dispatch_falls_back_to_auth_login() {
    let tmp = TempDir::new().unwrap();
    let artifact = write_artifact(tmp.path());
    let (port, server) = spawn_server(Script {
        auth: "LOGIN",
        ..Script::default()
    });

    SmtpDispatcher::new(&config_for(port))
        .dispatch("rcpt@example.org", &artifact)
        .unwrap();

    let transcript = server.join().unwrap();
    assert_eq!(transcript.commands[1], "AUTH LOGIN");
    assert_eq!(transcript.commands[2], STANDARD.encode("sender@example.com"));
    assert_eq!(transcript.commands[3], STANDARD.encode("app-password"));
}

#[test]
fn dispatch_reports_authentication_failure() {
    let tmp = TempDir::new().unwrap();
    let artifact = write_artifact(tmp.path());
    let (port, _server) = spawn_server(Script {
        accept_login: false,
        ..Script::default()
    });

    let err = SmtpDispatcher::new(&config_for(port))
        .dispatch("rcpt@example.org", &artifact)
        .unwrap_err();
    assert!(matches!(err, DispatchError::Authentication(_)), "{err}");
}

#[test]
fn dispatch_reports_rejected_recipient() {
    let tmp = TempDir::new().unwrap();
    let artifact = write_artifact(tmp.path());
    let (port, _server) = spawn_server(Script {
        accept_recipient: false,
        ..Script::default()
    });

    let err = SmtpDispatcher::new(&config_for(port))
        .dispatch("ghost@example.org", &artifact)
        .unwrap_err();
    assert!(
        matches!(err, DispatchError::Rejected { stage: "RCPT TO", code: 550, .. }),
        "{err}"
    );
}

/// Malformed recipients fail before any connection is attempted.
#[test]
fn dispatch_rejects_malformed_recipient_offline() {
    let tmp = TempDir::new().unwrap();
    let artifact = write_artifact(tmp.path());
    // Port 1 on loopback: connecting would fail, so reaching it would show up
    // as a Connection error rather than InvalidAddress.
    let err = SmtpDispatcher::new(&config_for(1))
        .dispatch("not-an-address", &artifact)
        .unwrap_err();
    assert!(matches!(err, DispatchError::InvalidAddress { .. }));
}

#[test]
fn dispatch_without_credentials_fails_cleanly() {
    let tmp = TempDir::new().unwrap();
    let artifact = write_artifact(tmp.path());
    let mut cfg = config_for(1);
    cfg.smtp.username = None;
    cfg.smtp.password = None;

    let err = SmtpDispatcher::new(&cfg)
        .dispatch("rcpt@example.org", &artifact)
        .unwrap_err();
    assert!(matches!(err, DispatchError::MissingCredentials));
}

#[test]
fn dispatch_reports_connection_failure() {
    let tmp = TempDir::new().unwrap();
    let artifact = write_artifact(tmp.path());
    // Bind then drop to obtain a port with nothing listening.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let err = SmtpDispatcher::new(&config_for(port))
        .dispatch("rcpt@example.org", &artifact)
        .unwrap_err();
    assert!(matches!(err, DispatchError::Connection { .. }), "{err}");
}

/// `message.from` overrides the SMTP username as envelope sender.
#[test]
fn dispatch_uses_configured_from_address() {
    let tmp = TempDir::new().unwrap();
    let artifact = write_artifact(tmp.path());
    let (port, server) = spawn_server(Script::default());
    let mut cfg = config_for(port);
    cfg.message.from = Some("reports@example.com".to_string());

    SmtpDispatcher::new(&cfg)
        .dispatch("rcpt@example.org", &artifact)
        .unwrap();

    let transcript = server.join().unwrap();
    assert!(transcript
        .commands
        .contains(&"MAIL FROM:<reports@example.com>".to_string()));
    assert!(transcript.data.contains(&"From: reports@example.com".to_string()));
}

/// STARTTLS is refused up front when the server does not advertise it.
#[test]
fn starttls_requires_server_support() {
    let tmp = TempDir::new().unwrap();
    let artifact = write_artifact(tmp.path());
    let (port, server) = spawn_server(Script::default());
    let mut cfg = config_for(port);
    cfg.smtp.security = Security::StartTls;

    let err = SmtpDispatcher::new(&cfg)
        .dispatch("rcpt@example.org", &artifact)
        .unwrap_err();
    assert!(
        matches!(err, DispatchError::NotSupported("STARTTLS")),
        "{err}"
    );

    // Nothing past EHLO was sent, credentials included.
    let transcript = server.join().unwrap();
    assert_eq!(transcript.commands, vec!["EHLO localhost".to_string()]);
}

/// Implicit TLS against a plaintext server fails with an error, not a hang.
#[test]
fn implicit_tls_against_plaintext_server_fails() {
    let tmp = TempDir::new().unwrap();
    let artifact = write_artifact(tmp.path());
    let (port, server) = spawn_server(Script::default());
    let mut cfg = config_for(port);
    cfg.smtp.security = Security::Tls;

    let err = SmtpDispatcher::new(&cfg)
        .dispatch("rcpt@example.org", &artifact)
        .unwrap_err();
    assert!(
        matches!(err, DispatchError::Io(_) | DispatchError::Tls(_)),
        "{err}"
    );

    let transcript = server.join().unwrap();
    assert!(!transcript.commands.iter().any(|c| c.starts_with("AUTH")));
}
