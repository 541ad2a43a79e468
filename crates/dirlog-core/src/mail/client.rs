/// Blocking SMTP client.
///
/// Supports implicit TLS (port 465), STARTTLS and plain connections,
/// `AUTH PLAIN` / `AUTH LOGIN`, and a single-recipient mail transaction.
/// Certificates are verified against the bundled webpki root store.
///
/// No timeouts are configured; the session relies on OS socket defaults.
use crate::config::Security;
use crate::error::DispatchError;
use crate::mail::reply::{is_last_line, Reply};
use crate::mail::{Address, OutgoingMessage};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use std::collections::HashSet;
use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;
use tracing::{debug, info};

type TlsStream = StreamOwned<ClientConnection, TcpStream>;

/// The underlying connection, plain or encrypted.
enum Transport {
    Plain(BufReader<TcpStream>),
    Tls(Box<BufReader<TlsStream>>),
}

impl Transport {
    /// Read one line without its line ending. EOF is an error: the server
    /// never closes mid-reply in a healthy session.
    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        let n = match self {
            Self::Plain(reader) => reader.read_line(&mut line)?,
            Self::Tls(reader) => reader.read_line(&mut line)?,
        };
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Self::Plain(reader) => {
                reader.get_mut().write_all(data)?;
                reader.get_mut().flush()
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data)?;
                reader.get_mut().flush()
            }
        }
    }

    fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

fn tls_config() -> Arc<ClientConfig> {
    let roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    Arc::new(
        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    )
}

fn wrap_tls(tcp: TcpStream, host: &str) -> Result<Transport, DispatchError> {
    let name = ServerName::try_from(host.to_string())
        .map_err(|_| DispatchError::Protocol(format!("invalid TLS server name {host:?}")))?;
    let conn = ClientConnection::new(tls_config(), name)?;
    Ok(Transport::Tls(Box::new(BufReader::new(StreamOwned::new(
        conn, tcp,
    )))))
}

/// Authentication mechanisms this client can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMechanism {
    Plain,
    Login,
}

/// An open, greeted session.
pub struct SmtpClient {
    transport: Transport,
    host: String,
    helo_name: String,
    /// Upper-cased EHLO keywords with their parameters, e.g. `AUTH PLAIN LOGIN`.
    extensions: HashSet<String>,
}

impl SmtpClient {
    /// Connect, read the greeting, send EHLO and, for
    /// [`Security::StartTls`], upgrade the connection.
    pub fn connect(
        host: &str,
        port: u16,
        security: Security,
        helo_name: &str,
    ) -> Result<Self, DispatchError> {
        let tcp = TcpStream::connect((host, port)).map_err(|source| DispatchError::Connection {
            host: host.to_string(),
            port,
            source,
        })?;
        info!("Connected to {host}:{port} ({security:?})");

        let transport = match security {
            Security::Tls => wrap_tls(tcp, host)?,
            Security::StartTls | Security::None => Transport::Plain(BufReader::new(tcp)),
        };

        let mut client = Self {
            transport,
            host: host.to_string(),
            helo_name: helo_name.to_string(),
            extensions: HashSet::new(),
        };

        client.read_reply()?.expect("greeting", Reply::is_positive)?;
        client.ehlo()?;

        if security == Security::StartTls {
            client = client.starttls()?;
        }
        Ok(client)
    }

    /// `true` if the server advertised `keyword` (case-insensitive).
    pub fn supports(&self, keyword: &str) -> bool {
        let keyword = keyword.to_ascii_uppercase();
        self.extensions
            .iter()
            .any(|ext| ext.split_whitespace().next() == Some(keyword.as_str()))
    }

    fn auth_mechanisms(&self) -> Vec<String> {
        self.extensions
            .iter()
            .filter_map(|ext| ext.strip_prefix("AUTH "))
            .flat_map(|mechs| mechs.split_whitespace().map(str::to_string))
            .collect()
    }

    fn ehlo(&mut self) -> Result<(), DispatchError> {
        let reply = self
            .command(&format!("EHLO {}", self.helo_name))?
            .expect("EHLO", Reply::is_positive)?;
        self.extensions = reply
            .lines
            .iter()
            .skip(1)
            .map(|line| line.trim().to_ascii_uppercase())
            .collect();
        debug!("Server extensions: {:?}", self.extensions);
        Ok(())
    }

    /// Upgrade a plain session to TLS and repeat EHLO, as RFC 3207 requires.
    fn starttls(mut self) -> Result<Self, DispatchError> {
        if !self.supports("STARTTLS") {
            return Err(DispatchError::NotSupported("STARTTLS"));
        }
        self.command("STARTTLS")?
            .expect("STARTTLS", Reply::is_positive)?;

        let tcp = match self.transport {
            Transport::Plain(reader) => reader.into_inner(),
            Transport::Tls(_) => {
                return Err(DispatchError::Protocol("STARTTLS on an encrypted session".into()))
            }
        };
        let mut upgraded = Self {
            transport: wrap_tls(tcp, &self.host)?,
            host: self.host,
            helo_name: self.helo_name,
            extensions: HashSet::new(),
        };
        upgraded.ehlo()?;
        info!("Upgraded session to TLS");
        Ok(upgraded)
    }

    /// Authenticate, preferring PLAIN and falling back to LOGIN.
    pub fn authenticate(&mut self, username: &str, password: &str) -> Result<(), DispatchError> {
        let offered = self.auth_mechanisms();
        let mechanism = if offered.iter().any(|m| m == "PLAIN") || offered.is_empty() {
            AuthMechanism::Plain
        } else if offered.iter().any(|m| m == "LOGIN") {
            AuthMechanism::Login
        } else {
            return Err(DispatchError::NotSupported("AUTH PLAIN or AUTH LOGIN"));
        };
        debug!("Authenticating as {username} with {mechanism:?}");

        let reply = match mechanism {
            AuthMechanism::Plain => {
                let token = STANDARD.encode(format!("\0{username}\0{password}"));
                self.secret_command("AUTH PLAIN", &format!("AUTH PLAIN {token}"))?
            }
            AuthMechanism::Login => {
                self.command("AUTH LOGIN")?
                    .expect("AUTH LOGIN", Reply::is_intermediate)?;
                self.secret_command("<username>", &STANDARD.encode(username))?
                    .expect("AUTH LOGIN", Reply::is_intermediate)?;
                self.secret_command("<password>", &STANDARD.encode(password))?
            }
        };

        if reply.is_positive() {
            info!("Authenticated as {username}");
            Ok(())
        } else {
            Err(DispatchError::Authentication(format!(
                "{} {}",
                reply.code,
                reply.text()
            )))
        }
    }

    /// Run one mail transaction: MAIL FROM, RCPT TO, DATA, body.
    pub fn send(&mut self, message: &OutgoingMessage) -> Result<(), DispatchError> {
        self.mail_from(&message.from)?;
        self.rcpt_to(&message.to)?;
        self.command("DATA")?
            .expect("DATA", |r| r.code == 354)?;
        self.send_data(message.to_rfc5322().as_bytes())?
            .expect("message body", Reply::is_positive)?;
        info!("Message to {} accepted", message.to);
        Ok(())
    }

    fn mail_from(&mut self, from: &Address) -> Result<(), DispatchError> {
        self.command(&format!("MAIL FROM:<{from}>"))?
            .expect("MAIL FROM", Reply::is_positive)?;
        Ok(())
    }

    fn rcpt_to(&mut self, to: &Address) -> Result<(), DispatchError> {
        self.command(&format!("RCPT TO:<{to}>"))?
            .expect("RCPT TO", Reply::is_positive)?;
        Ok(())
    }

    /// Send the message body with CRLF normalisation and dot-stuffing,
    /// then the terminating `.` line.
    fn send_data(&mut self, data: &[u8]) -> Result<Reply, DispatchError> {
        let data = data
            .strip_suffix(b"\r\n")
            .or_else(|| data.strip_suffix(b"\n"))
            .unwrap_or(data);

        let mut buf = Vec::with_capacity(data.len() + data.len() / 64 + 8);
        for line in data.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                buf.push(b'.');
            }
            buf.extend_from_slice(line);
            buf.extend_from_slice(b"\r\n");
        }
        buf.extend_from_slice(b".\r\n");

        debug!("C: <{} bytes of message data>", buf.len());
        self.transport.write_all(&buf)?;
        self.read_reply()
    }

    /// Send QUIT and close the session.
    pub fn quit(mut self) -> Result<(), DispatchError> {
        self.command("QUIT")?
            .expect("QUIT", |r| r.is_positive())?;
        Ok(())
    }

    fn command(&mut self, line: &str) -> Result<Reply, DispatchError> {
        debug!("C: {line}");
        self.transport.write_all(format!("{line}\r\n").as_bytes())?;
        self.read_reply()
    }

    /// Like [`command`](Self::command) but logs `label` instead of the line.
    fn secret_command(&mut self, label: &str, line: &str) -> Result<Reply, DispatchError> {
        debug!("C: {label} <redacted>");
        self.transport.write_all(format!("{line}\r\n").as_bytes())?;
        self.read_reply()
    }

    fn read_reply(&mut self) -> Result<Reply, DispatchError> {
        let mut lines = Vec::new();
        loop {
            let line = self.transport.read_line()?;
            debug!("S: {line}");
            let last = is_last_line(&line);
            lines.push(line);
            if last {
                break;
            }
        }
        Reply::parse(&lines)
    }
}

impl std::fmt::Debug for SmtpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpClient")
            .field("host", &self.host)
            .field("tls", &self.transport.is_tls())
            .field("extensions", &self.extensions)
            .finish()
    }
}
