/// Mail module: sends the log artifact as an email attachment.
///
/// - [`address`]: recipient/sender validation.
/// - [`message`]: RFC 5322 / MIME `multipart/mixed` assembly.
/// - [`reply`]: SMTP reply parsing (RFC 5321 section 4.2).
/// - [`client`]: blocking SMTP client over TCP or `rustls`.
/// - [`dispatch`]: the [`Dispatcher`] seam used by the pipeline.
pub mod address;
pub mod client;
pub mod dispatch;
pub mod message;
pub mod reply;

pub use address::Address;
pub use client::SmtpClient;
pub use dispatch::{Dispatcher, SmtpDispatcher};
pub use message::{Attachment, OutgoingMessage};
pub use reply::Reply;
