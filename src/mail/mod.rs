//! Mail delivery subsystem.
//!
//! # Data Flow
//! ```text
//! request payload → envelope.rs MailHeaders (from, to, subject)
//! rendered html   → envelope.rs MailEnvelope::assemble (addresses checked)
//!                 → transport.rs MailTransport::send
//!                 → smtp.rs (lettre, async SMTP)
//! ```

pub mod envelope;
pub mod smtp;
pub mod transport;

pub use envelope::{EnvelopeError, MailEnvelope, MailHeaders};
pub use smtp::SmtpTransport;
pub use transport::{MailTransport, TransportError};
