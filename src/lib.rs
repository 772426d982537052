//! Negotiation core for TLS and DTLS handshakes.
//!
//! tlsnego covers the parts of a handshake that decide *what* is used rather
//! than how records are protected:
//!
//! * [`ext`] parses, validates and emits hello extensions through a registry
//!   of [`ext::ExtensionHandler`] implementations.
//! * [`credentials`] picks a certificate chain, private key and signature
//!   scheme for the current peer.
//! * [`kx`] encodes and decodes finite-field and elliptic-curve Diffie-Hellman
//!   parameters and derives shared secrets.
//! * [`flavor`] implements the RSA, DHE, ECDHE and PSK key exchanges on top
//!   of the above.
//!
//! A [`Session`] ties these together for one handshake. Long lived data such
//! as the [`Config`], the extension [`ext::Registry`] and a
//! [`credentials::CredentialSet`] are shared between sessions behind `Arc`.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tlsnego::{Config, Session};
//! use tlsnego::ext::Registry;
//! use tlsnego::message::{ProtocolFamily, Role};
//!
//! let config = Arc::new(Config::builder().build().unwrap());
//! let mut session = Session::new(
//!     Role::Server,
//!     ProtocolFamily::Tls,
//!     config,
//!     Registry::default_shared(),
//! );
//! # let client_hello_extensions: &[u8] = &[];
//! session
//!     .process_extensions(tlsnego::ext::MessageKind::ClientHello, client_hello_extensions)
//!     .unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]
// #![deny(missing_docs)]

#[macro_use]
extern crate log;

mod buffer;
pub use buffer::Buf;

mod config;
pub use config::{Config, ConfigBuilder};

mod error;
pub use error::{AlertDescription, Error, ErrorKind};

pub mod credentials;
pub mod crypto;
pub mod ext;
pub mod flavor;
pub mod kx;
pub mod message;

mod session;
pub use session::{Session, SessionFlags, SessionParameters};

mod util;
