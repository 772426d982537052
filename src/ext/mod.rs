//! Hello extension framework.
//!
//! Every extension is an [`ExtensionHandler`] described by an
//! [`ExtensionDescriptor`]. Descriptors live in an immutable [`Registry`]
//! shared by all sessions, optionally overlaid by session specific ones.
//! The [`Dispatcher`] routes a received extensions block to the handlers and
//! assembles the block of an outgoing message.
//!
//! Handlers keep their per-session data in [`ExtensionState`], a type erased
//! map keyed by extension id. Reading it back as the wrong type is an error,
//! never a reinterpretation.

pub mod builtin;
mod dispatch;
mod registry;
mod state;

use std::any::Any;

pub use dispatch::Dispatcher;
pub use registry::{ExtensionDescriptor, Registry, RegistryBuilder};
pub use state::ExtensionState;

use crate::buffer::Buf;
use crate::credentials::PeerCapabilities;
use crate::message::{ProtocolFamily, Role};
use crate::session::{Session, SessionParameters};
use crate::{Config, Error};

bitflags::bitflags! {
    /// Where an extension may appear.
    ///
    /// A descriptor must have the bit of the message *and* the bit of the
    /// protocol family to be processed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Validity: u16 {
        const CLIENT_HELLO = 1 << 0;
        const TLS12_SERVER_HELLO = 1 << 1;
        const TLS13_SERVER_HELLO = 1 << 2;
        const HELLO_RETRY_REQUEST = 1 << 3;
        const ENCRYPTED_EXTENSIONS = 1 << 4;
        const CERTIFICATE_REQUEST = 1 << 5;
        const TLS = 1 << 8;
        const DTLS = 1 << 9;
        /// Server may send it without the client asking, and the client
        /// accepts it unrequested.
        const IGNORE_CLIENT_REQUEST = 1 << 10;

        const ANY_FAMILY = Self::TLS.bits() | Self::DTLS.bits();
    }
}

impl Validity {
    pub(crate) fn for_family(family: ProtocolFamily) -> Validity {
        match family {
            ProtocolFamily::Tls => Validity::TLS,
            ProtocolFamily::Dtls => Validity::DTLS,
        }
    }
}

/// Handshake message carrying an extensions block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    ClientHello,
    /// ServerHello of TLS 1.2 and earlier.
    ServerHello12,
    ServerHello13,
    HelloRetryRequest,
    EncryptedExtensions,
    /// TLS 1.3 CertificateRequest.
    CertificateRequest13,
}

impl MessageKind {
    pub fn validity(&self) -> Validity {
        match self {
            MessageKind::ClientHello => Validity::CLIENT_HELLO,
            MessageKind::ServerHello12 => Validity::TLS12_SERVER_HELLO,
            MessageKind::ServerHello13 => Validity::TLS13_SERVER_HELLO,
            MessageKind::HelloRetryRequest => Validity::HELLO_RETRY_REQUEST,
            MessageKind::EncryptedExtensions => Validity::ENCRYPTED_EXTENSIONS,
            MessageKind::CertificateRequest13 => Validity::CERTIFICATE_REQUEST,
        }
    }

    /// The sender of this message.
    pub fn sender(&self) -> Role {
        match self {
            MessageKind::ClientHello => Role::Client,
            _ => Role::Server,
        }
    }

    /// These messages carry the block length even when it is zero.
    pub(crate) fn always_has_block(&self) -> bool {
        matches!(
            self,
            MessageKind::EncryptedExtensions | MessageKind::CertificateRequest13
        )
    }

    /// The client must have asked for what the server answers here.
    pub(crate) fn is_response(&self) -> bool {
        matches!(
            self,
            MessageKind::ServerHello12
                | MessageKind::ServerHello13
                | MessageKind::HelloRetryRequest
                | MessageKind::EncryptedExtensions
        )
    }
}

/// Order in which received extensions are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParsePriority {
    /// Before all others, in registration order.
    First,
    Normal,
    /// After the TLS level extensions.
    Application,
}

/// Behavior of one extension.
///
/// Handlers are shared by every session and must not keep per-session data
/// themselves. Use [`ExtensionContext::set_state`] for that.
pub trait ExtensionHandler: Send + Sync {
    /// Handle the extension body received in `ctx.message()`.
    fn receive(&self, ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error>;

    /// Write the extension body for `ctx.message()`.
    ///
    /// `Ok(None)` leaves the extension out. `Ok(Some(0))` sends it with an
    /// empty body.
    fn send(&self, ctx: &mut ExtensionContext<'_>, out: &mut Buf) -> Result<Option<usize>, Error>;

    /// Serialize state for session resumption. Returns false when the
    /// extension does not take part.
    fn pack(&self, _state: &(dyn Any + Send + Sync), _out: &mut Buf) -> Result<bool, Error> {
        Ok(false)
    }

    /// Restore state written by [`ExtensionHandler::pack`], returning it
    /// with the number of bytes consumed.
    #[allow(clippy::type_complexity)]
    fn unpack(&self, _input: &[u8]) -> Result<Option<(Box<dyn Any + Send + Sync>, usize)>, Error> {
        Ok(None)
    }
}

/// What a handler sees of the session while it runs.
pub struct ExtensionContext<'a> {
    session: &'a mut Session,
    message: MessageKind,
    family: ProtocolFamily,
    id: u16,
}

impl<'a> ExtensionContext<'a> {
    pub(crate) fn new(
        session: &'a mut Session,
        message: MessageKind,
        family: ProtocolFamily,
        id: u16,
    ) -> Self {
        ExtensionContext {
            session,
            message,
            family,
            id,
        }
    }

    pub fn message(&self) -> MessageKind {
        self.message
    }

    pub fn family(&self) -> ProtocolFamily {
        self.family
    }

    /// Id of the extension being handled.
    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn role(&self) -> Role {
        self.session.params.role
    }

    pub fn config(&self) -> &Config {
        &self.session.config
    }

    pub fn params(&self) -> &SessionParameters {
        &self.session.params
    }

    pub fn params_mut(&mut self) -> &mut SessionParameters {
        &mut self.session.params
    }

    pub fn peer(&self) -> &PeerCapabilities {
        &self.session.peer
    }

    pub fn peer_mut(&mut self) -> &mut PeerCapabilities {
        &mut self.session.peer
    }

    /// State of this extension, if any was set.
    pub fn state<T: Any>(&self) -> Result<Option<&T>, Error> {
        self.session.ext_state.get(self.id)
    }

    pub fn state_mut<T: Any>(&mut self) -> Result<Option<&mut T>, Error> {
        self.session.ext_state.get_mut(self.id)
    }

    pub fn set_state<T: Any + Send + Sync>(&mut self, value: T) {
        self.session.ext_state.set(self.id, value);
    }

    /// State restored from a resumed session.
    pub fn resumed_state<T: Any>(&self) -> Result<Option<&T>, Error> {
        self.session.ext_state.resumed(self.id)
    }

    /// Whether extension `id` was received in this handshake.
    pub fn was_received(&self, id: u16) -> bool {
        self.session.received.contains(&id)
    }

    /// Whether extension `id` was sent in this handshake.
    pub fn was_sent(&self, id: u16) -> bool {
        self.session.sent.contains(&id)
    }

    pub(crate) fn session(&self) -> &Session {
        self.session
    }
}
