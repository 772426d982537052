//! Per-handshake negotiation state.

use std::collections::BTreeSet;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::buffer::Buf;
use crate::credentials::signature::compute_signature_algorithm;
use crate::credentials::{
    find_client, find_server, Credential, CredentialQuery, CredentialSet, Ownership,
    PeerCapabilities, SelectedCredential,
};
use crate::ext::builtin::{key_share, server_name, use_srtp};
use crate::ext::{Dispatcher, ExtensionDescriptor, ExtensionState, MessageKind, Registry};
use crate::message::extensions::SrtpProfileId;
use crate::message::{
    CertificateRequest, CipherSuite, NamedGroup, ProtocolFamily, ProtocolVersion, Role,
    SignatureScheme,
};
use crate::{Config, Error};

bitflags::bitflags! {
    /// Facts established during the handshake.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SessionFlags: u16 {
        /// A named FFDHE group was used for DHE.
        const USED_FFDHE = 1 << 0;
        const EARLY_DATA_ACCEPTED = 1 << 1;
        const RESUMED = 1 << 2;
        const EXT_MASTER_SECRET = 1 << 3;
        /// The client asked for a stapled OCSP response.
        const OCSP_REQUESTED = 1 << 4;
    }
}

/// What has been negotiated so far.
#[derive(Debug, Clone)]
pub struct SessionParameters {
    pub role: Role,
    pub family: ProtocolFamily,
    pub version: Option<ProtocolVersion>,
    /// Version the client put in its hello, used by the RSA premaster
    /// check.
    pub advertised_version: Option<ProtocolVersion>,
    pub cipher_suite: Option<CipherSuite>,
    pub group: Option<NamedGroup>,
    pub flags: SessionFlags,
    pub server_signature_scheme: Option<SignatureScheme>,
    pub client_signature_scheme: Option<SignatureScheme>,
    /// Size of the prime the server sent for DHE.
    pub dh_prime_bits: Option<usize>,
    pub client_random: [u8; 32],
    pub server_random: [u8; 32],
}

impl SessionParameters {
    pub fn new(role: Role, family: ProtocolFamily) -> Self {
        SessionParameters {
            role,
            family,
            version: None,
            advertised_version: None,
            cipher_suite: None,
            group: None,
            flags: SessionFlags::empty(),
            server_signature_scheme: None,
            client_signature_scheme: None,
            dh_prime_bits: None,
            client_random: [0; 32],
            server_random: [0; 32],
        }
    }
}

/// Negotiation state of one handshake.
///
/// The handshake driver feeds received extension blocks through
/// [`Session::process_extensions`], writes its own with
/// [`Session::write_extensions`] and asks for credentials once the
/// corresponding flight was processed.
pub struct Session {
    pub(crate) params: SessionParameters,
    pub(crate) config: Arc<Config>,
    pub(crate) registry: Arc<Registry>,
    /// Session specific descriptors, consulted before the registry.
    pub(crate) overlay: Vec<ExtensionDescriptor>,
    pub(crate) ext_state: ExtensionState,
    pub(crate) peer: PeerCapabilities,
    pub(crate) sent: BTreeSet<u16>,
    pub(crate) received: BTreeSet<u16>,
    pub(crate) credentials: Option<Arc<CredentialSet>>,
    pub(crate) selected: Option<SelectedCredential>,
    pub(crate) client_hello_dispatched: bool,
    pub(crate) cert_request_processed: bool,
    /// The credential callback was asked already.
    callback_asked: bool,
}

impl Session {
    pub fn new(
        role: Role,
        family: ProtocolFamily,
        config: Arc<Config>,
        registry: Arc<Registry>,
    ) -> Self {
        Session {
            params: SessionParameters::new(role, family),
            config,
            registry,
            overlay: Vec::new(),
            ext_state: ExtensionState::new(),
            peer: PeerCapabilities::default(),
            sent: BTreeSet::new(),
            received: BTreeSet::new(),
            credentials: None,
            selected: None,
            client_hello_dispatched: false,
            cert_request_processed: false,
            callback_asked: false,
        }
    }

    /// Register an extension for this session only.
    ///
    /// It hides a registry entry with the same id.
    pub fn register_extension(&mut self, descriptor: ExtensionDescriptor) -> Result<(), Error> {
        if self.overlay.iter().any(|d| d.id == descriptor.id) {
            return Err(Error::AlreadyRegistered(descriptor.id));
        }
        debug!(
            "Session extension {} ({:#06x})",
            descriptor.name, descriptor.id
        );
        self.overlay.push(descriptor);
        Ok(())
    }

    /// Handle a received extensions block, without its outer length.
    pub fn process_extensions(&mut self, message: MessageKind, data: &[u8]) -> Result<(), Error> {
        if message.sender() == self.params.role {
            return Err(Error::InvalidState("cannot receive our own message"));
        }
        let family = self.params.family;
        Dispatcher::new(self).dispatch_receive(message, family, data)
    }

    /// Write the extensions block of `message`, with its length.
    pub fn write_extensions(&mut self, message: MessageKind, out: &mut Buf) -> Result<usize, Error> {
        if message.sender() != self.params.role {
            return Err(Error::InvalidState("cannot send the peer's message"));
        }
        let family = self.params.family;
        Dispatcher::new(self).dispatch_send(message, family, out)
    }

    /// Serialize extension state for resumption.
    pub fn pack_extensions(&mut self) -> Result<Vec<u8>, Error> {
        Ok(Dispatcher::new(self).pack_session()?.into_vec())
    }

    /// Restore extension state of a resumed session.
    pub fn unpack_extensions(&mut self, data: &[u8]) -> Result<(), Error> {
        Dispatcher::new(self).unpack_session(data)
    }

    /// Handle a TLS 1.2 or earlier CertificateRequest.
    pub fn process_certificate_request(&mut self, request: &CertificateRequest<'_>) -> Result<(), Error> {
        if self.params.role != Role::Client {
            return Err(Error::InvalidState("CertificateRequest received by server"));
        }
        let caps = PeerCapabilities::from_certificate_request(request)?;
        self.peer.signature_schemes = caps.signature_schemes;
        self.peer.cert_types = caps.cert_types;
        self.peer.ca_names = caps.ca_names;
        self.peer.cert_request = true;
        self.cert_request_processed = true;
        debug!(
            "Certificate requested, {} CA names",
            self.peer.ca_names.len()
        );
        Ok(())
    }

    /// Set the host name to send in server_name.
    pub fn set_server_name(&mut self, host: &str) -> Result<(), Error> {
        server_name::set_host_name(self, host)
    }

    /// Host name asked for by the client, or by us.
    pub fn server_name(&self) -> Option<&str> {
        server_name::host_name(self)
    }

    pub fn set_credentials(&mut self, credentials: Arc<CredentialSet>) {
        self.credentials = Some(credentials);
    }

    /// Negotiated DTLS-SRTP protection profile.
    pub fn srtp_profile(&self) -> Option<SrtpProfileId> {
        use_srtp::profile(self)
    }

    /// Secret of the TLS 1.3 key_share exchange, once.
    pub fn take_key_share_secret(&mut self) -> Result<Option<Zeroizing<Vec<u8>>>, Error> {
        key_share::take_shared_secret(self)
    }

    pub fn params(&self) -> &SessionParameters {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut SessionParameters {
        &mut self.params
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn peer(&self) -> &PeerCapabilities {
        &self.peer
    }

    pub fn ext_state(&self) -> &ExtensionState {
        &self.ext_state
    }

    pub fn ext_state_mut(&mut self) -> &mut ExtensionState {
        &mut self.ext_state
    }

    pub fn selected(&self) -> Option<&SelectedCredential> {
        self.selected.as_ref()
    }

    /// Whether extension `id` was received in this handshake.
    pub fn was_received(&self, id: u16) -> bool {
        self.received.contains(&id)
    }

    /// Whether extension `id` was sent in this handshake.
    pub fn was_sent(&self, id: u16) -> bool {
        self.sent.contains(&id)
    }

    fn negotiated(&self) -> Result<(ProtocolVersion, CipherSuite), Error> {
        let version = self
            .params
            .version
            .ok_or(Error::InvalidState("version not negotiated"))?;
        let suite = self
            .params
            .cipher_suite
            .ok_or(Error::InvalidState("cipher suite not negotiated"))?;
        Ok((version, suite))
    }

    /// Pick the server's credential for the negotiated suite.
    ///
    /// The first successful answer is kept for the rest of the handshake.
    pub fn select_server_certificate(&mut self) -> Result<&SelectedCredential, Error> {
        if self.params.role != Role::Server {
            return Err(Error::InvalidState("server selection on client"));
        }
        if self.selected.is_none() {
            if !self.client_hello_dispatched {
                return Err(Error::InvalidState("ClientHello extensions not processed"));
            }
            let selected = self.find_server_credential()?;
            self.params.server_signature_scheme = selected.scheme;
            self.selected = Some(selected);
        }
        self.selected.as_ref().ok_or(Error::InsufficientCredentials)
    }

    fn find_server_credential(&mut self) -> Result<SelectedCredential, Error> {
        let (version, suite) = self.negotiated()?;
        let kx = suite.key_exchange_algorithm();
        let credentials = self
            .credentials
            .clone()
            .ok_or(Error::InsufficientCredentials)?;
        let want_ocsp = self.params.flags.contains(SessionFlags::OCSP_REQUESTED);

        if let Some(callback) = credentials.callback() {
            if self.callback_asked {
                return Err(Error::InsufficientCredentials);
            }
            self.callback_asked = true;
            let pk_algorithms: Vec<_> = self
                .peer
                .signature_schemes
                .iter()
                .filter_map(|s| s.pk_algorithm())
                .collect();
            let query = CredentialQuery {
                server_name: self.server_name(),
                cipher_suite: Some(suite),
                ca_names: &[],
                pk_algorithms: &pk_algorithms,
                signature_schemes: &self.peer.signature_schemes,
            };
            let credential = callback
                .server_credential(&query)?
                .ok_or(Error::InsufficientCredentials)?;
            let scheme = if kx.signs_params() {
                Some(self.scheme_for(&credential, version)?)
            } else {
                None
            };
            debug!("Using server credential from callback");
            return Ok(SelectedCredential::new(
                Arc::new(credential),
                Ownership::Owned,
                scheme,
                want_ocsp,
            ));
        }

        let (index, scheme) = find_server(
            &credentials,
            self.server_name(),
            kx,
            version,
            &self.config,
            &self.peer,
        )?;
        let credential = credentials
            .get(index)
            .cloned()
            .ok_or(Error::InsufficientCredentials)?;
        Ok(SelectedCredential::new(
            credential,
            Ownership::Borrowed { index },
            scheme,
            want_ocsp,
        ))
    }

    /// Pick the client's credential for the server's certificate request.
    ///
    /// `Ok(None)` means we have nothing suitable. The choice, and the
    /// callback, are only made once.
    pub fn select_client_certificate(&mut self) -> Result<Option<&SelectedCredential>, Error> {
        if self.params.role != Role::Client {
            return Err(Error::InvalidState("client selection on server"));
        }
        if !self.cert_request_processed {
            return Err(Error::InvalidState("certificate request not processed"));
        }
        if self.selected.is_none() && !self.callback_asked {
            if let Some(selected) = self.find_client_credential()? {
                self.params.client_signature_scheme = selected.scheme;
                self.selected = Some(selected);
            }
        }
        Ok(self.selected.as_ref())
    }

    fn find_client_credential(&mut self) -> Result<Option<SelectedCredential>, Error> {
        let version = self
            .params
            .version
            .ok_or(Error::InvalidState("version not negotiated"))?;
        let Some(credentials) = self.credentials.clone() else {
            return Ok(None);
        };

        if let Some(callback) = credentials.callback() {
            self.callback_asked = true;
            let pk_algorithms = self.peer.pk_algorithms();
            let query = CredentialQuery {
                server_name: None,
                cipher_suite: self.params.cipher_suite,
                ca_names: &self.peer.ca_names,
                pk_algorithms: &pk_algorithms,
                signature_schemes: &self.peer.signature_schemes,
            };
            let Some(credential) = callback.client_credential(&query)? else {
                debug!("Callback has no client credential");
                return Ok(None);
            };
            let scheme = Some(self.scheme_for(&credential, version)?);
            return Ok(Some(SelectedCredential::new(
                Arc::new(credential),
                Ownership::Owned,
                scheme,
                false,
            )));
        }

        let found = find_client(&credentials, version, &self.config, &self.peer);
        Ok(found.and_then(|(index, scheme)| {
            let credential = credentials.get(index)?.clone();
            Some(SelectedCredential::new(
                credential,
                Ownership::Borrowed { index },
                scheme,
                false,
            ))
        }))
    }

    fn scheme_for(&self, credential: &Credential, version: ProtocolVersion) -> Result<SignatureScheme, Error> {
        compute_signature_algorithm(
            credential.leaf(),
            credential.key().as_ref(),
            version,
            &self.config,
            &self.peer.signature_schemes,
        )
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("params", &self.params)
            .field("overlay", &self.overlay)
            .field("ext_state", &self.ext_state)
            .field("peer", &self.peer)
            .field("sent", &self.sent)
            .field("received", &self.received)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: Role) -> Session {
        let config = Arc::new(Config::builder().build().unwrap());
        Session::new(role, ProtocolFamily::Tls, config, Registry::default_shared())
    }

    #[test]
    fn selection_waits_for_dispatch() {
        let mut server = session(Role::Server);
        assert_eq!(
            server.select_server_certificate().map(|_| ()),
            Err(Error::InvalidState("ClientHello extensions not processed"))
        );

        let mut client = session(Role::Client);
        assert_eq!(
            client.select_client_certificate().map(|_| ()),
            Err(Error::InvalidState("certificate request not processed"))
        );
    }

    #[test]
    fn no_credentials_on_server() {
        let mut server = session(Role::Server);
        server.process_extensions(MessageKind::ClientHello, &[]).unwrap();
        server.params_mut().version = Some(ProtocolVersion::TLS1_2);
        server.params_mut().cipher_suite = Some(CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256);
        assert_eq!(
            server.select_server_certificate().map(|_| ()),
            Err(Error::InsufficientCredentials)
        );
    }

    #[test]
    fn wrong_direction() {
        let mut client = session(Role::Client);
        assert_eq!(
            client.process_extensions(MessageKind::ClientHello, &[]),
            Err(Error::InvalidState("cannot receive our own message"))
        );
        let mut out = Buf::new();
        assert_eq!(
            client.write_extensions(MessageKind::ServerHello12, &mut out),
            Err(Error::InvalidState("cannot send the peer's message"))
        );
    }

    #[test]
    fn overlay_ids_unique() {
        use crate::ext::builtin::cookie::Cookie;
        use crate::ext::{ParsePriority, Validity};

        let mut s = session(Role::Client);
        let d = ExtensionDescriptor::new(
            0xff10,
            "private",
            Validity::CLIENT_HELLO | Validity::ANY_FAMILY,
            ParsePriority::Normal,
            Cookie,
        );
        s.register_extension(d.clone()).unwrap();
        assert_eq!(s.register_extension(d), Err(Error::AlreadyRegistered(0xff10)));
    }
}
