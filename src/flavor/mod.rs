//! The key exchanges of TLS 1.2 and earlier.
//!
//! The flavor follows from the cipher suite. [`ServerKx`] and [`ClientKx`]
//! walk one exchange through its states and produce the premaster secret.
//! A call out of order fails with [`Error::InvalidState`] and the exchange
//! cannot be retried.
//!
//! Server, in handshake order:
//!
//! 1. [`ServerKx::generate`] once the suite is chosen (and, for signing
//!    flavors, the credential selected).
//! 2. [`ServerKx::write_server_key_exchange`].
//! 3. [`ServerKx::read_client_key_exchange`], then
//!    [`ServerKx::take_premaster`].
//!
//! The client reads the server message, if there is one, writes its own and
//! takes the premaster.

mod dhe;
mod ecdhe;
mod psk;
mod rsa;

use std::sync::Arc;

use zeroize::Zeroizing;

pub use self::psk::{PskCredentials, PskStore};
pub use self::rsa::{decrypt_premaster, PREMASTER_LEN};

use crate::buffer::Buf;
use crate::credentials::signature::{sign_params, verify_params};
use crate::crypto::PublicKey;
use crate::kx::{ClientKxState, KeyExchangeMaterial, ServerKxState};
use crate::message::{
    CipherSuite, EncryptedPreMasterSecret, KeyExchangeAlgorithm, ProtocolVersion, PskIdentity,
    PskIdentityHint, SignatureScheme,
};
use crate::session::Session;
use crate::Error;

/// Key exchange of a TLS 1.2 or earlier cipher suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyExchangeFlavor {
    Rsa,
    DheRsa,
    DheDss,
    EcdheRsa,
    EcdheEcdsa,
    Psk,
    DhePsk,
    EcdhePsk,
    RsaPsk,
    DhAnon,
    EcdhAnon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ephemeral {
    None,
    Ffdhe,
    Ecdhe,
}

impl KeyExchangeFlavor {
    pub fn from_algorithm(kx: KeyExchangeAlgorithm) -> Result<Self, Error> {
        use KeyExchangeAlgorithm as K;
        let flavor = match kx {
            K::Rsa => Self::Rsa,
            K::DheRsa => Self::DheRsa,
            K::DheDss => Self::DheDss,
            K::EcdheRsa => Self::EcdheRsa,
            K::EcdheEcdsa => Self::EcdheEcdsa,
            K::Psk => Self::Psk,
            K::DhePsk => Self::DhePsk,
            K::EcdhePsk => Self::EcdhePsk,
            K::RsaPsk => Self::RsaPsk,
            K::DhAnon => Self::DhAnon,
            K::EcdhAnon => Self::EcdhAnon,
            K::Tls13 | K::Unknown => {
                return Err(Error::InvalidState("no TLS 1.2 key exchange for suite"))
            }
        };
        Ok(flavor)
    }

    pub fn for_suite(suite: CipherSuite) -> Result<Self, Error> {
        Self::from_algorithm(suite.key_exchange_algorithm())
    }

    fn ephemeral(&self) -> Ephemeral {
        match self {
            Self::DheRsa | Self::DheDss | Self::DhAnon | Self::DhePsk => Ephemeral::Ffdhe,
            Self::EcdheRsa | Self::EcdheEcdsa | Self::EcdhAnon | Self::EcdhePsk => Ephemeral::Ecdhe,
            Self::Rsa | Self::Psk | Self::RsaPsk => Ephemeral::None,
        }
    }

    /// The server signs its params.
    pub fn signs(&self) -> bool {
        matches!(
            self,
            Self::DheRsa | Self::DheDss | Self::EcdheRsa | Self::EcdheEcdsa
        )
    }

    pub fn uses_psk(&self) -> bool {
        matches!(self, Self::Psk | Self::DhePsk | Self::EcdhePsk | Self::RsaPsk)
    }

    /// The premaster is encrypted to the server's RSA key.
    pub fn uses_rsa_transport(&self) -> bool {
        matches!(self, Self::Rsa | Self::RsaPsk)
    }

    /// ServerKeyExchange may be left out.
    pub fn server_params_optional(&self) -> bool {
        self.ephemeral() == Ephemeral::None
    }

    /// SSL 3.0 sends the RSA ciphertext bare, except inside RSA_PSK.
    fn length_prefixed(&self, version: ProtocolVersion) -> bool {
        !version.is_ssl3() || *self == Self::RsaPsk
    }
}

fn negotiated_version(session: &Session) -> Result<ProtocolVersion, Error> {
    session
        .params
        .version
        .ok_or(Error::InvalidState("version not negotiated"))
}

/// Schemes we offered in signature_algorithms.
fn advertised_schemes(session: &Session) -> Vec<SignatureScheme> {
    session
        .config
        .signature_schemes()
        .iter()
        .copied()
        .filter(|s| *s != SignatureScheme::RSA_PKCS1_MD5_SHA1)
        .collect()
}

/// Server side of a key exchange.
pub struct ServerKx {
    flavor: KeyExchangeFlavor,
    state: ServerKxState,
    material: KeyExchangeMaterial,
    params: Buf,
    psk: Option<Arc<dyn PskCredentials>>,
    identity: Option<Vec<u8>>,
    premaster: Option<Zeroizing<Vec<u8>>>,
}

impl ServerKx {
    pub fn new(flavor: KeyExchangeFlavor) -> Self {
        ServerKx {
            flavor,
            state: ServerKxState::Idle,
            material: KeyExchangeMaterial::new(),
            params: Buf::new(),
            psk: None,
            identity: None,
            premaster: None,
        }
    }

    /// Keys for the PSK flavors.
    pub fn with_psk(mut self, psk: Arc<dyn PskCredentials>) -> Self {
        self.psk = Some(psk);
        self
    }

    pub fn flavor(&self) -> KeyExchangeFlavor {
        self.flavor
    }

    pub fn state(&self) -> ServerKxState {
        self.state
    }

    pub fn material(&self) -> &KeyExchangeMaterial {
        &self.material
    }

    /// Identity the client authenticated with, PSK flavors only.
    pub fn psk_identity(&self) -> Option<&[u8]> {
        self.identity.as_deref()
    }

    fn expect(&self, state: ServerKxState) -> Result<(), Error> {
        if self.state != state {
            debug!("Server key exchange in {:?}, expected {:?}", self.state, state);
            return Err(Error::InvalidState("server key exchange out of order"));
        }
        Ok(())
    }

    fn psk_store(&self) -> Result<&Arc<dyn PskCredentials>, Error> {
        self.psk.as_ref().ok_or(Error::InsufficientCredentials)
    }

    /// Negotiate the group and generate our ephemeral key.
    pub fn generate(&mut self, session: &mut Session) -> Result<(), Error> {
        self.expect(ServerKxState::Idle)?;
        self.state = ServerKxState::Failed;
        let mut params = Buf::new();

        if self.flavor.uses_psk() {
            let hint = self.psk_store()?.identity_hint();
            // With a Diffie-Hellman part the hint is always present.
            if hint.is_some() || !self.flavor.server_params_optional() {
                PskIdentityHint(hint.as_deref().unwrap_or(&[])).serialize(&mut params)?;
            }
        }

        match self.flavor.ephemeral() {
            Ephemeral::Ffdhe => dhe::write_server_params(&mut self.material, session, &mut params)?,
            Ephemeral::Ecdhe => ecdhe::write_server_params(&mut self.material, session, &mut params)?,
            Ephemeral::None => {}
        }

        trace!("{:?} server params of {} bytes", self.flavor, params.len());
        self.params = params;
        self.state = ServerKxState::ParamsGenerated;
        Ok(())
    }

    /// Write the ServerKeyExchange body, signed if the flavor signs.
    ///
    /// Returns false when the message is to be left out.
    pub fn write_server_key_exchange(&mut self, session: &Session, out: &mut Buf) -> Result<bool, Error> {
        self.expect(ServerKxState::ParamsGenerated)?;
        self.state = ServerKxState::Failed;
        let start = out.len();
        out.extend_from_slice(&self.params);

        if self.flavor.signs() {
            let version = negotiated_version(session)?;
            let selected = session
                .selected()
                .ok_or(Error::InvalidState("no server credential selected"))?;
            let scheme = session
                .params
                .server_signature_scheme
                .or(selected.signature_scheme())
                .ok_or(Error::InvalidState("no signature scheme selected"))?;
            sign_params(
                selected.key().as_ref(),
                scheme,
                version,
                &session.params.client_random,
                &session.params.server_random,
                &self.params,
                out,
            )?;
            debug!("Signed server params with {:?}", scheme);
        }

        self.state = ServerKxState::Sent;
        Ok(out.len() > start)
    }

    /// Read the ClientKeyExchange body and derive the premaster secret.
    pub fn read_client_key_exchange(&mut self, session: &mut Session, input: &[u8]) -> Result<(), Error> {
        self.expect(ServerKxState::Sent)?;
        self.state = ServerKxState::Failed;
        let version = negotiated_version(session)?;
        let mut input = input;

        let psk = if self.flavor.uses_psk() {
            let (rest, identity) = PskIdentity::parse(input)?;
            input = rest;
            let Some(key) = self.psk_store()?.lookup(identity.0) else {
                debug!("Unknown PSK identity of {} bytes", identity.0.len());
                return Err(Error::UnknownPskIdentity);
            };
            self.identity = Some(identity.0.to_vec());
            Some(key)
        } else {
            None
        };

        let other = match self.flavor.ephemeral() {
            Ephemeral::Ffdhe => {
                let (rest, secret) = dhe::read_client_public(&mut self.material, version, input)?;
                input = rest;
                Some(secret)
            }
            Ephemeral::Ecdhe => {
                let (rest, secret) = ecdhe::read_client_public(&mut self.material, input)?;
                input = rest;
                Some(secret)
            }
            Ephemeral::None if self.flavor.uses_rsa_transport() => {
                let selected = session
                    .selected()
                    .ok_or(Error::InvalidState("no server credential selected"))?;
                let (rest, encrypted) =
                    EncryptedPreMasterSecret::parse(input, self.flavor.length_prefixed(version))?;
                input = rest;
                let advertised = session.params.advertised_version.unwrap_or(version);
                Some(decrypt_premaster(
                    selected.key().as_ref(),
                    encrypted.0,
                    advertised,
                    version,
                    &session.config,
                ))
            }
            Ephemeral::None => None,
        };

        if !input.is_empty() {
            return Err(Error::DecodeError("trailing data in ClientKeyExchange"));
        }

        self.premaster = Some(psk::premaster(self.flavor, other, psk)?);
        self.state = ServerKxState::Derived;
        debug!("{:?} key exchange complete", self.flavor);
        Ok(())
    }

    /// The premaster secret, once.
    pub fn take_premaster(&mut self) -> Result<Zeroizing<Vec<u8>>, Error> {
        self.premaster
            .take()
            .ok_or(Error::InvalidState("premaster not available"))
    }
}

impl std::fmt::Debug for ServerKx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerKx")
            .field("flavor", &self.flavor)
            .field("state", &self.state)
            .field("material", &self.material)
            .finish_non_exhaustive()
    }
}

/// Client side of a key exchange.
pub struct ClientKx {
    flavor: KeyExchangeFlavor,
    state: ClientKxState,
    material: KeyExchangeMaterial,
    psk: Option<Arc<dyn PskCredentials>>,
    hint: Option<Vec<u8>>,
    premaster: Option<Zeroizing<Vec<u8>>>,
}

impl ClientKx {
    pub fn new(flavor: KeyExchangeFlavor) -> Self {
        ClientKx {
            flavor,
            state: ClientKxState::Idle,
            material: KeyExchangeMaterial::new(),
            psk: None,
            hint: None,
            premaster: None,
        }
    }

    /// Keys for the PSK flavors.
    pub fn with_psk(mut self, psk: Arc<dyn PskCredentials>) -> Self {
        self.psk = Some(psk);
        self
    }

    pub fn flavor(&self) -> KeyExchangeFlavor {
        self.flavor
    }

    pub fn state(&self) -> ClientKxState {
        self.state
    }

    pub fn material(&self) -> &KeyExchangeMaterial {
        &self.material
    }

    /// Identity hint the server sent.
    pub fn psk_hint(&self) -> Option<&[u8]> {
        self.hint.as_deref()
    }

    /// Read the ServerKeyExchange body.
    ///
    /// `server_key` is the key of the server certificate, needed by the
    /// signing flavors.
    pub fn read_server_key_exchange(
        &mut self,
        session: &mut Session,
        server_key: Option<&PublicKey>,
        input: &[u8],
    ) -> Result<(), Error> {
        if self.state != ClientKxState::Idle {
            return Err(Error::InvalidState("ServerKeyExchange out of order"));
        }
        self.state = ClientKxState::ParamsReceived;
        let version = negotiated_version(session)?;
        let mut rest = input;

        if self.flavor.uses_psk() {
            let (r, hint) = PskIdentityHint::parse(rest)?;
            trace!("PSK identity hint of {} bytes", hint.0.len());
            self.hint = Some(hint.0.to_vec());
            rest = r;
        }

        rest = match self.flavor.ephemeral() {
            Ephemeral::Ffdhe => dhe::read_server_params(&mut self.material, session, rest)?,
            Ephemeral::Ecdhe => ecdhe::read_server_params(&mut self.material, session, rest)?,
            Ephemeral::None => rest,
        };

        if self.flavor.signs() {
            let key = server_key.ok_or(Error::InvalidState("server public key unknown"))?;
            let params = &input[..input.len() - rest.len()];
            let advertised = advertised_schemes(session);
            let (scheme, r) = verify_params(
                key,
                version,
                &session.config,
                &advertised,
                &session.params.client_random,
                &session.params.server_random,
                params,
                rest,
            )?;
            session.params.server_signature_scheme = Some(scheme);
            rest = r;
        }

        if !rest.is_empty() {
            return Err(Error::DecodeError("trailing data in ServerKeyExchange"));
        }
        self.state = ClientKxState::Validated;
        Ok(())
    }

    /// Write the ClientKeyExchange body and derive the premaster secret.
    ///
    /// `server_key` is the key of the server certificate, needed for RSA
    /// key transport.
    pub fn write_client_key_exchange(
        &mut self,
        session: &mut Session,
        server_key: Option<&PublicKey>,
        out: &mut Buf,
    ) -> Result<(), Error> {
        let ready = match self.state {
            ClientKxState::Validated => true,
            ClientKxState::Idle => self.flavor.server_params_optional(),
            _ => false,
        };
        if !ready {
            return Err(Error::InvalidState("ClientKeyExchange out of order"));
        }
        let version = negotiated_version(session)?;

        let psk = if self.flavor.uses_psk() {
            let store = self.psk.as_ref().ok_or(Error::InsufficientCredentials)?;
            let (identity, key) = store
                .client_psk(self.hint.as_deref())
                .ok_or(Error::InsufficientCredentials)?;
            PskIdentity(&identity).serialize(out)?;
            Some(key)
        } else {
            None
        };

        let other = match self.flavor.ephemeral() {
            Ephemeral::Ffdhe => Some(dhe::write_client_public(&mut self.material, session, version, out)?),
            Ephemeral::Ecdhe => Some(ecdhe::write_client_public(&mut self.material, out)?),
            Ephemeral::None if self.flavor.uses_rsa_transport() => {
                let key = server_key.ok_or(Error::InvalidState("server public key unknown"))?;
                let advertised = session.params.advertised_version.unwrap_or(version);
                let premaster = rsa::client_premaster(advertised);
                let encrypted = rsa::encrypt_premaster(key, &premaster)?;
                EncryptedPreMasterSecret(&encrypted).serialize(out, self.flavor.length_prefixed(version))?;
                Some(premaster)
            }
            Ephemeral::None => None,
        };

        self.premaster = Some(psk::premaster(self.flavor, other, psk)?);
        self.state = ClientKxState::Derived;
        debug!("{:?} key exchange complete", self.flavor);
        Ok(())
    }

    /// The premaster secret, once.
    pub fn take_premaster(&mut self) -> Result<Zeroizing<Vec<u8>>, Error> {
        self.premaster
            .take()
            .ok_or(Error::InvalidState("premaster not available"))
    }
}

impl std::fmt::Debug for ClientKx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientKx")
            .field("flavor", &self.flavor)
            .field("state", &self.state)
            .field("material", &self.material)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::{MessageKind, Registry};
    use crate::message::{ProtocolFamily, Role};
    use crate::Config;

    fn session(role: Role, suite: CipherSuite) -> Session {
        let config = Arc::new(Config::builder().build().unwrap());
        let mut s = Session::new(role, ProtocolFamily::Tls, config, Registry::default_shared());
        s.params.version = Some(ProtocolVersion::TLS1_2);
        s.params.cipher_suite = Some(suite);
        s.params.client_random = [1; 32];
        s.params.server_random = [2; 32];
        if role == Role::Server {
            s.process_extensions(MessageKind::ClientHello, &[]).unwrap();
        }
        s
    }

    fn run(
        suite: CipherSuite,
        server_psk: Option<Arc<dyn PskCredentials>>,
        client_psk: Option<Arc<dyn PskCredentials>>,
    ) -> Result<(Zeroizing<Vec<u8>>, Zeroizing<Vec<u8>>), Error> {
        let flavor = KeyExchangeFlavor::for_suite(suite)?;
        let mut server_session = session(Role::Server, suite);
        let mut client_session = session(Role::Client, suite);

        let mut server = ServerKx::new(flavor);
        if let Some(psk) = server_psk {
            server = server.with_psk(psk);
        }
        let mut client = ClientKx::new(flavor);
        if let Some(psk) = client_psk {
            client = client.with_psk(psk);
        }

        server.generate(&mut server_session)?;
        let mut ske = Buf::new();
        if server.write_server_key_exchange(&server_session, &mut ske)? {
            client.read_server_key_exchange(&mut client_session, None, &ske)?;
        }

        let mut cke = Buf::new();
        client.write_client_key_exchange(&mut client_session, None, &mut cke)?;
        server.read_client_key_exchange(&mut server_session, &cke)?;

        Ok((server.take_premaster()?, client.take_premaster()?))
    }

    fn store() -> Arc<dyn PskCredentials> {
        Arc::new(PskStore::new().insert(b"client", &[0x42; 16]))
    }

    #[test]
    fn anonymous_ecdh_agrees() {
        let (s, c) = run(CipherSuite::TLS_ECDH_ANON_WITH_AES_128_CBC_SHA, None, None).unwrap();
        assert_eq!(s.len(), 32);
        assert_eq!(&s[..], &c[..]);
    }

    #[test]
    fn anonymous_dh_agrees() {
        let (s, c) = run(CipherSuite::TLS_DH_ANON_WITH_AES_128_GCM_SHA256, None, None).unwrap();
        assert_eq!(&s[..], &c[..]);
    }

    #[test]
    fn plain_psk_without_server_message() {
        let (s, c) = run(CipherSuite::TLS_PSK_WITH_AES_128_GCM_SHA256, Some(store()), Some(store())).unwrap();
        assert_eq!(&s[..], &c[..]);
        assert_eq!(s.len(), 2 + 16 + 2 + 16);
        assert_eq!(&s[2..18], &[0; 16]);
    }

    #[test]
    fn ecdhe_psk_mixes() {
        let (s, c) = run(CipherSuite::TLS_ECDHE_PSK_WITH_AES_128_CBC_SHA256, Some(store()), Some(store())).unwrap();
        assert_eq!(&s[..], &c[..]);
        // u16 len ‖ 32 byte ECDH secret ‖ u16 len ‖ psk
        assert_eq!(s.len(), 2 + 32 + 2 + 16);
        assert_eq!(&s[s.len() - 16..], &[0x42; 16]);
    }

    #[test]
    fn unknown_identity() {
        let other: Arc<dyn PskCredentials> = Arc::new(PskStore::new().insert(b"mallory", &[1]));
        let res = run(CipherSuite::TLS_PSK_WITH_AES_128_GCM_SHA256, Some(store()), Some(other));
        assert_eq!(res.map(|_| ()), Err(Error::UnknownPskIdentity));
    }

    #[test]
    fn out_of_order() {
        let suite = CipherSuite::TLS_ECDH_ANON_WITH_AES_128_CBC_SHA;
        let mut server_session = session(Role::Server, suite);
        let mut server = ServerKx::new(KeyExchangeFlavor::EcdhAnon);
        let mut out = Buf::new();
        assert_eq!(
            server.write_server_key_exchange(&server_session, &mut out),
            Err(Error::InvalidState("server key exchange out of order"))
        );
        assert_eq!(
            server.read_client_key_exchange(&mut server_session, &[]),
            Err(Error::InvalidState("server key exchange out of order"))
        );

        let mut client_session = session(Role::Client, suite);
        let mut client = ClientKx::new(KeyExchangeFlavor::EcdhAnon);
        assert_eq!(
            client.write_client_key_exchange(&mut client_session, None, &mut out),
            Err(Error::InvalidState("ClientKeyExchange out of order"))
        );

        // A failed read cannot be retried.
        assert!(client.read_server_key_exchange(&mut client_session, None, &[0x03]).is_err());
        assert_eq!(
            client.read_server_key_exchange(&mut client_session, None, &[0x03]),
            Err(Error::InvalidState("ServerKeyExchange out of order"))
        );
    }

    #[test]
    fn server_read_is_single_shot() {
        let _ = env_logger::try_init();

        let suite = CipherSuite::TLS_ECDH_ANON_WITH_AES_128_CBC_SHA;
        let flavor = KeyExchangeFlavor::EcdhAnon;
        let mut server_session = session(Role::Server, suite);
        let mut client_session = session(Role::Client, suite);

        let mut server = ServerKx::new(flavor);
        server.generate(&mut server_session).unwrap();
        let mut ske = Buf::new();
        server.write_server_key_exchange(&server_session, &mut ske).unwrap();

        let mut client = ClientKx::new(flavor);
        client.read_server_key_exchange(&mut client_session, None, &ske).unwrap();
        let mut cke = Buf::new();
        client.write_client_key_exchange(&mut client_session, None, &mut cke).unwrap();

        // A short point fails, and the valid message is refused afterwards.
        assert!(server.read_client_key_exchange(&mut server_session, &[0x03, 1, 2, 3]).is_err());
        assert_eq!(server.state(), ServerKxState::Failed);
        assert_eq!(
            server.read_client_key_exchange(&mut server_session, &cke),
            Err(Error::InvalidState("server key exchange out of order"))
        );
        assert!(server.take_premaster().is_err());

        // A completed read is not repeated either.
        let mut server = ServerKx::new(flavor);
        let mut server_session = session(Role::Server, suite);
        server.generate(&mut server_session).unwrap();
        let mut ske = Buf::new();
        server.write_server_key_exchange(&server_session, &mut ske).unwrap();
        let mut client = ClientKx::new(flavor);
        let mut client_session = session(Role::Client, suite);
        client.read_server_key_exchange(&mut client_session, None, &ske).unwrap();
        let mut cke = Buf::new();
        client.write_client_key_exchange(&mut client_session, None, &mut cke).unwrap();

        server.read_client_key_exchange(&mut server_session, &cke).unwrap();
        assert_eq!(server.state(), ServerKxState::Derived);
        assert_eq!(
            server.read_client_key_exchange(&mut server_session, &cke),
            Err(Error::InvalidState("server key exchange out of order"))
        );
        assert_eq!(server.take_premaster().unwrap().len(), 32);
    }

    #[test]
    fn signing_needs_selection() {
        let suite = CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256;
        let mut server_session = session(Role::Server, suite);
        let mut server = ServerKx::new(KeyExchangeFlavor::EcdheEcdsa);
        server.generate(&mut server_session).unwrap();
        let mut out = Buf::new();
        assert_eq!(
            server.write_server_key_exchange(&server_session, &mut out),
            Err(Error::InvalidState("no server credential selected"))
        );
    }

    #[test]
    fn tls13_has_no_flavor() {
        assert!(KeyExchangeFlavor::for_suite(CipherSuite::TLS_AES_128_GCM_SHA256).is_err());
        assert_eq!(
            KeyExchangeFlavor::for_suite(CipherSuite::TLS_DHE_PSK_WITH_AES_128_GCM_SHA256),
            Ok(KeyExchangeFlavor::DhePsk)
        );
    }
}
