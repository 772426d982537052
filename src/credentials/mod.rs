//! Certificates, private keys and the choice between them.
//!
//! A [`CredentialSet`] is built once and shared between sessions. During a
//! handshake the session picks one [`Credential`] from it, or asks a
//! [`CertificateCallback`], and keeps the answer as its
//! [`SelectedCredential`].

mod certificate;
mod peer;
mod select;
pub mod signature;

use std::fmt;
use std::sync::Arc;

pub use certificate::{Certificate, KeyUsage};
pub use peer::{certificate_request, PeerCapabilities};
pub(crate) use select::{find_client, find_server};
pub use select::name_matches;

use crate::crypto::{load_private_key, PrivateKey};
use crate::message::{
    CipherSuite, KeyExchangeAlgorithm, PkAlgorithm, Role, SignatureScheme,
};
use crate::Error;

/// What a [`CertificateCallback`] is told about the handshake.
#[derive(Debug, Clone, Copy)]
pub struct CredentialQuery<'a> {
    /// Host name from server_name, server side only.
    pub server_name: Option<&'a str>,
    pub cipher_suite: Option<CipherSuite>,
    /// CA names from the CertificateRequest, client side only.
    pub ca_names: &'a [Vec<u8>],
    pub pk_algorithms: &'a [PkAlgorithm],
    pub signature_schemes: &'a [SignatureScheme],
}

/// Application provided credentials, asked instead of the configured list.
///
/// Each side is asked at most once per handshake.
pub trait CertificateCallback: Send + Sync {
    fn server_credential(&self, query: &CredentialQuery<'_>) -> Result<Option<Credential>, Error>;

    fn client_credential(&self, query: &CredentialQuery<'_>) -> Result<Option<Credential>, Error>;
}

/// Source of stapled OCSP responses for a chain.
pub trait OcspCallback: Send + Sync {
    fn ocsp_response(&self, chain: &[Certificate]) -> Option<Vec<u8>>;
}

/// A certificate chain, leaf first, with its private key.
pub struct Credential {
    chain: Vec<Certificate>,
    key: Arc<dyn PrivateKey>,
    ocsp: Option<Vec<u8>>,
    ocsp_callback: Option<Arc<dyn OcspCallback>>,
}

impl Credential {
    /// The key must belong to the algorithm of the leaf certificate.
    pub fn new(chain: Vec<Certificate>, key: Arc<dyn PrivateKey>) -> Result<Self, Error> {
        let Some(leaf) = chain.first() else {
            return Err(Error::CertificateError("empty certificate chain".to_string()));
        };
        let cert_pk = leaf.pk_algorithm();
        let key_pk = key.pk_algorithm();
        let matching = cert_pk == key_pk || (cert_pk == PkAlgorithm::RsaPss && key_pk == PkAlgorithm::Rsa);
        if !matching {
            return Err(Error::CertificateError(format!(
                "{:?} key does not match {:?} certificate",
                key_pk, cert_pk
            )));
        }
        Ok(Credential {
            chain,
            key,
            ocsp: None,
            ocsp_callback: None,
        })
    }

    /// Build from DER certificates, leaf first, and a PKCS#8 key.
    pub fn from_der(chain: &[&[u8]], key_der: &[u8]) -> Result<Self, Error> {
        let chain = chain
            .iter()
            .map(|der| Certificate::from_der(der))
            .collect::<Result<Vec<_>, _>>()?;
        let key = load_private_key(key_der)?;
        Self::new(chain, key)
    }

    /// Staple this OCSP response.
    pub fn with_ocsp(mut self, response: Vec<u8>) -> Self {
        self.ocsp = Some(response);
        self
    }

    pub fn with_ocsp_callback(mut self, callback: Arc<dyn OcspCallback>) -> Self {
        self.ocsp_callback = Some(callback);
        self
    }

    pub fn chain(&self) -> &[Certificate] {
        &self.chain
    }

    pub fn leaf(&self) -> &Certificate {
        // new() refuses empty chains
        &self.chain[0]
    }

    pub fn key(&self) -> &Arc<dyn PrivateKey> {
        &self.key
    }

    /// Names the leaf is valid for.
    pub fn names(&self) -> &[String] {
        self.leaf().dns_names()
    }

    fn ocsp_response(&self) -> Option<Vec<u8>> {
        if let Some(ocsp) = &self.ocsp {
            return Some(ocsp.clone());
        }
        self.ocsp_callback
            .as_ref()
            .and_then(|cb| cb.ocsp_response(&self.chain))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("names", &self.names())
            .field("chain_len", &self.chain.len())
            .field("key", &self.key)
            .field("ocsp", &self.ocsp.is_some())
            .finish_non_exhaustive()
    }
}

/// The configured credentials, in priority order.
pub struct CredentialSet {
    entries: Vec<Arc<Credential>>,
    order: Vec<usize>,
    callback: Option<Arc<dyn CertificateCallback>>,
}

impl CredentialSet {
    pub fn builder() -> CredentialSetBuilder {
        CredentialSetBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry by configuration index.
    pub fn get(&self, index: usize) -> Option<&Arc<Credential>> {
        self.entries.get(index)
    }

    /// Configuration indices in the order selection tries them.
    pub fn priority_order(&self) -> &[usize] {
        &self.order
    }

    pub(crate) fn callback(&self) -> Option<&Arc<dyn CertificateCallback>> {
        self.callback.as_ref()
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("entries", &self.entries)
            .field("order", &self.order)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[derive(Default)]
pub struct CredentialSetBuilder {
    entries: Vec<Arc<Credential>>,
    order: Vec<usize>,
    callback: Option<Arc<dyn CertificateCallback>>,
}

impl CredentialSetBuilder {
    /// Append a credential.
    ///
    /// Configuration order is kept, except that an RSA-PSS certificate
    /// takes the place of the first plain RSA one, which moves to the end.
    pub fn add(mut self, credential: Credential) -> Self {
        let index = self.entries.len();
        let is_pss = credential.leaf().pk_algorithm() == PkAlgorithm::RsaPss;
        self.entries.push(Arc::new(credential));

        let first_rsa = self
            .order
            .iter()
            .position(|i| self.entries[*i].leaf().pk_algorithm() == PkAlgorithm::Rsa);
        match first_rsa {
            Some(pos) if is_pss => {
                let moved = self.order[pos];
                self.order[pos] = index;
                self.order.push(moved);
            }
            _ => self.order.push(index),
        }
        self
    }

    /// Ask `callback` instead of the configured credentials.
    pub fn callback(mut self, callback: Arc<dyn CertificateCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn build(self) -> Arc<CredentialSet> {
        debug!(
            "Credential set of {} entries, order {:?}",
            self.entries.len(),
            self.order
        );
        Arc::new(CredentialSet {
            entries: self.entries,
            order: self.order,
            callback: self.callback,
        })
    }
}

/// Where a selected credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Entry `index` of the session's [`CredentialSet`].
    Borrowed { index: usize },
    /// Handed over by a [`CertificateCallback`].
    Owned,
}

/// The credential a handshake uses.
#[derive(Debug, Clone)]
pub struct SelectedCredential {
    pub(crate) credential: Arc<Credential>,
    pub(crate) ocsp: Option<Vec<u8>>,
    pub(crate) ownership: Ownership,
    pub(crate) scheme: Option<SignatureScheme>,
}

impl SelectedCredential {
    pub(crate) fn new(
        credential: Arc<Credential>,
        ownership: Ownership,
        scheme: Option<SignatureScheme>,
        want_ocsp: bool,
    ) -> Self {
        let ocsp = if want_ocsp {
            credential.ocsp_response()
        } else {
            None
        };
        SelectedCredential {
            credential,
            ocsp,
            ownership,
            scheme,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn chain(&self) -> &[Certificate] {
        self.credential.chain()
    }

    pub fn key(&self) -> &Arc<dyn PrivateKey> {
        self.credential.key()
    }

    pub fn ocsp(&self) -> Option<&[u8]> {
        self.ocsp.as_deref()
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Scheme chosen for signing with this credential, if the key exchange
    /// signs.
    pub fn signature_scheme(&self) -> Option<SignatureScheme> {
        self.scheme
    }
}

/// Decide whether a missing credential ends the handshake.
///
/// A server without a certificate can only continue with anonymous or PSK
/// key exchanges. A client is only asked when it must authenticate.
pub fn require_credential(
    selected: Option<&SelectedCredential>,
    kx: KeyExchangeAlgorithm,
    role: Role,
) -> Result<(), Error> {
    if selected.is_some() {
        return Ok(());
    }
    match role {
        Role::Server if kx.requires_certificate() => Err(Error::InsufficientCredentials),
        Role::Server => Ok(()),
        Role::Client => Err(Error::CertificateRequired),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential() {
        use KeyExchangeAlgorithm as K;
        assert_eq!(
            require_credential(None, K::EcdheRsa, Role::Server),
            Err(Error::InsufficientCredentials)
        );
        assert_eq!(require_credential(None, K::DhAnon, Role::Server), Ok(()));
        assert_eq!(require_credential(None, K::Psk, Role::Server), Ok(()));
        assert_eq!(
            require_credential(None, K::Rsa, Role::Client),
            Err(Error::CertificateRequired)
        );
    }
}
