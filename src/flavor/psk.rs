//! Pre-shared keys for the PSK key exchanges (RFC 4279).

use std::fmt;

use zeroize::Zeroizing;

use super::KeyExchangeFlavor;
use crate::kx::psk_mix;
use crate::Error;

/// Where PSK identities and keys come from.
///
/// Lookups may block, for example on a database.
pub trait PskCredentials: Send + Sync {
    /// Hint the server sends in ServerKeyExchange.
    fn identity_hint(&self) -> Option<Vec<u8>> {
        None
    }

    /// Key for `identity` (server).
    fn lookup(&self, identity: &[u8]) -> Option<Zeroizing<Vec<u8>>>;

    /// Identity and key to use after the server's `hint` (client).
    fn client_psk(&self, hint: Option<&[u8]>) -> Option<(Vec<u8>, Zeroizing<Vec<u8>>)>;
}

/// A fixed table of identities and keys.
///
/// A client uses the first entry.
#[derive(Default)]
pub struct PskStore {
    hint: Option<Vec<u8>>,
    keys: Vec<(Vec<u8>, Zeroizing<Vec<u8>>)>,
}

impl PskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hint(mut self, hint: &[u8]) -> Self {
        self.hint = Some(hint.to_vec());
        self
    }

    pub fn insert(mut self, identity: &[u8], key: &[u8]) -> Self {
        self.keys.retain(|(i, _)| i != identity);
        self.keys
            .push((identity.to_vec(), Zeroizing::new(key.to_vec())));
        self
    }
}

impl PskCredentials for PskStore {
    fn identity_hint(&self) -> Option<Vec<u8>> {
        self.hint.clone()
    }

    fn lookup(&self, identity: &[u8]) -> Option<Zeroizing<Vec<u8>>> {
        self.keys
            .iter()
            .find(|(i, _)| i == identity)
            .map(|(_, k)| k.clone())
    }

    fn client_psk(&self, _hint: Option<&[u8]>) -> Option<(Vec<u8>, Zeroizing<Vec<u8>>)> {
        self.keys.first().cloned()
    }
}

impl fmt::Debug for PskStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identities: Vec<String> = self
            .keys
            .iter()
            .map(|(i, _)| String::from_utf8_lossy(i).into_owned())
            .collect();
        f.debug_struct("PskStore")
            .field("hint", &self.hint.as_ref().map(|h| String::from_utf8_lossy(h).into_owned()))
            .field("identities", &identities)
            .finish()
    }
}

/// Build the premaster secret of `flavor`.
///
/// `other` is the secret of the RSA or Diffie-Hellman part, `psk` the key of
/// the PSK part.
pub(super) fn premaster(
    flavor: KeyExchangeFlavor,
    other: Option<Zeroizing<Vec<u8>>>,
    psk: Option<Zeroizing<Vec<u8>>>,
) -> Result<Zeroizing<Vec<u8>>, Error> {
    use KeyExchangeFlavor as F;
    match flavor {
        F::Psk => {
            let psk = psk.ok_or(Error::InvalidState("no PSK"))?;
            psk_mix::plain_psk_premaster(&psk)
        }
        F::DhePsk | F::EcdhePsk | F::RsaPsk => {
            let psk = psk.ok_or(Error::InvalidState("no PSK"))?;
            let other = other.ok_or(Error::InvalidState("no premaster to mix"))?;
            psk_mix::mix(&other, &psk)
        }
        _ => other.ok_or(Error::InvalidState("no premaster")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_lookup() {
        let store = PskStore::new()
            .with_hint(b"hint")
            .insert(b"alice", &[1, 2, 3])
            .insert(b"bob", &[4])
            .insert(b"alice", &[5]);
        assert_eq!(store.identity_hint(), Some(b"hint".to_vec()));
        assert_eq!(store.lookup(b"alice").as_deref(), Some(&vec![5]));
        assert!(store.lookup(b"carol").is_none());

        let (identity, key) = store.client_psk(None).unwrap();
        assert_eq!(identity, b"bob");
        assert_eq!(&key[..], &[4]);
    }

    #[test]
    fn premaster_layouts() {
        let psk = || Some(Zeroizing::new(vec![0xAA]));
        let other = || Some(Zeroizing::new(vec![1, 2]));

        let pms = premaster(KeyExchangeFlavor::Psk, None, psk()).unwrap();
        assert_eq!(&pms[..], &[0, 1, 0, 0, 1, 0xAA]);

        let pms = premaster(KeyExchangeFlavor::EcdhePsk, other(), psk()).unwrap();
        assert_eq!(&pms[..], &[0, 2, 1, 2, 0, 1, 0xAA]);

        let pms = premaster(KeyExchangeFlavor::DhAnon, other(), None).unwrap();
        assert_eq!(&pms[..], &[1, 2]);

        assert_eq!(
            premaster(KeyExchangeFlavor::RsaPsk, None, psk()),
            Err(Error::InvalidState("no premaster to mix"))
        );
    }
}
