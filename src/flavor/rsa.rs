//! RSA key transport (RFC 5246 7.4.7.1).

use rand::rngs::OsRng;
use rand::RngCore;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::{PrivateKey, PublicKey};
use crate::message::ProtocolVersion;
use crate::{Config, Error};

/// Size of the RSA premaster secret.
pub const PREMASTER_LEN: usize = 48;

/// `client_version ‖ random[46]`.
pub(super) fn client_premaster(version: ProtocolVersion) -> Zeroizing<Vec<u8>> {
    let mut premaster = Zeroizing::new(vec![0; PREMASTER_LEN]);
    premaster[..2].copy_from_slice(&version.as_u16().to_be_bytes());
    OsRng.fill_bytes(&mut premaster[2..]);
    premaster
}

pub(super) fn encrypt_premaster(key: &PublicKey, premaster: &[u8]) -> Result<Vec<u8>, Error> {
    key.encrypt(premaster)
}

/// Decrypt the client's premaster without revealing whether it was valid.
///
/// A random premaster is drawn before decrypting. It replaces the
/// decrypted one when decryption fails, the length is not 48 or the version
/// bytes differ from `advertised` (or from `negotiated`, if the config
/// allows that). The choice is made in constant time and never reported,
/// so the handshake fails later at Finished (RFC 5246 7.4.7.1).
pub fn decrypt_premaster(
    key: &dyn PrivateKey,
    ciphertext: &[u8],
    advertised: ProtocolVersion,
    negotiated: ProtocolVersion,
    config: &Config,
) -> Zeroizing<Vec<u8>> {
    let mut fallback = Zeroizing::new([0u8; PREMASTER_LEN]);
    OsRng.fill_bytes(&mut fallback[..]);

    let plaintext = key.decrypt(ciphertext).unwrap_or_default();

    let len_ok = (plaintext.len() as u64).ct_eq(&(PREMASTER_LEN as u64));
    let mut candidate = [0u8; PREMASTER_LEN];
    let n = plaintext.len().min(PREMASTER_LEN);
    candidate[..n].copy_from_slice(&plaintext[..n]);

    let wanted = advertised.as_u16().to_be_bytes();
    let mut version_ok = candidate[0].ct_eq(&wanted[0]) & candidate[1].ct_eq(&wanted[1]);
    if config.allow_wrong_pms_version() {
        let got = negotiated.as_u16().to_be_bytes();
        version_ok |= candidate[0].ct_eq(&got[0]) & candidate[1].ct_eq(&got[1]);
    }
    let use_candidate: Choice = len_ok & version_ok;

    let mut premaster = Zeroizing::new(vec![0u8; PREMASTER_LEN]);
    for (i, byte) in premaster.iter_mut().enumerate() {
        *byte = u8::conditional_select(&fallback[i], &candidate[i], use_candidate);
    }
    candidate.zeroize();
    premaster
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::RsaKey;
    use once_cell::sync::Lazy;
    use rsa::RsaPrivateKey;

    static KEY: Lazy<RsaKey> = Lazy::new(|| RsaKey::new(RsaPrivateKey::new(&mut OsRng, 1024).unwrap()));

    fn public() -> PublicKey {
        PublicKey::Rsa(KEY.public_key())
    }

    fn config(allow_wrong_version: bool) -> Config {
        Config::builder()
            .allow_wrong_pms_version(allow_wrong_version)
            .build()
            .unwrap()
    }

    #[test]
    fn valid_premaster_comes_back() {
        let pms = client_premaster(ProtocolVersion::TLS1_2);
        assert_eq!(&pms[..2], &[0x03, 0x03]);
        let ct = encrypt_premaster(&public(), &pms).unwrap();
        let out = decrypt_premaster(
            &*KEY,
            &ct,
            ProtocolVersion::TLS1_2,
            ProtocolVersion::TLS1_2,
            &config(false),
        );
        assert_eq!(&out[..], &pms[..]);
    }

    #[test]
    fn wrong_version_is_replaced() {
        let pms = client_premaster(ProtocolVersion::TLS1_1);
        let ct = encrypt_premaster(&public(), &pms).unwrap();

        let out = decrypt_premaster(
            &*KEY,
            &ct,
            ProtocolVersion::TLS1_2,
            ProtocolVersion::TLS1_1,
            &config(false),
        );
        assert_eq!(out.len(), PREMASTER_LEN);
        assert_ne!(&out[..], &pms[..]);

        // Tolerated when the client put the negotiated version.
        let out = decrypt_premaster(
            &*KEY,
            &ct,
            ProtocolVersion::TLS1_2,
            ProtocolVersion::TLS1_1,
            &config(true),
        );
        assert_eq!(&out[..], &pms[..]);
    }

    #[test]
    fn garbage_gives_random_premaster() {
        let config = config(false);
        let a = decrypt_premaster(
            &*KEY,
            &[0x55; 128],
            ProtocolVersion::TLS1_2,
            ProtocolVersion::TLS1_2,
            &config,
        );
        let b = decrypt_premaster(&*KEY, &[], ProtocolVersion::TLS1_2, ProtocolVersion::TLS1_2, &config);
        assert_eq!(a.len(), PREMASTER_LEN);
        assert_eq!(b.len(), PREMASTER_LEN);
        assert_ne!(&a[..], &b[..]);
    }

    #[test]
    fn short_plaintext_is_replaced() {
        let ct = encrypt_premaster(&public(), &[0x03, 0x03, 0x01]).unwrap();
        let out = decrypt_premaster(
            &*KEY,
            &ct,
            ProtocolVersion::TLS1_2,
            ProtocolVersion::TLS1_2,
            &config(false),
        );
        assert_eq!(out.len(), PREMASTER_LEN);
        assert_ne!(&out[..3], &[0x03, 0x03, 0x01]);
    }
}
