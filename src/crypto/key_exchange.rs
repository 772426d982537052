use elliptic_curve::sec1::ToEncodedPoint;
use num_bigint::{BigUint, RandomBits};
use p256::{ecdh::EphemeralSecret as P256EphemeralSecret, PublicKey as P256PublicKey};
use p384::{ecdh::EphemeralSecret as P384EphemeralSecret, PublicKey as P384PublicKey};
use rand::distributions::Distribution;
use rand::rngs::OsRng;
use x25519_dalek::{EphemeralSecret as X25519EphemeralSecret, PublicKey as X25519PublicKey};
use zeroize::Zeroizing;

use crate::message::NamedGroup;
use crate::Error;

/// Our half of an ephemeral (EC)DH exchange.
///
/// The secret is consumed by [`EphemeralKey::derive`].
pub enum EphemeralKey {
    P256(P256EphemeralSecret),
    P384(P384EphemeralSecret),
    X25519(X25519EphemeralSecret),
    Dh {
        prime: BigUint,
        private_key: Zeroizing<Vec<u8>>,
    },
}

impl std::fmt::Debug for EphemeralKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EphemeralKey::P256(_) => f.debug_tuple("EphemeralKey::P256").finish(),
            EphemeralKey::P384(_) => f.debug_tuple("EphemeralKey::P384").finish(),
            EphemeralKey::X25519(_) => f.debug_tuple("EphemeralKey::X25519").finish(),
            EphemeralKey::Dh { prime, .. } => f
                .debug_struct("EphemeralKey::Dh")
                .field("prime_bits", &prime.bits())
                .finish_non_exhaustive(),
        }
    }
}

/// Generate an ephemeral key pair on an elliptic curve group.
///
/// Returns the key and our public value in its wire encoding.
pub fn generate_keypair(group: NamedGroup) -> Result<(EphemeralKey, Vec<u8>), Error> {
    match group {
        NamedGroup::Secp256r1 => {
            let secret = P256EphemeralSecret::random(&mut OsRng);
            let public_key = P256PublicKey::from(&secret);
            let encoded_point = public_key.to_encoded_point(false);
            Ok((EphemeralKey::P256(secret), encoded_point.as_bytes().to_vec()))
        }
        NamedGroup::Secp384r1 => {
            let secret = P384EphemeralSecret::random(&mut OsRng);
            let public_key = P384PublicKey::from(&secret);
            let encoded_point = public_key.to_encoded_point(false);
            Ok((EphemeralKey::P384(secret), encoded_point.as_bytes().to_vec()))
        }
        NamedGroup::X25519 => {
            let secret = X25519EphemeralSecret::random_from_rng(OsRng);
            let public_key = X25519PublicKey::from(&secret);
            Ok((EphemeralKey::X25519(secret), public_key.as_bytes().to_vec()))
        }
        _ => Err(Error::UnsupportedGroup(group.as_u16())),
    }
}

/// Generate a finite field DH key pair for `(prime, generator)`.
///
/// The private exponent has `q_bits` bits, one less than the prime when
/// `None`.
pub fn generate_dh_keypair(
    prime: &[u8],
    generator: &[u8],
    q_bits: Option<usize>,
) -> Result<(EphemeralKey, Vec<u8>), Error> {
    let prime = BigUint::from_bytes_be(prime);
    let generator = BigUint::from_bytes_be(generator);
    let prime_bits = prime.bits();
    if prime_bits < 2 {
        return Err(Error::IllegalParameter("DH prime too small"));
    }

    let exponent_bits = q_bits
        .map(|b| b as usize)
        .unwrap_or(prime_bits - 1)
        .min(prime_bits - 1)
        .max(1);
    let distribution = RandomBits::new(exponent_bits);
    let private_key: Zeroizing<BigUint> = Zeroizing::new(distribution.sample(&mut OsRng));

    // Compute public key as g^private_key mod p
    let public_key = generator.modpow(&private_key, &prime);

    Ok((
        EphemeralKey::Dh {
            prime,
            private_key: Zeroizing::new(private_key.to_bytes_be()),
        },
        public_key.to_bytes_be(),
    ))
}

impl EphemeralKey {
    /// Combine with the peer's public value.
    ///
    /// EC results are the x coordinate at field size. DH results are the
    /// minimal big-endian encoding, callers pad as the protocol requires.
    pub fn derive(self, peer_public_key: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
        match self {
            EphemeralKey::P256(secret) => {
                let peer = P256PublicKey::from_sec1_bytes(peer_public_key)
                    .map_err(|_| Error::IllegalParameter("Invalid P-256 public key"))?;
                let shared = secret.diffie_hellman(&peer);
                Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
            }
            EphemeralKey::P384(secret) => {
                let peer = P384PublicKey::from_sec1_bytes(peer_public_key)
                    .map_err(|_| Error::IllegalParameter("Invalid P-384 public key"))?;
                let shared = secret.diffie_hellman(&peer);
                Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
            }
            EphemeralKey::X25519(secret) => {
                let bytes: [u8; 32] = peer_public_key
                    .try_into()
                    .map_err(|_| Error::IllegalParameter("Invalid X25519 public key length"))?;
                let shared = secret.diffie_hellman(&X25519PublicKey::from(bytes));
                if !shared.was_contributory() {
                    return Err(Error::IllegalParameter("X25519 low order point"));
                }
                Ok(Zeroizing::new(shared.as_bytes().to_vec()))
            }
            EphemeralKey::Dh { prime, private_key } => {
                let peer = BigUint::from_bytes_be(peer_public_key);
                let exponent = Zeroizing::new(BigUint::from_bytes_be(&private_key));
                let shared = Zeroizing::new(peer.modpow(&exponent, &prime));
                Ok(Zeroizing::new(shared.to_bytes_be()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecdh_agrees() {
        for group in [NamedGroup::Secp256r1, NamedGroup::Secp384r1, NamedGroup::X25519] {
            let (a, a_pub) = generate_keypair(group).unwrap();
            let (b, b_pub) = generate_keypair(group).unwrap();
            assert_eq!(*a.derive(&b_pub).unwrap(), *b.derive(&a_pub).unwrap());
        }
    }

    #[test]
    fn dh_agrees() {
        // 2^127 - 1
        let prime = [
            0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xff,
        ];
        let (a, a_pub) = generate_dh_keypair(&prime, &[3], None).unwrap();
        let (b, b_pub) = generate_dh_keypair(&prime, &[3], Some(64)).unwrap();
        assert_eq!(*a.derive(&b_pub).unwrap(), *b.derive(&a_pub).unwrap());
    }

    #[test]
    fn dh_values_wipe() {
        use zeroize::Zeroize;

        let mut exponent = BigUint::from_bytes_be(&[0x5a; 32]);
        exponent.zeroize();
        assert_eq!(exponent, BigUint::default());

        let wrapped = Zeroizing::new(BigUint::from(7u32));
        assert_eq!(*wrapped, BigUint::from(7u32));
    }

    #[test]
    fn unsupported_group() {
        assert_eq!(
            generate_keypair(NamedGroup::X448).unwrap_err(),
            Error::UnsupportedGroup(0x001e)
        );
    }
}
