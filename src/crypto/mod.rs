//! Default public key primitives, built on the RustCrypto crates.
//!
//! Negotiation code only reaches key material through [`PrivateKey`],
//! [`PublicKey`] and [`EphemeralKey`]. Applications with their own key
//! storage implement [`PrivateKey`].

mod hash;
mod key_exchange;
mod public_key;
mod signing;

pub use hash::{digest, Hash};
pub use key_exchange::{generate_dh_keypair, generate_keypair, EphemeralKey};
pub use public_key::PublicKey;
pub use signing::{load_private_key, EcdsaKey, PrivateKey, RsaKey};

pub(crate) use public_key::compatible;
