use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::message::HashAlgorithm;
use crate::Error;

/// A running hash for any algorithm a signature scheme can name.
#[derive(Clone)]
pub enum Hash {
    Md5(Md5),
    Sha1(Sha1),
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
    Md5Sha1(Md5, Sha1),
}

impl Hash {
    /// Create a new hash context with the specified algorithm
    pub fn new(algorithm: HashAlgorithm) -> Result<Self, Error> {
        let hash = match algorithm {
            HashAlgorithm::MD5 => Hash::Md5(Md5::new()),
            HashAlgorithm::SHA1 => Hash::Sha1(Sha1::new()),
            HashAlgorithm::SHA224 => Hash::Sha224(Sha224::new()),
            HashAlgorithm::SHA256 => Hash::Sha256(Sha256::new()),
            HashAlgorithm::SHA384 => Hash::Sha384(Sha384::new()),
            HashAlgorithm::SHA512 => Hash::Sha512(Sha512::new()),
            HashAlgorithm::MD5_SHA1 => Hash::Md5Sha1(Md5::new(), Sha1::new()),
            _ => {
                return Err(Error::CryptoError(format!(
                    "Unsupported hash algorithm: {:?}",
                    algorithm
                )))
            }
        };
        Ok(hash)
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hash::Md5(h) => h.update(data),
            Hash::Sha1(h) => h.update(data),
            Hash::Sha224(h) => h.update(data),
            Hash::Sha256(h) => h.update(data),
            Hash::Sha384(h) => h.update(data),
            Hash::Sha512(h) => h.update(data),
            Hash::Md5Sha1(md5, sha1) => {
                md5.update(data);
                sha1.update(data);
            }
        }
    }

    pub fn finalize(self) -> Vec<u8> {
        match self {
            Hash::Md5(h) => h.finalize().to_vec(),
            Hash::Sha1(h) => h.finalize().to_vec(),
            Hash::Sha224(h) => h.finalize().to_vec(),
            Hash::Sha256(h) => h.finalize().to_vec(),
            Hash::Sha384(h) => h.finalize().to_vec(),
            Hash::Sha512(h) => h.finalize().to_vec(),
            Hash::Md5Sha1(md5, sha1) => {
                let mut out = md5.finalize().to_vec();
                out.extend_from_slice(&sha1.finalize());
                out
            }
        }
    }
}

/// One-shot digest of `data`.
pub fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut hash = Hash::new(algorithm)?;
    hash.update(data);
    Ok(hash.finalize())
}
