//! Finite field groups of RFC 7919.

use once_cell::sync::Lazy;

use crate::message::NamedGroup;

/// Prime and generator of a named finite field group.
#[derive(Debug)]
pub struct DhGroup {
    pub group: NamedGroup,
    pub prime: Vec<u8>,
    pub generator: Vec<u8>,
}

impl DhGroup {
    /// Size of the prime in bits.
    pub fn bits(&self) -> usize {
        prime_bits(&self.prime)
    }
}

// RFC 7919 3.1 ffdhe2048 prime (2048-bit, 512 hex chars)
const FFDHE2048_P: &str = "\
FFFFFFFFFFFFFFFFADF85458a2bb4a9aafdc5620273d3cf1\
d8b9c583ce2d3695a9e13641146433fbcc939dce249b3ef9\
7d2fe363630c75d8f681b202aec4617ad3df1ed5d5fd6561\
2433f51f5f066ed0856365553ded1af3b557135e7f57c935\
984f0c70e0e68b77e2a689daf3efe8721df158a136ade735\
30acca4f483a797abc0ab182b324fb61d108a94bb2c8e3fb\
b96adab760d7f4681d4f42a3de394df4ae56ede76372bb19\
0b07a7c8ee0a6d709e02fce1cdf7e2ecc03404cd28342f61\
9172fe9ce98583ff8e4f1232eef28183c3fe3b1b4c6fad73\
3bb5fcbc2ec22005c58ef1837d1683b2c6f34a26c1b2effa\
886b423861285c97ffffffffffffffff";

// RFC 7919 3.2 ffdhe3072 prime (3072-bit, 768 hex chars)
const FFDHE3072_P: &str = "\
FFFFFFFFFFFFFFFFADF85458a2bb4a9aafdc5620273d3cf1\
d8b9c583ce2d3695a9e13641146433fbcc939dce249b3ef9\
7d2fe363630c75d8f681b202aec4617ad3df1ed5d5fd6561\
2433f51f5f066ed0856365553ded1af3b557135e7f57c935\
984f0c70e0e68b77e2a689daf3efe8721df158a136ade735\
30acca4f483a797abc0ab182b324fb61d108a94bb2c8e3fb\
b96adab760d7f4681d4f42a3de394df4ae56ede76372bb19\
0b07a7c8ee0a6d709e02fce1cdf7e2ecc03404cd28342f61\
9172fe9ce98583ff8e4f1232eef28183c3fe3b1b4c6fad73\
3bb5fcbc2ec22005c58ef1837d1683b2c6f34a26c1b2effa\
886b4238611fcfdcde355b3b6519035bbc34f4def99c0238\
61b46fc9d6e6c9077ad91d2691f7f7ee598cb0fac186d91c\
aefe130985139270b4130c93bc437944f4fd4452e2d74dd3\
64f2e21e71f54bff5cae82ab9c9df69ee86d2bc522363a0d\
abc521979b0deada1dbf9a42d5c4484e0abcd06bfa53ddef\
3c1b20ee3fd59d7c25e41d2b66c62e37ffffffffffffffff";

fn from_hex(hex: &str) -> Vec<u8> {
    hex.as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16).unwrap_or(0);
            let lo = (pair[1] as char).to_digit(16).unwrap_or(0);
            (hi << 4 | lo) as u8
        })
        .collect()
}

static FFDHE2048: Lazy<DhGroup> = Lazy::new(|| DhGroup {
    group: NamedGroup::Ffdhe2048,
    prime: from_hex(FFDHE2048_P),
    generator: vec![2],
});

static FFDHE3072: Lazy<DhGroup> = Lazy::new(|| DhGroup {
    group: NamedGroup::Ffdhe3072,
    prime: from_hex(FFDHE3072_P),
    generator: vec![2],
});

/// Parameters of a named finite field group we implement.
pub fn lookup(group: NamedGroup) -> Option<&'static DhGroup> {
    match group {
        NamedGroup::Ffdhe2048 => Some(&FFDHE2048),
        NamedGroup::Ffdhe3072 => Some(&FFDHE3072),
        _ => None,
    }
}

/// Find the named group a peer's `(p, g)` belongs to.
///
/// Leading zero bytes are ignored.
pub fn identify(prime: &[u8], generator: &[u8]) -> Option<&'static DhGroup> {
    let prime = strip_leading_zeros(prime);
    let generator = strip_leading_zeros(generator);
    [&*FFDHE2048, &*FFDHE3072]
        .into_iter()
        .find(|g| g.prime == prime && g.generator == generator)
}

pub(crate) fn strip_leading_zeros(value: &[u8]) -> &[u8] {
    let start = value.iter().position(|b| *b != 0).unwrap_or(value.len());
    &value[start..]
}

/// Bit length of a big-endian unsigned integer.
pub(crate) fn prime_bits(value: &[u8]) -> usize {
    let value = strip_leading_zeros(value);
    match value.first() {
        Some(first) => value.len() * 8 - first.leading_zeros() as usize,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_sizes() {
        assert_eq!(lookup(NamedGroup::Ffdhe2048).unwrap().bits(), 2048);
        assert_eq!(lookup(NamedGroup::Ffdhe3072).unwrap().bits(), 3072);
        assert!(lookup(NamedGroup::Ffdhe4096).is_none());
    }

    #[test]
    fn identify_ignores_leading_zeros() {
        let group = lookup(NamedGroup::Ffdhe2048).unwrap();
        let mut padded = vec![0];
        padded.extend_from_slice(&group.prime);

        let found = identify(&padded, &[0, 2]).unwrap();
        assert_eq!(found.group, NamedGroup::Ffdhe2048);
        assert!(identify(&group.prime, &[5]).is_none());
    }

    #[test]
    fn bit_length() {
        assert_eq!(prime_bits(&[0x00, 0x01, 0x00]), 9);
        assert_eq!(prime_bits(&[0x00]), 0);
        assert_eq!(prime_bits(&[0xff; 64]), 512);
    }
}
