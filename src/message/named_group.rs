wire_enum! {
    /// Groups for (EC)DHE key exchange (RFC 8422, RFC 7919, RFC 8446).
    ///
    /// The binary and sub-224 bit curves RFC 8422 deprecated decode as
    /// `Unknown`.
    pub enum NamedGroup: u16 {
        Secp224r1 = 21,
        Secp256k1 = 22,
        /// P-256.
        Secp256r1 = 23,
        /// P-384.
        Secp384r1 = 24,
        /// P-521.
        Secp521r1 = 25,
        X25519 = 29,
        X448 = 30,
        Ffdhe2048 = 0x0100,
        Ffdhe3072 = 0x0101,
        Ffdhe4096 = 0x0102,
        Ffdhe6144 = 0x0103,
        Ffdhe8192 = 0x0104,
    }
}

impl NamedGroup {
    /// Finite field group from RFC 7919.
    pub fn is_ffdhe(&self) -> bool {
        matches!(
            self,
            NamedGroup::Ffdhe2048
                | NamedGroup::Ffdhe3072
                | NamedGroup::Ffdhe4096
                | NamedGroup::Ffdhe6144
                | NamedGroup::Ffdhe8192
        )
    }

    /// Elliptic curve group, including X25519 and X448.
    pub fn is_ec(&self) -> bool {
        !self.is_ffdhe() && !matches!(self, NamedGroup::Unknown(_))
    }
}

wire_enum! {
    /// ECParameters curve_type (RFC 8422 5.4). Only named curves are used.
    pub enum CurveType: u8 {
        ExplicitPrime = 1,
        ExplicitChar2 = 2,
        NamedCurve = 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &[u8] = &[
        0x00, 0x1D, // x25519
        0x01, 0x00, // ffdhe2048
        0xFA, 0xFA, // GREASE
    ];

    #[test]
    fn parse_groups() {
        let (rest, a) = NamedGroup::parse(MESSAGE).unwrap();
        let (rest, b) = NamedGroup::parse(rest).unwrap();
        let (rest, c) = NamedGroup::parse(rest).unwrap();
        assert!(rest.is_empty());

        assert_eq!(a, NamedGroup::X25519);
        assert!(a.is_ec());
        assert_eq!(b, NamedGroup::Ffdhe2048);
        assert!(b.is_ffdhe());
        assert_eq!(c, NamedGroup::Unknown(0xFAFA));
        assert!(!c.is_ec() && !c.is_ffdhe());
        assert_eq!(c.as_u16(), 0xFAFA);
    }
}
