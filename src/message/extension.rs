use nom::bytes::complete::take;
use nom::number::complete::be_u16;
use nom::IResult;

use crate::buffer::Buf;
use crate::Error;

/// One entry of a hello extensions block.
#[derive(Debug, PartialEq, Eq)]
pub struct Extension<'a> {
    pub extension_type: ExtensionType,
    pub extension_data: &'a [u8],
}

impl<'a> Extension<'a> {
    pub fn new(extension_type: ExtensionType, extension_data: &'a [u8]) -> Self {
        Extension {
            extension_type,
            extension_data,
        }
    }

    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], Extension<'a>> {
        let (input, extension_type) = ExtensionType::parse(input)?;
        let (input, extension_length) = be_u16(input)?;
        let (input, extension_data) = take(extension_length)(input)?;

        Ok((
            input,
            Extension {
                extension_type,
                extension_data,
            },
        ))
    }

    /// Split an extensions block, without its outer length, into entries.
    ///
    /// An entry claiming more bytes than remain is a length error. Entries
    /// are returned in wire order, duplicates included.
    pub fn parse_block(mut input: &'a [u8]) -> Result<Vec<Extension<'a>>, Error> {
        let mut entries = Vec::new();
        while !input.is_empty() {
            if input.len() < 4 {
                return Err(Error::UnexpectedPacketLength("truncated extension header"));
            }
            let (rest, extension) = Extension::parse(input)
                .map_err(|_| Error::UnexpectedPacketLength("extension exceeds block"))?;
            entries.push(extension);
            input = rest;
        }
        Ok(entries)
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push_u16(self.extension_type.as_u16());
        output.push_u16_prefixed(self.extension_data)
    }
}

wire_enum! {
    /// Extension ids from the IANA TLS ExtensionType registry.
    pub enum ExtensionType: u16 {
        ServerName = 0x0000,
        MaxFragmentLength = 0x0001,
        ClientCertificateUrl = 0x0002,
        TrustedCaKeys = 0x0003,
        TruncatedHmac = 0x0004,
        StatusRequest = 0x0005,
        SupportedGroups = 0x000a,
        EcPointFormats = 0x000b,
        SignatureAlgorithms = 0x000d,
        UseSrtp = 0x000e,
        Heartbeat = 0x000f,
        Alpn = 0x0010,
        SignedCertificateTimestamp = 0x0012,
        Padding = 0x0015,
        EncryptThenMac = 0x0016,
        ExtendedMasterSecret = 0x0017,
        SessionTicket = 0x0023,
        PreSharedKey = 0x0029,
        EarlyData = 0x002a,
        SupportedVersions = 0x002b,
        Cookie = 0x002c,
        PskKeyExchangeModes = 0x002d,
        CertificateAuthorities = 0x002f,
        PostHandshakeAuth = 0x0031,
        SignatureAlgorithmsCert = 0x0032,
        KeyShare = 0x0033,
        RenegotiationInfo = 0xff01,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &[u8] = &[
        0x00, 0x0A, // ExtensionType::SupportedGroups
        0x00, 0x04, // Extension length
        0x00, 0x02, 0x00, 0x17, // Extension data
        0x00, 0x17, // ExtensionType::ExtendedMasterSecret
        0x00, 0x00, // Extension length
        0xAB, 0xCD, // Unregistered id
        0x00, 0x01, // Extension length
        0x00, // Extension data
    ];

    #[test]
    fn parse_block_keeps_wire_order() {
        let entries = Extension::parse_block(MESSAGE).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].extension_type, ExtensionType::SupportedGroups);
        assert_eq!(entries[0].extension_data, &[0x00, 0x02, 0x00, 0x17]);
        assert_eq!(entries[1].extension_type, ExtensionType::ExtendedMasterSecret);
        assert!(entries[1].extension_data.is_empty());
        assert_eq!(entries[2].extension_type, ExtensionType::Unknown(0xABCD));
    }

    #[test]
    fn overlong_entry_is_length_error() {
        let block = [0x00, 0x17, 0x00, 0x05, 0x00];
        assert_eq!(
            Extension::parse_block(&block),
            Err(Error::UnexpectedPacketLength("extension exceeds block"))
        );
        assert!(Extension::parse_block(&[0x00]).is_err());
    }

    #[test]
    fn serialize_entry() {
        let ext = Extension::new(ExtensionType::SupportedGroups, &MESSAGE[4..8]);
        let mut out = Buf::new();
        ext.serialize(&mut out).unwrap();
        assert_eq!(&*out, &MESSAGE[..8]);
    }
}
