//! Extensions tlsnego implements itself.
//!
//! [`descriptors`] lists them in registration order, which is also the
//! order of the first priority pass and of outgoing blocks.

pub mod cookie;
pub mod ec_point_formats;
pub mod extended_master_secret;
pub mod heartbeat;
pub mod key_share;
pub mod pre_shared_key;
pub mod server_name;
pub mod signature_algorithms;
pub mod status_request;
pub mod supported_groups;
pub mod supported_versions;
pub mod use_srtp;

use nom::IResult;

use super::{ExtensionDescriptor, ParsePriority, Validity};
use crate::message::ExtensionType;
use crate::Error;

/// The built-in descriptors, in registration order.
pub fn descriptors() -> Vec<ExtensionDescriptor> {
    use ParsePriority::*;
    use Validity as V;

    let any = V::ANY_FAMILY;
    vec![
        ExtensionDescriptor::new(
            ExtensionType::SupportedVersions.as_u16(),
            "supported_versions",
            V::CLIENT_HELLO | V::TLS13_SERVER_HELLO | V::HELLO_RETRY_REQUEST | any,
            First,
            supported_versions::SupportedVersions,
        ),
        ExtensionDescriptor::new(
            ExtensionType::PreSharedKey.as_u16(),
            "pre_shared_key",
            V::CLIENT_HELLO | V::TLS13_SERVER_HELLO | any,
            First,
            pre_shared_key::PreSharedKey,
        ),
        ExtensionDescriptor::new(
            ExtensionType::Cookie.as_u16(),
            "cookie",
            V::CLIENT_HELLO | V::HELLO_RETRY_REQUEST | V::IGNORE_CLIENT_REQUEST | any,
            First,
            cookie::Cookie,
        ),
        ExtensionDescriptor::new(
            ExtensionType::ServerName.as_u16(),
            "server_name",
            V::CLIENT_HELLO | V::TLS12_SERVER_HELLO | V::ENCRYPTED_EXTENSIONS | any,
            Normal,
            server_name::ServerNameIndication,
        ),
        ExtensionDescriptor::new(
            ExtensionType::StatusRequest.as_u16(),
            "status_request",
            V::CLIENT_HELLO | V::TLS12_SERVER_HELLO | any,
            Normal,
            status_request::StatusRequest,
        ),
        ExtensionDescriptor::new(
            ExtensionType::SupportedGroups.as_u16(),
            "supported_groups",
            V::CLIENT_HELLO | V::ENCRYPTED_EXTENSIONS | any,
            Normal,
            supported_groups::SupportedGroups,
        ),
        ExtensionDescriptor::new(
            ExtensionType::EcPointFormats.as_u16(),
            "ec_point_formats",
            V::CLIENT_HELLO | V::TLS12_SERVER_HELLO | any,
            Normal,
            ec_point_formats::EcPointFormats,
        ),
        ExtensionDescriptor::new(
            ExtensionType::SignatureAlgorithms.as_u16(),
            "signature_algorithms",
            V::CLIENT_HELLO | V::CERTIFICATE_REQUEST | any,
            Normal,
            signature_algorithms::SignatureAlgorithms,
        ),
        ExtensionDescriptor::new(
            ExtensionType::KeyShare.as_u16(),
            "key_share",
            V::CLIENT_HELLO | V::TLS13_SERVER_HELLO | V::HELLO_RETRY_REQUEST | any,
            Normal,
            key_share::KeyShare,
        ),
        ExtensionDescriptor::new(
            ExtensionType::ExtendedMasterSecret.as_u16(),
            "extended_master_secret",
            V::CLIENT_HELLO | V::TLS12_SERVER_HELLO | any,
            Normal,
            extended_master_secret::ExtendedMasterSecret,
        ),
        ExtensionDescriptor::new(
            ExtensionType::UseSrtp.as_u16(),
            "use_srtp",
            V::CLIENT_HELLO | V::TLS12_SERVER_HELLO | V::ENCRYPTED_EXTENSIONS | V::DTLS,
            Application,
            use_srtp::UseSrtp,
        ),
        ExtensionDescriptor::new(
            ExtensionType::Heartbeat.as_u16(),
            "heartbeat",
            V::CLIENT_HELLO | V::TLS12_SERVER_HELLO | V::ENCRYPTED_EXTENSIONS | any,
            Application,
            heartbeat::Heartbeat,
        ),
    ]
}

/// Run an extension body parser that must consume the whole body.
pub(crate) fn parse_body<'a, T>(
    input: &'a [u8],
    parser: impl FnOnce(&'a [u8]) -> IResult<&'a [u8], T>,
) -> Result<T, Error> {
    let (rest, value) = parser(input)?;
    if !rest.is_empty() {
        return Err(Error::DecodeError("trailing bytes in extension"));
    }
    Ok(value)
}

/// Bodies that must be empty.
pub(crate) fn expect_empty(data: &[u8]) -> Result<(), Error> {
    if !data.is_empty() {
        return Err(Error::DecodeError("extension body must be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_body_rejects_trailing() {
        let res = parse_body(&[0x01, 0x02], nom::number::complete::be_u8::<_, nom::error::Error<_>>);
        assert_eq!(res, Err(Error::DecodeError("trailing bytes in extension")));
        let res = parse_body(&[0x01], nom::number::complete::be_u8::<_, nom::error::Error<_>>);
        assert_eq!(res, Ok(1));
    }

    #[test]
    fn ids_are_unique() {
        let all = descriptors();
        for (i, d) in all.iter().enumerate() {
            assert!(all[i + 1..].iter().all(|o| o.id != d.id), "{:?}", d);
        }
    }

    #[test]
    fn srtp_is_dtls_only() {
        let srtp = descriptors().into_iter().find(|d| d.id == 0x000E).unwrap();
        assert!(srtp.validity.contains(Validity::DTLS));
        assert!(!srtp.validity.contains(Validity::TLS));
    }
}
