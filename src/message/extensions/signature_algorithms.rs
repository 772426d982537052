use crate::buffer::Buf;
use crate::message::SignatureScheme;
use crate::Error;
use nom::bytes::complete::take;
use nom::number::complete::be_u16;
use nom::IResult;

/// SignatureAlgorithms extension (RFC 5246 7.4.1.4.1, RFC 8446 4.2.3).
///
/// Schemes are kept in the sender's preference order, unknown values
/// included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureAlgorithmsExtension {
    pub supported_signature_algorithms: Vec<SignatureScheme>,
}

impl SignatureAlgorithmsExtension {
    pub fn new(supported_signature_algorithms: &[SignatureScheme]) -> Self {
        SignatureAlgorithmsExtension {
            supported_signature_algorithms: supported_signature_algorithms.to_vec(),
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], SignatureAlgorithmsExtension> {
        let (input, len) = be_u16(input)?;
        let (input, list) = take(len)(input)?;
        let (_, algs) = crate::util::all_consumed(SignatureScheme::parse)(list)?;
        Ok((input, SignatureAlgorithmsExtension::new(&algs)))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        let pos = output.start_u16_len();
        for alg in &self.supported_signature_algorithms {
            output.push_u16(alg.as_u16());
        }
        output.finish_u16_len(pos)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &[u8] = &[
        0x00, 0x06, // Length
        0x04, 0x03, // ECDSA_SECP256R1_SHA256
        0x08, 0x04, // RSA_PSS_RSAE_SHA256
        0x0F, 0x0F, // unknown
    ];

    #[test]
    fn keeps_peer_order() {
        let (rest, parsed) = SignatureAlgorithmsExtension::parse(MESSAGE).unwrap();
        assert!(rest.is_empty());
        assert_eq!(
            parsed.supported_signature_algorithms,
            vec![
                SignatureScheme::ECDSA_SECP256R1_SHA256,
                SignatureScheme::RSA_PSS_RSAE_SHA256,
                SignatureScheme::Unknown(0x0F0F)
            ]
        );

        let mut out = Buf::new();
        parsed.serialize(&mut out).unwrap();
        assert_eq!(&*out, MESSAGE);
    }

    #[test]
    fn odd_length_rejected() {
        assert!(SignatureAlgorithmsExtension::parse(&[0x00, 0x03, 0x04, 0x03, 0x08]).is_err());
    }
}
