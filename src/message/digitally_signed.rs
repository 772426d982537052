use super::SignatureScheme;
use crate::buffer::Buf;
use crate::Error;
use nom::number::complete::be_u16;
use nom::{bytes::complete::take, IResult};

/// A `digitally-signed` struct (RFC 5246 4.7).
///
/// The signature scheme is only present from TLS 1.2 on, older versions
/// imply it from the certificate key.
#[derive(Debug, PartialEq, Eq)]
pub struct DigitallySigned<'a> {
    pub algorithm: Option<SignatureScheme>,
    pub signature: &'a [u8],
}

impl<'a> DigitallySigned<'a> {
    pub fn new(algorithm: Option<SignatureScheme>, signature: &'a [u8]) -> Self {
        DigitallySigned {
            algorithm,
            signature,
        }
    }

    pub fn parse(input: &'a [u8], with_algorithm: bool) -> IResult<&'a [u8], DigitallySigned<'a>> {
        let (input, algorithm) = if with_algorithm {
            let (input, scheme) = SignatureScheme::parse(input)?;
            (input, Some(scheme))
        } else {
            (input, None)
        };
        let (input, signature_len) = be_u16(input)?;
        let (input, signature) = take(signature_len)(input)?;
        Ok((
            input,
            DigitallySigned {
                algorithm,
                signature,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        if let Some(algorithm) = self.algorithm {
            output.push_u16(algorithm.as_u16());
        }
        output.push_u16_prefixed(self.signature)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const MESSAGE: &[u8] = &[
        0x04, 0x01, // SignatureScheme (RSA_PKCS1_SHA256)
        0x00, 0x04, // Signature length
        0x01, 0x02, 0x03, 0x04, // Signature data
    ];

    #[test]
    fn with_scheme() {
        let (rest, parsed) = DigitallySigned::parse(MESSAGE, true).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed.algorithm, Some(SignatureScheme::RSA_PKCS1_SHA256));
        assert_eq!(parsed.signature, &MESSAGE[4..]);

        let mut serialized = Buf::new();
        parsed.serialize(&mut serialized).unwrap();
        assert_eq!(&*serialized, MESSAGE);
    }

    #[test]
    fn without_scheme() {
        let (rest, parsed) = DigitallySigned::parse(&MESSAGE[2..], false).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed.algorithm, None);
        assert_eq!(parsed.signature.len(), 4);
    }
}
