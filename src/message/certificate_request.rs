use super::{ClientCertificateType, DistinguishedName, SignatureScheme};
use crate::buffer::Buf;
use crate::util::{all_consumed, many0, many1};
use crate::Error;
use nom::error::{Error as NomError, ErrorKind};
use nom::number::complete::{be_u16, be_u8};
use nom::Err;
use nom::{bytes::complete::take, IResult};
use tinyvec::ArrayVec;

/// TLS 1.2 and earlier CertificateRequest body (RFC 5246 7.4.4).
#[derive(Debug, PartialEq, Eq)]
pub struct CertificateRequest<'a> {
    pub certificate_types: ArrayVec<[ClientCertificateType; 8]>,
    /// Absent before TLS 1.2.
    pub supported_signature_algorithms: Option<ArrayVec<[SignatureScheme; 64]>>,
    pub certificate_authorities: Vec<DistinguishedName<'a>>,
}

impl<'a> CertificateRequest<'a> {
    pub fn new(
        certificate_types: ArrayVec<[ClientCertificateType; 8]>,
        supported_signature_algorithms: Option<ArrayVec<[SignatureScheme; 64]>>,
        certificate_authorities: Vec<DistinguishedName<'a>>,
    ) -> Self {
        CertificateRequest {
            certificate_types,
            supported_signature_algorithms,
            certificate_authorities,
        }
    }

    pub fn parse(
        input: &'a [u8],
        with_signature_algorithms: bool,
    ) -> IResult<&'a [u8], CertificateRequest<'a>> {
        let (input, cert_types_len) = be_u8(input)?;
        let (input, input_type) = take(cert_types_len)(input)?;
        let (rest, certificate_types) = many1(ClientCertificateType::parse)(input_type)?;
        if !rest.is_empty() {
            return Err(Err::Failure(NomError::new(rest, ErrorKind::LengthValue)));
        }

        let (input, supported_signature_algorithms) = if with_signature_algorithms {
            let (input, sig_algs_len) = be_u16(input)?;
            let (input, input_sigs) = take(sig_algs_len)(input)?;
            let (rest, algs) = many0(SignatureScheme::parse)(input_sigs)?;
            if !rest.is_empty() {
                return Err(Err::Failure(NomError::new(rest, ErrorKind::LengthValue)));
            }
            (input, Some(algs))
        } else {
            (input, None)
        };

        let (input, cert_auths_len) = be_u16(input)?;
        let (input, input_auths) = take(cert_auths_len)(input)?;
        let (_, certificate_authorities) = all_consumed(DistinguishedName::parse)(input_auths)?;

        Ok((
            input,
            CertificateRequest {
                certificate_types,
                supported_signature_algorithms,
                certificate_authorities,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push(self.certificate_types.len() as u8);
        for cert_type in &self.certificate_types {
            output.push(cert_type.as_u8());
        }

        if let Some(algs) = &self.supported_signature_algorithms {
            let pos = output.start_u16_len();
            for sig_alg in algs {
                output.push_u16(sig_alg.as_u16());
            }
            output.finish_u16_len(pos)?;
        }

        let pos = output.start_u16_len();
        for name in &self.certificate_authorities {
            output.push_u16_prefixed(name)?;
        }
        output.finish_u16_len(pos)?;
        Ok(())
    }
}
