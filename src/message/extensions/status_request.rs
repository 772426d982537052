//! Certificate status request extension (RFC 6066 Section 8).

use crate::buffer::Buf;
use crate::Error;
use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateStatusType {
    Ocsp,
    Unknown(u8),
}

impl CertificateStatusType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => CertificateStatusType::Ocsp,
            _ => CertificateStatusType::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            CertificateStatusType::Ocsp => 1,
            CertificateStatusType::Unknown(value) => *value,
        }
    }
}

/// `CertificateStatusRequest` from a ClientHello.
///
/// Responder ids and request extensions are kept as opaque blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRequestExtension {
    pub status_type: CertificateStatusType,
    pub responder_id_list: Vec<u8>,
    pub request_extensions: Vec<u8>,
}

impl StatusRequestExtension {
    pub fn ocsp() -> Self {
        StatusRequestExtension {
            status_type: CertificateStatusType::Ocsp,
            responder_id_list: Vec::new(),
            request_extensions: Vec::new(),
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, status_type) = be_u8(input)?;
        let status_type = CertificateStatusType::from_u8(status_type);
        if status_type != CertificateStatusType::Ocsp {
            // Unknown request types carry a body we cannot interpret.
            return Ok((
                &input[input.len()..],
                StatusRequestExtension {
                    status_type,
                    responder_id_list: Vec::new(),
                    request_extensions: Vec::new(),
                },
            ));
        }
        let (input, ids_len) = be_u16(input)?;
        let (input, ids) = take(ids_len)(input)?;
        let (input, exts_len) = be_u16(input)?;
        let (input, exts) = take(exts_len)(input)?;
        Ok((
            input,
            StatusRequestExtension {
                status_type,
                responder_id_list: ids.to_vec(),
                request_extensions: exts.to_vec(),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push(self.status_type.as_u8());
        output.push_u16_prefixed(&self.responder_id_list)?;
        output.push_u16_prefixed(&self.request_extensions)
    }
}
