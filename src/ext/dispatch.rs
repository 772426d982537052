use std::collections::BTreeSet;

use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u32};
use nom::IResult;

use super::{ExtensionContext, ExtensionDescriptor, MessageKind, ParsePriority, Validity};
use crate::buffer::Buf;
use crate::message::{Extension, ProtocolFamily, Role};
use crate::session::Session;
use crate::Error;

const PRE_SHARED_KEY: u16 = 0x0029;

/// The only extensions a HelloRetryRequest may carry.
const HRR_ALLOWED: [u16; 3] = [0x002B, 0x002C, 0x0033];

/// Routes extension blocks of one session to their handlers.
pub struct Dispatcher<'a> {
    session: &'a mut Session,
}

impl<'a> Dispatcher<'a> {
    pub fn new(session: &'a mut Session) -> Self {
        Dispatcher { session }
    }

    /// Session overlay first, then the shared registry. An id in the
    /// overlay hides the shared descriptor.
    fn descriptors(&self) -> Vec<ExtensionDescriptor> {
        let mut all: Vec<ExtensionDescriptor> = self.session.overlay.clone();
        for d in self.session.registry.iter() {
            if !all.iter().any(|o| o.id == d.id) {
                all.push(d.clone());
            }
        }
        all
    }

    /// Process the extensions block (without its outer length) of `message`.
    pub fn dispatch_receive(
        &mut self,
        message: MessageKind,
        family: ProtocolFamily,
        data: &[u8],
    ) -> Result<(), Error> {
        let entries = Extension::parse_block(data)?;

        let mut seen = BTreeSet::new();
        for entry in &entries {
            let id = entry.extension_type.as_u16();
            if !seen.insert(id) {
                debug!("Duplicate extension {:#06x} in {:?}", id, message);
                return Err(Error::IllegalParameter("duplicate extension"));
            }
            if message == MessageKind::HelloRetryRequest && !HRR_ALLOWED.contains(&id) {
                debug!("Extension {:#06x} not allowed in HelloRetryRequest", id);
                return Err(Error::IllegalParameter(
                    "extension not allowed in HelloRetryRequest",
                ));
            }
        }

        if message == MessageKind::ClientHello {
            let psk = entries
                .iter()
                .position(|e| e.extension_type.as_u16() == PRE_SHARED_KEY);
            if let Some(pos) = psk {
                if pos + 1 != entries.len() {
                    return Err(Error::IllegalParameter("pre_shared_key is not last"));
                }
            }
        }

        let descriptors = self.descriptors();

        // Known extensions, paired with their descriptor, in wire order.
        let mut known: Vec<(&ExtensionDescriptor, &[u8])> = Vec::with_capacity(entries.len());
        for entry in &entries {
            let id = entry.extension_type.as_u16();
            match descriptors.iter().find(|d| d.id == id) {
                Some(d) => known.push((d, entry.extension_data)),
                None => trace!("Ignoring unknown extension {:#06x}", id),
            }
        }

        // First priority in registration order, the rest in wire order.
        let mut ordered: Vec<(&ExtensionDescriptor, &[u8])> = Vec::with_capacity(known.len());
        for d in descriptors.iter().filter(|d| d.priority == ParsePriority::First) {
            if let Some(k) = known.iter().find(|(k, _)| k.id == d.id) {
                ordered.push(*k);
            }
        }
        for priority in [ParsePriority::Normal, ParsePriority::Application] {
            ordered.extend(known.iter().filter(|(d, _)| d.priority == priority));
        }

        for (descriptor, body) in ordered {
            self.receive_one(message, family, descriptor, body)?;
        }

        match message {
            MessageKind::ClientHello => self.session.client_hello_dispatched = true,
            MessageKind::CertificateRequest13 => self.session.cert_request_processed = true,
            _ => {}
        }

        Ok(())
    }

    fn receive_one(
        &mut self,
        message: MessageKind,
        family: ProtocolFamily,
        descriptor: &ExtensionDescriptor,
        body: &[u8],
    ) -> Result<(), Error> {
        let id = descriptor.id;

        if !descriptor.allows(message.validity(), Validity::for_family(family)) {
            debug!(
                "Extension {} ({:#06x}) not allowed in {:?} over {:?}",
                descriptor.name, id, message, family
            );
            return Err(Error::IllegalParameter("extension not allowed in this message"));
        }

        if self.session.params.role == Role::Client
            && message.is_response()
            && !self.session.sent.contains(&id)
            && !descriptor.validity.contains(Validity::IGNORE_CLIENT_REQUEST)
        {
            debug!("Unsolicited extension {} ({:#06x})", descriptor.name, id);
            return Err(Error::IllegalExtension(id, "unsolicited extension"));
        }

        trace!(
            "Receive extension {} ({:#06x}) of {} bytes in {:?}",
            descriptor.name,
            id,
            body.len(),
            message
        );
        self.session.received.insert(id);

        let handler = descriptor.handler.clone();
        let mut ctx = ExtensionContext::new(&mut *self.session, message, family, id);
        handler.receive(&mut ctx, body)
    }

    /// Write the extensions block of `message`, with its u16 length.
    ///
    /// Returns the block length. An empty block is left out entirely unless
    /// the message always carries one.
    pub fn dispatch_send(
        &mut self,
        message: MessageKind,
        family: ProtocolFamily,
        out: &mut Buf,
    ) -> Result<usize, Error> {
        let start = out.len();
        let pos = out.start_u16_len();

        let mut deferred = None;
        for descriptor in self.descriptors() {
            if !descriptor.allows(message.validity(), Validity::for_family(family)) {
                continue;
            }
            if self.session.params.role == Role::Server
                && !self.session.received.contains(&descriptor.id)
                && !descriptor.validity.contains(Validity::IGNORE_CLIENT_REQUEST)
            {
                continue;
            }
            // pre_shared_key must be the last extension of a ClientHello.
            if message == MessageKind::ClientHello && descriptor.id == PRE_SHARED_KEY {
                deferred = Some(descriptor);
                continue;
            }
            self.send_one(message, family, &descriptor, out)?;
        }
        if let Some(descriptor) = deferred {
            self.send_one(message, family, &descriptor, out)?;
        }

        let len = out.finish_u16_len(pos)?;
        if len == 0 && !message.always_has_block() {
            out.truncate(start);
        }
        Ok(len)
    }

    fn send_one(
        &mut self,
        message: MessageKind,
        family: ProtocolFamily,
        descriptor: &ExtensionDescriptor,
        out: &mut Buf,
    ) -> Result<(), Error> {
        let id = descriptor.id;
        let start = out.len();
        out.push_u16(id);
        let pos = out.start_u16_len();

        let handler = descriptor.handler.clone();
        let mut ctx = ExtensionContext::new(&mut *self.session, message, family, id);
        match handler.send(&mut ctx, out)? {
            None => {
                out.truncate(start);
            }
            Some(_) => {
                let len = out.finish_u16_len(pos)?;
                trace!(
                    "Send extension {} ({:#06x}) of {} bytes in {:?}",
                    descriptor.name,
                    id,
                    len,
                    message
                );
                self.session.sent.insert(id);
            }
        }
        Ok(())
    }

    /// Serialize the resumable extension state.
    ///
    /// Format: `u32 count ‖ { u16 id ‖ u32 len ‖ payload }*`.
    pub fn pack_session(&self) -> Result<Buf, Error> {
        let mut out = Buf::new();
        out.push_u32(0);
        let mut count: u32 = 0;

        for descriptor in self.descriptors() {
            let Some(state) = self.session.ext_state.get_raw(descriptor.id) else {
                continue;
            };
            let start = out.len();
            out.push_u16(descriptor.id);
            let len_pos = out.len();
            out.push_u32(0);

            if descriptor.handler.pack(state, &mut out)? {
                let len = u32::try_from(out.len() - len_pos - 4)
                    .map_err(|_| Error::InvalidState("packed state too large"))?;
                out[len_pos..len_pos + 4].copy_from_slice(&len.to_be_bytes());
                count += 1;
            } else {
                out.truncate(start);
            }
        }

        out[0..4].copy_from_slice(&count.to_be_bytes());
        debug!("Packed {} extension states", count);
        Ok(out)
    }

    /// Restore state written by [`Dispatcher::pack_session`] as resumed
    /// state.
    ///
    /// Extensions we do not know, or that cannot unpack, are treated as not
    /// negotiated.
    pub fn unpack_session(&mut self, data: &[u8]) -> Result<(), Error> {
        let (mut input, count) = parse_count(data)?;
        let descriptors = self.descriptors();

        for _ in 0..count {
            let (rest, (id, payload)) = parse_packed(input)?;
            input = rest;

            let Some(descriptor) = descriptors.iter().find(|d| d.id == id) else {
                trace!("Skipping packed state of unknown extension {:#06x}", id);
                continue;
            };
            let Some((state, consumed)) = descriptor.handler.unpack(payload)? else {
                continue;
            };
            if consumed != payload.len() {
                return Err(Error::DecodeError("packed extension length mismatch"));
            }
            self.session.ext_state.set_resumed_boxed(id, state);
        }

        if !input.is_empty() {
            return Err(Error::DecodeError("trailing data after packed extensions"));
        }
        Ok(())
    }
}

fn parse_count(input: &[u8]) -> IResult<&[u8], u32> {
    be_u32(input)
}

fn parse_packed(input: &[u8]) -> IResult<&[u8], (u16, &[u8])> {
    let (input, id) = be_u16(input)?;
    let (input, len) = be_u32(input)?;
    let (input, payload) = take(len)(input)?;
    Ok((input, (id, payload)))
}
