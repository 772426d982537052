use super::signature::compute_signature_algorithm;
use super::{Certificate, CredentialSet, KeyUsage, PeerCapabilities};
use crate::message::{KeyExchangeAlgorithm, PkAlgorithm, ProtocolVersion, SignatureScheme};
use crate::{Config, Error};

/// Match a host name against a certificate name.
///
/// Comparison ignores ASCII case. A `*.` prefix stands for exactly one
/// leftmost label.
pub fn name_matches(pattern: &str, host: &str) -> bool {
    let host = host.trim_end_matches('.');
    if pattern.eq_ignore_ascii_case(host) {
        return true;
    }
    let Some(suffix) = pattern.strip_prefix("*.") else {
        return false;
    };
    match host.split_once('.') {
        Some((label, rest)) => !label.is_empty() && rest.eq_ignore_ascii_case(suffix),
        None => false,
    }
}

fn key_usage_ok(certificate: &Certificate, usage: KeyUsage, config: &Config) -> bool {
    if certificate.allows(usage) {
        return true;
    }
    if config.allow_key_usage_violation() {
        warn!("Using certificate despite key usage {:?} violation", usage);
        return true;
    }
    warn!("Skipping certificate, key usage does not permit {:?}", usage);
    false
}

/// Whether `certificate` can authenticate the key exchange `kx`.
fn kx_compatible(kx: KeyExchangeAlgorithm, certificate: &Certificate, config: &Config) -> bool {
    use KeyExchangeAlgorithm as K;
    let pk = certificate.pk_algorithm();

    let (algorithm_ok, usage) = match kx {
        K::Rsa | K::RsaPsk => (pk == PkAlgorithm::Rsa, KeyUsage::KEY_ENCIPHERMENT),
        K::DheRsa | K::EcdheRsa => (
            matches!(pk, PkAlgorithm::Rsa | PkAlgorithm::RsaPss),
            KeyUsage::DIGITAL_SIGNATURE,
        ),
        K::EcdheEcdsa => (pk == PkAlgorithm::Ecdsa, KeyUsage::DIGITAL_SIGNATURE),
        K::DheDss => (pk == PkAlgorithm::Dsa, KeyUsage::DIGITAL_SIGNATURE),
        K::Tls13 => (true, KeyUsage::DIGITAL_SIGNATURE),
        _ => return false,
    };
    algorithm_ok && key_usage_ok(certificate, usage, config)
}

/// Pick the server credential for `kx`.
///
/// Credentials naming the requested host are tried first, then all of
/// them. Within a pass the set's priority order applies. Returns the
/// configuration index and the signature scheme, if the exchange signs.
pub(crate) fn find_server(
    set: &CredentialSet,
    server_name: Option<&str>,
    kx: KeyExchangeAlgorithm,
    version: ProtocolVersion,
    config: &Config,
    peer: &PeerCapabilities,
) -> Result<(usize, Option<SignatureScheme>), Error> {
    let try_entry = |index: usize| -> Option<Option<SignatureScheme>> {
        let credential = set.get(index)?;
        let leaf = credential.leaf();
        if !kx_compatible(kx, leaf, config) {
            trace!("Credential {} does not fit {:?}", index, kx);
            return None;
        }
        if !kx.signs_params() {
            return Some(None);
        }
        match compute_signature_algorithm(
            leaf,
            credential.key().as_ref(),
            version,
            config,
            &peer.signature_schemes,
        ) {
            Ok(scheme) => Some(Some(scheme)),
            Err(e) => {
                trace!("Credential {} has no usable signature scheme: {}", index, e);
                None
            }
        }
    };

    if let Some(host) = server_name {
        for &index in set.priority_order() {
            let Some(credential) = set.get(index) else {
                continue;
            };
            if !credential.names().iter().any(|n| name_matches(n, host)) {
                continue;
            }
            if let Some(scheme) = try_entry(index) {
                debug!("Selected credential {} for server name {}", index, host);
                return Ok((index, scheme));
            }
        }
        trace!("No credential for server name {}, trying all", host);
    }

    for &index in set.priority_order() {
        if let Some(scheme) = try_entry(index) {
            debug!("Selected credential {} for {:?}", index, kx);
            return Ok((index, scheme));
        }
    }

    Err(Error::InsufficientCredentials)
}

/// Pick the client credential for a certificate request.
///
/// A lone credential is used as is when the server named no CAs, or when
/// the config forces it. Otherwise the first CA, in the server's order,
/// that issued a certificate in one of our chains decides, provided the
/// leaf key is of a type the server accepts.
pub(crate) fn find_client(
    set: &CredentialSet,
    version: ProtocolVersion,
    config: &Config,
    peer: &PeerCapabilities,
) -> Option<(usize, Option<SignatureScheme>)> {
    let accepted = peer.pk_algorithms();

    let scheme_for = |index: usize| -> Option<Option<SignatureScheme>> {
        let credential = set.get(index)?;
        let leaf = credential.leaf();
        if !key_usage_ok(leaf, KeyUsage::DIGITAL_SIGNATURE, config) {
            return None;
        }
        if !version.has_selectable_sighash() && !version.is_tls13() {
            return Some(None);
        }
        compute_signature_algorithm(
            leaf,
            credential.key().as_ref(),
            version,
            config,
            &peer.signature_schemes,
        )
        .ok()
        .map(Some)
    };

    if set.len() == 1 && (peer.ca_names.is_empty() || config.force_client_cert()) {
        let index = set.priority_order()[0];
        return scheme_for(index).map(|scheme| {
            debug!("Using the only client credential");
            (index, scheme)
        });
    }

    for ca in &peer.ca_names {
        for &index in set.priority_order() {
            let Some(credential) = set.get(index) else {
                continue;
            };
            if !accepted.contains(&credential.leaf().pk_algorithm()) {
                continue;
            }
            let issued = credential.chain().iter().any(|c| c.issuer() == ca.as_slice());
            if !issued {
                continue;
            }
            if let Some(scheme) = scheme_for(index) {
                debug!("Client credential {} matches a requested CA", index);
                return Some((index, scheme));
            }
        }
    }

    debug!("No client credential matches the certificate request");
    None
}
