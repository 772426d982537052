use crate::message::extensions::{HeartbeatMode, SrtpProfileId};
use crate::message::{NamedGroup, ProtocolVersion, SignatureScheme};
use crate::Error;

/// Negotiation policy shared by many sessions.
#[derive(Debug, Clone)]
pub struct Config {
    versions: Vec<ProtocolVersion>,
    min_dh_bits: usize,
    max_dh_bits: usize,
    tolerate_weak_dh: bool,
    dh_group: NamedGroup,
    dh_q_bits: Option<usize>,
    signature_schemes: Vec<SignatureScheme>,
    groups: Vec<NamedGroup>,
    force_client_cert: bool,
    allow_key_usage_violation: bool,
    allow_wrong_pms_version: bool,
    srtp_profiles: Vec<SrtpProfileId>,
    heartbeat: Option<HeartbeatMode>,
    request_ocsp: bool,
    with_extended_master_secret: bool,
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            versions: vec![
                ProtocolVersion::TLS1_3,
                ProtocolVersion::TLS1_2,
                ProtocolVersion::DTLS1_3,
                ProtocolVersion::DTLS1_2,
            ],
            min_dh_bits: 1024,
            max_dh_bits: 16384,
            tolerate_weak_dh: false,
            dh_group: NamedGroup::Ffdhe2048,
            dh_q_bits: None,
            signature_schemes: vec![
                SignatureScheme::ECDSA_SECP256R1_SHA256,
                SignatureScheme::ECDSA_SECP384R1_SHA384,
                SignatureScheme::RSA_PSS_RSAE_SHA256,
                SignatureScheme::RSA_PSS_RSAE_SHA384,
                SignatureScheme::RSA_PSS_RSAE_SHA512,
                SignatureScheme::RSA_PKCS1_SHA256,
                SignatureScheme::RSA_PKCS1_SHA384,
                SignatureScheme::RSA_PKCS1_SHA512,
                SignatureScheme::RSA_PKCS1_SHA1,
                SignatureScheme::ECDSA_SHA1,
            ],
            groups: vec![
                NamedGroup::X25519,
                NamedGroup::Secp256r1,
                NamedGroup::Secp384r1,
                NamedGroup::Ffdhe2048,
                NamedGroup::Ffdhe3072,
            ],
            force_client_cert: false,
            allow_key_usage_violation: false,
            allow_wrong_pms_version: false,
            srtp_profiles: Vec::new(),
            heartbeat: None,
            request_ocsp: false,
            with_extended_master_secret: true,
        }
    }

    /// Enabled protocol versions, most preferred first.
    #[inline(always)]
    pub fn versions(&self) -> &[ProtocolVersion] {
        &self.versions
    }

    /// Smallest acceptable DH prime, in bits, for unnamed groups.
    #[inline(always)]
    pub fn min_dh_bits(&self) -> usize {
        self.min_dh_bits
    }

    /// Largest acceptable DH prime, in bits.
    #[inline(always)]
    pub fn max_dh_bits(&self) -> usize {
        self.max_dh_bits
    }

    /// Continue with a DH prime outside the bounds, logging a warning.
    #[inline(always)]
    pub fn tolerate_weak_dh(&self) -> bool {
        self.tolerate_weak_dh
    }

    /// FFDHE group a server uses when the client names none.
    #[inline(always)]
    pub fn dh_group(&self) -> NamedGroup {
        self.dh_group
    }

    /// Size of the DH private exponent in bits.
    ///
    /// `None` uses one bit less than the prime.
    #[inline(always)]
    pub fn dh_q_bits(&self) -> Option<usize> {
        self.dh_q_bits
    }

    /// Signature schemes we accept and produce, most preferred first.
    #[inline(always)]
    pub fn signature_schemes(&self) -> &[SignatureScheme] {
        &self.signature_schemes
    }

    /// Key exchange groups, most preferred first.
    #[inline(always)]
    pub fn groups(&self) -> &[NamedGroup] {
        &self.groups
    }

    /// A client with a single certificate sends it even when the server's
    /// CA list does not name its issuer.
    #[inline(always)]
    pub fn force_client_cert(&self) -> bool {
        self.force_client_cert
    }

    /// Use certificates whose key usage forbids the operation.
    #[inline(always)]
    pub fn allow_key_usage_violation(&self) -> bool {
        self.allow_key_usage_violation
    }

    /// Accept an RSA premaster carrying the negotiated instead of the
    /// advertised client version.
    #[inline(always)]
    pub fn allow_wrong_pms_version(&self) -> bool {
        self.allow_wrong_pms_version
    }

    /// DTLS-SRTP profiles (rfc5764), most preferred first. Empty disables
    /// the extension.
    #[inline(always)]
    pub fn srtp_profiles(&self) -> &[SrtpProfileId] {
        &self.srtp_profiles
    }

    /// Heartbeat mode we advertise (rfc6520).
    #[inline(always)]
    pub fn heartbeat(&self) -> Option<HeartbeatMode> {
        self.heartbeat
    }

    /// Whether a client asks for stapled OCSP responses.
    #[inline(always)]
    pub fn request_ocsp(&self) -> bool {
        self.request_ocsp
    }

    /// Whether to enable Extended Master Secret extension (rfc7627).
    #[inline(always)]
    pub fn with_extended_master_secret(&self) -> bool {
        self.with_extended_master_secret
    }
}

/// Builder for [`Config`].
pub struct ConfigBuilder {
    versions: Vec<ProtocolVersion>,
    min_dh_bits: usize,
    max_dh_bits: usize,
    tolerate_weak_dh: bool,
    dh_group: NamedGroup,
    dh_q_bits: Option<usize>,
    signature_schemes: Vec<SignatureScheme>,
    groups: Vec<NamedGroup>,
    force_client_cert: bool,
    allow_key_usage_violation: bool,
    allow_wrong_pms_version: bool,
    srtp_profiles: Vec<SrtpProfileId>,
    heartbeat: Option<HeartbeatMode>,
    request_ocsp: bool,
    with_extended_master_secret: bool,
}

impl ConfigBuilder {
    /// Set the enabled protocol versions, most preferred first.
    ///
    /// Defaults to TLS 1.3, TLS 1.2, DTLS 1.3 and DTLS 1.2.
    pub fn versions(mut self, versions: &[ProtocolVersion]) -> Self {
        self.versions = versions.to_vec();
        self
    }

    /// Set the smallest acceptable DH prime size in bits.
    ///
    /// Defaults to 1024.
    pub fn min_dh_bits(mut self, bits: usize) -> Self {
        self.min_dh_bits = bits;
        self
    }

    /// Set the largest acceptable DH prime size in bits.
    ///
    /// Defaults to 16384.
    pub fn max_dh_bits(mut self, bits: usize) -> Self {
        self.max_dh_bits = bits;
        self
    }

    /// Continue with out of bounds DH primes instead of failing.
    ///
    /// Defaults to false.
    pub fn tolerate_weak_dh(mut self, tolerate: bool) -> Self {
        self.tolerate_weak_dh = tolerate;
        self
    }

    /// Set the FFDHE group a server falls back to.
    ///
    /// Defaults to ffdhe2048.
    pub fn dh_group(mut self, group: NamedGroup) -> Self {
        self.dh_group = group;
        self
    }

    /// Set the DH private exponent size in bits.
    ///
    /// Defaults to one bit less than the prime.
    pub fn dh_q_bits(mut self, bits: usize) -> Self {
        self.dh_q_bits = Some(bits);
        self
    }

    /// Set the enabled signature schemes, most preferred first.
    pub fn signature_schemes(mut self, schemes: &[SignatureScheme]) -> Self {
        self.signature_schemes = schemes.to_vec();
        self
    }

    /// Set the enabled key exchange groups, most preferred first.
    ///
    /// Defaults to X25519, secp256r1, secp384r1, ffdhe2048, ffdhe3072.
    pub fn groups(mut self, groups: &[NamedGroup]) -> Self {
        self.groups = groups.to_vec();
        self
    }

    /// Defaults to false.
    pub fn force_client_cert(mut self, force: bool) -> Self {
        self.force_client_cert = force;
        self
    }

    /// Defaults to false.
    pub fn allow_key_usage_violation(mut self, allow: bool) -> Self {
        self.allow_key_usage_violation = allow;
        self
    }

    /// Defaults to false.
    pub fn allow_wrong_pms_version(mut self, allow: bool) -> Self {
        self.allow_wrong_pms_version = allow;
        self
    }

    /// Set the DTLS-SRTP profiles, most preferred first.
    ///
    /// Defaults to none.
    pub fn srtp_profiles(mut self, profiles: &[SrtpProfileId]) -> Self {
        self.srtp_profiles = profiles.to_vec();
        self
    }

    /// Advertise the heartbeat extension with `mode`.
    pub fn heartbeat(mut self, mode: HeartbeatMode) -> Self {
        self.heartbeat = Some(mode);
        self
    }

    /// Defaults to false.
    pub fn request_ocsp(mut self, request: bool) -> Self {
        self.request_ocsp = request;
        self
    }

    /// Set whether to enable Extended Master Secret extension (rfc7627)
    ///
    /// Defaults to true.
    pub fn with_extended_master_secret(mut self, enable: bool) -> Self {
        self.with_extended_master_secret = enable;
        self
    }

    /// Build the configuration.
    ///
    /// Returns `Error::Config` for inconsistent DH bounds, an empty scheme
    /// or group list, or a fallback DH group without built-in parameters.
    pub fn build(self) -> Result<Config, Error> {
        if self.min_dh_bits > self.max_dh_bits {
            return Err(Error::Config("min_dh_bits exceeds max_dh_bits"));
        }
        if self.signature_schemes.is_empty() {
            return Err(Error::Config("no signature schemes"));
        }
        if self.groups.is_empty() {
            return Err(Error::Config("no groups"));
        }
        if !self.dh_group.is_ffdhe() {
            return Err(Error::Config("dh_group must be an FFDHE group"));
        }
        if crate::kx::ffdhe::lookup(self.dh_group).is_none() {
            return Err(Error::Config("dh_group has no built-in parameters"));
        }
        if self.versions.is_empty() {
            return Err(Error::Config("no protocol versions"));
        }

        Ok(Config {
            versions: self.versions,
            min_dh_bits: self.min_dh_bits,
            max_dh_bits: self.max_dh_bits,
            tolerate_weak_dh: self.tolerate_weak_dh,
            dh_group: self.dh_group,
            dh_q_bits: self.dh_q_bits,
            signature_schemes: self.signature_schemes,
            groups: self.groups,
            force_client_cert: self.force_client_cert,
            allow_key_usage_violation: self.allow_key_usage_violation,
            allow_wrong_pms_version: self.allow_wrong_pms_version,
            srtp_profiles: self.srtp_profiles,
            heartbeat: self.heartbeat,
            request_ocsp: self.request_ocsp,
            with_extended_master_secret: self.with_extended_master_secret,
        })
    }
}
