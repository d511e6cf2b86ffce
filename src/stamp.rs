//! DNS stamps.
//!
//! A stamp describes how to reach a resolver: which protocol to use, where
//! to find the server, how to authenticate it, and what it promises about
//! its behaviour. Stamps are exchanged as URIs of the form
//! `sdns://<payload>` where the payload is the binary encoding of the stamp
//! in unpadded *base64url*.
//!
//! The payload starts with a [protocol identifier][Protocol] which selects
//! the layout of the remainder. With the exception of anonymized relays,
//! this is followed by the [properties][Properties] octet and seven reserved
//! octets. The rest of the payload is a sequence of length-prefixed fields
//! whose order is fixed for each protocol:
//!
//! | Protocol         | Fields after the properties block        |
//! |------------------|------------------------------------------|
//! | DNSCrypt         | addr, pk, providerName                   |
//! | DoH, ODoH relay  | addr, hash, hostName, path               |
//! | DoT              | addr, hash, hostName                     |
//! | Plain            | addr                                     |
//! | ODoH             | hostName, path                           |
//! | Anonymized relay | addr (and no properties block)           |
//!
//! The type [`Stamp`] represents any stamp. It wraps one of the types
//! for the individual protocols, each of which can be created via a
//! constructor and a set of `with_` methods that replace one field each:
//!
//! ```
//! use sdns_stamp::stamp::{Doh, Stamp};
//!
//! let stamp = Stamp::from(
//!     Doh::new("").with_host_name("dns.example").with_path("/dns-query")
//! );
//! let uri = stamp.encode().unwrap();
//! assert_eq!(uri.parse::<Stamp>().unwrap(), stamp);
//! ```
//!
//! Binary fields – the DNSCrypt provider key and the certificate hashes of
//! the TLS-based protocols – are kept as raw octets and are accepted and
//! returned as hex strings.

use crate::props::Properties;
use crate::proto::Protocol;
use crate::utils::base64;
use crate::wire::{self, DecodeError, EncodeError};
use core::str::FromStr;
use octseq::builder::{OctetsBuilder, ShortBuf, Truncate};
use octseq::parse::Parser;
use tracing::{debug, trace};

//------------ Constants -----------------------------------------------------

/// The scheme prefix of a stamp URI.
pub const SCHEME: &str = "sdns://";

//------------ Stamp ---------------------------------------------------------

/// A DNS stamp.
///
/// The variant is determined by the protocol identifier of the stamp. DoH
/// stamps and ODoH relay stamps share their content type [`Doh`] and are
/// distinguished only by their variant.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "protocol"))]
pub enum Stamp {
    /// A DNSCrypt resolver.
    #[cfg_attr(feature = "serde", serde(rename = "DNSCrypt"))]
    DnsCrypt(DnsCrypt),

    /// A DNS-over-HTTPS resolver.
    #[cfg_attr(feature = "serde", serde(rename = "DoH"))]
    Doh(Doh),

    /// A DNS-over-TLS resolver.
    #[cfg_attr(feature = "serde", serde(rename = "DoT"))]
    Dot(Dot),

    /// A plain DNS resolver.
    #[cfg_attr(feature = "serde", serde(rename = "Plain"))]
    Plain(Plain),

    /// An Oblivious DoH target.
    #[cfg_attr(feature = "serde", serde(rename = "ODoH"))]
    Odoh(Odoh),

    /// An anonymized DNSCrypt relay.
    #[cfg_attr(feature = "serde", serde(rename = "AnonymizedRelay"))]
    AnonymizedRelay(AnonymizedRelay),

    /// An Oblivious DoH relay.
    #[cfg_attr(feature = "serde", serde(rename = "ODoHRelay"))]
    OdohRelay(Doh),
}

/// # Creation
///
impl Stamp {
    /// Creates an ODoH relay stamp.
    ///
    /// Relays have the same content as DoH stamps, so converting a [`Doh`]
    /// via `From` creates a DoH stamp instead.
    pub fn odoh_relay(stamp: Doh) -> Self {
        Stamp::OdohRelay(stamp)
    }
}

/// # Field Access
///
impl Stamp {
    /// Returns the protocol identifier of the stamp.
    pub fn proto(&self) -> Protocol {
        match *self {
            Stamp::DnsCrypt(_) => Protocol::DNSCRYPT,
            Stamp::Doh(_) => Protocol::DOH,
            Stamp::Dot(_) => Protocol::DOT,
            Stamp::Plain(_) => Protocol::PLAIN,
            Stamp::Odoh(_) => Protocol::ODOH,
            Stamp::AnonymizedRelay(_) => Protocol::ANONYMIZED_RELAY,
            Stamp::OdohRelay(_) => Protocol::ODOH_RELAY,
        }
    }

    /// Returns the properties of the stamp.
    ///
    /// Returns `None` for an anonymized relay which has no properties.
    pub fn props(&self) -> Option<Properties> {
        match *self {
            Stamp::DnsCrypt(ref stamp) => Some(stamp.props()),
            Stamp::Doh(ref stamp) | Stamp::OdohRelay(ref stamp) => {
                Some(stamp.props())
            }
            Stamp::Dot(ref stamp) => Some(stamp.props()),
            Stamp::Plain(ref stamp) => Some(stamp.props()),
            Stamp::Odoh(ref stamp) => Some(stamp.props()),
            Stamp::AnonymizedRelay(_) => None,
        }
    }

    /// Returns the server address of the stamp.
    ///
    /// Returns `None` for an ODoH target which has no address.
    pub fn addr(&self) -> Option<&str> {
        match *self {
            Stamp::DnsCrypt(ref stamp) => Some(stamp.addr()),
            Stamp::Doh(ref stamp) | Stamp::OdohRelay(ref stamp) => {
                Some(stamp.addr())
            }
            Stamp::Dot(ref stamp) => Some(stamp.addr()),
            Stamp::Plain(ref stamp) => Some(stamp.addr()),
            Stamp::Odoh(_) => None,
            Stamp::AnonymizedRelay(ref stamp) => Some(stamp.addr()),
        }
    }
}

/// # Encoding
///
impl Stamp {
    /// Appends the binary payload of the stamp to a target.
    ///
    /// If encoding fails, the target is truncated to its original length.
    pub fn compose<Target>(&self, target: &mut Target) -> Result<(), EncodeError>
    where
        Target: OctetsBuilder + AsRef<[u8]> + Truncate + ?Sized,
    {
        let start = target.as_ref().len();
        let res = self.compose_unchecked(target);
        if res.is_err() {
            target.truncate(start);
        }
        res
    }

    fn compose_unchecked<Target: OctetsBuilder + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), EncodeError> {
        self.proto()
            .compose(target)
            .map_err(|err| EncodeError::from(Into::<ShortBuf>::into(err)))?;
        if let Some(props) = self.props() {
            wire::compose_props_block(target, props)?;
        }
        match *self {
            Stamp::DnsCrypt(ref stamp) => stamp.compose_fields(target),
            Stamp::Doh(ref stamp) | Stamp::OdohRelay(ref stamp) => {
                stamp.compose_fields(target)
            }
            Stamp::Dot(ref stamp) => stamp.compose_fields(target),
            Stamp::Plain(ref stamp) => stamp.compose_fields(target),
            Stamp::Odoh(ref stamp) => stamp.compose_fields(target),
            Stamp::AnonymizedRelay(ref stamp) => stamp.compose_fields(target),
        }
    }

    /// Returns the binary payload of the stamp.
    pub fn to_payload(&self) -> Result<Vec<u8>, EncodeError> {
        let mut res = Vec::new();
        self.compose(&mut res)?;
        Ok(res)
    }

    /// Returns the `sdns://` URI for the stamp.
    pub fn encode(&self) -> Result<String, EncodeError> {
        let payload = self.to_payload().map_err(|err| {
            debug!("cannot encode {} stamp: {}", self.proto(), err);
            err
        })?;
        trace!(
            "encoded {} stamp with {} octets of payload",
            self.proto(),
            payload.len()
        );
        let mut res = String::with_capacity(
            SCHEME.len() + (payload.len() / 3 + 1) * 4,
        );
        res.push_str(SCHEME);
        res.push_str(&base64::encode_string(&payload));
        Ok(res)
    }
}

/// # Decoding
///
impl Stamp {
    /// Takes a stamp payload from the beginning of a parser.
    ///
    /// Any data following the last field of the stamp is left in the
    /// parser.
    pub fn parse<'a, Octs: AsRef<[u8]> + ?Sized>(
        parser: &mut Parser<'a, Octs>,
    ) -> Result<Self, DecodeError> {
        let proto = Protocol::parse(parser)?;
        if !proto.is_known() {
            return Err(DecodeError::UnsupportedProtocol(proto.to_int()));
        }
        trace!("decoding {} stamp", proto);
        let props = if proto.has_props() {
            wire::parse_props_block(parser)?
        } else {
            Properties::default()
        };
        match proto {
            Protocol::DNSCRYPT => {
                DnsCrypt::parse_fields(props, parser).map(Into::into)
            }
            Protocol::DOH => Doh::parse_fields(props, parser).map(Stamp::Doh),
            Protocol::DOT => Dot::parse_fields(props, parser).map(Into::into),
            Protocol::PLAIN => {
                Plain::parse_fields(props, parser).map(Into::into)
            }
            Protocol::ODOH => Odoh::parse_fields(props, parser).map(Into::into),
            Protocol::ODOH_RELAY => {
                Doh::parse_fields(props, parser).map(Stamp::OdohRelay)
            }
            Protocol::ANONYMIZED_RELAY => {
                AnonymizedRelay::parse_fields(parser).map(Into::into)
            }
            _ => Err(DecodeError::UnsupportedProtocol(proto.to_int())),
        }
    }

    /// Creates a stamp from its binary payload.
    ///
    /// Trailing data after the last field is ignored.
    pub fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut parser = Parser::from_ref(payload);
        let res = Self::parse(&mut parser).map_err(rejected)?;
        if parser.remaining() > 0 {
            trace!(
                "ignoring {} octets trailing the {} stamp",
                parser.remaining(),
                res.proto()
            );
        }
        Ok(res)
    }

    /// Decodes a stamp from its `sdns://` URI.
    ///
    /// The scheme is case sensitive.
    pub fn decode(s: &str) -> Result<Self, DecodeError> {
        let encoded = s
            .strip_prefix(SCHEME)
            .ok_or_else(|| rejected(DecodeError::InvalidScheme))?;
        let payload = base64::decode_vec(encoded)
            .map_err(|err| rejected(err.into()))?;
        Self::from_payload(&payload)
    }
}

/// Logs a rejected stamp.
fn rejected(err: DecodeError) -> DecodeError {
    debug!("rejecting stamp: {}", err);
    err
}

//--- From

impl From<DnsCrypt> for Stamp {
    fn from(stamp: DnsCrypt) -> Self {
        Stamp::DnsCrypt(stamp)
    }
}

/// Always creates a DoH stamp.
///
/// Use [`Stamp::odoh_relay`] for an ODoH relay.
impl From<Doh> for Stamp {
    fn from(stamp: Doh) -> Self {
        Stamp::Doh(stamp)
    }
}

impl From<Dot> for Stamp {
    fn from(stamp: Dot) -> Self {
        Stamp::Dot(stamp)
    }
}

impl From<Plain> for Stamp {
    fn from(stamp: Plain) -> Self {
        Stamp::Plain(stamp)
    }
}

impl From<Odoh> for Stamp {
    fn from(stamp: Odoh) -> Self {
        Stamp::Odoh(stamp)
    }
}

impl From<AnonymizedRelay> for Stamp {
    fn from(stamp: AnonymizedRelay) -> Self {
        Stamp::AnonymizedRelay(stamp)
    }
}

//--- FromStr and TryFrom

impl FromStr for Stamp {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl<'a> TryFrom<&'a Stamp> for String {
    type Error = EncodeError;

    fn try_from(stamp: &'a Stamp) -> Result<Self, Self::Error> {
        stamp.encode()
    }
}

//------------ DnsCrypt ------------------------------------------------------

/// The content of a DNSCrypt stamp.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct DnsCrypt {
    /// The properties of the resolver.
    props: Properties,

    /// The address of the server.
    addr: String,

    /// The provider’s Ed25519 public key.
    #[cfg_attr(feature = "serde", serde(with = "crate::utils::base16::serde"))]
    pk: Vec<u8>,

    /// The provider name.
    provider_name: String,
}

impl DnsCrypt {
    /// Creates a new DNSCrypt stamp for the given address.
    ///
    /// The address is an IP address with an optional port, which is
    /// required if the server doesn’t listen on port 443. IPv6 addresses
    /// need to be given in square brackets. All other fields are empty and
    /// all properties are set.
    pub fn new(addr: impl Into<String>) -> Self {
        DnsCrypt {
            props: Properties::default(),
            addr: addr.into(),
            pk: Vec::new(),
            provider_name: String::new(),
        }
    }

    /// Replaces the properties.
    #[must_use]
    pub fn with_props(self, props: Properties) -> Self {
        DnsCrypt { props, ..self }
    }

    /// Replaces the public key with one given as a hex string.
    pub fn with_pk(self, pk: &str) -> Result<Self, EncodeError> {
        Ok(self.with_pk_bytes(wire::encode_hex(pk)?))
    }

    /// Replaces the public key with the given octets.
    #[must_use]
    pub fn with_pk_bytes(self, pk: impl Into<Vec<u8>>) -> Self {
        DnsCrypt {
            pk: pk.into(),
            ..self
        }
    }

    /// Replaces the provider name.
    #[must_use]
    pub fn with_provider_name(self, name: impl Into<String>) -> Self {
        DnsCrypt {
            provider_name: name.into(),
            ..self
        }
    }

    pub fn props(&self) -> Properties {
        self.props
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn pk(&self) -> &[u8] {
        &self.pk
    }

    /// Returns the public key as a lowercase hex string.
    pub fn pk_hex(&self) -> String {
        wire::decode_hex(&self.pk)
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    fn compose_fields<Target: OctetsBuilder + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), EncodeError> {
        wire::compose_text(target, "addr", &self.addr)?;
        wire::compose_field(target, "pk", &self.pk)?;
        wire::compose_text(target, "providerName", &self.provider_name)
    }

    fn parse_fields<Octs: AsRef<[u8]> + ?Sized>(
        props: Properties,
        parser: &mut Parser<Octs>,
    ) -> Result<Self, DecodeError> {
        Ok(DnsCrypt {
            props,
            addr: wire::parse_text(parser)?,
            pk: wire::parse_binary(parser)?,
            provider_name: wire::parse_text(parser)?,
        })
    }
}

//------------ Doh -----------------------------------------------------------

/// The content of a DNS-over-HTTPS or ODoH relay stamp.
///
/// Both kinds of stamps have the same content. Which one a value describes
/// is determined by the [`Stamp`] variant it is wrapped in.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct Doh {
    /// The properties of the resolver.
    props: Properties,

    /// The address of the server.
    addr: String,

    /// The certificate hashes.
    #[cfg_attr(feature = "serde", serde(with = "crate::utils::base16::serde"))]
    hash: Vec<u8>,

    /// The host name used for SNI and the HTTP host header.
    host_name: String,

    /// The absolute URI path.
    path: String,
}

impl Doh {
    /// Creates a new DoH stamp for the given address.
    ///
    /// The address can be an IP address with an optional port. It can also
    /// be empty or just a port preceded by a colon, in which case the host
    /// name is to be resolved via other means. All other fields are empty
    /// and all properties are set.
    pub fn new(addr: impl Into<String>) -> Self {
        Doh {
            props: Properties::default(),
            addr: addr.into(),
            hash: Vec::new(),
            host_name: String::new(),
            path: String::new(),
        }
    }

    /// Replaces the properties.
    #[must_use]
    pub fn with_props(self, props: Properties) -> Self {
        Doh { props, ..self }
    }

    /// Replaces the certificate hashes with ones given as a hex string.
    ///
    /// The hashes of all certificates are simply concatenated.
    pub fn with_hash(self, hash: &str) -> Result<Self, EncodeError> {
        Ok(self.with_hash_bytes(wire::encode_hex(hash)?))
    }

    /// Replaces the certificate hashes with the given octets.
    #[must_use]
    pub fn with_hash_bytes(self, hash: impl Into<Vec<u8>>) -> Self {
        Doh {
            hash: hash.into(),
            ..self
        }
    }

    /// Replaces the host name.
    ///
    /// The host name is used as is, even if it contains characters outside
    /// of what is allowed in URLs.
    #[must_use]
    pub fn with_host_name(self, host_name: impl Into<String>) -> Self {
        Doh {
            host_name: host_name.into(),
            ..self
        }
    }

    /// Replaces the path.
    #[must_use]
    pub fn with_path(self, path: impl Into<String>) -> Self {
        Doh {
            path: path.into(),
            ..self
        }
    }

    pub fn props(&self) -> Properties {
        self.props
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    /// Returns the certificate hashes as a lowercase hex string.
    pub fn hash_hex(&self) -> String {
        wire::decode_hex(&self.hash)
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn compose_fields<Target: OctetsBuilder + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), EncodeError> {
        wire::compose_text(target, "addr", &self.addr)?;
        wire::compose_field(target, "hash", &self.hash)?;
        wire::compose_text(target, "hostName", &self.host_name)?;
        wire::compose_text(target, "path", &self.path)
    }

    fn parse_fields<Octs: AsRef<[u8]> + ?Sized>(
        props: Properties,
        parser: &mut Parser<Octs>,
    ) -> Result<Self, DecodeError> {
        Ok(Doh {
            props,
            addr: wire::parse_text(parser)?,
            hash: wire::parse_binary(parser)?,
            host_name: wire::parse_text(parser)?,
            path: wire::parse_text(parser)?,
        })
    }
}

//------------ Dot -----------------------------------------------------------

/// The content of a DNS-over-TLS stamp.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct Dot {
    props: Properties,
    addr: String,
    #[cfg_attr(feature = "serde", serde(with = "crate::utils::base16::serde"))]
    hash: Vec<u8>,
    host_name: String,
}

impl Dot {
    /// Creates a new DoT stamp for the given address.
    ///
    /// The address can be empty or just a port, in which case the host
    /// name is resolved via other means.
    pub fn new(addr: impl Into<String>) -> Self {
        Dot {
            props: Properties::default(),
            addr: addr.into(),
            hash: Vec::new(),
            host_name: String::new(),
        }
    }

    /// Replaces the properties.
    #[must_use]
    pub fn with_props(self, props: Properties) -> Self {
        Dot { props, ..self }
    }

    /// Replaces the certificate hashes with ones given as a hex string.
    pub fn with_hash(self, hash: &str) -> Result<Self, EncodeError> {
        Ok(self.with_hash_bytes(wire::encode_hex(hash)?))
    }

    /// Replaces the certificate hashes with the given octets.
    #[must_use]
    pub fn with_hash_bytes(self, hash: impl Into<Vec<u8>>) -> Self {
        Dot {
            hash: hash.into(),
            ..self
        }
    }

    /// Replaces the host name.
    #[must_use]
    pub fn with_host_name(self, host_name: impl Into<String>) -> Self {
        Dot {
            host_name: host_name.into(),
            ..self
        }
    }

    pub fn props(&self) -> Properties {
        self.props
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    pub fn hash_hex(&self) -> String {
        wire::decode_hex(&self.hash)
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    fn compose_fields<Target: OctetsBuilder + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), EncodeError> {
        wire::compose_text(target, "addr", &self.addr)?;
        wire::compose_field(target, "hash", &self.hash)?;
        wire::compose_text(target, "hostName", &self.host_name)
    }

    fn parse_fields<Octs: AsRef<[u8]> + ?Sized>(
        props: Properties,
        parser: &mut Parser<Octs>,
    ) -> Result<Self, DecodeError> {
        Ok(Dot {
            props,
            addr: wire::parse_text(parser)?,
            hash: wire::parse_binary(parser)?,
            host_name: wire::parse_text(parser)?,
        })
    }
}

//------------ Plain ---------------------------------------------------------

/// The content of a plain DNS stamp.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Plain {
    props: Properties,
    addr: String,
}

impl Plain {
    /// Creates a new plain DNS stamp for the given address.
    pub fn new(addr: impl Into<String>) -> Self {
        Plain {
            props: Properties::default(),
            addr: addr.into(),
        }
    }

    /// Replaces the properties.
    #[must_use]
    pub fn with_props(self, props: Properties) -> Self {
        Plain { props, ..self }
    }

    pub fn props(&self) -> Properties {
        self.props
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn compose_fields<Target: OctetsBuilder + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), EncodeError> {
        wire::compose_text(target, "addr", &self.addr)
    }

    fn parse_fields<Octs: AsRef<[u8]> + ?Sized>(
        props: Properties,
        parser: &mut Parser<Octs>,
    ) -> Result<Self, DecodeError> {
        Ok(Plain {
            props,
            addr: wire::parse_text(parser)?,
        })
    }
}

//------------ Odoh ----------------------------------------------------------

/// The content of an Oblivious DoH target stamp.
///
/// Targets are only ever reached through a relay, so unlike all other
/// stamps these don’t have an address.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct Odoh {
    props: Properties,
    host_name: String,
    path: String,
}

impl Odoh {
    /// Creates a new ODoH target stamp.
    ///
    /// The host name and path are empty and all properties are set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the properties.
    #[must_use]
    pub fn with_props(self, props: Properties) -> Self {
        Odoh { props, ..self }
    }

    /// Replaces the host name.
    #[must_use]
    pub fn with_host_name(self, host_name: impl Into<String>) -> Self {
        Odoh {
            host_name: host_name.into(),
            ..self
        }
    }

    /// Replaces the path.
    #[must_use]
    pub fn with_path(self, path: impl Into<String>) -> Self {
        Odoh {
            path: path.into(),
            ..self
        }
    }

    pub fn props(&self) -> Properties {
        self.props
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn compose_fields<Target: OctetsBuilder + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), EncodeError> {
        wire::compose_text(target, "hostName", &self.host_name)?;
        wire::compose_text(target, "path", &self.path)
    }

    fn parse_fields<Octs: AsRef<[u8]> + ?Sized>(
        props: Properties,
        parser: &mut Parser<Octs>,
    ) -> Result<Self, DecodeError> {
        Ok(Odoh {
            props,
            host_name: wire::parse_text(parser)?,
            path: wire::parse_text(parser)?,
        })
    }
}

//------------ AnonymizedRelay -----------------------------------------------

/// The content of an anonymized DNSCrypt relay stamp.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnonymizedRelay {
    addr: String,
}

impl AnonymizedRelay {
    /// Creates a new relay stamp for the given address.
    pub fn new(addr: impl Into<String>) -> Self {
        AnonymizedRelay { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn compose_fields<Target: OctetsBuilder + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), EncodeError> {
        wire::compose_text(target, "addr", &self.addr)
    }

    fn parse_fields<Octs: AsRef<[u8]> + ?Sized>(
        parser: &mut Parser<Octs>,
    ) -> Result<Self, DecodeError> {
        Ok(AnonymizedRelay {
            addr: wire::parse_text(parser)?,
        })
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    fn decode(s: &str) -> Result<Stamp, DecodeError> {
        Stamp::decode(s)
    }

    fn payload(stamp: impl Into<Stamp>) -> Vec<u8> {
        stamp.into().to_payload().unwrap()
    }

    #[test]
    fn dnscrypt_layout() {
        let stamp = DnsCrypt::new("1.2.3.4")
            .with_pk("f0:0b")
            .unwrap()
            .with_provider_name("2.dnscrypt-cert.example")
            .with_props(Properties::from_bits(0x01));
        assert_eq!(
            payload(stamp),
            b"\x01\x01\0\0\0\0\0\0\0\
              \x071.2.3.4\
              \x02\xf0\x0b\
              \x172.dnscrypt-cert.example"
        );
    }

    #[test]
    fn doh_and_relay_share_layout() {
        let doh = Doh::new("[::1]:443")
            .with_hash_bytes(*b"\xab\xcd")
            .with_host_name("dns.example")
            .with_path("/dns-query");
        let mut doh_payload = payload(doh.clone());
        let relay = Stamp::odoh_relay(doh.clone());
        assert_eq!(relay.proto(), Protocol::ODOH_RELAY);
        assert_eq!(Stamp::from(doh.clone()).proto(), Protocol::DOH);
        let relay_payload = relay.to_payload().unwrap();
        assert_eq!(doh_payload[0], 0x02);
        assert_eq!(relay_payload[0], 0x85);
        assert_eq!(doh_payload[1..], relay_payload[1..]);

        assert_eq!(
            Stamp::from_payload(&relay_payload).unwrap(),
            Stamp::OdohRelay(doh.clone())
        );
        doh_payload[0] = 0x85;
        assert_eq!(
            Stamp::from_payload(&doh_payload).unwrap(),
            Stamp::OdohRelay(doh)
        );
    }

    #[test]
    fn odoh_has_no_addr() {
        let stamp = Odoh::new().with_host_name("odoh.example").with_path("/q");
        assert_eq!(
            payload(stamp.clone()),
            b"\x05\x07\0\0\0\0\0\0\0\x0codoh.example\x02/q"
        );
        assert_eq!(Stamp::from(stamp).addr(), None);
    }

    #[test]
    fn relay_has_no_props() {
        let stamp = Stamp::from(AnonymizedRelay::new("192.0.2.1:443"));
        assert_eq!(stamp.to_payload().unwrap(), b"\x81\x0d192.0.2.1:443");
        assert_eq!(stamp.props(), None);
        assert_eq!(stamp.addr(), Some("192.0.2.1:443"));
    }

    #[test]
    fn accessors() {
        let stamp = Stamp::from(
            Plain::new("9.9.9.9").with_props(Properties::from_bits(0x04)),
        );
        assert_eq!(stamp.proto(), Protocol::PLAIN);
        assert_eq!(stamp.props(), Some(Properties::from_bits(0x04)));
        assert_eq!(stamp.addr(), Some("9.9.9.9"));

        let doh = Doh::new("").with_hash("F0:0B:A4").unwrap();
        assert_eq!(doh.hash(), b"\xf0\x0b\xa4");
        assert_eq!(doh.hash_hex(), "f00ba4");
        assert_eq!(Stamp::OdohRelay(doh).proto(), Protocol::ODOH_RELAY);
    }

    #[test]
    fn with_methods_keep_other_fields() {
        let dot = Dot::new("foo")
            .with_host_name("bar")
            .with_hash("0102")
            .unwrap()
            .with_props(Properties::none());
        assert_eq!(dot.addr(), "foo");
        assert_eq!(dot.host_name(), "bar");
        assert_eq!(dot.hash(), b"\x01\x02");
        assert_eq!(dot.props(), Properties::none());
    }

    #[test]
    fn invalid_hex() {
        assert!(matches!(
            DnsCrypt::new("").with_pk("f00"),
            Err(EncodeError::InvalidHex(_))
        ));
        assert!(matches!(
            Dot::new("").with_hash("xyz0"),
            Err(EncodeError::InvalidHex(_))
        ));
    }

    #[test]
    fn field_too_long() {
        let stamp = Stamp::from(Doh::new("").with_path("/".repeat(256)));
        assert_eq!(
            stamp.encode(),
            Err(EncodeError::FieldTooLong {
                field: "path",
                len: 256
            })
        );

        let stamp = Stamp::from(DnsCrypt::new("").with_pk_bytes(vec![0; 300]));
        assert_eq!(
            stamp.to_payload(),
            Err(EncodeError::FieldTooLong {
                field: "pk",
                len: 300
            })
        );

        let stamp = Stamp::from(Plain::new("é".repeat(128)));
        assert!(matches!(
            stamp.encode(),
            Err(EncodeError::FieldTooLong { field: "addr", .. })
        ));

        let stamp = Stamp::from(Plain::new("a".repeat(255)));
        assert!(stamp.encode().is_ok());
    }

    #[test]
    fn compose_truncates_on_error() {
        let mut target = b"prefix".to_vec();
        let stamp = Stamp::from(
            Doh::new("addr").with_host_name("x".repeat(300)),
        );
        assert!(stamp.compose(&mut target).is_err());
        assert_eq!(target, b"prefix");

        let mut target = octseq::array::Array::<10>::new();
        let stamp = Stamp::from(Plain::new("too long for ten"));
        assert_eq!(stamp.compose(&mut target), Err(EncodeError::ShortBuf));
        assert!(target.as_ref().is_empty());
    }

    #[test]
    fn scheme() {
        assert_eq!(decode(""), Err(DecodeError::InvalidScheme));
        assert_eq!(decode("gQNmb28"), Err(DecodeError::InvalidScheme));
        assert_eq!(decode("SDNS://gQNmb28"), Err(DecodeError::InvalidScheme));
        assert_eq!(decode("sdns:/gQNmb28"), Err(DecodeError::InvalidScheme));
        assert_eq!(decode(" sdns://gQNmb28"), Err(DecodeError::InvalidScheme));
        assert!(decode("sdns://gQNmb28").is_ok());
    }

    #[test]
    fn invalid_encoding() {
        assert!(matches!(
            decode("sdns://gQNm+b28"),
            Err(DecodeError::InvalidEncoding(_))
        ));
        assert!(matches!(
            decode("sdns://gQNmb"),
            Err(DecodeError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn unsupported_protocols() {
        for tag in 0..=u8::MAX {
            let payload = [tag, 0x07, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
            let res = Stamp::from_payload(&payload);
            if Protocol::from_int(tag).is_known() {
                assert!(res.is_ok(), "tag {} rejected", tag);
            } else {
                assert_eq!(res, Err(DecodeError::UnsupportedProtocol(tag)));
            }
        }
    }

    #[test]
    fn truncated() {
        let full = payload(
            Doh::new("a")
                .with_hash_bytes(*b"\x01")
                .with_host_name("h")
                .with_path("/p"),
        );
        for len in 0..full.len() {
            assert_eq!(
                Stamp::from_payload(&full[..len]),
                Err(DecodeError::Truncated),
                "length {}",
                len
            );
        }
        assert!(Stamp::from_payload(&full).is_ok());

        // Length octet pointing past the end.
        assert_eq!(
            Stamp::from_payload(b"\x81\x04foo"),
            Err(DecodeError::Truncated)
        );
        assert_eq!(decode("sdns://"), Err(DecodeError::Truncated));
    }

    #[test]
    fn invalid_text() {
        assert!(matches!(
            Stamp::from_payload(b"\x81\x02\xc3\x28"),
            Err(DecodeError::InvalidText(_))
        ));
    }

    #[test]
    fn reserved_data_ignored() {
        let stamp = Stamp::from_payload(
            b"\x04\xff\x01\x02\x03\x04\x05\x06\x07\x03foo",
        )
        .unwrap();
        assert_eq!(stamp, Stamp::from(Plain::new("foo")));
        assert_eq!(
            stamp.to_payload().unwrap(),
            b"\x04\x07\0\0\0\0\0\0\0\x03foo"
        );
    }

    #[test]
    fn rejected_payload_is_logged() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;
        use tracing::span;
        use tracing::{Event, Level, Metadata};

        struct CountDebug(Arc<AtomicUsize>);

        impl tracing::Subscriber for CountDebug {
            fn enabled(&self, _: &Metadata<'_>) -> bool {
                true
            }

            fn new_span(&self, _: &span::Attributes<'_>) -> span::Id {
                span::Id::from_u64(1)
            }

            fn record(&self, _: &span::Id, _: &span::Record<'_>) {}

            fn record_follows_from(&self, _: &span::Id, _: &span::Id) {}

            fn event(&self, event: &Event<'_>) {
                if *event.metadata().level() == Level::DEBUG {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }

            fn enter(&self, _: &span::Id) {}

            fn exit(&self, _: &span::Id) {}
        }

        let count = Arc::new(AtomicUsize::new(0));
        tracing::subscriber::with_default(CountDebug(count.clone()), || {
            assert_eq!(
                Stamp::from_payload(b"\x06"),
                Err(DecodeError::UnsupportedProtocol(6))
            );
            assert_eq!(count.load(Ordering::SeqCst), 1);
            assert_eq!(
                Stamp::from_payload(b"\x81\x04foo"),
                Err(DecodeError::Truncated)
            );
            assert_eq!(count.load(Ordering::SeqCst), 2);
            assert!(Stamp::from_payload(b"\x81\x03foo").is_ok());
            assert_eq!(count.load(Ordering::SeqCst), 2);
            assert_eq!(decode("sdns:gQNmb28"), Err(DecodeError::InvalidScheme));
            assert_eq!(count.load(Ordering::SeqCst), 3);
        });
    }

    #[test]
    fn trailing_data_ignored() {
        assert_eq!(
            Stamp::from_payload(b"\x81\x03foo\x01\x02").unwrap(),
            Stamp::from(AnonymizedRelay::new("foo"))
        );
    }

    #[test]
    fn parse_leaves_trailing_data() {
        let mut parser = Parser::from_ref(&b"\x81\x01a\x81\x01b"[..]);
        assert_eq!(
            Stamp::parse(&mut parser).unwrap(),
            Stamp::from(AnonymizedRelay::new("a"))
        );
        assert_eq!(
            Stamp::parse(&mut parser).unwrap(),
            Stamp::from(AnonymizedRelay::new("b"))
        );
        assert_eq!(parser.remaining(), 0);
    }

    #[test]
    fn utf8_round_trip() {
        let stamp = Stamp::from(
            Doh::new("")
                .with_host_name("dns.bücher.example")
                .with_path("/ドメイン"),
        );
        let uri = stamp.encode().unwrap();
        assert_eq!(decode(&uri).unwrap(), stamp);
    }

    #[test]
    fn from_str_and_try_from() {
        let stamp: Stamp = "sdns://gQNmb28".parse().unwrap();
        assert_eq!(stamp, Stamp::from(AnonymizedRelay::new("foo")));
        assert_eq!(String::try_from(&stamp).unwrap(), "sdns://gQNmb28");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json() {
        let stamp = Stamp::from(
            Doh::new("127.0.0.1")
                .with_hash("0a:0b")
                .unwrap()
                .with_host_name("localhost")
                .with_path("/dns-query")
                .with_props(Properties::from_bits(0x01)),
        );
        let json = serde_json::to_value(&stamp).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "protocol": "DoH",
                "props": { "dnssec": true, "nolog": false, "nofilter": false },
                "addr": "127.0.0.1",
                "hash": "0a0b",
                "hostName": "localhost",
                "path": "/dns-query",
            })
        );
        assert_eq!(serde_json::from_value::<Stamp>(json).unwrap(), stamp);

        let relay: Stamp = serde_json::from_str(
            r#"{ "protocol": "ODoHRelay", "hash": "AB CD", "path": "/r" }"#,
        )
        .unwrap();
        assert_eq!(
            relay,
            Stamp::OdohRelay(
                Doh::new("").with_hash_bytes(*b"\xab\xcd").with_path("/r")
            )
        );

        let odoh: Stamp =
            serde_json::from_str(r#"{ "protocol": "ODoH" }"#).unwrap();
        assert_eq!(odoh, Stamp::from(Odoh::new()));

        assert!(serde_json::from_str::<Stamp>(r#"{ "protocol": "DoQ" }"#)
            .is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn ser_de_hash() {
        use serde_test::{
            assert_de_tokens, assert_ser_tokens, assert_tokens, Configure,
            Token,
        };

        fn tokens(hash: Token) -> [Token; 17] {
            [
                Token::Struct {
                    name: "Dot",
                    len: 4,
                },
                Token::Str("props"),
                Token::Struct {
                    name: "Properties",
                    len: 3,
                },
                Token::Str("dnssec"),
                Token::Bool(true),
                Token::Str("nolog"),
                Token::Bool(true),
                Token::Str("nofilter"),
                Token::Bool(true),
                Token::StructEnd,
                Token::Str("addr"),
                Token::Str("foo"),
                Token::Str("hash"),
                hash,
                Token::Str("hostName"),
                Token::Str("bar"),
                Token::StructEnd,
            ]
        }

        let dot = Dot::new("foo")
            .with_hash_bytes(*b"\x01\x02")
            .with_host_name("bar");
        assert_tokens(&dot.clone().readable(), &tokens(Token::Str("0102")));
        assert_ser_tokens(
            &dot.clone().compact(),
            &tokens(Token::Bytes(b"\x01\x02")),
        );
        assert_de_tokens(
            &dot.compact(),
            &tokens(Token::ByteBuf(b"\x01\x02")),
        );
    }
}
