//! Stamp protocol identifiers.

//------------ Protocol ------------------------------------------------------

int_enum! {
    /// The protocol identifier of a stamp.
    ///
    /// This is the first octet of every stamp payload and selects both the
    /// transport described by the stamp and the layout of the remaining
    /// payload. Values with the high bit set describe relays rather than
    /// resolvers.
    ///
    /// Values not listed here can appear in a stamp but cannot be decoded.
    =>
    Protocol, u8;

    /// DNSCrypt
    ///
    /// A DNSCrypt resolver identified by its provider public key and
    /// provider name.
    (DNSCRYPT => 0x01, "DNSCrypt")

    /// DNS-over-HTTPS
    ///
    /// A resolver reached via HTTPS at a host name and URI path.
    (DOH => 0x02, "DoH")

    /// DNS-over-TLS
    (DOT => 0x03, "DoT")

    /// Plain DNS
    ///
    /// An unencrypted resolver reached via UDP and TCP.
    (PLAIN => 0x04, "Plain")

    /// Oblivious DNS-over-HTTPS target
    ///
    /// An ODoH target is only reached via a relay and thus has no address
    /// of its own.
    (ODOH => 0x05, "ODoH")

    /// Anonymized DNSCrypt relay
    (ANONYMIZED_RELAY => 0x81, "AnonymizedRelay")

    /// Oblivious DNS-over-HTTPS relay
    ///
    /// Relays share the layout of DNS-over-HTTPS stamps.
    (ODOH_RELAY => 0x85, "ODoHRelay")
}

int_enum_str_with_decimal!(Protocol, u8, "unknown stamp protocol");

impl Protocol {
    /// Returns whether stamps of this protocol carry a properties block.
    ///
    /// Only the anonymized DNSCrypt relay lacks properties.
    #[must_use]
    pub const fn has_props(self) -> bool {
        self.0 != Self::ANONYMIZED_RELAY.0
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn mnemonics() {
        assert_eq!(Protocol::from_int(0x02), Protocol::DOH);
        assert_eq!(Protocol::from_mnemonic(b"doh"), Some(Protocol::DOH));
        assert_eq!(Protocol::from_mnemonic(b"DoQ"), None);
        assert_eq!(Protocol::ODOH_RELAY.to_mnemonic_str(), Some("ODoHRelay"));
        assert_eq!(Protocol::from_int(0x06).to_mnemonic_str(), None);
        assert!(!Protocol::from_int(0x00).is_known());
    }

    #[test]
    fn from_str_and_display() {
        assert_eq!(Protocol::from_str("dnscrypt").unwrap(), Protocol::DNSCRYPT);
        assert_eq!(Protocol::from_str("129").unwrap(), Protocol::ANONYMIZED_RELAY);
        assert!(Protocol::from_str("bogus").is_err());
        assert_eq!(format!("{}", Protocol::DOT), "DoT");
        assert_eq!(format!("{}", Protocol::from_int(7)), "7");
        assert_eq!(format!("{:?}", Protocol::PLAIN), "Protocol::Plain");
        assert_eq!(format!("{:?}", Protocol::from_int(7)), "Protocol(7)");
    }

    #[test]
    fn props() {
        for proto in Protocol::ALL {
            assert_eq!(
                proto.has_props(),
                *proto != Protocol::ANONYMIZED_RELAY
            );
        }
        assert_eq!(Protocol::ALL.len(), 7);
    }

    #[test]
    fn parse_and_compose() {
        let mut parser = octseq::parse::Parser::from_ref(&b"\x85"[..]);
        assert_eq!(Protocol::parse(&mut parser).unwrap(), Protocol::ODOH_RELAY);
        assert!(Protocol::parse(&mut parser).is_err());

        let mut target = Vec::<u8>::new();
        Protocol::DNSCRYPT.compose(&mut target).unwrap();
        assert_eq!(target, b"\x01");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn ser_de() {
        use serde_test::{assert_de_tokens, assert_tokens, Configure, Token};

        assert_tokens(&Protocol::DOH.readable(), &[Token::Str("DoH")]);
        assert_tokens(&Protocol::DOH.compact(), &[Token::U8(2)]);
        assert_tokens(&Protocol::from_int(9).readable(), &[Token::U8(9)]);
        assert_de_tokens(&Protocol::DOT.readable(), &[Token::Str("3")]);
    }
}
