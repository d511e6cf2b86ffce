//! Resolver properties.
//!
//! Every stamp except that of an anonymized relay announces a set of
//! properties of the resolver it describes. These are encoded in the first
//! octet of an eight octet block following the protocol identifier. The
//! remaining seven octets are reserved and always zero in stamps produced
//! by this crate. When reading stamps, they are skipped without looking at
//! them.

use core::fmt;
use core::str::FromStr;

//------------ Properties ----------------------------------------------------

/// The properties announced by a resolver.
///
/// The flags are packed into the properties octet like this:
///
/// ```text
///   7  6  5  4  3  2  1  0
/// +--+--+--+--+--+--+--+--+
/// |   reserved   |NF|NL|DS|
/// +--+--+--+--+--+--+--+--+
/// ```
///
/// This type has a text notation and can be created from it as well. Each
/// flag that is set is represented by its uppercase name. Multiple flags are
/// separated by space.
///
/// ```
/// use core::str::FromStr;
/// use sdns_stamp::props::Properties;
///
/// let props = Properties::from_str("DNSSEC NOLOG").unwrap();
/// assert!(props.dnssec && props.nolog && !props.nofilter);
/// assert_eq!(props.to_bits(), 0x03);
/// assert_eq!(format!("{}", props), "DNSSEC NOLOG");
/// ```
///
/// Unlike most flag types, all flags are set by default.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Properties {
    /// The resolver supports DNSSEC.
    pub dnssec: bool,

    /// The resolver doesn’t keep logs.
    pub nolog: bool,

    /// The resolver doesn’t intentionally block domains.
    pub nofilter: bool,
}

/// # Creation and Conversion
///
impl Properties {
    /// The bit of the DNSSEC flag.
    pub const DNSSEC: u8 = 1 << 0;

    /// The bit of the no-logs flag.
    pub const NOLOG: u8 = 1 << 1;

    /// The bit of the no-filter flag.
    pub const NOFILTER: u8 = 1 << 2;

    /// Creates new properties with all flags set.
    #[must_use]
    pub const fn new() -> Self {
        Properties {
            dnssec: true,
            nolog: true,
            nofilter: true,
        }
    }

    /// Creates new properties with no flags set.
    #[must_use]
    pub const fn none() -> Self {
        Properties {
            dnssec: false,
            nolog: false,
            nofilter: false,
        }
    }

    /// Creates properties from the properties octet.
    ///
    /// The reserved bits are ignored.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Properties {
            dnssec: bits & Self::DNSSEC != 0,
            nolog: bits & Self::NOLOG != 0,
            nofilter: bits & Self::NOFILTER != 0,
        }
    }

    /// Returns the properties octet.
    ///
    /// The reserved bits are always zero.
    #[must_use]
    pub const fn to_bits(self) -> u8 {
        (if self.dnssec { Self::DNSSEC } else { 0 })
            | (if self.nolog { Self::NOLOG } else { 0 })
            | (if self.nofilter { Self::NOFILTER } else { 0 })
    }
}

//--- Default

impl Default for Properties {
    fn default() -> Self {
        Self::new()
    }
}

//--- From

impl From<u8> for Properties {
    fn from(bits: u8) -> Self {
        Self::from_bits(bits)
    }
}

impl From<Properties> for u8 {
    fn from(props: Properties) -> Self {
        props.to_bits()
    }
}

//--- Display & FromStr

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut sep = "";
        if self.dnssec {
            write!(f, "DNSSEC")?;
            sep = " ";
        }
        if self.nolog {
            write!(f, "{}NOLOG", sep)?;
            sep = " ";
        }
        if self.nofilter {
            write!(f, "{}NOFILTER", sep)?;
        }
        Ok(())
    }
}

impl FromStr for Properties {
    type Err = PropertiesFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut props = Properties::none();
        for token in s.to_uppercase().split(' ') {
            match token {
                "DNSSEC" => props.dnssec = true,
                "NOLOG" => props.nolog = true,
                "NOFILTER" => props.nofilter = true,
                "" => {}
                _ => return Err(PropertiesFromStrError),
            }
        }
        Ok(props)
    }
}

//------------ PropertiesFromStrError ----------------------------------------

/// An error happened when converting a string to properties.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PropertiesFromStrError;

impl fmt::Display for PropertiesFromStrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("illegal properties token")
    }
}

impl std::error::Error for PropertiesFromStrError {}

//============ Testing =======================================================
