//! Macros making implementing registry types easier.

/// Creates a standard registry type wrapping an integer.
///
/// This adds impls for `From`, `PartialEq`, `Eq`, `PartialOrd`, `Ord`,
/// `Hash`, and `Debug`.
///
/// For `FromStr` and `Display`, see `int_enum_str_with_decimal`.
macro_rules! int_enum {
    ( $(#[$attr:meta])* =>
      $regtype:ident, $inttype:path;
      $( $(#[$variant_attr:meta])* ( $variant:ident =>
                                        $value:expr, $mnemonic:expr) )* ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $regtype($inttype);

        impl $regtype {
            $(
                $(#[$variant_attr])*
                pub const $variant: $regtype = $regtype($value);
            )*

            /// All values that have a mnemonic, in ascending order.
            pub const ALL: &'static [$regtype] = &[ $( $regtype::$variant, )* ];
        }

        impl $regtype {
            /// Returns a value from its raw integer value.
            #[must_use]
            pub const fn from_int(value: $inttype) -> Self {
                Self(value)
            }

            /// Returns the raw integer value for a value.
            #[must_use]
            pub const fn to_int(self) -> $inttype {
                self.0
            }

            /// Returns a value from a well-defined mnemonic.
            #[must_use]
            pub fn from_mnemonic(m: &[u8]) -> Option<Self> {
                $(
                    if m.eq_ignore_ascii_case($mnemonic.as_bytes()) {
                        return Some($regtype::$variant)
                    }
                )*
                None
            }

            /// Returns the mnemonic as a `&str` for this value if there is one.
            #[must_use]
            pub const fn to_mnemonic_str(self) -> Option<&'static str> {
                match self {
                    $(
                        $regtype::$variant => {
                            Some($mnemonic)
                        }
                    )*
                    _ => None
                }
            }

            /// Returns whether the value is one of the well-defined ones.
            #[must_use]
            pub const fn is_known(self) -> bool {
                self.to_mnemonic_str().is_some()
            }

            /// Takes a value from the beginning of a parser.
            pub fn parse<'a, Octs: AsRef<[u8]> + ?Sized>(
                parser: &mut octseq::parse::Parser<'a, Octs>
            ) -> Result<Self, octseq::parse::ShortInput> {
                parser.parse_u8().map(Self::from_int)
            }

            /// Appends the wire format of the value to a target.
            pub fn compose<Target: octseq::builder::OctetsBuilder + ?Sized>(
                &self,
                target: &mut Target
            ) -> Result<(), Target::AppendError> {
                target.append_slice(&[self.to_int()])
            }
        }


        //--- From

        impl From<$inttype> for $regtype {
            fn from(value: $inttype) -> Self {
                $regtype::from_int(value)
            }
        }

        impl From<$regtype> for $inttype {
            fn from(value: $regtype) -> Self {
                value.to_int()
            }
        }

        //--- Debug

        impl core::fmt::Debug for $regtype {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                match self.to_mnemonic_str() {
                    Some(mnemonic) => {
                        write!(
                            f,
                            concat!(stringify!($regtype), "::{}"),
                            mnemonic
                        )
                    }
                    None => {
                        f.debug_tuple(stringify!($regtype))
                            .field(&self.0)
                            .finish()
                    }
                }
            }
        }
    }
}

/// Adds impls for `FromStr` and `Display` to the type given as first argument.
///
/// For `FromStr`, recognizes all mnemonics case-insensitively as well as a
/// decimal number representing any value.
///
/// For `Display`, it will display a decimal number for values without
/// mnemonic.
///
/// If the `serde` feature is enabled, also adds implementation for
/// `Serialize` and `Deserialize`. Values will be serialized using the
/// mnemonic if available or otherwise the integer value for human readable
/// formats and the integer value for compact formats. Both mnemonics and
/// integer values can be deserialized.
macro_rules! int_enum_str_with_decimal {
    ($regtype:ident, $inttype:ident, $error:expr) => {
        impl core::str::FromStr for $regtype {
            type Err = FromStrError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // We assume all mnemonics are always ASCII, so using
                // the bytes representation of `s` is safe.
                match $regtype::from_mnemonic(s.as_bytes()) {
                    Some(res) => Ok(res),
                    None => {
                        if let Ok(res) = s.parse() {
                            Ok($regtype::from_int(res))
                        } else {
                            Err(FromStrError(()))
                        }
                    }
                }
            }
        }

        impl core::fmt::Display for $regtype {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                match self.to_mnemonic_str() {
                    Some(m) => f.write_str(m),
                    None => write!(f, "{}", self.to_int()),
                }
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $regtype {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> Result<S::Ok, S::Error> {
                if serializer.is_human_readable() {
                    match self.to_mnemonic_str() {
                        Some(value) => value.serialize(serializer),
                        None => self.to_int().serialize(serializer),
                    }
                } else {
                    self.to_int().serialize(serializer)
                }
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $regtype {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> Result<Self, D::Error> {
                struct Visitor;

                impl<'de> serde::de::Visitor<'de> for Visitor {
                    type Value = $regtype;

                    fn expecting(
                        &self, f: &mut core::fmt::Formatter
                    ) -> core::fmt::Result {
                        f.write_str(concat!(
                            "a ", stringify!($regtype), " mnemonic or integer"
                        ))
                    }

                    fn visit_str<E: serde::de::Error>(
                        self, v: &str
                    ) -> Result<Self::Value, E> {
                        v.parse().map_err(E::custom)
                    }

                    fn visit_u64<E: serde::de::Error>(
                        self, v: u64
                    ) -> Result<Self::Value, E> {
                        $inttype::try_from(v)
                            .map($regtype::from_int)
                            .map_err(E::custom)
                    }
                }

                if deserializer.is_human_readable() {
                    deserializer.deserialize_any(Visitor)
                } else {
                    deserializer.deserialize_u8(Visitor)
                }
            }
        }

        from_str_error!($error);
    };
}

/// Defines the error type returned by `FromStr` of a registry type.
macro_rules! from_str_error {
    ($description:expr) => {
        #[derive(Clone, Debug)]
        pub struct FromStrError(());

        impl core::fmt::Display for FromStrError {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                f.write_str($description)
            }
        }

        impl std::error::Error for FromStrError {}
    };
}
