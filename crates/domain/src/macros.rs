//! Macro for implementing string conversions on wire enums
//!
//! Enums such as device status or job state travel as plain strings. This
//! macro ties each variant to its wire spelling once and derives `as_str`,
//! `Display` and a case-insensitive `FromStr` from that table. Serde
//! attributes on the enum itself must use the same spellings.
//!
//! # Example
//!
//! ```rust
//! use synpse_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Power {
//!     On,
//!     Off,
//! }
//!
//! impl_domain_status_conversions!(Power {
//!     On => "on",
//!     Off => "off",
//! });
//!
//! assert_eq!(Power::On.as_str(), "on");
//! assert_eq!("OFF".parse::<Power>().unwrap(), Power::Off);
//! ```

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their wire spelling
///
/// Parsing ignores ASCII case and fails with
/// [`DomainError::InvalidValue`](crate::DomainError::InvalidValue).
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Wire spelling of this variant
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err($crate::DomainError::InvalidValue {
                    kind: stringify!($enum_name),
                    value: s.to_string(),
                })
            }
        }
    };
}
