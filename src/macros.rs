//! Macros to reduce boilerplate in the codebase

/// Macro to generate Display, FromStr and `as_str` for wire-named enums
///
/// Parsing is ASCII case-insensitive, so `startsWith`, `startswith` and
/// `STARTSWITH` all resolve to the same variant. Display always yields the
/// canonical spelling given in the table.
///
/// # Usage
///
/// ```rust,ignore
/// use crate::error::TicketDeskError;
///
/// enum_display_fromstr!(
///     MyEnum,
///     TicketDeskError::invalid_my_enum,
///     {
///         Variant1 => "variant1",
///         Variant2 => "variantTwo",
///     }
/// );
/// ```
#[macro_export]
macro_rules! enum_display_fromstr {
    (
        $enum_name:ident,
        $error_ctor:path,
        { $($variant:ident => $str:expr),+ $(,)? }
    ) => {
        impl $enum_name {
            /// Canonical wire spelling of this variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($enum_name::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::error::TicketDeskError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($str) {
                        return Ok($enum_name::$variant);
                    }
                )+
                Err($error_ctor(s.to_string()))
            }
        }
    };
}
