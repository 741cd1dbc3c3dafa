//! Macro for defining validated string newtypes.
//!
//! Every identifier alarm-craft passes around (alarm names, selector ids) is
//! a non-empty string with an upper length bound imposed by the cloud API.
//! The macro generates the wrapper plus the conversions callers need.

/// Define a non-empty, length-bounded string newtype.
///
/// Generates:
/// - the struct with `Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize`
/// - a `Deserialize` impl that applies the same validation as `try_new`
/// - `new()` (panics on invalid input), `try_new()`, `as_str()`, `into_inner()`
/// - `Display`, `AsRef<str>`, `Deref<Target = str>`, `Borrow<str>`
/// - `PartialEq<str>` and `PartialEq<&str>`
macro_rules! define_newtype_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident(max_len = $max:expr);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $Name::validate(&s).map_err(serde::de::Error::custom)?;
                Ok(Self(s))
            }
        }

        impl $Name {
            /// Maximum length accepted by the cloud API.
            pub const MAX_LEN: usize = $max;

            fn validate(s: &str) -> Result<(), String> {
                if s.is_empty() {
                    return Err(concat!(stringify!($Name), " must not be empty").to_string());
                }
                if s.chars().count() > Self::MAX_LEN {
                    return Err(format!(
                        "{} '{}' exceeds {} characters",
                        stringify!($Name),
                        s,
                        Self::MAX_LEN
                    ));
                }
                Ok(())
            }

            /// Create a new instance, panicking if the value is invalid.
            ///
            /// Prefer [`try_new`](Self::try_new) for values built from cloud or user input.
            pub fn new(name: impl Into<String>) -> Self {
                let s = name.into();
                if let Err(reason) = Self::validate(&s) {
                    panic!("{}", reason);
                }
                Self(s)
            }

            /// Try to create a new instance, returning the validation failure.
            pub fn try_new(name: impl Into<String>) -> Result<Self, String> {
                let s = name.into();
                Self::validate(&s)?;
                Ok(Self(s))
            }

            /// Return the underlying value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str { &self.0 }
        }

        impl std::ops::Deref for $Name {
            type Target = str;
            fn deref(&self) -> &str { &self.0 }
        }

        impl std::borrow::Borrow<str> for $Name {
            fn borrow(&self) -> &str { &self.0 }
        }

        impl PartialEq<str> for $Name {
            fn eq(&self, other: &str) -> bool { self.0 == other }
        }

        impl PartialEq<&str> for $Name {
            fn eq(&self, other: &&str) -> bool { self.0 == *other }
        }
    };
}

pub(crate) use define_newtype_string;
