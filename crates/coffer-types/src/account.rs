use crate::error::TypesError;
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Name of an account: either a signer (`alice`, `sys`) or a submitted
/// contract (`currency`, `con_safe`).
///
/// Names are ASCII alphanumerics plus `_` and `-`. The storage key
/// delimiters `.` and `:` can never appear in a name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId(String);

impl AccountId {
    /// Maximum name length in bytes
    pub const MAX_LEN: usize = 64;

    /// Default signer used by the execution client
    pub const SYS: &'static str = "sys";

    /// Validate and wrap a name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypesError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Check a candidate name without allocating.
    pub fn validate(name: &str) -> Result<(), TypesError> {
        if name.is_empty() {
            return Err(TypesError::EmptyAccount);
        }
        if name.len() > Self::MAX_LEN {
            return Err(TypesError::AccountTooLong {
                max: Self::MAX_LEN,
                actual: name.len(),
            });
        }
        if let Some(ch) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(TypesError::InvalidAccountChar {
                name: name.to_string(),
                ch,
            });
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.0)
    }
}

impl FromStr for AccountId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for AccountId {
    type Error = TypesError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AccountId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for AccountId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AccountId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
