//! Registry identifiers.

use std::fmt;

/// Identifier used to key registry helpers.
///
/// Strings and integers are distinct: `Id::from("1") != Id::from(1)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Id {
    /// Textual id
    Str(String),
    /// Numeric id
    Num(i64),
}

impl Id {
    /// Name that blank ids fall back to.
    pub const DEFAULT: &'static str = "default";

    /// True for the empty string and zero.
    pub fn is_blank(&self) -> bool {
        match self {
            Id::Str(s) => s.is_empty(),
            Id::Num(n) => *n == 0,
        }
    }

    /// Maps blank ids to `"default"`.
    pub(crate) fn or_default(self) -> Id {
        if self.is_blank() {
            Id::Str(Self::DEFAULT.to_string())
        } else {
            self
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Str(s) => f.write_str(s),
            Id::Num(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::Str(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::Str(value)
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Num(value)
    }
}

impl From<i32> for Id {
    fn from(value: i32) -> Self {
        Id::Num(value.into())
    }
}

impl From<u32> for Id {
    fn from(value: u32) -> Self {
        Id::Num(value.into())
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(Id::Num)
            .unwrap_or_else(|_| Id::Str(value.to_string()))
    }
}
