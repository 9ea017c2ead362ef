//! Transport adapter flavors

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Host-integration flavor of a generated download/upload accessor pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterFlavor {
    /// Blocking request handlers (werkzeug / flask)
    #[default]
    Synchronous,
    /// Coroutine request handlers (starlette)
    Asynchronous,
}

impl AdapterFlavor {
    /// Both flavors
    pub const ALL: [AdapterFlavor; 2] = [AdapterFlavor::Synchronous, AdapterFlavor::Asynchronous];

    /// Suffix appended to the field name for the accessor pair
    #[inline]
    #[must_use]
    pub fn suffix(&self) -> &'static str {
        match self {
            AdapterFlavor::Synchronous => "sync_file",
            AdapterFlavor::Asynchronous => "async_file",
        }
    }

    /// The flavor that is not this one
    #[inline]
    #[must_use]
    pub fn other(&self) -> Self {
        match self {
            AdapterFlavor::Synchronous => AdapterFlavor::Asynchronous,
            AdapterFlavor::Asynchronous => AdapterFlavor::Synchronous,
        }
    }

    /// Whether generated accessors are coroutines
    #[inline]
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(self, AdapterFlavor::Asynchronous)
    }
}

impl Display for AdapterFlavor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AdapterFlavor::Synchronous => f.write_str("synchronous"),
            AdapterFlavor::Asynchronous => f.write_str("asynchronous"),
        }
    }
}

/// Unknown adapter flavor name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown adapter flavor '{0}', expected synchronous or asynchronous")]
pub struct ParseFlavorError(pub String);

impl FromStr for AdapterFlavor {
    type Err = ParseFlavorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synchronous" | "sync" | "flask" | "werkzeug" => Ok(AdapterFlavor::Synchronous),
            "asynchronous" | "async" | "asyncio" | "starlette" => Ok(AdapterFlavor::Asynchronous),
            other => Err(ParseFlavorError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_aliases() {
        assert_eq!("Flask".parse(), Ok(AdapterFlavor::Synchronous));
        assert_eq!("asynchronous".parse(), Ok(AdapterFlavor::Asynchronous));
        assert_eq!("starlette".parse(), Ok(AdapterFlavor::Asynchronous));
        assert!("grpc".parse::<AdapterFlavor>().is_err());
    }

    #[test]
    fn other_flips() {
        assert_eq!(AdapterFlavor::Synchronous.other(), AdapterFlavor::Asynchronous);
        assert!(AdapterFlavor::Asynchronous.is_async());
    }
}
