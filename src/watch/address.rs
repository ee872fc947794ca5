use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::ADDRESS_SEPARATOR;
use crate::Error;

/// Identifies one remote value: a container id plus a leaf-value id.
///
/// Both segments are opaque to the engine. Equality, ordering and hashing are
/// structural over the pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address {
    container: String,
    leaf: String,
}

impl Address {
    pub fn new(
        container: impl Into<String>,
        leaf: impl Into<String>,
    ) -> Self {
        Self {
            container: container.into(),
            leaf: leaf.into(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn leaf(&self) -> &str {
        &self.leaf
    }
}

impl fmt::Display for Address {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}{}{}", self.container, ADDRESS_SEPARATOR, self.leaf)
    }
}

/// Parses `container/leaf`. The split happens at the first separator, so a
/// leaf may itself contain `/`.
impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(ADDRESS_SEPARATOR) {
            Some((container, leaf)) if !container.is_empty() && !leaf.is_empty() => {
                Ok(Address::new(container, leaf))
            }
            _ => Err(Error::InvalidAddress(s.to_string())),
        }
    }
}
