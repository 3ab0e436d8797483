//! Version identifiers: the keys inserted into the filter

use std::fmt;

use serde::{Deserialize, Serialize};

/// Key encoding used for filter inputs
pub const KEY_FORMAT: &str = "{guid}:{version}";

/// `guid:version` naming one published addon version
///
/// Ordered by the byte-wise order of the full string, which is the order
/// snapshot files and filter inputs are written in.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(guid: &str, version: &str) -> Self {
        Identifier(format!("{}:{}", guid, version))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<[u8]> for Identifier {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(key: &str) -> Self {
        Identifier(key.to_string())
    }
}
