//! Variable names.
//!
//! Every value in an execution context is bound to a [`VarName`]. Names are
//! plain strings on the wire; the wrapper keeps them from being confused with
//! opcodes or literal text.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a variable bound in an execution context.
///
/// Hashes exactly like the wrapped string, so maps keyed by `VarName` can be
/// queried with a plain `&str`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarName(pub String);

impl VarName {
    /// Creates a new variable name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VarName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VarName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for VarName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for VarName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for VarName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
