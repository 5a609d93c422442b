//! Capability set exposed to a snippet.
//!
//! A snippet only sees what its [`Capabilities`] enumerate. Everything on the
//! deny list is guarded: reading it raises a `SandboxError` naming the
//! category of the refused access.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A built-in that can be installed into the sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// `console.*` and `print`, writing structured records
    Console,
    Math,
    String,
    Table,
    Utf8,
    /// `json.encode` / `json.decode`
    Json,
    /// `date.now` / `date.iso` / `date.format`
    Date,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Self::Console,
        Self::Math,
        Self::String,
        Self::Table,
        Self::Utf8,
        Self::Json,
        Self::Date,
    ];

    /// Global name under which the capability is installed.
    pub fn global_name(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Math => "math",
            Self::String => "string",
            Self::Table => "table",
            Self::Utf8 => "utf8",
            Self::Json => "json",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.global_name())
    }
}

/// The set of capabilities granted to a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    granted: BTreeSet<Capability>,
}

impl Capabilities {
    /// No capabilities at all; only the core language remains.
    pub fn none() -> Self {
        Self {
            granted: BTreeSet::new(),
        }
    }

    /// Every built-in capability.
    pub fn standard() -> Self {
        Self {
            granted: Capability::ALL.into_iter().collect(),
        }
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.granted.insert(capability);
        self
    }

    pub fn without(mut self, capability: Capability) -> Self {
        self.granted.remove(&capability);
        self
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.granted.contains(&capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.granted.iter().copied()
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::standard()
    }
}

/// A global the sandbox refuses to expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeniedGlobal {
    pub name: &'static str,
    pub category: &'static str,
}

impl DeniedGlobal {
    const fn new(name: &'static str, category: &'static str) -> Self {
        Self { name, category }
    }

    /// Message raised when a snippet reads this global.
    pub fn message(&self) -> String {
        format!(
            "'{}' is not available in the sandbox ({})",
            self.name, self.category
        )
    }

    /// Looks up a denied global by name.
    pub fn find(name: &str) -> Option<&'static DeniedGlobal> {
        DENIED_GLOBALS.iter().find(|d| d.name == name)
    }
}

/// Globals that raise a `SandboxError` when read.
pub const DENIED_GLOBALS: &[DeniedGlobal] = &[
    DeniedGlobal::new("io", "filesystem"),
    DeniedGlobal::new("dofile", "filesystem"),
    DeniedGlobal::new("loadfile", "filesystem"),
    DeniedGlobal::new("os", "environment"),
    DeniedGlobal::new("package", "module loading"),
    DeniedGlobal::new("require", "module loading"),
    DeniedGlobal::new("load", "code loading"),
    DeniedGlobal::new("loadstring", "code loading"),
    DeniedGlobal::new("coroutine", "scheduling"),
    DeniedGlobal::new("collectgarbage", "scheduling"),
    DeniedGlobal::new("debug", "introspection"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_grants_everything() {
        let caps = Capabilities::standard();
        for cap in Capability::ALL {
            assert!(caps.allows(cap), "{cap} should be granted");
        }
    }

    #[test]
    fn test_without_removes_capability() {
        let caps = Capabilities::standard().without(Capability::Json);
        assert!(!caps.allows(Capability::Json));
        assert!(caps.allows(Capability::Console));
    }

    #[test]
    fn test_denied_global_message() {
        let denied = DeniedGlobal::find("os").unwrap();
        assert_eq!(
            denied.message(),
            "'os' is not available in the sandbox (environment)"
        );
        assert!(DeniedGlobal::find("math").is_none());
    }
}
