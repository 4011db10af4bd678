use serde::{Deserialize, Serialize};

/// A grant of allowed actions on one module.
///
/// Wire shape: `{ "module": "project", "actions": ["VIEW", "EDIT"] }`.
/// Module names are unique by convention only; nothing enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub module: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl Permission {
    pub fn new<A, S>(module: impl Into<String>, actions: A) -> Self
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            module: module.into(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:[{}]", self.module, self.actions.join(","))
    }
}

/// Decide whether `permissions` grant `action` on `module`.
///
/// The first record whose module matches wins, even if a later duplicate
/// would allow the action. Matching is exact: no case folding, no wildcards,
/// no module hierarchy. An empty slice denies everything.
///
/// - No IO
/// - No panics
pub fn has_permission(permissions: &[Permission], module: &str, action: &str) -> bool {
    permissions
        .iter()
        .find(|p| p.module == module)
        .is_some_and(|p| p.allows(action))
}
