use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Permission;

/// Authorization scope a role descriptor applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleScope {
    Platform,
    Organization,
    Workspace,
    Project,
    Team,
}

impl RoleScope {
    pub const ALL: [RoleScope; 5] = [
        RoleScope::Platform,
        RoleScope::Organization,
        RoleScope::Workspace,
        RoleScope::Project,
        RoleScope::Team,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleScope::Platform => "platform",
            RoleScope::Organization => "organization",
            RoleScope::Workspace => "workspace",
            RoleScope::Project => "project",
            RoleScope::Team => "team",
        }
    }
}

impl core::fmt::Display for RoleScope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles held by the signed-in user, one opaque descriptor per scope.
///
/// The descriptor shape is owned by the backend, so it is kept as raw JSON
/// here. All five scope keys are always present (possibly `null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleState {
    pub platform: Option<Value>,
    pub organization: Option<Value>,
    pub workspace: Option<Value>,
    pub project: Option<Value>,
    pub team: Option<Value>,
    pub simple_roles: Option<Vec<Value>>,
}

/// Partial update for [`RoleState`]; `None` fields keep the current value.
///
/// To clear a scope explicitly use `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RolePatch {
    pub platform: Option<Option<Value>>,
    pub organization: Option<Option<Value>>,
    pub workspace: Option<Option<Value>>,
    pub project: Option<Option<Value>>,
    pub team: Option<Option<Value>>,
    pub simple_roles: Option<Option<Vec<Value>>>,
}

impl RolePatch {
    pub fn scope(scope: RoleScope, descriptor: Option<Value>) -> Self {
        let mut patch = Self::default();
        *patch.slot_mut(scope) = Some(descriptor);
        patch
    }

    pub fn simple_roles(roles: Option<Vec<Value>>) -> Self {
        Self {
            simple_roles: Some(roles),
            ..Self::default()
        }
    }

    fn slot_mut(&mut self, scope: RoleScope) -> &mut Option<Option<Value>> {
        match scope {
            RoleScope::Platform => &mut self.platform,
            RoleScope::Organization => &mut self.organization,
            RoleScope::Workspace => &mut self.workspace,
            RoleScope::Project => &mut self.project,
            RoleScope::Team => &mut self.team,
        }
    }
}

impl RoleState {
    pub fn scope(&self, scope: RoleScope) -> Option<&Value> {
        match scope {
            RoleScope::Platform => self.platform.as_ref(),
            RoleScope::Organization => self.organization.as_ref(),
            RoleScope::Workspace => self.workspace.as_ref(),
            RoleScope::Project => self.project.as_ref(),
            RoleScope::Team => self.team.as_ref(),
        }
    }

    pub fn set_scope(&mut self, scope: RoleScope, descriptor: Option<Value>) {
        let slot = match scope {
            RoleScope::Platform => &mut self.platform,
            RoleScope::Organization => &mut self.organization,
            RoleScope::Workspace => &mut self.workspace,
            RoleScope::Project => &mut self.project,
            RoleScope::Team => &mut self.team,
        };
        *slot = descriptor;
    }

    /// Shallow merge: every field present in the patch replaces ours.
    pub fn apply(&mut self, patch: RolePatch) {
        let RolePatch {
            platform,
            organization,
            workspace,
            project,
            team,
            simple_roles,
        } = patch;

        for (scope, value) in [
            (RoleScope::Platform, platform),
            (RoleScope::Organization, organization),
            (RoleScope::Workspace, workspace),
            (RoleScope::Project, project),
            (RoleScope::Team, team),
        ] {
            if let Some(descriptor) = value {
                self.set_scope(scope, descriptor);
            }
        }

        if let Some(roles) = simple_roles {
            self.simple_roles = roles;
        }
    }

    /// Permission records carried by a scope's descriptor.
    ///
    /// Accepts either `{ "permissions": [...] }` or a bare array. Entries that
    /// do not decode as a [`Permission`] are skipped; a missing or oddly shaped
    /// descriptor yields an empty list (which denies everything).
    pub fn permissions(&self, scope: RoleScope) -> Vec<Permission> {
        let raw = match self.scope(scope) {
            Some(Value::Array(items)) => items,
            Some(Value::Object(map)) => match map.get("permissions") {
                Some(Value::Array(items)) => items,
                _ => return Vec::new(),
            },
            _ => return Vec::new(),
        };

        raw.iter()
            .filter_map(|item| match serde_json::from_value::<Permission>(item.clone()) {
                Ok(p) => Some(p),
                Err(err) => {
                    tracing::debug!(%scope, "skipping malformed permission record: {err}");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_has_all_scopes_null() {
        let state = RoleState::default();
        let encoded = serde_json::to_value(&state).unwrap();

        assert_eq!(
            encoded,
            json!({
                "platform": null,
                "organization": null,
                "workspace": null,
                "project": null,
                "team": null,
                "simpleRoles": null
            })
        );
    }

    #[test]
    fn patch_merges_shallowly() {
        let mut state = RoleState {
            platform: Some(json!({ "name": "owner" })),
            ..RoleState::default()
        };

        state.apply(RolePatch::scope(
            RoleScope::Project,
            Some(json!({ "name": "lead" })),
        ));

        assert_eq!(state.platform, Some(json!({ "name": "owner" })));
        assert_eq!(state.project, Some(json!({ "name": "lead" })));
        assert!(state.team.is_none());
    }

    #[test]
    fn patch_can_clear_a_scope() {
        let mut state = RoleState {
            team: Some(json!({ "name": "member" })),
            ..RoleState::default()
        };

        state.apply(RolePatch::scope(RoleScope::Team, None));
        assert!(state.team.is_none());
    }

    #[test]
    fn permissions_from_descriptor_object() {
        let state = RoleState {
            organization: Some(json!({
                "name": "admin",
                "permissions": [
                    { "module": "hr", "actions": ["VIEW"] },
                    { "bogus": true },
                    { "module": "crm", "actions": ["VIEW", "EDIT"] }
                ]
            })),
            ..RoleState::default()
        };

        let perms = state.permissions(RoleScope::Organization);
        assert_eq!(perms.len(), 2);
        assert!(crate::has_permission(&perms, "crm", "EDIT"));
    }

    #[test]
    fn permissions_from_bare_array() {
        let state = RoleState {
            workspace: Some(json!([{ "module": "project", "actions": ["VIEW"] }])),
            ..RoleState::default()
        };

        assert_eq!(
            state.permissions(RoleScope::Workspace),
            vec![Permission::new("project", ["VIEW"])]
        );
    }

    #[test]
    fn missing_descriptor_has_no_permissions() {
        let state = RoleState::default();
        for scope in RoleScope::ALL {
            assert!(state.permissions(scope).is_empty());
        }
    }
}
