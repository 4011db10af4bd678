//! Role/permission cache for the signed-in user.

use serde_json::Value;

use bizdesk_auth::{has_permission, Permission, RolePatch, RoleScope, RoleState};

use crate::state::{StateContainer, SubscriptionId};

/// In-memory only: roles are re-fetched after every sign-in.
#[derive(Debug, Clone, Default)]
pub struct RoleStore {
    state: StateContainer<RoleState>,
}

impl RoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> RoleState {
        self.state.get()
    }

    /// Replace every scope at once (e.g. after a role fetch).
    pub fn set(&self, roles: RoleState) -> bool {
        self.state.set(roles)
    }

    pub fn patch(&self, patch: RolePatch) -> bool {
        self.state.patch(patch)
    }

    pub fn set_scope(&self, scope: RoleScope, descriptor: Option<Value>) -> bool {
        self.state.patch(RolePatch::scope(scope, descriptor))
    }

    pub fn set_simple_roles(&self, roles: Option<Vec<Value>>) -> bool {
        self.state.patch(RolePatch::simple_roles(roles))
    }

    pub fn scope(&self, scope: RoleScope) -> Option<Value> {
        self.state.with(|s| s.scope(scope).cloned())
    }

    pub fn permissions(&self, scope: RoleScope) -> Vec<Permission> {
        self.state.with(|s| s.permissions(scope))
    }

    /// Gate check against the current role of `scope`.
    pub fn has_permission(&self, scope: RoleScope, module: &str, action: &str) -> bool {
        has_permission(&self.permissions(scope), module, action)
    }

    /// Reset every scope to null (sign-out).
    pub fn clear(&self) -> bool {
        self.state.set(RoleState::default())
    }

    pub fn subscribe(&self, listener: impl Fn(&RoleState) + Send + Sync + 'static) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }
}
