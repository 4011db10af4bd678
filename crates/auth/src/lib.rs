//! `bizdesk-auth` — client-side authorization state.
//!
//! Pure data + decision functions: permission records, the permission
//! resolver, and the per-scope role state fetched from the backend.
//! No IO, no storage, no HTTP.

pub mod permissions;
pub mod roles;

pub use permissions::{has_permission, Permission};
pub use roles::{RolePatch, RoleScope, RoleState};
