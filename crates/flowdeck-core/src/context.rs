use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{FlowdeckError, FlowdeckResult};

/// Role of the authenticated caller within their organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Editor,
    Admin,
}

impl Role {
    pub fn can_write(self) -> bool {
        !matches!(self, Role::Viewer)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }
}

/// Authenticated caller identity for one operation.
///
/// Constructed once per inbound operation by the auth boundary and passed
/// explicitly through every call; never read from ambient state. All reads
/// and writes are scoped to `org_id` — an entity in another org is reported
/// as not found, so its existence is never revealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub org_id: Uuid,
    pub role: Role,
}

impl RequestContext {
    pub fn new(user_id: Uuid, org_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            org_id,
            role,
        }
    }

    /// Authorization gate for mutating operations. Runs before any
    /// repository access, so a denied caller causes no side effects.
    pub fn ensure_can_write(&self) -> FlowdeckResult<()> {
        if self.role.can_write() {
            Ok(())
        } else {
            Err(FlowdeckError::Forbidden(format!(
                "role {} may not modify board data",
                self.role.as_str()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: Role) -> RequestContext {
        RequestContext::new(Uuid::new_v4(), Uuid::new_v4(), role)
    }

    #[test]
    fn test_viewer_cannot_write() {
        let err = ctx(Role::Viewer).ensure_can_write().unwrap_err();
        assert!(matches!(err, FlowdeckError::Forbidden(_)));
    }

    #[test]
    fn test_editor_and_admin_can_write() {
        assert!(ctx(Role::Editor).ensure_can_write().is_ok());
        assert!(ctx(Role::Admin).ensure_can_write().is_ok());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Editor).unwrap(), "\"editor\"");
    }
}
