//! Pluggable permission checks for assessment operations.
//!
//! Hosts swap [`DefaultPermissions`] for their own [`AssessmentPermissions`] implementation.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const ADD_RECORD: &str = "assess.add_assessmentrecord";
pub const CHANGE_RECORD: &str = "assess.change_assessmentrecord";
pub const DELETE_RECORD: &str = "assess.delete_assessmentrecord";

/// The acting user as seen by permission checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl User {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_authenticated: true,
            ..Self::default()
        }
    }

    pub fn staff(username: impl Into<String>) -> Self {
        Self {
            is_staff: true,
            ..Self::authenticated(username)
        }
    }

    pub fn with_permission(mut self, permission: &str) -> Self {
        self.permissions.insert(permission.to_string());
        self
    }

    pub fn has_perm(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        };
        f.write_str(verb)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user '{username}' is not permitted to {action} assessments")]
pub struct PermissionDenied {
    pub username: String,
    pub action: Action,
}

pub trait AssessmentPermissions: Send + Sync {
    fn can_view(&self, user: &User) -> bool;
    fn can_create(&self, user: &User) -> bool;
    fn can_edit(&self, user: &User) -> bool;
    fn can_delete(&self, user: &User) -> bool;

    fn allows(&self, action: Action, user: &User) -> bool {
        match action {
            Action::View => self.can_view(user),
            Action::Create => self.can_create(user),
            Action::Edit => self.can_edit(user),
            Action::Delete => self.can_delete(user),
        }
    }
}

/// Staff may do anything; other users need the matching record permission. Viewing only
/// requires a login when `login_required` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultPermissions {
    pub login_required: bool,
}

impl Default for DefaultPermissions {
    fn default() -> Self {
        Self {
            login_required: true,
        }
    }
}

impl AssessmentPermissions for DefaultPermissions {
    fn can_view(&self, user: &User) -> bool {
        !self.login_required || user.is_authenticated
    }

    fn can_create(&self, user: &User) -> bool {
        user.is_staff || user.has_perm(ADD_RECORD)
    }

    fn can_edit(&self, user: &User) -> bool {
        user.is_staff || user.has_perm(CHANGE_RECORD)
    }

    fn can_delete(&self, user: &User) -> bool {
        user.is_staff || user.has_perm(DELETE_RECORD)
    }
}

pub fn permission_required<P>(
    permissions: &P,
    action: Action,
    user: &User,
) -> Result<(), PermissionDenied>
where
    P: AssessmentPermissions + ?Sized,
{
    if permissions.allows(action, user) {
        Ok(())
    } else {
        Err(PermissionDenied {
            username: user.username.clone(),
            action,
        })
    }
}

/// Every permission answer for one user, for display layers that toggle controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermissionsContext {
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl PermissionsContext {
    pub fn for_user<P>(permissions: &P, user: &User) -> Self
    where
        P: AssessmentPermissions + ?Sized,
    {
        Self {
            can_view: permissions.can_view(user),
            can_create: permissions.can_create(user),
            can_edit: permissions.can_edit(user),
            can_delete: permissions.can_delete(user),
        }
    }
}
