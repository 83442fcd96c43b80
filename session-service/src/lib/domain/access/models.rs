use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Named category of users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const SUPERADMIN: Role = Role(Cow::Borrowed("superadmin"));
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const MODERATOR: Role = Role(Cow::Borrowed("moderator"));
    pub const USER: Role = Role(Cow::Borrowed("user"));

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionCode(Cow<'static, str>);

impl PermissionCode {
    pub const DEBUGVARS_VIEW: PermissionCode = PermissionCode(Cow::Borrowed("debugvars:view"));
    pub const ADMINS_VIEW: PermissionCode = PermissionCode(Cow::Borrowed("admins:view"));
    pub const ADMINS_MANAGE: PermissionCode = PermissionCode(Cow::Borrowed("admins:manage"));
    pub const USERS_VIEW: PermissionCode = PermissionCode(Cow::Borrowed("users:view"));
    pub const USERS_MANAGE: PermissionCode = PermissionCode(Cow::Borrowed("users:manage"));
    pub const ROLES_VIEW: PermissionCode = PermissionCode(Cow::Borrowed("roles:view"));
    pub const ROLES_MANAGE: PermissionCode = PermissionCode(Cow::Borrowed("roles:manage"));

    pub fn new(code: impl Into<String>) -> Self {
        Self(Cow::Owned(code.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of permission codes held by a session, built once per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionMap(HashSet<PermissionCode>);

impl PermissionMap {
    pub fn contains(&self, code: &PermissionCode) -> bool {
        self.0.contains(code)
    }

    pub fn contains_all(&self, codes: &[PermissionCode]) -> bool {
        codes.iter().all(|code| self.contains(code))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Codes in lexical order.
    pub fn codes(&self) -> Vec<PermissionCode> {
        let mut codes: Vec<PermissionCode> = self.0.iter().cloned().collect();
        codes.sort();
        codes
    }
}

impl FromIterator<PermissionCode> for PermissionMap {
    fn from_iter<I: IntoIterator<Item = PermissionCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
