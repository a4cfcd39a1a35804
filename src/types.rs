/// Shared domain types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Portal roles, lowest privilege first.
///
/// Role is a closed enumeration so every dispatch over it is a total match;
/// adding a role without handling it everywhere is a compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Parent,
    Educator,
    Admin,
    #[serde(rename = "IT")]
    It,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Parent, Role::Educator, Role::Admin, Role::It];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Parent => "Parent",
            Role::Educator => "Educator",
            Role::Admin => "Admin",
            Role::It => "IT",
        }
    }

    /// True for roles allowed on the IT-or-admin routes.
    pub fn can_manage_issues(&self) -> bool {
        matches!(self, Role::It | Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Parent
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Parent" => Ok(Role::Parent),
            "Educator" => Ok(Role::Educator),
            "Admin" => Ok(Role::Admin),
            "IT" => Ok(Role::It),
            _ => Err(InvalidRole(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvalidRole(pub String);

impl fmt::Display for InvalidRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let valid = Role::ALL.map(|r| r.as_str()).join(", ");
        write!(f, "Invalid role '{}'. Must be one of: {}", self.0, valid)
    }
}

impl std::error::Error for InvalidRole {}

/// A user profile as stored in the record store and returned on the wire.
///
/// `id` is the record-store row id; `uid` is the identity-provider subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A support issue row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub issue: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Self-service profile update. Role is not representable here, so the
/// self-service route cannot mutate it no matter what the payload carries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.phone.is_none()
    }
}

/// Derive the default display name for a new profile from the local part of
/// the email address: "john.doe@x.com" becomes "John Doe".
pub fn default_display_name(email: &str) -> String {
    let local = email.split('@').next().unwrap_or("");
    local
        .split(['.', '_', '-'])
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
