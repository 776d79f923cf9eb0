//! User and session models

use crate::{Caller, Xp};
use serde::{Deserialize, Serialize};

/// Session response from `GET /auth/session`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: UserData,
}

impl SessionResponse {
    /// Convert to UserProfile for internal use
    pub fn into_user_profile(self) -> UserProfile {
        let display_name = self
            .user
            .display_name
            .or(self.user.name)
            .unwrap_or_else(|| self.user.username.clone());

        UserProfile {
            id: crate::models::id_to_string(&self.user.id),
            username: self.user.username,
            display_name,
            is_admin: self.user.is_admin || self.user.role.as_deref() == Some("admin"),
            xp: Xp(self.user.xp.or(self.user.total_xp).unwrap_or(0)),
        }
    }
}

/// User data from the session response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: serde_json::Value,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, alias = "is_admin")]
    pub is_admin: bool,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub xp: Option<i64>,
    #[serde(default, alias = "total_xp")]
    pub total_xp: Option<i64>,
}

/// User profile information (internal representation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub xp: Xp,
}

impl UserProfile {
    pub fn caller(&self) -> Caller {
        Caller {
            user_id: self.id.clone(),
            is_admin: self.is_admin,
        }
    }
}
