//! User-management records exchanged with the banking API

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Back-office role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Staff,
    Manager,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::User, Role::Admin, Role::Staff, Role::Manager];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Manager => "manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid role: {}", s))
    }
}

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            AccountStatus::Active => AccountStatus::Inactive,
            AccountStatus::Inactive => AccountStatus::Active,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

/// One row of the user-management list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default = "not_available")]
    pub department: String,
    /// "Active" or "Inactive"
    pub status: String,
    #[serde(rename = "lastLogin", default = "never")]
    pub last_login: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn not_available() -> String {
    "N/A".to_string()
}

fn never() -> String {
    "Never".to_string()
}

impl UserRecord {
    pub fn account_status(&self) -> Option<AccountStatus> {
        self.status.parse().ok()
    }

    pub fn is_active(&self) -> bool {
        self.account_status() == Some(AccountStatus::Active)
    }
}

/// Payload for creating a user (admin only)
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub department: String,
    pub status: AccountStatus,
}

/// Partial update; unset fields are left untouched by the server
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
}

impl UserUpdate {
    pub fn status(status: AccountStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role.is_none()
            && self.department.is_none()
            && self.status.is_none()
    }
}

/// Dashboard counters from `/users/stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: u64,
    pub active_users: u64,
    pub pending_approvals: u64,
    pub new_users_this_month: u64,
}

/// Answer of a create/update/delete call
#[derive(Debug, Clone, Deserialize)]
pub struct MutationReceipt {
    #[serde(default = "succeeded")]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

fn succeeded() -> bool {
    true
}

impl MutationReceipt {
    /// Server-assigned id, if the answer carries one.
    pub fn id(&self) -> Option<i64> {
        self.data.as_ref()?.get("id")?.as_i64()
    }

    /// Affected user's name, if the answer carries one.
    pub fn name(&self) -> Option<&str> {
        self.data.as_ref()?.get("name")?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_parsing_ignores_case() {
        assert_eq!("Manager".parse::<Role>(), Ok(Role::Manager));
        assert_eq!(" ADMIN ".parse::<Role>(), Ok(Role::Admin));
        assert!("auditor".parse::<Role>().is_err());
        assert_eq!(Role::Staff.to_string(), "staff");
    }

    #[test]
    fn user_record_defaults() {
        let user: UserRecord = serde_json::from_value(json!({
            "id": 7,
            "name": "Jane Doe",
            "email": "jane@abcbank.com",
            "role": "manager",
            "status": "Active"
        }))
        .unwrap();
        assert_eq!(user.department, "N/A");
        assert_eq!(user.last_login, "Never");
        assert!(user.is_active());
    }

    #[test]
    fn update_skips_unset_fields() {
        let update = UserUpdate::status(AccountStatus::Inactive);
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "status": "inactive" })
        );
        assert!(!update.is_empty());
        assert!(UserUpdate::default().is_empty());
    }

    #[test]
    fn stats_use_camel_case() {
        let stats: UserStats = serde_json::from_value(json!({
            "totalUsers": 23,
            "activeUsers": 20,
            "pendingApprovals": 3,
            "newUsersThisMonth": 4
        }))
        .unwrap();
        assert_eq!(stats.pending_approvals, 3);
    }

    #[test]
    fn receipt_exposes_id_and_name() {
        let receipt: MutationReceipt = serde_json::from_value(json!({
            "success": true,
            "message": "User created successfully",
            "data": { "id": 42, "name": "New Teller" }
        }))
        .unwrap();
        assert_eq!(receipt.id(), Some(42));
        assert_eq!(receipt.name(), Some("New Teller"));
    }
}
