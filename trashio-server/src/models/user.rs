//! User accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use trashio_common::{Error, Result};
use uuid::Uuid;

use super::GeoPoint;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Citizen,
    #[serde(alias = "cleaner")]
    Worker,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Worker => "worker",
            Role::Admin => "admin",
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

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "citizen" => Ok(Role::Citizen),
            "worker" | "cleaner" => Ok(Role::Worker),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    /// Last known position; only meaningful for workers
    pub location: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
}

/// Account creation request
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

impl NewUser {
    /// Check field bounds and build the account
    ///
    /// Email is trimmed and lower-cased so uniqueness is case-insensitive.
    pub fn into_user(self) -> Result<User> {
        let full_name = self.full_name.trim().to_string();
        let name_len = full_name.chars().count();
        if !(2..=80).contains(&name_len) {
            return Err(Error::InvalidInput(
                "full_name must be 2-80 characters".to_string(),
            ));
        }

        let email = self.email.trim().to_lowercase();
        let well_formed = email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !well_formed {
            return Err(Error::InvalidInput(format!("invalid email '{email}'")));
        }

        if let Some(location) = self.location {
            if !location.is_valid() {
                return Err(Error::InvalidInput("location out of range".to_string()));
            }
        }

        Ok(User {
            id: Uuid::new_v4(),
            full_name,
            email,
            role: self.role,
            is_active: true,
            location: self.location,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            full_name: name.to_string(),
            email: email.to_string(),
            role: Role::Citizen,
            location: None,
        }
    }

    #[test]
    fn test_email_is_normalised() {
        let user = new_user("Ada Lovelace", "  Ada@Example.ORG ").into_user().unwrap();
        assert_eq!(user.email, "ada@example.org");
        assert!(user.is_active);
    }

    #[test]
    fn test_name_bounds() {
        assert!(new_user("A", "a@b.co").into_user().is_err());
        assert!(new_user("Al", "a@b.co").into_user().is_ok());
        assert!(new_user(&"x".repeat(81), "a@b.co").into_user().is_err());
    }

    #[test]
    fn test_bad_email_rejected() {
        assert!(matches!(
            new_user("Ada", "not-an-email").into_user(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cleaner_is_an_alias_for_worker() {
        let role: Role = serde_json::from_str("\"cleaner\"").unwrap();
        assert_eq!(role, Role::Worker);
        assert_eq!("cleaner".parse::<Role>(), Ok(Role::Worker));
    }
}
