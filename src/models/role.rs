use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Platform-wide role names. The catalog is static reference data; rows in
/// the `roles` table carrying any other name are dropped during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Admin,
    Mod,
    Member,
    Owner,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "admin",
            RoleName::Mod => "mod",
            RoleName::Member => "member",
            RoleName::Owner => "owner",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(RoleName::Admin),
            "mod" => Ok(RoleName::Mod),
            "member" => Ok(RoleName::Member),
            "owner" => Ok(RoleName::Owner),
            _ => Err(()),
        }
    }
}

/// Row in the `roles` catalog table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: i32,
    pub name: String,
}

/// Join row assigning a platform role to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleAssignment {
    pub user_id: Uuid,
    pub role_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_name_round_trips() {
        for name in ["admin", "mod", "member", "owner"] {
            let role: RoleName = name.parse().unwrap();
            assert_eq!(role.as_str(), name);
        }
    }

    #[test]
    fn unknown_role_names_fail_to_parse() {
        assert!("superuser".parse::<RoleName>().is_err());
        assert!("Admin".parse::<RoleName>().is_err());
    }
}
