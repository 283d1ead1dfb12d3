//! Authenticated identity.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Role carried in the credential token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer.
    #[default]
    User,
    /// Catalog administrator.
    Admin,
}

/// Identity of the signed-in user, derived from the credential token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    /// Subject id (`sub` claim).
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Role claim.
    pub role: Role,
}

impl Session {
    /// Returns `true` for administrators.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns `true` if this session may act on a resource owned by `owner`.
    #[must_use]
    pub fn can_act_for(&self, owner: &UserId) -> bool {
        self.is_admin() || &self.user_id == owner
    }
}
