use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Staff,
}

/// Claims of the access token issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: StaffRole,
    pub exp: usize,
    pub iat: usize,
}

/// Extracted from the validated JWT, available via Axum extractors
#[derive(Debug, Clone)]
pub struct AuthenticatedStaff {
    pub user_id: String,
    pub email: Option<String>,
    pub role: StaffRole,
}

impl AuthenticatedStaff {
    pub fn is_admin(&self) -> bool {
        self.role == StaffRole::Admin
    }
}
