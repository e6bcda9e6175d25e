use serde::{Deserialize, Serialize};

/// Coarse role used for route decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Role of an optional profile. No profile means `User`.
    pub fn of(profile: Option<&UserProfile>) -> Self {
        profile.map(UserProfile::role).unwrap_or(Role::User)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile of the signed-in user as reported by `/api/me/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub can_generate_invoice: bool,
    #[serde(default)]
    pub can_view_reports: bool,
}

impl UserProfile {
    pub fn role(&self) -> Role {
        if self.is_staff { Role::Admin } else { Role::User }
    }

    pub fn is_admin(&self) -> bool {
        self.is_staff
    }

    /// Staff may always generate invoices.
    pub fn may_generate_invoices(&self) -> bool {
        self.is_staff || self.can_generate_invoice
    }

    pub fn may_view_reports(&self) -> bool {
        self.is_staff || self.can_view_reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_is_admin() {
        let profile = UserProfile {
            username: "asha".to_string(),
            is_staff: true,
            can_generate_invoice: false,
            can_view_reports: false,
        };
        assert_eq!(profile.role(), Role::Admin);
        assert!(profile.may_generate_invoices());
        assert!(profile.may_view_reports());
    }

    #[test]
    fn missing_profile_is_plain_user() {
        assert_eq!(Role::of(None), Role::User);
    }

    #[test]
    fn missing_flags_default_to_false() {
        let profile: UserProfile = serde_json::from_str(r#"{"username":"ravi"}"#).unwrap();
        assert_eq!(profile.role(), Role::User);
        assert!(!profile.may_generate_invoices());
        assert!(!profile.may_view_reports());
    }
}
