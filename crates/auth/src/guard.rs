use thiserror::Error;

use crate::SessionState;

pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/home";

/// What a route demands of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteRequirement {
    Public,
    Authenticated,
    AdminOnly,
    CanGenerateInvoice,
    CanViewReports,
}

impl RouteRequirement {
    /// Requirement for an application path. Unknown paths need a session.
    pub fn for_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let path = if trimmed.is_empty() { "/" } else { trimmed };

        match path {
            "/" | "/login" | "/signup" | "/forgot-password" => RouteRequirement::Public,
            "/generate-invoice" => RouteRequirement::CanGenerateInvoice,
            "/invoices" | "/reports" | "/inventory" | "/clients" | "/settings" | "/orders"
            | "/products" | "/add-product" => RouteRequirement::AdminOnly,
            _ => RouteRequirement::Authenticated,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuardRejection {
    #[error("login required (return to '{return_to}')")]
    LoginRequired { return_to: String },

    #[error("forbidden (redirect to '{redirect_to}')")]
    Forbidden { redirect_to: String },
}

impl GuardRejection {
    /// Where the user should be sent.
    pub fn redirect(&self) -> &str {
        match self {
            GuardRejection::LoginRequired { .. } => LOGIN_ROUTE,
            GuardRejection::Forbidden { redirect_to } => redirect_to,
        }
    }
}

/// Decide whether the session may open `path` under `requirement`.
///
/// Staff users pass every requirement once signed in.
pub fn guard(
    state: &SessionState,
    requirement: RouteRequirement,
    path: &str,
) -> Result<(), GuardRejection> {
    if requirement == RouteRequirement::Public {
        return Ok(());
    }

    if !state.is_authenticated() {
        tracing::debug!(path, "route needs login");
        return Err(GuardRejection::LoginRequired {
            return_to: path.to_string(),
        });
    }

    let profile = state.profile.as_ref();
    let allowed = match requirement {
        RouteRequirement::Public | RouteRequirement::Authenticated => true,
        RouteRequirement::AdminOnly => profile.is_some_and(|p| p.is_admin()),
        RouteRequirement::CanGenerateInvoice => profile.is_some_and(|p| p.may_generate_invoices()),
        RouteRequirement::CanViewReports => profile.is_some_and(|p| p.may_view_reports()),
    };

    if allowed {
        Ok(())
    } else {
        tracing::debug!(path, requirement = ?requirement, "route forbidden");
        Err(GuardRejection::Forbidden {
            redirect_to: HOME_ROUTE.to_string(),
        })
    }
}
