use serde::Serialize;

use super::extractors::SessionStatus;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthSlot {
    /// Status unknown; the slot renders nothing. Follows
    /// [`SessionStatus::Unknown`], which secret-keyed sessions never produce.
    Loading,
    Authenticated {
        display_name: String,
        sign_out: &'static str,
    },
    Anonymous {
        sign_in: Option<String>,
    },
}

/// Navigation plus the auth control shown on every page.
#[derive(Debug, Serialize)]
pub struct HeaderView {
    pub home: &'static str,
    pub dashboard: Option<&'static str>,
    pub auth: AuthSlot,
}

impl HeaderView {
    pub fn new(status: &SessionStatus, default_provider: Option<&str>) -> Self {
        match status {
            SessionStatus::Authenticated(session) => HeaderView {
                home: "/",
                dashboard: Some("/dashboard"),
                auth: AuthSlot::Authenticated {
                    display_name: session
                        .display_name()
                        .unwrap_or(&session.email)
                        .to_uppercase(),
                    sign_out: "/auth/signout",
                },
            },
            SessionStatus::Anonymous => HeaderView {
                home: "/",
                dashboard: None,
                auth: AuthSlot::Anonymous {
                    sign_in: default_provider.map(|p| format!("/auth/signin/{p}")),
                },
            },
            SessionStatus::Unknown => HeaderView {
                home: "/",
                dashboard: None,
                auth: AuthSlot::Loading,
            },
        }
    }
}
