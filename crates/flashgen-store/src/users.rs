//! Auth user lookup through the admin API.

use serde::Deserialize;
use tracing::debug;

use crate::client::SupabaseClient;
use crate::error::StoreResult;

/// Users fetched per admin API page.
const PAGE_SIZE: u32 = 200;

/// Upper bound on pages scanned for one lookup.
const MAX_PAGES: u32 = 50;

/// An auth user as returned by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUserRecord {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Finds auth users.
#[derive(Clone)]
pub struct UserDirectory {
    client: SupabaseClient,
}

impl UserDirectory {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Find a user by email (case-insensitive), scanning admin pages.
    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<AuthUserRecord>> {
        let wanted = email.trim();
        for page in 1..=MAX_PAGES {
            let users = self.client.list_auth_users(page, PAGE_SIZE).await?;
            let last_page = (users.len() as u32) < PAGE_SIZE;

            if let Some(user) = users.into_iter().find(|u| {
                u.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
            }) {
                return Ok(Some(user));
            }

            if last_page {
                break;
            }
        }
        debug!("No auth user found for email");
        Ok(None)
    }
}
