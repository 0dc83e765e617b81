//! Authentication state owned by a single client.
//!
//! Transitions:
//! - `establish` after a successful login sets every field.
//! - `replace_access_token` after a successful refresh swaps the token and,
//!   when the server rotates it, the refresh token.
//! - `clear` on logout empties every field.
//!
//! Failed calls never reach these methods, so a failed login or refresh
//! leaves the previous state intact.

use crate::types::{LoginResponse, TokenResponse, User};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    access_token: Option<String>,
    refresh_token: Option<String>,
    organization_id: Option<String>,
    user: Option<User>,
}

impl Session {
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.organization_id.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub(crate) fn establish(&mut self, login: LoginResponse) -> User {
        self.access_token = Some(login.access_token);
        self.refresh_token = login.refresh_token;
        self.organization_id = Some(login.user.organization_id.clone());
        self.user = Some(login.user.clone());
        login.user
    }

    pub(crate) fn replace_access_token(&mut self, tokens: TokenResponse) -> String {
        if let Some(refresh) = tokens.refresh_token {
            self.refresh_token = Some(refresh);
        }
        self.access_token = Some(tokens.access_token.clone());
        tokens.access_token
    }

    pub(crate) fn clear(&mut self) {
        *self = Session::default();
    }
}
