use crate::models::user::User;
use crate::security::token::{self, TOKEN_LENGTH};
use crate::utils::auth::secrets_match;
use crate::wal::wal::{Wal, WalOperation};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Login is already taken")]
    LoginTaken,

    #[error("Invalid login or password")]
    InvalidCredentials,
}

/// In-memory identity store
///
/// Users are keyed by ID with secondary indexes on login and on the
/// current session token. A token resolves only while it is still the
/// user's current one. Registrations and token issues are journaled
/// while the affected entry is locked.
pub struct UserStore {
    users: DashMap<u64, User>,
    logins: DashMap<String, u64>,
    tokens: DashMap<String, u64>,
    next_id: AtomicU64,
    wal: Arc<Wal>,
}

impl UserStore {
    pub fn new(wal: Arc<Wal>) -> Self {
        Self::with_capacity(0, wal)
    }

    pub fn with_capacity(capacity: usize, wal: Arc<Wal>) -> Self {
        Self {
            users: DashMap::with_capacity(capacity),
            logins: DashMap::with_capacity(capacity),
            tokens: DashMap::with_capacity(capacity),
            next_id: AtomicU64::new(1),
            wal,
        }
    }

    /// Create a user without a session token
    ///
    /// The login slot is held for the duration of the insert, so two
    /// concurrent registrations of one login cannot both succeed, and
    /// the user cannot log in before the registration is journaled.
    pub fn register(&self, login: &str, password_hash: &str) -> Result<User, StoreError> {
        match self.logins.entry(login.to_string()) {
            Entry::Occupied(_) => Err(StoreError::LoginTaken),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let user = User::new(id, login.to_string(), password_hash.to_string());

                self.journal(WalOperation::Register {
                    id,
                    login: user.login.clone(),
                    password_hash: user.password_hash.clone(),
                });
                self.users.insert(id, user.clone());
                slot.insert(id);

                Ok(user)
            }
        }
    }

    /// Verify credentials and issue a fresh session token
    ///
    /// Any previous token of the user stops resolving. Returns the user
    /// with the new token set.
    pub fn login(
        &self,
        login: &str,
        password_hash: &str,
        issued_at: i64,
    ) -> Result<User, StoreError> {
        let user_id = *self
            .logins
            .get(login)
            .ok_or(StoreError::InvalidCredentials)?;

        let token = loop {
            let candidate = token::generate(TOKEN_LENGTH);
            if !self.tokens.contains_key(&candidate) {
                break candidate;
            }
        };

        let mut user = self
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::InvalidCredentials)?;

        if !secrets_match(password_hash, &user.password_hash) {
            return Err(StoreError::InvalidCredentials);
        }

        self.journal(WalOperation::IssueToken {
            user_id,
            token: token.clone(),
            issued_at,
        });
        self.replace_token(&mut user, token, issued_at);

        Ok(user.clone())
    }

    /// Replay a journaled token issue
    ///
    /// Returns the updated user, or `None` if no such user exists.
    pub fn restore_token(&self, user_id: u64, token: String, issued_at: i64) -> Option<User> {
        let mut user = self.users.get_mut(&user_id)?;
        self.replace_token(&mut user, token, issued_at);
        Some(user.clone())
    }

    /// Put back a user read from persistent storage
    pub fn restore_user(&self, user: User) {
        self.next_id.fetch_max(user.id + 1, Ordering::Relaxed);
        if let Some(token) = &user.token {
            self.tokens.insert(token.clone(), user.id);
        }
        self.logins.insert(user.login.clone(), user.id);
        self.users.insert(user.id, user);
    }

    pub fn find_by_login(&self, login: &str) -> Option<User> {
        let id = *self.logins.get(login)?;
        self.get_user(id)
    }

    /// Resolve a bearer token to its user
    pub fn find_by_token(&self, token: &str) -> Option<User> {
        let id = *self.tokens.get(token)?;
        let user = self.get_user(id)?;

        // the index may briefly lag a concurrent login
        if user.token.as_deref() == Some(token) {
            Some(user)
        } else {
            None
        }
    }

    pub fn get_user(&self, user_id: u64) -> Option<User> {
        self.users.get(&user_id).map(|entry| entry.value().clone())
    }

    /// Every user in ID order
    pub fn snapshot(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by_key(|user| user.id);
        users
    }

    pub fn contains(&self, user_id: u64) -> bool {
        self.users.contains_key(&user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn replace_token(&self, user: &mut User, token: String, issued_at: i64) {
        if let Some(old) = user.token.replace(token.clone()) {
            self.tokens.remove(&old);
        }
        user.token_issued_at = Some(issued_at);
        self.tokens.insert(token, user.id);
    }

    fn journal(&self, op: WalOperation) {
        if let Err(e) = self.wal.log_operation(op) {
            warn!(error = %e, "Failed to log identity change to WAL");
        }
    }
}
