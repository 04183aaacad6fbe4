//! Fixtures shared by the unit tests.

use std::sync::Arc;

use chrono::Utc;

use crate::accounts::Session;
use crate::auth::Claims;
use crate::models::{AccountStatus, User};
use crate::store::{MemoryStore, Store, UserStore};

pub(crate) fn verified_user(id: &str, name: &str) -> User {
    let now = Utc::now();
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{id}@example.com"),
        mis: "612303001".to_string(),
        password_hash: "hash".to_string(),
        profile_pic: None,
        status: AccountStatus::Verified,
        email_otp: None,
        email_otp_expires: None,
        password_reset_token: None,
        password_reset_expires: None,
        password_changed_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn session_for(user: &User) -> Session {
    let now = Utc::now().timestamp();
    Session {
        user: user.clone(),
        claims: Claims {
            id: user.id.clone(),
            email: user.email.clone(),
            mis: user.mis.clone(),
            iat: now,
            exp: now + 3_600,
        },
    }
}

/// A memory store holding the given users, plus a session for each
pub(crate) async fn store_with_users(users: &[(&str, &str)]) -> (Arc<dyn Store>, Vec<Session>) {
    let store = MemoryStore::new();
    let mut sessions = Vec::new();
    for (id, name) in users {
        let user = verified_user(id, name);
        store.insert_user(&user).await.unwrap();
        sessions.push(session_for(&user));
    }
    (Arc::new(store), sessions)
}
