//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered user. The chain address is the identity used everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// Bech32 chain address
    pub address: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: String,
    pub bio: String,
    /// Invites this user may still send
    pub invites_left: i32,
    /// Address of the user who referred this one
    pub referred_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub address: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: String,
    pub referred_by: Option<String>,
}

/// A mobile device registered for push notifications.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceToken {
    pub id: i64,
    pub address: String,
    pub token: String,
    /// "ios" or "android"
    pub platform: String,
    pub created_at: DateTime<Utc>,
}
