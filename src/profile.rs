//! Lazy creation of application profiles
//!
//! A profile row is created the first time a signed-in user is seen without
//! one. Creation checks for an existing row first; two concurrent first
//! visits can still both pass the check, in which case the second insert
//! fails on the primary key and surfaces as [`Provisioning::Failed`].

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::auth::{IdentityProvider, User};
use crate::error::{Error, Result};
use crate::models::{NewProfile, Profile};
use crate::postgrest::PostgrestClient;

/// Access to the `profiles` table
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// The profile with this id, if one exists
    async fn find(&self, user_id: &str) -> Result<Option<Profile>>;

    /// Insert a profile and return the stored row
    async fn insert(&self, profile: &NewProfile) -> Result<Profile>;
}

#[async_trait]
impl ProfileStore for PostgrestClient {
    async fn find(&self, user_id: &str) -> Result<Option<Profile>> {
        self.select("*").eq("id", user_id).maybe_single().await
    }

    async fn insert(&self, profile: &NewProfile) -> Result<Profile> {
        PostgrestClient::insert(self, profile).single().await
    }
}

/// Outcome of looking up or creating a profile
#[derive(Debug)]
pub enum Provisioning {
    /// The profile was already there
    Existing(Profile),
    /// The profile was created by this call
    Created(Profile),
    /// No profile, and none may be created for this id
    Missing,
    /// The store or the identity provider failed
    Failed(Error),
}

impl Provisioning {
    /// The profile, if one is available
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Provisioning::Existing(p) | Provisioning::Created(p) => Some(p),
            _ => None,
        }
    }

    /// Degrade to an optional profile
    pub fn into_profile(self) -> Option<Profile> {
        match self {
            Provisioning::Existing(p) | Provisioning::Created(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Provisioning::Created(_))
    }
}

/// Finds profiles and creates missing ones for the signed-in user
pub struct ProfileProvisioner<'a> {
    identity: &'a dyn IdentityProvider,
    store: &'a dyn ProfileStore,
}

impl<'a> ProfileProvisioner<'a> {
    pub fn new(identity: &'a dyn IdentityProvider, store: &'a dyn ProfileStore) -> Self {
        Self { identity, store }
    }

    /// Look up a profile, creating it when `user_id` is the signed-in user
    pub async fn get_user_profile(&self, user_id: &str) -> Provisioning {
        match self.store.find(user_id).await {
            Ok(Some(profile)) => return Provisioning::Existing(profile),
            Ok(None) => {}
            Err(e) => {
                error!("Error fetching profile for {}: {}", user_id, e);
                return Provisioning::Failed(e);
            }
        }

        info!("No profile found for user {}, attempting to create one", user_id);
        match self.identity.get_user().await {
            Ok(Some(user)) if user.id == user_id => self.create_user_profile(&user).await,
            Ok(_) => Provisioning::Missing,
            Err(e) => {
                warn!("Could not resolve the current user: {}", e);
                Provisioning::Failed(e)
            }
        }
    }

    /// Create the profile for `user` unless it already exists
    pub async fn create_user_profile(&self, user: &User) -> Provisioning {
        match self.store.find(&user.id).await {
            Ok(Some(profile)) => return Provisioning::Existing(profile),
            Ok(None) => {}
            Err(e) => {
                error!("Error checking profile for {}: {}", user.id, e);
                return Provisioning::Failed(e);
            }
        }

        let profile = NewProfile::for_user(user);
        match self.store.insert(&profile).await {
            Ok(created) => {
                info!("Created profile for user {}", user.id);
                Provisioning::Created(created)
            }
            Err(e) => {
                error!("Error creating profile for {}: {}", user.id, e);
                Provisioning::Failed(e)
            }
        }
    }
}
