//! Profile service.

use tracing::{debug, instrument};

use patient_dashboard_core::UserId;

use super::{RecordError, not_blank};
use crate::db::{Store, UserRepository};
use crate::models::{Entity, ProfileUpdate, User};

const NAME_REQUIRED: &str = "Please add a name";

/// Reads and updates the caller's own profile.
pub struct ProfileService<'a> {
    users: UserRepository<'a>,
}

impl<'a> ProfileService<'a> {
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self {
            users: UserRepository::new(store),
        }
    }

    /// The caller's user record.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` if the account has vanished.
    #[instrument(skip(self))]
    pub async fn get(&self, id: UserId) -> Result<User, RecordError> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or(RecordError::NotFound(Entity::User))
    }

    /// Merge a partial profile update. Email and password are untouched.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Validation` if the name is blanked.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: UserId, update: ProfileUpdate) -> Result<User, RecordError> {
        not_blank(update.name.as_deref(), NAME_REQUIRED)?;

        let mut user = self.get(id).await?;
        if let Some(name) = update.name.as_deref() {
            user.name = name.trim().to_owned();
        }
        user.profile.apply(update);

        let user = self
            .users
            .update_profile(id, &user.name, &user.profile)
            .await?
            .ok_or(RecordError::NotFound(Entity::User))?;

        debug!(user_id = %id, "Profile updated");
        Ok(user)
    }
}
