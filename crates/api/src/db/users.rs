//! User repository for database operations.
//!
//! Users and their password hashes live in separate tables so that profile
//! reads never touch credentials.

use chrono::{DateTime, NaiveDate, Utc};

use patient_dashboard_core::{Email, UserId};

use super::memory::StoredUser;
use super::{RepositoryError, Store, conflict_on_unique};
use crate::models::{Address, Profile, User};

macro_rules! user_columns {
    () => {
        "u.id, u.name, u.email, u.profile_image, u.phone_number, \
         u.address_street, u.address_city, u.address_state, u.address_zip_code, \
         u.address_country, u.target_weight, u.height, u.age, u.gender, \
         u.blood_group, u.date_of_birth, u.created_at, u.updated_at"
    };
}

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    profile_image: Option<String>,
    phone_number: Option<String>,
    address_street: Option<String>,
    address_city: Option<String>,
    address_state: Option<String>,
    address_zip_code: Option<String>,
    address_country: Option<String>,
    target_weight: Option<f64>,
    height: Option<f64>,
    age: Option<i32>,
    gender: String,
    blood_group: String,
    date_of_birth: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let gender = row.gender.parse().map_err(RepositoryError::DataCorruption)?;
        let blood_group = row
            .blood_group
            .parse()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            profile: Profile {
                profile_image: row.profile_image,
                phone_number: row.phone_number,
                address: Address {
                    street: row.address_street,
                    city: row.address_city,
                    state: row.address_state,
                    zip_code: row.address_zip_code,
                    country: row.address_country,
                },
                target_weight: row.target_weight,
                height: row.height,
                age: row.age,
                gender,
                blood_group,
                date_of_birth: row.date_of_birth,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// User row joined with its password hash.
#[derive(Debug, sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    store: &'a Store,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let row = sqlx::query_as::<_, UserRow>(concat!(
                    "SELECT ",
                    user_columns!(),
                    " FROM dashboard.user u WHERE u.id = $1"
                ))
                .bind(id)
                .fetch_optional(pool)
                .await?;

                row.map(TryInto::try_into).transpose()
            }
            Store::Memory(mem) => Ok(mem.users.lock().await.get(&id).map(|s| s.user.clone())),
        }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let row = sqlx::query_as::<_, UserRow>(concat!(
                    "SELECT ",
                    user_columns!(),
                    " FROM dashboard.user u WHERE u.email = $1"
                ))
                .bind(email.as_str())
                .fetch_optional(pool)
                .await?;

                row.map(TryInto::try_into).transpose()
            }
            Store::Memory(mem) => Ok(mem
                .users
                .lock()
                .await
                .values()
                .find(|s| &s.user.email == email)
                .map(|s| s.user.clone())),
        }
    }

    /// Create a new user with name, email and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let mut tx = pool.begin().await?;

                // Create user
                let row = sqlx::query_as::<_, UserRow>(concat!(
                    "INSERT INTO dashboard.user AS u (name, email) VALUES ($1, $2) RETURNING ",
                    user_columns!()
                ))
                .bind(name)
                .bind(email.as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| conflict_on_unique(e, "email already exists"))?;

                let user = User::try_from(row)?;

                // Create password entry
                sqlx::query(
                    "INSERT INTO dashboard.user_password (user_id, password_hash) VALUES ($1, $2)",
                )
                .bind(user.id)
                .bind(password_hash)
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;

                Ok(user)
            }
            Store::Memory(mem) => {
                let mut users = mem.users.lock().await;
                if users.values().any(|s| &s.user.email == email) {
                    return Err(RepositoryError::Conflict("email already exists".to_owned()));
                }

                let now = Utc::now();
                let user = User {
                    id: UserId::new(mem.next_id()),
                    name: name.to_owned(),
                    email: email.clone(),
                    profile: Profile::default(),
                    created_at: now,
                    updated_at: now,
                };
                users.insert(
                    user.id,
                    StoredUser {
                        user: user.clone(),
                        password_hash: Some(password_hash.to_owned()),
                    },
                );
                Ok(user)
            }
        }
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if the user doesn't exist or has no password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let row = sqlx::query_as::<_, UserWithPasswordRow>(concat!(
                    "SELECT ",
                    user_columns!(),
                    ", p.password_hash \
                     FROM dashboard.user u \
                     JOIN dashboard.user_password p ON p.user_id = u.id \
                     WHERE u.email = $1"
                ))
                .bind(email.as_str())
                .fetch_optional(pool)
                .await?;

                match row {
                    Some(r) => Ok(Some((User::try_from(r.user)?, r.password_hash))),
                    None => Ok(None),
                }
            }
            Store::Memory(mem) => Ok(mem
                .users
                .lock()
                .await
                .values()
                .find(|s| &s.user.email == email)
                .and_then(|s| {
                    s.password_hash
                        .clone()
                        .map(|hash| (s.user.clone(), hash))
                })),
        }
    }

    /// Overwrite the name and profile attributes of a user.
    ///
    /// Returns `None` if the user no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        profile: &Profile,
    ) -> Result<Option<User>, RepositoryError> {
        match self.store {
            Store::Postgres(pool) => {
                let row = sqlx::query_as::<_, UserRow>(concat!(
                    "UPDATE dashboard.user AS u SET \
                       name = $2, profile_image = $3, phone_number = $4, \
                       address_street = $5, address_city = $6, address_state = $7, \
                       address_zip_code = $8, address_country = $9, \
                       target_weight = $10, height = $11, age = $12, \
                       gender = $13, blood_group = $14, date_of_birth = $15, \
                       updated_at = now() \
                     WHERE u.id = $1 RETURNING ",
                    user_columns!()
                ))
                .bind(id)
                .bind(name)
                .bind(profile.profile_image.as_deref())
                .bind(profile.phone_number.as_deref())
                .bind(profile.address.street.as_deref())
                .bind(profile.address.city.as_deref())
                .bind(profile.address.state.as_deref())
                .bind(profile.address.zip_code.as_deref())
                .bind(profile.address.country.as_deref())
                .bind(profile.target_weight)
                .bind(profile.height)
                .bind(profile.age)
                .bind(profile.gender.to_string())
                .bind(profile.blood_group.as_str())
                .bind(profile.date_of_birth)
                .fetch_optional(pool)
                .await?;

                row.map(TryInto::try_into).transpose()
            }
            Store::Memory(mem) => {
                let mut users = mem.users.lock().await;
                let Some(stored) = users.get_mut(&id) else {
                    return Ok(None);
                };
                name.clone_into(&mut stored.user.name);
                stored.user.profile = profile.clone();
                stored.user.updated_at = Utc::now();
                Ok(Some(stored.user.clone()))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_create_and_lookup() {
        let store = Store::memory();
        let users = UserRepository::new(&store);
        let email = Email::parse("ana@example.com").unwrap();

        let created = users
            .create_with_password("Ana", &email, "hash")
            .await
            .unwrap();

        let by_email = users.get_by_email(&email).await.unwrap().unwrap();
        assert_eq!(by_email, created);

        let (user, hash) = users.get_password_hash(&email).await.unwrap().unwrap();
        assert_eq!(user.id, created.id);
        assert_eq!(hash, "hash");
    }

    #[tokio::test]
    async fn test_memory_duplicate_email_conflicts() {
        let store = Store::memory();
        let users = UserRepository::new(&store);
        let email = Email::parse("ana@example.com").unwrap();

        users.create_with_password("Ana", &email, "h1").await.unwrap();
        let result = users.create_with_password("Other", &email, "h2").await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_memory_update_profile_missing_user() {
        let store = Store::memory();
        let users = UserRepository::new(&store);

        let result = users
            .update_profile(UserId::new(42), "Nobody", &Profile::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
