//! User domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use patient_dashboard_core::{BloodGroup, Email, Gender, UserId};

use super::dates;

/// A registered user with their profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(flatten)]
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Postal address; every line is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Overwrite the lines present in `other`.
    pub fn merge(&mut self, other: Self) {
        let Self {
            street,
            city,
            state,
            zip_code,
            country,
        } = other;
        if street.is_some() {
            self.street = street;
        }
        if city.is_some() {
            self.city = city;
        }
        if state.is_some() {
            self.state = state;
        }
        if zip_code.is_some() {
            self.zip_code = zip_code;
        }
        if country.is_some() {
            self.country = country;
        }
    }
}

/// Self-reported profile attributes.
///
/// Weights are in pounds and height in centimetres.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub profile_image: Option<String>,
    pub phone_number: Option<String>,
    pub address: Address,
    pub target_weight: Option<f64>,
    pub height: Option<f64>,
    pub age: Option<i32>,
    pub gender: Gender,
    pub blood_group: BloodGroup,
    pub date_of_birth: Option<NaiveDate>,
}

impl Profile {
    /// Merge a partial update; absent fields keep their value.
    pub fn apply(&mut self, update: ProfileUpdate) {
        if update.profile_image.is_some() {
            self.profile_image = update.profile_image;
        }
        if update.phone_number.is_some() {
            self.phone_number = update.phone_number;
        }
        if let Some(address) = update.address {
            self.address.merge(address);
        }
        if update.target_weight.is_some() {
            self.target_weight = update.target_weight;
        }
        if update.height.is_some() {
            self.height = update.height;
        }
        if update.age.is_some() {
            self.age = update.age;
        }
        if let Some(gender) = update.gender {
            self.gender = gender;
        }
        if let Some(blood_group) = update.blood_group {
            self.blood_group = blood_group;
        }
        if update.date_of_birth.is_some() {
            self.date_of_birth = update.date_of_birth;
        }
    }
}

/// Request body for `PUT /api/users/profile`.
///
/// Email and password are not editable here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub profile_image: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<Address>,
    pub target_weight: Option<f64>,
    pub height: Option<f64>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub blood_group: Option<BloodGroup>,
    #[serde(default, deserialize_with = "dates::optional_date")]
    pub date_of_birth: Option<NaiveDate>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_merges_address_lines() {
        let mut profile = Profile {
            address: Address {
                street: Some("1 Main St".to_string()),
                city: Some("Springfield".to_string()),
                ..Address::default()
            },
            ..Profile::default()
        };

        let update: ProfileUpdate = serde_json::from_str(
            r#"{"address":{"city":"Shelbyville","zipCode":"12345"},"bloodGroup":"O-","height":172.5}"#,
        )
        .unwrap();
        profile.apply(update);

        assert_eq!(profile.address.street.as_deref(), Some("1 Main St"));
        assert_eq!(profile.address.city.as_deref(), Some("Shelbyville"));
        assert_eq!(profile.address.zip_code.as_deref(), Some("12345"));
        assert_eq!(profile.blood_group, BloodGroup::ONegative);
        assert_eq!(profile.height, Some(172.5));
        assert_eq!(profile.gender, Gender::PreferNotToSay);
    }

    #[test]
    fn test_profile_update_rejects_unknown_gender() {
        let result = serde_json::from_str::<ProfileUpdate>(r#"{"gender":"robot"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_user_serializes_profile_inline() {
        let now = Utc::now();
        let user = User {
            id: UserId::new(3),
            name: "Sam".to_string(),
            email: Email::parse("sam@example.com").unwrap(),
            profile: Profile::default(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "sam@example.com");
        assert_eq!(json["gender"], "prefer not to say");
        assert_eq!(json["bloodGroup"], "unknown");
        assert!(json["address"].is_object());
        assert!(json.get("passwordHash").is_none());
    }
}
