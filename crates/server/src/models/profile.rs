//! Profile document types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use garden_core::Username;

/// Theme assigned to new profiles.
pub const DEFAULT_THEME: &str = "light";

/// A user's profile document.
///
/// The owning [`garden_core::UserId`] is the document key and is not part of
/// the body, so it never appears in API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Normalized username, copied from the user record at registration.
    pub username: Username,
    /// Whether the user has finished onboarding.
    pub on_boarded: bool,
    /// IANA timezone chosen by the user.
    pub timezone: String,
    /// Character class picked during onboarding.
    pub selected_class: String,
    /// Free-form profile text.
    pub custom_description: String,
    /// Profile image reference (URL or data URI).
    pub profile_image: Option<String>,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
    /// Last time the client reported activity.
    pub last_active: DateTime<Utc>,
    /// UI theme name.
    pub theme: String,
    /// In-app currency balance. Non-negative by convention only.
    pub balance: f64,
}

impl Profile {
    /// Profile created alongside a new account.
    #[must_use]
    pub fn new_for(username: Username, now: DateTime<Utc>) -> Self {
        Self {
            username,
            on_boarded: false,
            timezone: String::new(),
            selected_class: String::new(),
            custom_description: String::new(),
            profile_image: None,
            created_at: now,
            last_active: now,
            theme: DEFAULT_THEME.to_owned(),
            balance: 0.0,
        }
    }
}

/// Partial profile update.
///
/// Absent fields are left untouched. `profileImage: null` clears the image.
/// Identity fields (`username`, `createdAt`) cannot be changed, and unknown
/// keys are ignored because clients usually send the whole profile back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_boarded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_description: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub profile_image: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
}

/// Distinguish an explicit `null` (`Some(None)`) from an absent key (`None`).
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl ProfilePatch {
    /// Apply the patch to a profile in place.
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(on_boarded) = self.on_boarded {
            profile.on_boarded = on_boarded;
        }
        if let Some(timezone) = &self.timezone {
            profile.timezone.clone_from(timezone);
        }
        if let Some(selected_class) = &self.selected_class {
            profile.selected_class.clone_from(selected_class);
        }
        if let Some(description) = &self.custom_description {
            profile.custom_description.clone_from(description);
        }
        if let Some(image) = &self.profile_image {
            profile.profile_image.clone_from(image);
        }
        if let Some(last_active) = self.last_active {
            profile.last_active = last_active;
        }
        if let Some(theme) = &self.theme {
            profile.theme.clone_from(theme);
        }
        if let Some(balance) = self.balance {
            profile.balance = balance;
        }
    }

    /// The patch as a JSON object of only the fields being set.
    ///
    /// Keys match [`Profile`]'s serialized form, so merging this object into a
    /// stored profile document has the same effect as [`Self::apply_to`].
    #[must_use]
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::to_value(self)
            .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn profile() -> Profile {
        Profile::new_for(Username::parse("alice123").unwrap(), Utc::now())
    }

    #[test]
    fn test_new_profile_defaults() {
        let p = profile();
        assert!(!p.on_boarded);
        assert_eq!(p.theme, "light");
        assert!(p.balance.abs() < f64::EPSILON);
        assert!(p.profile_image.is_none());
        assert_eq!(p.created_at, p.last_active);
    }

    #[test]
    fn test_profile_serializes_camel_case_without_id() {
        let value = serde_json::to_value(profile()).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj["username"], "alice123");
        assert_eq!(obj["onBoarded"], false);
        assert_eq!(obj["profileImage"], serde_json::Value::Null);
        assert!(obj.contains_key("selectedClass"));
        assert!(obj.contains_key("customDescription"));
        assert!(obj.contains_key("lastActive"));
        assert!(!obj.contains_key("_id"));
        assert!(!obj.contains_key("id"));
    }

    #[test]
    fn test_patch_ignores_identity_and_unknown_fields() {
        let patch: ProfilePatch = serde_json::from_value(json!({
            "username": "mallory",
            "createdAt": "2000-01-01T00:00:00Z",
            "somethingElse": 1,
            "theme": "dark"
        }))
        .unwrap();

        let mut p = profile();
        patch.apply_to(&mut p);
        assert_eq!(p.username.as_str(), "alice123");
        assert_eq!(p.theme, "dark");
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let clear: ProfilePatch = serde_json::from_value(json!({ "profileImage": null })).unwrap();
        assert_eq!(clear.profile_image, Some(None));

        let absent: ProfilePatch = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.profile_image, None);

        let mut p = profile();
        p.profile_image = Some("https://img/1.png".to_owned());
        absent.apply_to(&mut p);
        assert!(p.profile_image.is_some());
        clear.apply_to(&mut p);
        assert!(p.profile_image.is_none());
    }

    #[test]
    fn test_patch_document_matches_apply() {
        let patch: ProfilePatch = serde_json::from_value(json!({
            "onBoarded": true,
            "selectedClass": "druid",
            "profileImage": null,
            "balance": 12.5
        }))
        .unwrap();

        assert_eq!(
            patch.to_document(),
            json!({
                "onBoarded": true,
                "selectedClass": "druid",
                "profileImage": null,
                "balance": 12.5
            })
        );

        // Merging the document into a serialized profile equals applying the patch
        let mut merged = serde_json::to_value(profile()).unwrap();
        let base = serde_json::from_value::<Profile>(merged.clone()).unwrap();
        if let (Some(target), Some(changes)) =
            (merged.as_object_mut(), patch.to_document().as_object())
        {
            for (k, v) in changes {
                target.insert(k.clone(), v.clone());
            }
        }
        let mut applied = base;
        patch.apply_to(&mut applied);
        assert_eq!(serde_json::from_value::<Profile>(merged).unwrap(), applied);
    }
}
