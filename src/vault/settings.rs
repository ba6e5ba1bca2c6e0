//! Per-user vault preferences, stored unencrypted through the backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

/// Built-in categories: (id, display name, icon id).
const DEFAULT_CATEGORIES: [(&str, &str, &str); 4] = [
    ("financial", "Financial", "dollar"),
    ("personal", "Personal", "user"),
    ("work", "Work", "briefcase"),
    ("diary", "Diary", "book"),
];

/// Category a new document lands in when none is given.
pub const DEFAULT_CATEGORY: &str = "personal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSettings {
    /// Number of digits in the vault PIN (4 or 6).
    #[serde(default = "default_pin_length")]
    pub pin_length: usize,

    /// Idle minutes before the session locks itself. 0 disables auto-lock.
    #[serde(default = "default_auto_lock_minutes")]
    pub auto_lock_minutes: u32,

    #[serde(default)]
    pub email_notifications: bool,

    #[serde(default = "default_category_names")]
    pub category_names: BTreeMap<String, String>,

    #[serde(default = "default_category_icons")]
    pub category_icons: BTreeMap<String, String>,
}

fn default_pin_length() -> usize {
    6
}

fn default_auto_lock_minutes() -> u32 {
    5
}

fn default_category_names() -> BTreeMap<String, String> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(id, name, _)| (id.to_string(), name.to_string()))
        .collect()
}

fn default_category_icons() -> BTreeMap<String, String> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(id, _, icon)| (id.to_string(), icon.to_string()))
        .collect()
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            pin_length: default_pin_length(),
            auto_lock_minutes: default_auto_lock_minutes(),
            email_notifications: false,
            category_names: default_category_names(),
            category_icons: default_category_icons(),
        }
    }
}

impl VaultSettings {
    /// Reject values the rest of the vault cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.pin_length != 4 && self.pin_length != 6 {
            return Err(VaultError::ConfigError(format!(
                "pin length must be 4 or 6 (got {})",
                self.pin_length
            )));
        }
        Ok(())
    }

    /// Display name for a category id, falling back to the id itself.
    pub fn category_name<'a>(&'a self, category: &'a str) -> &'a str {
        self.category_names
            .get(category)
            .map_or(category, String::as_str)
    }

    /// Fill in category maps that older stored settings lack.
    pub(crate) fn with_category_defaults(mut self) -> Self {
        if self.category_names.is_empty() {
            self.category_names = default_category_names();
        }
        if self.category_icons.is_empty() {
            self.category_icons = default_category_icons();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let s = VaultSettings::default();
        assert_eq!(s.pin_length, 6);
        assert_eq!(s.auto_lock_minutes, 5);
        assert!(!s.email_notifications);
        assert_eq!(s.category_names.len(), 4);
        assert_eq!(s.category_icons["financial"], "dollar");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let s: VaultSettings = serde_json::from_str(r#"{"pinLength":4}"#).unwrap();
        assert_eq!(s.pin_length, 4);
        assert_eq!(s.auto_lock_minutes, 5);
        assert_eq!(s.category_names["diary"], "Diary");
    }

    #[test]
    fn empty_category_maps_are_refilled() {
        let s = VaultSettings {
            category_names: BTreeMap::new(),
            category_icons: BTreeMap::new(),
            ..VaultSettings::default()
        }
        .with_category_defaults();
        assert_eq!(s.category_names.len(), 4);
        assert_eq!(s.category_icons.len(), 4);
    }

    #[test]
    fn validate_rejects_odd_pin_length() {
        let s = VaultSettings {
            pin_length: 5,
            ..VaultSettings::default()
        };
        assert!(s.validate().is_err());
        assert!(VaultSettings::default().validate().is_ok());
    }

    #[test]
    fn category_name_falls_back_to_id() {
        let s = VaultSettings::default();
        assert_eq!(s.category_name("work"), "Work");
        assert_eq!(s.category_name("custom"), "custom");
    }
}
