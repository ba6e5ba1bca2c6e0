//! Secret documents and the payload/patch types used to create and edit them.
//!
//! Documents serialize with camelCase field names, the same shape the
//! legacy monolithic blob used, so old blobs deserialize unchanged.
//! Every field except `id` has a default for the same reason.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::settings::DEFAULT_CATEGORY;

/// Prefix of every generated document id.
const ID_PREFIX: &str = "secret";

/// Length of the random base36 suffix of generated ids.
const ID_SUFFIX_LEN: usize = 9;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Maximum number of characters kept in a preview snippet.
pub const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretDocument {
    pub id: String,

    #[serde(default)]
    pub title: String,

    /// Plaintext, or a `salt:iv:ciphertext` string when
    /// `is_content_encrypted` is set.
    #[serde(default)]
    pub content: String,

    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub is_important: bool,

    #[serde(default)]
    pub has_password: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,

    #[serde(default)]
    pub is_content_encrypted: bool,

    /// Plaintext snippet shown in listings while the content is locked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,

    /// The content encrypted under the vault PIN, kept so the PIN can
    /// open a document whose own password was forgotten.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_envelope: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl SecretDocument {
    /// Text to show in a listing: the preview for locked documents,
    /// otherwise the start of the content.
    pub fn display_snippet(&self) -> String {
        if self.is_content_encrypted {
            return self.preview.clone().unwrap_or_default();
        }
        snippet(&self.content)
    }

    /// Case-insensitive match against title, tags and, for unlocked
    /// documents, the content.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
            || (!self.is_content_encrypted && self.content.to_lowercase().contains(&query))
    }

    /// Apply the fields set in `patch`.
    pub(crate) fn apply(&mut self, patch: &DocumentPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(category) = &patch.category {
            self.category.clone_from(category);
        }
        if let Some(tags) = &patch.tags {
            self.tags.clone_from(tags);
        }
        if let Some(important) = patch.is_important {
            self.is_important = important;
        }
    }
}

/// Payload for `VaultRepository::add_document`.
#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub is_important: bool,
}

impl NewDocument {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub(crate) fn into_document(self, now: DateTime<Utc>) -> SecretDocument {
        SecretDocument {
            id: generate_id(now),
            title: self.title,
            content: self.content,
            category: self.category.unwrap_or_else(default_category),
            tags: self.tags,
            is_important: self.is_important,
            has_password: false,
            password_hash: None,
            is_content_encrypted: false,
            preview: None,
            recovery_envelope: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for `VaultRepository::update_document`.
///
/// Password fields are deliberately absent: they change only through the
/// document-password operations.
#[derive(Debug, Clone, Default)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_important: Option<bool>,
}

impl DocumentPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.is_important.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// By creation time.
    #[default]
    Date,
    /// Important documents first, then newest first.
    Importance,
}

/// Sort documents for display.  Listings themselves keep insertion order.
pub fn sort_documents(docs: &mut [SecretDocument], key: SortKey, descending: bool) {
    match key {
        SortKey::Date => docs.sort_by(|a, b| {
            let ord = a.created_at.cmp(&b.created_at);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }),
        SortKey::Importance => docs.sort_by(|a, b| {
            let ord = a.is_important.cmp(&b.is_important);
            let ord = if descending { ord.reverse() } else { ord };
            ord.then_with(|| b.created_at.cmp(&a.created_at))
        }),
    }
}

/// `secret_<unix millis>_<9 random base36 chars>`
pub fn generate_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{ID_PREFIX}_{}_{suffix}", now.timestamp_millis())
}

/// First `PREVIEW_CHARS` characters of `text`.
pub(crate) fn snippet(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
