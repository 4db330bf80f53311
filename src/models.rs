//! Catalog Models
//!
//! Records stored in the `pets` and `users` collections, plus the static
//! category set used by the filter bar.

use std::fmt;

use adoteme_store::{to_fields, Entity, Fields};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Label of the catch-all filter
pub const ALL_LABEL: &str = "All";

/// Placeholder text substituted for missing values.
///
/// Write-time placeholders are applied only by [`NewPet::into_record`];
/// read-time placeholders only by the `PetRecord` display accessors.
pub mod placeholders {
    pub const PET_NAME: &str = "Unnamed";
    pub const OWNER_NAME: &str = "User";
    pub const OWNER_EMAIL: &str = "No e-mail";
    pub const BREED: &str = "Breed not specified";
    pub const LOCATION: &str = "Location not provided";
    pub const AGE: &str = "Age not provided";
    pub const NOT_AVAILABLE: &str = "Not available";
}

// ========================
// Identity
// ========================

/// Opaque pet identity (document id)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PetId(String);

impl PetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for PetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ========================
// Categories
// ========================

/// Pet category; anything unrecognised is `Unknown`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "String")]
pub enum Category {
    Dog,
    Cat,
    Fish,
    Bird,
    #[default]
    Unknown,
}

impl Category {
    /// Categories a record can be filtered by, in display order
    pub const SELECTABLE: [Category; 4] = [Category::Dog, Category::Cat, Category::Fish, Category::Bird];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Dog => "Dog",
            Category::Cat => "Cat",
            Category::Fish => "Fish",
            Category::Bird => "Bird",
            Category::Unknown => "Unknown",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::Dog => "dog",
            Category::Cat => "cat",
            Category::Fish => "fish",
            Category::Bird => "dove",
            Category::Unknown => "question",
        }
    }

    /// Exact, case-sensitive label lookup
    pub fn from_label(label: &str) -> Self {
        Self::SELECTABLE
            .into_iter()
            .find(|c| c.label() == label)
            .unwrap_or(Category::Unknown)
    }
}

impl From<Value> for Category {
    fn from(label: Value) -> Self {
        match label {
            Value::String(label) => Category::from_label(&label),
            _ => Category::Unknown,
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.label().to_string()
    }
}

/// Static filter-bar entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryDescriptor {
    pub label: &'static str,
    pub icon: &'static str,
}

/// Filter-bar entries; "All" is always first
pub const CATEGORIES: [CategoryDescriptor; 5] = [
    CategoryDescriptor { label: ALL_LABEL, icon: "paw" },
    CategoryDescriptor { label: "Dog", icon: "dog" },
    CategoryDescriptor { label: "Cat", icon: "cat" },
    CategoryDescriptor { label: "Fish", icon: "fish" },
    CategoryDescriptor { label: "Bird", icon: "dove" },
];

/// Active category predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Parse a filter-bar label; `None` for labels not in [`CATEGORIES`]
    pub fn from_label(label: &str) -> Option<Self> {
        if label == ALL_LABEL {
            return Some(CategoryFilter::All);
        }
        match Category::from_label(label) {
            Category::Unknown => None,
            category => Some(CategoryFilter::Only(category)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => ALL_LABEL,
            CategoryFilter::Only(category) => category.label(),
        }
    }

    pub fn matches(&self, pet: &PetRecord) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => pet.category == *category,
        }
    }
}

// ========================
// Pets
// ========================

/// Owner contact details carried on a pet document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerContact {
    /// Owner's user identity, used to open a chat
    #[serde(rename = "uid", default)]
    pub uid: Option<String>,
    #[serde(rename = "ownerName", default)]
    pub name: Option<String>,
    #[serde(rename = "ownerEmail", default)]
    pub email: Option<String>,
    #[serde(rename = "ownerPhone", default)]
    pub phone: Option<String>,
}

/// Where a chat with the pet's owner should be opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTarget {
    pub receiver_id: String,
}

/// Pet document (matches the `pets` collection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetRecord {
    pub id: PetId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// URL or storage path
    #[serde(default, alias = "imageUrl")]
    pub image: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub favorited: bool,
    #[serde(flatten)]
    pub owner: OwnerContact,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

impl PetRecord {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            placeholders::PET_NAME
        } else {
            &self.name
        }
    }

    pub fn display_breed(&self) -> &str {
        present(&self.breed).unwrap_or(placeholders::BREED)
    }

    pub fn display_location(&self) -> &str {
        present(&self.location).unwrap_or(placeholders::LOCATION)
    }

    pub fn display_age(&self) -> &str {
        present(&self.age).unwrap_or(placeholders::AGE)
    }

    pub fn owner_name(&self) -> &str {
        present(&self.owner.name).unwrap_or(placeholders::NOT_AVAILABLE)
    }

    pub fn owner_email(&self) -> &str {
        present(&self.owner.email).unwrap_or(placeholders::NOT_AVAILABLE)
    }

    pub fn owner_phone(&self) -> &str {
        present(&self.owner.phone).unwrap_or(placeholders::NOT_AVAILABLE)
    }

    /// Chat entry point; `None` when the pet has no owner reference
    pub fn chat_target(&self) -> Option<ChatTarget> {
        present(&self.owner.uid).map(|uid| ChatTarget {
            receiver_id: uid.to_string(),
        })
    }

    /// Copy with the favorite flag set
    pub fn with_favorited(&self, favorited: bool) -> Self {
        Self {
            favorited,
            ..self.clone()
        }
    }
}

impl Entity for PetRecord {
    const COLLECTION: &'static str = "pets";

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

/// Input for a new pet listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPet {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub age: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
    pub category: Option<Category>,
    pub owner_uid: Option<String>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl NewPet {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Build the stored record, substituting placeholders for missing values
    pub fn into_record(self, id: PetId) -> PetRecord {
        PetRecord {
            id,
            name: non_blank(self.name).unwrap_or_else(|| placeholders::PET_NAME.to_string()),
            breed: non_blank(self.breed),
            age: non_blank(self.age),
            location: non_blank(self.location),
            image: non_blank(self.image).unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            favorited: false,
            owner: OwnerContact {
                uid: non_blank(self.owner_uid),
                name: Some(non_blank(self.owner_name).unwrap_or_else(|| placeholders::OWNER_NAME.to_string())),
                email: Some(non_blank(self.owner_email).unwrap_or_else(|| placeholders::OWNER_EMAIL.to_string())),
                phone: non_blank(self.owner_phone),
            },
        }
    }
}

/// Partial pet write; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PetUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorited: Option<bool>,
}

impl PetUpdate {
    pub fn favorited(favorited: bool) -> Self {
        Self {
            favorited: Some(favorited),
            ..Default::default()
        }
    }

    pub fn to_fields(&self) -> Result<Fields, serde_json::Error> {
        to_fields(self)
    }
}

// ========================
// Users
// ========================

/// User profile document (identity = authentication uid)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: String,
    #[serde(default)]
    pub phone: String,
}

impl Entity for UserProfile {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Signed-in identity as reported by the auth provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

/// Merge update of a profile; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn to_fields(&self) -> Result<Fields, serde_json::Error> {
        to_fields(self)
    }
}
