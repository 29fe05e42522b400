//! Upload slots: where a form's file goes and what it may contain.

use estate_core::constants::{DOCUMENT_ACCEPT, LOGO_ACCEPT, PHOTO_ACCEPT};
use estate_core::{AssetCategory, MediaKind};
use serde::{Deserialize, Serialize};

/// Static configuration of one upload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSlot {
    pub category: AssetCategory,
    pub kind: MediaKind,
    /// File-name prefix inside the entity's folder.
    pub prefix: &'static str,
    /// Advisory picker filter. The validator is authoritative.
    pub accept: &'static str,
}

impl UploadSlot {
    pub const fn new(
        category: AssetCategory,
        kind: MediaKind,
        prefix: &'static str,
        accept: &'static str,
    ) -> Self {
        Self {
            category,
            kind,
            prefix,
            accept,
        }
    }

    pub const fn building_image() -> Self {
        Self::new(AssetCategory::Buildings, MediaKind::Image, "image", PHOTO_ACCEPT)
    }

    pub const fn unit_image() -> Self {
        Self::new(AssetCategory::Units, MediaKind::Image, "image", PHOTO_ACCEPT)
    }

    pub const fn component_image() -> Self {
        Self::new(AssetCategory::Components, MediaKind::Image, "image", PHOTO_ACCEPT)
    }

    pub const fn request_image() -> Self {
        Self::new(AssetCategory::Requests, MediaKind::Image, "photo", PHOTO_ACCEPT)
    }

    pub const fn contingency_document() -> Self {
        Self::new(
            AssetCategory::ContingencyDocs,
            MediaKind::Document,
            "document",
            DOCUMENT_ACCEPT,
        )
    }

    pub const fn provider_logo() -> Self {
        Self::new(AssetCategory::Providers, MediaKind::Image, "logo", LOGO_ACCEPT)
    }

    /// The manager's own company logo. Stored next to provider logos.
    pub const fn account_logo() -> Self {
        Self::new(
            AssetCategory::Providers,
            MediaKind::Image,
            "account_logo",
            LOGO_ACCEPT,
        )
    }
}

/// An entity that carries one media URL.
pub trait MediaOwner: Send + Sync {
    /// `None` until the entity has been created.
    fn entity_id(&self) -> Option<&str>;

    fn media_url(&self) -> Option<&str>;

    fn set_media_url(&mut self, url: Option<String>);
}

/// Fields of a building record the building form submits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub id: Option<String>,
    pub name: String,
    pub address: String,
    pub image_url: Option<String>,
}

impl MediaOwner for Building {
    fn entity_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn media_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn set_media_url(&mut self, url: Option<String>) {
        self.image_url = url;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub logo_url: Option<String>,
}

impl MediaOwner for ServiceProvider {
    fn entity_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn media_url(&self) -> Option<&str> {
        self.logo_url.as_deref()
    }

    fn set_media_url(&mut self, url: Option<String>) {
        self.logo_url = url;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: Option<String>,
    pub company_name: String,
    pub logo_url: Option<String>,
}

impl MediaOwner for AccountProfile {
    fn entity_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn media_url(&self) -> Option<&str> {
        self.logo_url.as_deref()
    }

    fn set_media_url(&mut self, url: Option<String>) {
        self.logo_url = url;
    }
}
