//! Saved templates: element content plus variables and metadata.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::element::CanvasElement;

/// Output medium of a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    /// Printable page.
    #[default]
    Pdf,
    /// HTML email body.
    Email,
}

impl std::fmt::Display for TemplateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => f.write_str("pdf"),
            Self::Email => f.write_str("email"),
        }
    }
}

/// Unit of a page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Pixels.
    Px,
    /// Millimetres.
    Mm,
    /// Inches.
    In,
}

/// Named page formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageFormat {
    /// ISO A4.
    A4,
    /// US Letter.
    Letter,
    /// US Legal.
    Legal,
    /// Anything else.
    Custom,
}

/// Physical page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    /// Page width.
    pub width: f64,
    /// Page height.
    pub height: f64,
    /// Unit of both dimensions.
    pub unit: Unit,
    /// Named format, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<PageFormat>,
}

impl PageSize {
    /// ISO A4, 210 x 297 mm.
    pub const A4: Self = Self {
        width: 210.0,
        height: 297.0,
        unit: Unit::Mm,
        name: Some(PageFormat::A4),
    };
    /// US Letter, 8.5 x 11 in.
    pub const LETTER: Self = Self {
        width: 8.5,
        height: 11.0,
        unit: Unit::In,
        name: Some(PageFormat::Letter),
    };
    /// US Legal, 8.5 x 14 in.
    pub const LEGAL: Self = Self {
        width: 8.5,
        height: 14.0,
        unit: Unit::In,
        name: Some(PageFormat::Legal),
    };
    /// Email body, 600 x 800 px.
    pub const EMAIL: Self = Self {
        width: 600.0,
        height: 800.0,
        unit: Unit::Px,
        name: Some(PageFormat::Custom),
    };

    /// Default page for a template type.
    #[must_use]
    pub const fn for_type(template_type: TemplateType) -> Self {
        match template_type {
            TemplateType::Pdf => Self::A4,
            TemplateType::Email => Self::EMAIL,
        }
    }
}

/// Value type of a template variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    /// Text.
    String,
    /// Number.
    Number,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// List.
    Array,
    /// Nested object.
    Object,
}

impl VariableType {
    /// Whether `value` is of this type. Dates are ISO strings.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String | Self::Date => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// A named, typed placeholder substituted at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Identifier.
    pub id: String,
    /// Placeholder name, as in `{{name}}`.
    pub name: String,
    /// Value type.
    #[serde(rename = "type")]
    pub variable_type: VariableType,
    /// Value used when none is supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether a value must be supplied.
    #[serde(default)]
    pub required: bool,
}

/// Authoring information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    /// Author name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Template version string.
    pub version: String,
    /// Free-form category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Thumbnail image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl Default for TemplateMetadata {
    fn default() -> Self {
        Self {
            author: None,
            version: "1.0.0".to_string(),
            category: None,
            thumbnail_url: None,
        }
    }
}

/// A saved document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Output medium.
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    /// Page dimensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<PageSize>,
    /// Elements, in document order.
    #[serde(default)]
    pub content: Vec<CanvasElement>,
    /// Placeholders.
    #[serde(default)]
    pub variables: Vec<Variable>,
    /// Authoring information.
    #[serde(default)]
    pub metadata: TemplateMetadata,
    /// Creation time, ms since the Unix epoch.
    pub created_at: u64,
    /// Last update time, ms since the Unix epoch.
    pub updated_at: u64,
    /// Owning user.
    #[serde(default)]
    pub owner_id: String,
    /// Search tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Template {
    /// Create an empty template with a fresh id and the type's default page.
    #[must_use]
    pub fn new(name: impl Into<String>, template_type: TemplateType) -> Self {
        let now = current_timestamp_ms();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            template_type,
            page_size: Some(PageSize::for_type(template_type)),
            content: Vec::new(),
            variables: Vec::new(),
            metadata: TemplateMetadata::default(),
            created_at: now,
            updated_at: now,
            owner_id: String::new(),
            tags: Vec::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Stamp `updated_at` with the current time.
    pub fn touch(&mut self) {
        self.updated_at = current_timestamp_ms();
    }
}

/// Criteria for listing templates. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateFilter {
    /// Only this type.
    pub template_type: Option<TemplateType>,
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
    /// Every listed tag must be present.
    pub tags: Vec<String>,
    /// Only this owner.
    pub owner_id: Option<String>,
}

impl TemplateFilter {
    /// Whether `template` satisfies every criterion.
    #[must_use]
    pub fn matches(&self, template: &Template) -> bool {
        if self
            .template_type
            .is_some_and(|t| t != template.template_type)
        {
            return false;
        }
        if let Some(owner) = &self.owner_id {
            if owner != &template.owner_id {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let in_name = template.name.to_lowercase().contains(&needle);
            let in_description = template
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_name && !in_description {
                return false;
            }
        }
        self.tags.iter().all(|tag| template.tags.contains(tag))
    }
}

/// Get the current Unix timestamp in milliseconds.
pub(crate) fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}
