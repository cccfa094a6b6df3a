//! The homepage configuration document.
//!
//! A single JSON file drives the whole homepage.  Example:
//!
//! ```json
//! {
//!   "name": "Remio",
//!   "sites": [
//!     { "title": "Blog", "url": "https://blog.example.com" },
//!     { "title": "More" },
//!     { "title": "Wiki", "url": "https://wiki.example.com" }
//!   ],
//!   "sitesConfig": { "modal": true },
//!   "bgConfig": { "bg": ["https://img.example.com/a.webp"] },
//!   "globalStyle": { "primaryColor": "#ff6a00" }
//! }
//! ```
//!
//! # Unknown keys
//!
//! Front ends add settings faster than this model learns about them.  Every
//! struct keeps a flattened `extra` map so that a load → save cycle writes
//! back exactly the keys it read, including ones this crate never inspects.
//!
//! # Mistyped values
//!
//! Documents are edited by hand as often as through the editor.  A known key
//! holding a value of the wrong JSON type (`"istTransition": "false"`,
//! `"blur": 8`) is read as absent instead of failing the whole document, so
//! the page falls back to that key's default.  Malformed entries of the site
//! and link lists are skipped.  Only a document that is not a JSON object at
//! all fails to load.
//!
//! # Lifecycle
//!
//! Read from disk on every request, written wholesale on save.  There is no
//! versioning, no partial update and no migration.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Primary colour used when `globalStyle.primaryColor` is absent or empty.
pub const DEFAULT_PRIMARY_COLOR: &str = "#229fff";

/// Default spacing between page sections.
pub const DEFAULT_GAP_SIZE: &str = "md";

// ── Document ──────────────────────────────────────────────────────────────────

/// Top-level homepage configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Owner name, shown under the avatar and used as the page title.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub sub_title: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// The site grid, in display order.
    #[serde(
        default,
        deserialize_with = "lenient_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub sites: Option<Vec<Site>>,
    /// Social links rendered as icons.
    #[serde(
        default,
        deserialize_with = "lenient_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub links: Option<Vec<Link>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub layout_config: Option<LayoutConfig>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub sites_config: Option<SitesConfig>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub bg_config: Option<BgConfig>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub global_style: Option<GlobalStyle>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub footer: Option<Footer>,
    /// Resource injection (raw HTML appended to the page body).
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,
    /// Every other top-level key, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of the site grid.
///
/// A site without a `url` is the *anchor*: it opens the modal that holds the
/// overflow sites (see [`crate::domain::transform::partition_sites`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Site {
    /// Convenience constructor for a site that links somewhere.
    pub fn linked(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Convenience constructor for an anchor site (no URL).
    pub fn anchor(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Returns `true` when the site carries a non-empty URL.
    pub fn has_url(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// A social link (icon row under the subtitle).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Whether entrance animations run.  Defaults to `true`.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub ist_transition: Option<bool>,
    /// `"sm"`, `"md"` or `"lg"`.  Defaults to `"md"`.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub gap_size: Option<String>,
    /// `"vertical"` or `"horizontal"`.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitesConfig {
    /// Moves the sites after the anchor into a modal instead of dropping the anchor.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub modal: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub hover_scale: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub hover_blur: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SitesConfig {
    pub fn modal_enabled(&self) -> bool {
        self.modal.unwrap_or(false)
    }
}

/// A background image field: either one URL or a list of URLs to rotate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BgSource {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BgConfig {
    /// Desktop background(s).
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub bg: Option<BgSource>,
    /// Mobile background(s).
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub mbg: Option<BgSource>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub bg_style: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub blur: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStyle {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub weather: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Footer {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// ICP filing number, shown as a separate footer line.
    #[serde(
        rename = "ICP",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub icp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Lenient field readers ─────────────────────────────────────────────────────

/// Reads an optional field, treating a value of the wrong type as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            debug!("ignoring mistyped config value: {e}");
            Ok(None)
        }
    }
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Reads an optional list, skipping entries that do not parse.  A non-array
/// value counts as absent.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    let parsed = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("skipping malformed list entry: {e}");
                None
            }
        })
        .collect();
    Ok(Some(parsed))
}

// ── Built-in document and merging ─────────────────────────────────────────────

impl AppConfig {
    /// The document served when no configuration file exists yet.
    pub fn builtin() -> Self {
        Self {
            name: Some("Remio".to_string()),
            sub_title: Some("Welcome to my homepage".to_string()),
            description: Some("A personal homepage and link hub".to_string()),
            sites: Some(vec![Site {
                desc: Some("Source code of this homepage".to_string()),
                ..Site::linked("GitHub", "https://github.com")
            }]),
            links: Some(Vec::new()),
            layout_config: Some(LayoutConfig {
                ist_transition: Some(true),
                gap_size: Some(DEFAULT_GAP_SIZE.to_string()),
                style: Some("vertical".to_string()),
                ..LayoutConfig::default()
            }),
            sites_config: Some(SitesConfig {
                modal: Some(false),
                ..SitesConfig::default()
            }),
            global_style: Some(GlobalStyle {
                primary_color: Some(DEFAULT_PRIMARY_COLOR.to_string()),
                ..GlobalStyle::default()
            }),
            ..Self::default()
        }
    }

    /// Overlays this document on top of `defaults`.
    ///
    /// Every top-level key present in `self` replaces the default value
    /// wholesale (no deep merge); keys absent from `self` keep the default.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error only if one of the documents cannot be
    /// represented as a JSON object, which the derived impls never produce.
    pub fn merged_over(&self, defaults: &AppConfig) -> Result<AppConfig, serde_json::Error> {
        let mut base = serde_json::to_value(defaults)?;
        let overlay = serde_json::to_value(self)?;

        if let (Value::Object(base_map), Value::Object(overlay_map)) = (&mut base, overlay) {
            for (key, value) in overlay_map {
                base_map.insert(key, value);
            }
        }

        serde_json::from_value(base)
    }

    /// Shorthand for [`merged_over`](Self::merged_over) with [`AppConfig::builtin`].
    ///
    /// # Errors
    ///
    /// See [`merged_over`](Self::merged_over).
    pub fn merged_with_builtin(&self) -> Result<AppConfig, serde_json::Error> {
        self.merged_over(&AppConfig::builtin())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
