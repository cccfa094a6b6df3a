//! Stored document → render-ready view model.
//!
//! [`transform`] is a pure function: it never fails and never touches the
//! file system, so the server can call it on every request after loading the
//! document fresh from disk.
//!
//! # Site partitioning
//!
//! The first site without a URL is the *anchor* at index `k`.
//!
//! ```text
//! sites:  [A, B, (anchor), C, D]          k = 2
//!
//! modal off:  static = [A, B, C, D]       modal = []
//! modal on:   static = [A, B, (anchor)]   modal = [C, D]
//! no anchor:  static = sites              modal = []
//! ```
//!
//! # Backgrounds
//!
//! `bg` and `mbg` accept a single URL or a list.  Both are normalised to a
//! list; an absent (or empty-string) value falls back to a built-in image.
//!
//! # Passthrough keys
//!
//! Unknown top-level keys are copied into the view, except those named like
//! a computed view field: the computed value always wins, so the serialized
//! view never repeats a key.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::config::{
    AppConfig, BgConfig, BgSource, Footer, GlobalStyle, Link, Resources, Site, SitesConfig,
    DEFAULT_GAP_SIZE, DEFAULT_PRIMARY_COLOR,
};
use crate::domain::motion::{motion, Motion, MotionDirection};

/// Desktop background used when the document configures none.
pub const FALLBACK_BG: &str = "https://s2.loli.net/2024/06/21/euQ48saP7UgMyDr.webp";

/// Mobile background used when the document configures none.
pub const FALLBACK_MOBILE_BG: &str = "https://s2.loli.net/2024/06/21/59b6eRscAvQWHT1.webp";

/// CSS custom property carrying the primary colour.
pub const PRIMARY_COLOR_VAR: &str = "--primary-color";

/// CSS custom property carrying the primary colour as `H S% L%` channels.
pub const PRIMARY_HSL_VAR: &str = "--mio-primary";

/// CSS custom property for the editor's foreground colour.
pub const FOREGROUND_VAR: &str = "--mio-foreground";

/// Editor foreground channels (`H S% L%`).
pub const EDITOR_FOREGROUND_HSL: &str = "210 5.56% 92.94%";

/// Serialized names of the computed [`HomeView`] fields.  Document keys with
/// these names are not passed through.
const VIEW_KEYS: &[&str] = &[
    "meta",
    "name",
    "subTitle",
    "links",
    "staticSites",
    "modalSites",
    "sitesConfig",
    "bgConfig",
    "primaryColor",
    "varStyle",
    "globalStyle",
    "istTransition",
    "gapSize",
    "style",
    "footer",
    "resources",
    "motions",
];

/// Stagger between sections, and the section slot used by the background
/// effect and footer.
const SECTION_GAP_SECS: f64 = 0.1;
const TRAILING_SECTION_INDEX: u32 = 4;
const TRAILING_SECTION_DURATION_SECS: f64 = 0.2;

// ── View model ────────────────────────────────────────────────────────────────

/// Result of splitting the site list around the anchor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePartition {
    pub static_sites: Vec<Site>,
    pub modal_sites: Vec<Site>,
}

/// Background settings with the image lists normalised.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BgView {
    #[serde(flatten)]
    pub source: BgConfig,
    pub bgs: Vec<String>,
    pub mbgs: Vec<String>,
}

/// Page metadata (title, description, keywords, favicon).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Everything a front end needs to render the homepage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    pub meta: PageMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_title: Option<String>,
    pub links: Vec<Link>,
    pub static_sites: Vec<Site>,
    pub modal_sites: Vec<Site>,
    pub sites_config: SitesConfig,
    pub bg_config: BgView,
    pub primary_color: String,
    /// CSS custom properties to set on the page root.
    pub var_style: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_style: Option<GlobalStyle>,
    pub ist_transition: bool,
    pub gap_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<Footer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,
    /// Entrance motion for the background effect and footer; `None` when
    /// transitions are disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motions: Option<Motion>,
    /// Remaining top-level keys of the document, passed through untouched.
    #[serde(flatten)]
    pub others: Map<String, Value>,
}

// ── Transform ─────────────────────────────────────────────────────────────────

/// Reshapes a stored document into a [`HomeView`].
pub fn transform(config: &AppConfig) -> HomeView {
    let sites_config = config.sites_config.clone().unwrap_or_default();
    let layout = config.layout_config.clone().unwrap_or_default();

    let SitePartition {
        static_sites,
        modal_sites,
    } = partition_sites(
        config.sites.as_deref().unwrap_or_default(),
        sites_config.modal_enabled(),
    );

    let primary_color = primary_color(config);
    let mut var_style = BTreeMap::new();
    var_style.insert(PRIMARY_COLOR_VAR.to_string(), primary_color.clone());

    let ist_transition = layout.ist_transition.unwrap_or(true);

    HomeView {
        meta: PageMeta {
            title: config.name.clone(),
            description: config.description.clone(),
            keywords: config.keywords.clone(),
            favicon: config.favicon.clone(),
            domain: config.domain.clone(),
        },
        name: config.name.clone(),
        sub_title: config.sub_title.clone(),
        links: config.links.clone().unwrap_or_default(),
        static_sites,
        modal_sites,
        sites_config,
        bg_config: background_view(config.bg_config.as_ref()),
        primary_color,
        var_style,
        global_style: config.global_style.clone(),
        ist_transition,
        gap_size: layout
            .gap_size
            .unwrap_or_else(|| DEFAULT_GAP_SIZE.to_string()),
        style: layout.style,
        footer: config.footer.clone(),
        resources: config.resources.clone(),
        motions: motion(
            SECTION_GAP_SECS,
            TRAILING_SECTION_INDEX,
            TRAILING_SECTION_DURATION_SECS,
            ist_transition,
            MotionDirection::ToBottom,
        ),
        others: passthrough_keys(&config.extra),
    }
}

/// Copies the document's unknown top-level keys, minus any that would
/// collide with a computed view field.
fn passthrough_keys(extra: &Map<String, Value>) -> Map<String, Value> {
    extra
        .iter()
        .filter(|(key, _)| !VIEW_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Splits `sites` around the first site without a URL.
pub fn partition_sites(sites: &[Site], modal: bool) -> SitePartition {
    let Some(anchor) = sites.iter().position(|s| !s.has_url()) else {
        return SitePartition {
            static_sites: sites.to_vec(),
            modal_sites: Vec::new(),
        };
    };

    if modal {
        SitePartition {
            static_sites: sites[..=anchor].to_vec(),
            modal_sites: sites[anchor + 1..].to_vec(),
        }
    } else {
        SitePartition {
            static_sites: sites
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != anchor)
                .map(|(_, s)| s.clone())
                .collect(),
            modal_sites: Vec::new(),
        }
    }
}

/// Normalises one background field to a list of URLs.
///
/// A list is returned as-is, even when empty.
pub fn normalize_backgrounds(source: Option<&BgSource>, fallback: &str) -> Vec<String> {
    match source {
        Some(BgSource::One(url)) if !url.is_empty() => vec![url.clone()],
        Some(BgSource::Many(urls)) => urls.clone(),
        _ => vec![fallback.to_string()],
    }
}

/// Builds the background view for `bg_config`, filling both image lists.
pub fn background_view(bg_config: Option<&BgConfig>) -> BgView {
    let mut source = bg_config.cloned().unwrap_or_default();
    source.extra.remove("bgs");
    source.extra.remove("mbgs");
    BgView {
        bgs: normalize_backgrounds(source.bg.as_ref(), FALLBACK_BG),
        mbgs: normalize_backgrounds(source.mbg.as_ref(), FALLBACK_MOBILE_BG),
        source,
    }
}

/// CSS variables for the configuration editor: the foreground, the primary
/// colour, and (for hex colours) its HSL channels.
pub fn editor_var_style(primary_color: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    vars.insert(FOREGROUND_VAR.to_string(), EDITOR_FOREGROUND_HSL.to_string());
    vars.insert(PRIMARY_COLOR_VAR.to_string(), primary_color.to_string());
    if let Some(hsl) = to_hsl(primary_color) {
        vars.insert(PRIMARY_HSL_VAR.to_string(), hsl);
    }
    vars
}

/// Converts a `#rgb` / `#rrggbb` (optionally with alpha, which is ignored)
/// colour to space-separated `H S% L%` channels, e.g. `#229fff` →
/// `206.06 100% 56.67%`.  Returns `None` for anything else.
pub fn to_hsl(color: &str) -> Option<String> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| f64::from(v) / 255.0);
    let short = |c: &str| channel(c.repeat(2).as_str());

    let (r, g, b) = match hex.len() {
        3 | 4 => (short(&hex[0..1])?, short(&hex[1..2])?, short(&hex[2..3])?),
        6 | 8 => (channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?),
        _ => return None,
    };

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let lightness = (max + min) / 2.0;
    let delta = max - min;

    let (hue, saturation) = if delta == 0.0 {
        (0.0, 0.0)
    } else {
        let saturation = delta / (1.0 - (2.0 * lightness - 1.0).abs());
        let sector = if max == r {
            ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        (sector * 60.0, saturation)
    };

    Some(format!(
        "{} {}% {}%",
        hsl_number(hue),
        hsl_number(saturation * 100.0),
        hsl_number(lightness * 100.0)
    ))
}

/// At most two decimals, trailing zeros trimmed.
fn hsl_number(value: f64) -> String {
    let fixed = format!("{value:.2}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Returns the configured primary colour or [`DEFAULT_PRIMARY_COLOR`].
pub fn primary_color(config: &AppConfig) -> String {
    config
        .global_style
        .as_ref()
        .and_then(|s| s.primary_color.as_deref())
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_PRIMARY_COLOR)
        .to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::LayoutConfig;

    fn titles(sites: &[Site]) -> Vec<&str> {
        sites.iter().map(|s| s.title.as_str()).collect()
    }

    fn sample_sites() -> Vec<Site> {
        vec![
            Site::linked("A", "https://a"),
            Site::linked("B", "https://b"),
            Site::anchor("More"),
            Site::linked("C", "https://c"),
            Site::linked("D", "https://d"),
        ]
    }

    // ── partition_sites ───────────────────────────────────────────────────────

    #[test]
    fn test_partition_without_anchor_keeps_everything_static() {
        // Arrange
        let sites = vec![Site::linked("A", "https://a"), Site::linked("B", "https://b")];

        // Act
        let part = partition_sites(&sites, true);

        // Assert
        assert_eq!(part.static_sites, sites);
        assert!(part.modal_sites.is_empty());
    }

    #[test]
    fn test_partition_modal_on_keeps_anchor_and_moves_tail() {
        let part = partition_sites(&sample_sites(), true);

        assert_eq!(titles(&part.static_sites), ["A", "B", "More"]);
        assert_eq!(titles(&part.modal_sites), ["C", "D"]);
    }

    #[test]
    fn test_partition_modal_off_drops_only_the_anchor() {
        let part = partition_sites(&sample_sites(), false);

        assert_eq!(titles(&part.static_sites), ["A", "B", "C", "D"]);
        assert!(part.modal_sites.is_empty());
    }

    #[test]
    fn test_partition_only_first_anchor_counts() {
        // Arrange: a second URL-less site after the anchor travels with the tail
        let sites = vec![
            Site::anchor("More"),
            Site::linked("A", "https://a"),
            Site::anchor("Other"),
        ];

        // Act
        let on = partition_sites(&sites, true);
        let off = partition_sites(&sites, false);

        // Assert
        assert_eq!(titles(&on.static_sites), ["More"]);
        assert_eq!(titles(&on.modal_sites), ["A", "Other"]);
        assert_eq!(titles(&off.static_sites), ["A", "Other"]);
    }

    #[test]
    fn test_partition_anchor_last_yields_empty_modal() {
        let sites = vec![Site::linked("A", "https://a"), Site::anchor("More")];
        let part = partition_sites(&sites, true);
        assert_eq!(titles(&part.static_sites), ["A", "More"]);
        assert!(part.modal_sites.is_empty());
    }

    #[test]
    fn test_partition_empty_list() {
        let part = partition_sites(&[], true);
        assert!(part.static_sites.is_empty());
        assert!(part.modal_sites.is_empty());
    }

    // ── normalize_backgrounds ─────────────────────────────────────────────────

    #[test]
    fn test_backgrounds_absent_uses_fallback() {
        assert_eq!(normalize_backgrounds(None, FALLBACK_BG), vec![FALLBACK_BG]);
    }

    #[test]
    fn test_backgrounds_empty_string_uses_fallback() {
        let src = BgSource::One(String::new());
        assert_eq!(normalize_backgrounds(Some(&src), FALLBACK_BG), vec![FALLBACK_BG]);
    }

    #[test]
    fn test_backgrounds_string_becomes_single_element_list() {
        let src = BgSource::One("a.webp".to_string());
        assert_eq!(normalize_backgrounds(Some(&src), FALLBACK_BG), vec!["a.webp"]);
    }

    #[test]
    fn test_backgrounds_list_passes_through() {
        let list = vec!["a.webp".to_string(), "b.webp".to_string()];
        let src = BgSource::Many(list.clone());
        assert_eq!(normalize_backgrounds(Some(&src), FALLBACK_BG), list);
    }

    #[test]
    fn test_background_view_fills_desktop_and_mobile_separately() {
        // Arrange: only the desktop background is configured
        let cfg = BgConfig {
            bg: Some(BgSource::One("desk.webp".to_string())),
            blur: Some("md".to_string()),
            ..BgConfig::default()
        };

        // Act
        let view = background_view(Some(&cfg));

        // Assert
        assert_eq!(view.bgs, vec!["desk.webp"]);
        assert_eq!(view.mbgs, vec![FALLBACK_MOBILE_BG]);
        assert_eq!(view.source.blur.as_deref(), Some("md"));
    }

    // ── transform ─────────────────────────────────────────────────────────────

    #[test]
    fn test_transform_empty_document_uses_defaults() {
        // Arrange / Act
        let view = transform(&AppConfig::default());

        // Assert
        assert_eq!(view.primary_color, DEFAULT_PRIMARY_COLOR);
        assert_eq!(view.var_style[PRIMARY_COLOR_VAR], DEFAULT_PRIMARY_COLOR);
        assert!(view.ist_transition);
        assert_eq!(view.gap_size, "md");
        assert!(view.static_sites.is_empty());
        assert_eq!(view.bg_config.bgs, vec![FALLBACK_BG]);
        assert!(view.motions.is_some());
    }

    #[test]
    fn test_transform_uses_configured_primary_color() {
        let cfg = AppConfig {
            global_style: Some(GlobalStyle {
                primary_color: Some("#ff6a00".to_string()),
                ..GlobalStyle::default()
            }),
            ..AppConfig::default()
        };

        let view = transform(&cfg);

        assert_eq!(view.primary_color, "#ff6a00");
        assert_eq!(view.var_style[PRIMARY_COLOR_VAR], "#ff6a00");
    }

    #[test]
    fn test_transform_disabled_transition_has_no_motion() {
        let cfg = AppConfig {
            layout_config: Some(LayoutConfig {
                ist_transition: Some(false),
                gap_size: Some("lg".to_string()),
                ..LayoutConfig::default()
            }),
            ..AppConfig::default()
        };

        let view = transform(&cfg);

        assert!(!view.ist_transition);
        assert!(view.motions.is_none());
        assert_eq!(view.gap_size, "lg");
    }

    #[test]
    fn test_transform_applies_modal_flag() {
        let cfg = AppConfig {
            sites: Some(sample_sites()),
            sites_config: Some(SitesConfig {
                modal: Some(true),
                ..SitesConfig::default()
            }),
            ..AppConfig::default()
        };

        let view = transform(&cfg);

        assert_eq!(titles(&view.static_sites), ["A", "B", "More"]);
        assert_eq!(titles(&view.modal_sites), ["C", "D"]);
    }

    #[test]
    fn test_transform_moves_metadata_out_of_passthrough_keys() {
        // Arrange
        let cfg: AppConfig = serde_json::from_value(serde_json::json!({
            "name": "kasuie",
            "keywords": "home,links",
            "favicon": "/favicon.ico",
            "avatarConfig": { "src": "a.png" }
        }))
        .unwrap();

        // Act
        let value = serde_json::to_value(transform(&cfg)).unwrap();

        // Assert
        assert_eq!(value["meta"]["title"], "kasuie");
        assert_eq!(value["meta"]["keywords"], "home,links");
        assert!(value.get("keywords").is_none());
        assert_eq!(value["avatarConfig"]["src"], "a.png");
        assert_eq!(value["varStyle"]["--primary-color"], DEFAULT_PRIMARY_COLOR);
    }

    #[test]
    fn test_transform_computed_fields_win_over_document_keys() {
        // Arrange: top-level keys named like computed view fields
        let cfg: AppConfig = serde_json::from_value(serde_json::json!({
            "name": "x",
            "primaryColor": "red",
            "meta": 1
        }))
        .unwrap();

        // Act
        let view = transform(&cfg);
        let text = serde_json::to_string(&view).unwrap();

        // Assert: each key appears once and carries the computed value
        assert!(view.others.is_empty());
        assert_eq!(text.matches("\"primaryColor\"").count(), 1);
        assert_eq!(text.matches("\"meta\"").count(), 1);
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["primaryColor"], DEFAULT_PRIMARY_COLOR);
        assert_eq!(value["meta"]["title"], "x");
    }

    #[test]
    fn test_background_view_drops_colliding_list_keys() {
        let cfg: BgConfig =
            serde_json::from_value(serde_json::json!({ "bgs": "stale", "opacity": 1 })).unwrap();

        let view = background_view(Some(&cfg));
        let text = serde_json::to_string(&view).unwrap();

        assert_eq!(text.matches("\"bgs\"").count(), 1);
        assert_eq!(view.bgs, vec![FALLBACK_BG]);
        assert_eq!(view.source.extra.get("opacity"), Some(&Value::from(1)));
    }

    // ── colours ───────────────────────────────────────────────────────────────

    #[test]
    fn test_to_hsl_converts_default_primary_color() {
        assert_eq!(to_hsl(DEFAULT_PRIMARY_COLOR).as_deref(), Some("206.06 100% 56.67%"));
    }

    #[test]
    fn test_to_hsl_handles_red_hue_and_short_form() {
        assert_eq!(to_hsl("#ff6a00").as_deref(), Some("24.94 100% 50%"));
        assert_eq!(to_hsl("#fff").as_deref(), Some("0 0% 100%"));
        assert_eq!(to_hsl("#000000ff").as_deref(), Some("0 0% 0%"));
    }

    #[test]
    fn test_to_hsl_rejects_non_hex_colours() {
        assert_eq!(to_hsl("red"), None);
        assert_eq!(to_hsl("#12345"), None);
        assert_eq!(to_hsl("#gggggg"), None);
        assert_eq!(to_hsl("#ééé"), None);
    }

    #[test]
    fn test_editor_var_style_carries_hsl_channels() {
        let vars = editor_var_style("#ff6a00");

        assert_eq!(vars[PRIMARY_COLOR_VAR], "#ff6a00");
        assert_eq!(vars[PRIMARY_HSL_VAR], "24.94 100% 50%");
        assert_eq!(vars[FOREGROUND_VAR], EDITOR_FOREGROUND_HSL);
    }

    #[test]
    fn test_editor_var_style_omits_hsl_for_named_colour() {
        let vars = editor_var_style("red");
        assert_eq!(vars[PRIMARY_COLOR_VAR], "red");
        assert!(!vars.contains_key(PRIMARY_HSL_VAR));
    }
}
