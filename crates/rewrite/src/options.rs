use crate::error::OptionsError;
use serde::Deserialize;

/// Construction parameters of a [`crate::Watcher`].
///
/// Deserializes from a TOML table; missing keys take their defaults and the
/// camelCase spellings are accepted as aliases.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatcherOptions {
    /// Sweep the existing content once at construction.
    #[serde(alias = "scanExisting")]
    pub scan_existing: bool,
    /// Leave text inside live-editable regions alone.
    #[serde(alias = "contentEditable")]
    pub content_editable: bool,
    /// Rewrite rendered-text attributes such as `placeholder` and `title`.
    pub attributes: bool,
    /// Discover shadow roots and add them to the watched targets.
    #[serde(alias = "shadowSubtrees", alias = "encapsulated")]
    pub shadow_subtrees: bool,
    /// Leave text set in icon fonts alone. Needs a style resolution per unit.
    #[serde(alias = "iconFonts")]
    pub icon_fonts: bool,
    /// Rewrite quoted `::before`/`::after` content. Needs a style resolution
    /// per element.
    #[serde(alias = "cssGeneratedContent")]
    pub css_generated_content: bool,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            scan_existing: true,
            content_editable: true,
            attributes: true,
            shadow_subtrees: true,
            icon_fonts: false,
            css_generated_content: false,
        }
    }
}

impl WatcherOptions {
    pub fn from_toml_str(input: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(input)?)
    }

    pub(crate) fn needs_styles(&self) -> bool {
        self.icon_fonts || self.css_generated_content
    }
}
