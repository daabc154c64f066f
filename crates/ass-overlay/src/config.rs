//! Provider configuration

use std::time::Duration;

use crate::tag_images::TagScanMode;

/// Default font substitution applied to every renderer
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FontSettings {
    /// Family used when a style's font cannot be found
    pub default_family: String,
    /// Explicit fallback font file, if any
    pub default_font: Option<String>,
    /// Fontconfig configuration file, if any
    pub fontconfig_path: Option<String>,
    /// Rebuild the font index when the renderer is configured
    pub update_cache: bool,
    /// Global font scale factor
    pub font_scale: f64,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            default_family: "Sans".to_string(),
            default_font: None,
            fontconfig_path: None,
            update_cache: true,
            font_scale: 1.0,
        }
    }
}

/// Configuration for [`SubtitleRenderProvider`](crate::SubtitleRenderProvider)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProviderConfig {
    /// Font substitution for renderers created by the provider
    pub fonts: FontSettings,
    /// Short sleep before a pending warm-up escalates to a progress wait
    pub warmup_grace: Duration,
    /// Readiness polling interval while the progress wait is shown
    pub progress_poll_interval: Duration,
    /// Title of the progress wait
    pub progress_title: String,
    /// Message of the progress wait
    pub progress_message: String,
    /// Part of the script searched for image references
    pub scan_mode: TagScanMode,
    /// Search the script directory case-insensitively for missing images
    pub directory_scan: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            fonts: FontSettings::default(),
            warmup_grace: Duration::from_millis(250),
            progress_poll_interval: Duration::from_millis(250),
            progress_title: "Updating font index".to_string(),
            progress_message: "This may take several minutes".to_string(),
            scan_mode: TagScanMode::default(),
            directory_scan: true,
        }
    }
}

impl ProviderConfig {
    /// Set font settings
    #[must_use]
    pub fn with_fonts(mut self, fonts: FontSettings) -> Self {
        self.fonts = fonts;
        self
    }

    /// Set the grace period before escalating a warm-up wait
    #[must_use]
    pub fn with_warmup_grace(mut self, grace: Duration) -> Self {
        self.warmup_grace = grace;
        self
    }

    /// Set the polling interval of the progress wait
    #[must_use]
    pub fn with_progress_poll_interval(mut self, interval: Duration) -> Self {
        self.progress_poll_interval = interval;
        self
    }

    /// Set the progress wait title and message
    #[must_use]
    pub fn with_progress_text(
        mut self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.progress_title = title.into();
        self.progress_message = message.into();
        self
    }

    /// Set the tag scan mode
    #[must_use]
    pub fn with_scan_mode(mut self, mode: TagScanMode) -> Self {
        self.scan_mode = mode;
        self
    }

    /// Enable or disable the script directory search
    #[must_use]
    pub fn with_directory_scan(mut self, enabled: bool) -> Self {
        self.directory_scan = enabled;
        self
    }
}
