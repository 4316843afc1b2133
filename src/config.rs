//! Configuration types for a flashcard import run.
//!
//! All tunable behaviour is controlled through [`ImportConfig`], built via its
//! [`ImportConfigBuilder`]. The config is constant for the whole batch.

use crate::error::ImportError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Literal token separating cards in the input file.
pub const DEFAULT_DELIMITER: &str = "#flashcard";

/// Note types whose name contains this (case-insensitively) are preselected.
pub const DEFAULT_TEMPLATE_KEYWORD: &str = "basic";

/// Configuration for one import run.
///
/// Built via [`ImportConfig::builder()`] or using [`ImportConfig::default()`].
///
/// # Example
/// ```rust
/// use flashcard_import::ImportConfig;
///
/// let config = ImportConfig::builder()
///     .tag("imported")
///     .template_keyword("cloze")
///     .build()
///     .unwrap();
/// assert_eq!(config.delimiter, "#flashcard");
/// ```
#[derive(Clone)]
pub struct ImportConfig {
    /// Card delimiter. Default: `#flashcard`.
    ///
    /// There is no escape syntax; the token cannot appear inside a card.
    pub delimiter: String,

    /// Keyword used to preselect a note type in the picker. Default: `basic`.
    pub template_keyword: String,

    /// Tags attached to every created note. Default: none.
    pub tags: Vec<String>,

    /// Receives per-note events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            template_keyword: DEFAULT_TEMPLATE_KEYWORD.to_string(),
            tags: Vec::new(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ImportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportConfig")
            .field("delimiter", &self.delimiter)
            .field("template_keyword", &self.template_keyword)
            .field("tags", &self.tags)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ImportProgressCallback>"),
            )
            .finish()
    }
}

impl ImportConfig {
    /// Create a new builder for `ImportConfig`.
    pub fn builder() -> ImportConfigBuilder {
        ImportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ImportConfig`].
#[derive(Debug)]
pub struct ImportConfigBuilder {
    config: ImportConfig,
}

impl ImportConfigBuilder {
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.config.delimiter = delimiter.into();
        self
    }

    pub fn template_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.config.template_keyword = keyword.into();
        self
    }

    /// Add one tag. May be called repeatedly.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.config.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ImportConfig, ImportError> {
        let c = &self.config;
        if c.delimiter.is_empty() {
            return Err(ImportError::InvalidConfig(
                "delimiter must not be empty".into(),
            ));
        }
        if let Some(bad) = c
            .tags
            .iter()
            .find(|t| t.is_empty() || t.chars().any(char::is_whitespace))
        {
            return Err(ImportError::InvalidConfig(format!(
                "tag {bad:?} must be non-empty and contain no whitespace"
            )));
        }
        Ok(self.config)
    }
}
