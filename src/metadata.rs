//! Application metadata provider.

/// Name used in prompt copy when the host reports no display name.
pub const DEFAULT_APP_NAME: &str = "This App";

/// Describes the running application.
pub trait AppMetadata: Send + Sync {
    /// Version string of the running build, if known.
    fn current_version(&self) -> Option<String>;

    /// Human-readable application name, if known.
    fn display_name(&self) -> Option<String>;
}

/// Metadata fixed at construction time.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    version: Option<String>,
    display_name: Option<String>,
}

impl StaticMetadata {
    /// Create metadata for the given version.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            display_name: None,
        }
    }

    /// Metadata that reports no version.
    pub fn unversioned() -> Self {
        Self::default()
    }

    /// Set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

impl AppMetadata for StaticMetadata {
    fn current_version(&self) -> Option<String> {
        self.version.clone().filter(|v| !v.trim().is_empty())
    }

    fn display_name(&self) -> Option<String> {
        self.display_name.clone().filter(|n| !n.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_metadata_reports_version() {
        let meta = StaticMetadata::new("1.2.0").with_display_name("Notes");
        assert_eq!(meta.current_version().as_deref(), Some("1.2.0"));
        assert_eq!(meta.display_name().as_deref(), Some("Notes"));
    }

    #[test]
    fn test_blank_version_is_treated_as_missing() {
        let meta = StaticMetadata::new("  ");
        assert!(meta.current_version().is_none());
        assert!(StaticMetadata::unversioned().current_version().is_none());
    }
}
