//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn templates() -> PathBuf {
        "templates".into()
    }

    pub fn assets() -> PathBuf {
        "assets".into()
    }

    pub fn uploads() -> PathBuf {
        "uploads".into()
    }

    pub fn target() -> PathBuf {
        "public".into()
    }

    pub fn posts() -> PathBuf {
        "posts".into()
    }

    pub fn url_prefix() -> String {
        "/posts".into()
    }

    pub fn default_category() -> String {
        "uncategorized".into()
    }

    pub fn default_template() -> Option<String> {
        None
    }

    pub fn markdown_extensions() -> Vec<String> {
        vec!["md".into(), "markdown".into()]
    }

    pub fn template_extensions() -> Vec<String> {
        ["html", "htm", "xml", "txt", "json"]
            .into_iter()
            .map(Into::into)
            .collect()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        3000
    }
}

// ============================================================================
// [lint] Section Defaults
// ============================================================================

pub mod lint {
    use std::path::PathBuf;

    pub fn vendor() -> PathBuf {
        "vendor".into()
    }
}

// ============================================================================
// [report] Section Defaults
// ============================================================================

pub mod report {
    use std::path::PathBuf;

    pub fn command() -> Vec<String> {
        vec!["lighthouse".into()]
    }

    pub fn flags() -> Vec<String> {
        vec!["--quiet".into(), "--chrome-flags=--headless".into()]
    }

    pub fn output() -> String {
        "html".into()
    }

    pub fn dir() -> PathBuf {
        "reports".into()
    }
}
