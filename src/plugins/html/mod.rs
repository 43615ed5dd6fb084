//! HTML plugin

mod document;
pub mod lexer;
pub mod node;
pub mod parser;

pub use document::HtmlDocument;

use crate::plugin::{Document, Language, Plugin};
use std::path::Path;

/// HTML plugin for markup linting
pub struct HtmlPlugin {
    /// Plugin version
    version: String,
}

impl Default for HtmlPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlPlugin {
    /// Create a new HTML plugin
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Plugin for HtmlPlugin {
    fn id(&self) -> &str {
        "html"
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn description(&self) -> &str {
        "HTML style-guide plugin"
    }

    fn extensions(&self) -> &[&str] {
        &["html", "htm"]
    }

    fn language(&self) -> Language {
        Language::Html
    }

    fn parse(&self, content: &str, _path: &Path) -> Box<dyn Document> {
        Box::new(HtmlDocument::parse(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_metadata() {
        let plugin = HtmlPlugin::new();
        assert_eq!(plugin.id(), "html");
        assert_eq!(plugin.extensions(), &["html", "htm"]);
        assert_eq!(plugin.language(), Language::Html);
        assert!(!plugin.version().is_empty());
    }

    #[test]
    fn test_parse_never_fails() {
        let plugin = HtmlPlugin::new();
        let doc = plugin.parse("<div <p>></span>", Path::new("broken.html"));
        assert!(!doc.parse_issues().is_empty());
    }
}
