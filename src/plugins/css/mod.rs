//! CSS plugin

mod document;
pub mod lexer;
pub mod node;
pub mod parser;

pub use document::{walk_stylesheet, CssDocument, ParsedCss};

use crate::plugin::{Document, Language, Plugin};
use std::path::Path;

/// CSS plugin for stylesheet linting
pub struct CssPlugin {
    /// Plugin version
    version: String,
}

impl Default for CssPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl CssPlugin {
    /// Create a new CSS plugin
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Plugin for CssPlugin {
    fn id(&self) -> &str {
        "css"
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn description(&self) -> &str {
        "CSS style-guide plugin"
    }

    fn extensions(&self) -> &[&str] {
        &["css"]
    }

    fn language(&self) -> Language {
        Language::Css
    }

    fn parse(&self, content: &str, _path: &Path) -> Box<dyn Document> {
        Box::new(CssDocument::parse(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_metadata() {
        let plugin = CssPlugin::new();
        assert_eq!(plugin.id(), "css");
        assert_eq!(plugin.extensions(), &["css"]);
        assert_eq!(plugin.language(), Language::Css);
    }

    #[test]
    fn test_parse_never_fails() {
        let plugin = CssPlugin::new();
        let doc = plugin.parse("a { color: 'open", Path::new("broken.css"));
        assert!(!doc.parse_issues().is_empty());
        assert_eq!(doc.language(), Language::Css);
    }
}
