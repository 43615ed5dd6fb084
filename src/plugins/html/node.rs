//! HTML document tree

use crate::span::Span;

/// Elements that never have content or an end tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose end tag may be omitted
pub const OPTIONAL_END_TAG: &[&str] = &[
    "html", "head", "body", "li", "dt", "dd", "p", "rb", "rt", "rtc", "rp", "optgroup", "option",
    "colgroup", "caption", "thead", "tbody", "tfoot", "tr", "td", "th",
];

/// Elements that may directly follow a `<p>` whose end tag is omitted
pub const P_END_FOLLOWERS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "dialog", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hgroup", "hr", "main", "menu", "nav", "ol", "p", "pre", "search", "section", "table", "ul",
];

/// How an attribute value was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    Double,
    Single,
    Unquoted,
    /// Boolean attribute without a value
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased name
    pub name: String,
    pub raw_name: String,
    pub name_span: Span,
    /// Value without quotes
    pub value: Option<String>,
    /// Span of the value as written, quotes included
    pub value_span: Option<Span>,
    pub quote: QuoteStyle,
    pub span: Span,
}

impl Attribute {
    /// Span of the value without its quotes
    pub fn inner_value_span(&self) -> Option<Span> {
        let span = self.value_span?;
        let value = self.value.as_deref()?;
        let start = match self.quote {
            QuoteStyle::Double | QuoteStyle::Single => {
                let mut start = span.start;
                start.advance(if self.quote == QuoteStyle::Double { '"' } else { '\'' });
                start
            }
            _ => span.start,
        };
        Some(Span::covering(start, value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercased tag name
    pub name: String,
    pub raw_name: String,
    pub name_span: Span,
    pub attributes: Vec<Attribute>,
    pub children: Vec<HtmlNode>,
    /// Start tag closed with `/>`
    pub self_closing: bool,
    pub start_tag: Span,
    /// Span of the `>` or `/>` ending the start tag
    pub start_tag_end: Option<Span>,
    /// `None` when the end tag was implied
    pub end_tag: Option<Span>,
    pub span: Span,
}

impl Element {
    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.name.as_str())
    }

    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(|a| a.value.as_deref())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Child elements, skipping text and comments
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            HtmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Depth-first search for the first element with `name`
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements()
            .find_map(|el| if el.name == name { Some(el) } else { el.find(name) })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub text: String,
    pub span: Span,
    /// Content of a raw-text element or a CDATA section
    pub raw: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    /// Raw text including `<!--` and `-->`
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctypeNode {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    Element(Element),
    Text(TextNode),
    Comment(CommentNode),
    Doctype(DoctypeNode),
}

impl HtmlNode {
    pub fn span(&self) -> Span {
        match self {
            HtmlNode::Element(el) => el.span,
            HtmlNode::Text(text) => text.span,
            HtmlNode::Comment(comment) => comment.span,
            HtmlNode::Doctype(doctype) => doctype.span,
        }
    }

    /// Whitespace-only text
    pub fn is_blank(&self) -> bool {
        matches!(self, HtmlNode::Text(t) if t.text.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;

    #[test]
    fn test_inner_value_span() {
        let start = Position::new(5, 1, 6);
        let attr = Attribute {
            name: "href".to_string(),
            raw_name: "href".to_string(),
            name_span: Span::covering(start, "href"),
            value: Some("#top".to_string()),
            value_span: Some(Span::covering(start.advanced("href="), "\"#top\"")),
            quote: QuoteStyle::Double,
            span: Span::covering(start, "href=\"#top\""),
        };
        let inner = attr.inner_value_span().unwrap();
        assert_eq!(inner.start.column, 12);
        assert_eq!(inner.len(), 4);
    }
}
