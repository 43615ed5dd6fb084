//! HTML rules

use crate::plugins::html::node::{Element, HtmlNode, QuoteStyle, OPTIONAL_END_TAG, P_END_FOLLOWERS};
use crate::rule::{Emitter, RuleContext, Unit};
use crate::span::{Position, Span};
use regex::Regex;
use std::sync::LazyLock;

static CHARACTER_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#([0-9]+)|#[xX]([0-9a-fA-F]+)|([A-Za-z][A-Za-z0-9]*));")
        .expect("character reference pattern is valid")
});

/// Named references that stay escaped: markup characters and invisible ones
const KEPT_ENTITIES: &[&str] = &[
    "amp", "lt", "gt", "quot", "apos", "nbsp", "shy", "zwj", "zwnj", "lrm", "rlm", "ensp", "emsp",
    "thinsp",
];

/// Common named references and the characters they stand for
const NAMED_CHARACTERS: &[(&str, char)] = &[
    ("bull", '•'),
    ("cent", '¢'),
    ("copy", '©'),
    ("deg", '°'),
    ("divide", '÷'),
    ("eacute", 'é'),
    ("euro", '€'),
    ("frac12", '½'),
    ("hellip", '…'),
    ("laquo", '«'),
    ("larr", '←'),
    ("ldquo", '“'),
    ("lsquo", '‘'),
    ("mdash", '—'),
    ("middot", '·'),
    ("ndash", '–'),
    ("para", '¶'),
    ("pound", '£'),
    ("raquo", '»'),
    ("rarr", '→'),
    ("rdquo", '”'),
    ("reg", '®'),
    ("rsquo", '’'),
    ("sect", '§'),
    ("times", '×'),
    ("trade", '™'),
    ("yen", '¥'),
];

/// `type` values that only restate a script's default
const JAVASCRIPT_TYPES: &[&str] = &[
    "text/javascript",
    "application/javascript",
    "application/ecmascript",
    "application/x-javascript",
    "text/ecmascript",
    "text/jscript",
];

/// Parents inside which a `</p>` cannot be dropped
const P_END_KEEPERS: &[&str] = &["a", "audio", "del", "ins", "map", "noscript", "video"];

pub fn doctype_html5(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::HtmlDoctype(doctype) = unit else {
        return;
    };
    let inner = doctype
        .text
        .trim_start_matches("<!")
        .trim_end_matches('>');
    let words: Vec<String> = inner
        .split_whitespace()
        .map(|w| w.to_ascii_lowercase())
        .collect();
    if words != ["doctype", "html"] {
        out.report_with(doctype.span, &[])
            .suggest("Use the HTML5 doctype", "<!doctype html>");
    }
}

pub fn void_element_self_close(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::HtmlElement { element, .. } = unit else {
        return;
    };
    if !element.is_void() || !element.self_closing {
        return;
    }
    if let Some(end) = element.start_tag_end {
        out.report_with(end, &[("name", element.name.as_str())])
            .suggest("End the tag with '>'", ">");
    }
}

pub fn alt_attribute(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::HtmlElement { element, .. } = unit else {
        return;
    };
    if element.name == "img" && !element.has_attr("alt") {
        out.report_with(element.start_tag, &[]);
    }
}

pub fn double_quotes(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::HtmlElement { element, .. } = unit else {
        return;
    };
    for attr in &element.attributes {
        if attr.quote != QuoteStyle::Single {
            continue;
        }
        let (Some(value), Some(span)) = (attr.value.as_deref(), attr.value_span) else {
            continue;
        };
        let diag = out.report_with(span, &[("name", attr.raw_name.as_str())]);
        if !value.contains('"') {
            diag.suggest("Use double quotes", &format!("\"{}\"", value));
        }
    }
}

pub fn optional_tags(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::HtmlElement { element, ancestors } = unit else {
        return;
    };
    let name = element.name.as_str();

    if matches!(name, "html" | "head" | "body") && element.attributes.is_empty() {
        let tag = format!("<{}>", name);
        out.report_with(element.start_tag, &[("tag", tag.as_str())])
            .suggest("Remove the start tag", "");
    }

    let Some(end_tag) = element.end_tag else {
        return;
    };
    let omissible = match name {
        "p" => p_end_omissible(element, ancestors),
        _ => OPTIONAL_END_TAG.contains(&name),
    };
    if omissible {
        let tag = format!("</{}>", name);
        out.report_with(end_tag, &[("tag", tag.as_str())])
            .suggest("Remove the end tag", "");
    }
}

/// `</p>` can go when nothing but a paragraph-closing element or the parent's end follows
fn p_end_omissible(element: &Element, ancestors: &[&Element]) -> bool {
    let Some(parent) = ancestors.last() else {
        return false;
    };
    if P_END_KEEPERS.contains(&parent.name.as_str()) {
        return false;
    }
    let mut following = parent
        .children
        .iter()
        .skip_while(|node| !matches!(node, HtmlNode::Element(el) if std::ptr::eq(el, element)))
        .skip(1)
        .filter(|node| !node.is_blank());
    match following.next() {
        None => true,
        Some(HtmlNode::Element(next)) => P_END_FOLLOWERS.contains(&next.name.as_str()),
        Some(_) => false,
    }
}

pub fn type_attribute(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::HtmlElement { element, .. } = unit else {
        return;
    };
    let Some(attr) = element.attr("type") else {
        return;
    };
    let value = attr.value.as_deref().unwrap_or_default();
    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let redundant = match element.name.as_str() {
        "style" => mime == "text/css",
        "link" => {
            let stylesheet = element
                .attr_value("rel")
                .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet")));
            stylesheet && mime == "text/css"
        }
        "script" => JAVASCRIPT_TYPES.contains(&mime.as_str()),
        _ => false,
    };
    if redundant {
        out.report_with(attr.span, &[("name", element.name.as_str())])
            .suggest("Remove the type attribute", "");
    }
}

pub fn entity_references(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    match unit {
        Unit::HtmlText(text) if !text.raw => scan_references(out, &text.text, text.span.start),
        Unit::HtmlElement { element, .. } => {
            for attr in &element.attributes {
                if let (Some(value), Some(span)) = (attr.value.as_deref(), attr.inner_value_span()) {
                    scan_references(out, value, span.start);
                }
            }
        }
        _ => {}
    }
}

fn scan_references(out: &mut Emitter<'_>, text: &str, origin: Position) {
    for caps in CHARACTER_REFERENCE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let replacement = if let Some(name) = caps.get(3) {
            if KEPT_ENTITIES.contains(&name.as_str()) {
                continue;
            }
            NAMED_CHARACTERS
                .iter()
                .find(|(n, _)| *n == name.as_str())
                .map(|&(_, c)| c)
        } else {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(dec), _) => dec.as_str().parse().ok(),
                (_, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
                _ => None,
            };
            let Some(ch) = code.and_then(char::from_u32) else {
                continue;
            };
            if needs_escape(ch) {
                continue;
            }
            Some(ch)
        };

        let start = origin.advanced(&text[..whole.start()]);
        let diag = out.report_with(Span::covering(start, whole.as_str()), &[("entity", whole.as_str())]);
        if let Some(ch) = replacement {
            diag.suggest("Use the character", &ch.to_string());
        }
    }
}

/// Characters that keep their reference: markup-significant, control and invisible ones
fn needs_escape(ch: char) -> bool {
    matches!(ch, '&' | '<' | '>' | '"' | '\'')
        || ch.is_control()
        || ch.is_whitespace()
        || matches!(
            ch,
            '\u{AD}' | '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
        )
}

pub fn meta_charset(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::HtmlElement { element, .. } = unit else {
        return;
    };
    if element.name != "head" {
        return;
    }
    let charset = element
        .elements()
        .filter(|el| el.name == "meta")
        .find_map(|meta| meta.attr("charset"));
    match charset {
        None => {
            out.report_with(element.start_tag, &[]);
        }
        Some(attr) => {
            let value = attr.value.as_deref().unwrap_or_default().trim();
            if !value.eq_ignore_ascii_case("utf-8") {
                out.report_with(attr.span, &[])
                    .suggest("Use UTF-8", "charset=\"utf-8\"");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::rules::check_rule;
    use pretty_assertions::assert_eq;

    fn lines(rule: &str, text: &str) -> Vec<usize> {
        check_rule(rule, "a.html", text)
            .iter()
            .map(|d| d.line())
            .collect()
    }

    #[test]
    fn test_doctype_html5() {
        assert!(lines("doctype-html5", "<!DOCTYPE html>").is_empty());
        assert!(lines("doctype-html5", "<!doctype html>").is_empty());
        let legacy = "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\">";
        assert_eq!(lines("doctype-html5", legacy), vec![1]);
    }

    #[test]
    fn test_void_element_self_close() {
        let found = check_rule("void-element-self-close", "a.html", "<br/>");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].column(), 4);
        assert_eq!(found[0].fix.as_ref().unwrap().replacement, ">");
        assert!(check_rule("void-element-self-close", "a.html", "<br>").is_empty());
    }

    #[test]
    fn test_alt_attribute() {
        assert_eq!(
            lines("alt-attribute", "<img src=\"a.png\">\n<img src=\"b.png\" alt=\"\">"),
            vec![1]
        );
    }

    #[test]
    fn test_double_quotes() {
        let found = check_rule("double-quotes", "a.html", "<a class='maia-button' href=\"#\">x</a>");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "Quote the value of 'class' with double quotes");
        assert_eq!(found[0].fix.as_ref().unwrap().replacement, "\"maia-button\"");
    }

    #[test]
    fn test_optional_tags() {
        let text = "<html>\n<head>\n<title>t</title>\n</head>\n<body>\n<ul>\n<li>a</li>\n</ul>\n<div><p>x</p><span>y</span></div>\n</body>\n</html>";
        let found = check_rule("optional-tags", "a.html", text);
        let tags: Vec<_> = found.iter().map(|d| d.message.clone()).collect();
        assert_eq!(
            tags,
            vec![
                "Optional tag <html> can be omitted",
                "Optional tag <head> can be omitted",
                "Optional tag </head> can be omitted",
                "Optional tag <body> can be omitted",
                "Optional tag </li> can be omitted",
                "Optional tag </body> can be omitted",
                "Optional tag </html> can be omitted",
            ]
        );
    }

    #[test]
    fn test_optional_tags_off_by_default() {
        let engine = crate::engine::Engine::new(crate::config::ResolvedConfig::default());
        let found = engine
            .check_file(std::path::Path::new("a.html"), "<ul>\n  <li>a</li>\n</ul>\n")
            .unwrap();
        assert!(found.iter().all(|d| d.rule_id != "optional-tags"));
    }

    #[test]
    fn test_type_attribute() {
        let text = "<link rel=\"stylesheet\" href=\"a.css\" type=\"text/css\">\n\
                    <script src=\"a.js\" type=\"text/javascript\"></script>\n\
                    <script type=\"module\" src=\"b.js\"></script>\n\
                    <link rel=\"icon\" href=\"i.png\" type=\"image/png\">";
        assert_eq!(lines("type-attribute", text), vec![1, 2]);
    }

    #[test]
    fn test_entity_references() {
        let text = "<p title=\"&eacute;t&eacute;\">&copy; 2024 &amp; &lt;b&gt; &nbsp; &#8212; &#x27;</p>";
        let found = check_rule("entity-references", "a.html", text);
        let entities: Vec<_> = found
            .iter()
            .map(|d| d.fix.as_ref().map(|f| f.replacement.clone()))
            .collect();
        assert_eq!(
            entities,
            vec![
                Some("é".to_string()),
                Some("é".to_string()),
                Some("©".to_string()),
                Some("—".to_string())
            ]
        );
    }

    #[test]
    fn test_entity_references_skip_scripts() {
        let text = "<script>if (a &copy; b) {}</script>";
        assert!(check_rule("entity-references", "a.html", text).is_empty());
    }

    #[test]
    fn test_entity_references_in_title_and_textarea() {
        let text = "<title>Caf&eacute; &amp; <Bar></title>\n<textarea>&copy;</textarea>";
        let found = check_rule("entity-references", "a.html", text);
        let entities: Vec<_> = found.iter().map(|d| (d.line(), d.column())).collect();
        assert_eq!(entities, vec![(1, 11), (2, 11)]);
    }

    #[test]
    fn test_meta_charset() {
        assert!(lines("meta-charset", "<head><meta charset=\"UTF-8\"></head>").is_empty());
        assert_eq!(lines("meta-charset", "<head><title>x</title></head>"), vec![1]);
        assert_eq!(
            lines("meta-charset", "<head>\n<meta charset=\"iso-8859-1\">\n</head>"),
            vec![2]
        );
        // No explicit head, nothing to anchor to
        assert!(lines("meta-charset", "<title>x</title>").is_empty());
    }
}
