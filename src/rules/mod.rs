//! Built-in style-guide rules
//!
//! Every rule is a plain predicate registered here with its metadata. The
//! predicates live next to the language they inspect: [`common`] for rules that
//! read the raw text or apply to both languages, [`html`] and [`css`] for the
//! rest.

pub mod common;
pub mod css;
pub mod html;

use crate::plugin::Language;
use crate::rule::{Rule, Target};

/// Get all built-in rules
pub fn builtin_rules() -> Vec<Rule> {
    vec![
        // Text-level rules shared by both languages
        Rule::new(
            "protocol-relative-url",
            "Omit the protocol from '{url}'",
            common::protocol_relative_url,
        )
        .with_description("Embedded resources should not hard-code http: or https:")
        .with_targets(&[Target::HtmlElement, Target::CssDeclaration, Target::CssAtRule]),

        Rule::new(
            "indentation",
            "Indentation of {count} spaces is not a multiple of two",
            common::indentation,
        )
        .with_description("Indent with spaces, two at a time; never use tabs")
        .with_targets(&[Target::Source]),

        Rule::new(
            "lowercase",
            "'{text}' should be lowercase",
            common::lowercase,
        )
        .with_description("Element names, attributes, selectors, properties and values are lowercase")
        .with_targets(&[
            Target::HtmlElement,
            Target::CssStyleRule,
            Target::CssAtRule,
            Target::CssDeclaration,
        ]),

        Rule::new(
            "trailing-whitespace",
            "Line ends with trailing whitespace",
            common::trailing_whitespace,
        )
        .with_description("Remove whitespace at the end of lines")
        .with_targets(&[Target::Source]),

        Rule::new(
            "utf8-no-bom",
            "File starts with a byte order mark",
            common::utf8_no_bom,
        )
        .with_description("Files are UTF-8 without a byte order mark")
        .with_targets(&[Target::Source]),

        Rule::new(
            "todo-format",
            "Write TODOs as 'TODO(contact): action'",
            common::todo_format,
        )
        .with_description("Mark todos with the keyword TODO followed by a contact in parentheses")
        .with_targets(&[Target::HtmlComment, Target::CssComment]),

        // HTML
        Rule::new(
            "doctype-html5",
            "Use the HTML5 doctype '<!doctype html>'",
            html::doctype_html5,
        )
        .with_description("Documents declare the HTML5 doctype")
        .with_language(Language::Html)
        .with_targets(&[Target::HtmlDoctype]),

        Rule::new(
            "void-element-self-close",
            "Do not close the void element <{name}> with '/>'",
            html::void_element_self_close,
        )
        .with_description("Void elements end with '>' rather than '/>'")
        .with_language(Language::Html)
        .with_targets(&[Target::HtmlElement]),

        Rule::new(
            "alt-attribute",
            "<img> needs an alt attribute",
            html::alt_attribute,
        )
        .with_description("Images carry alternative text; alt=\"\" marks a purely decorative image")
        .with_language(Language::Html)
        .with_targets(&[Target::HtmlElement]),

        Rule::new(
            "double-quotes",
            "Quote the value of '{name}' with double quotes",
            html::double_quotes,
        )
        .with_description("Attribute values use double quotation marks")
        .with_language(Language::Html)
        .with_targets(&[Target::HtmlElement]),

        Rule::new(
            "optional-tags",
            "Optional tag {tag} can be omitted",
            html::optional_tags,
        )
        .with_description("Leave out start and end tags the parser implies")
        .with_language(Language::Html)
        .with_targets(&[Target::HtmlElement])
        .disabled_by_default(),

        Rule::new(
            "type-attribute",
            "Remove the redundant type attribute from <{name}>",
            html::type_attribute,
        )
        .with_description("Stylesheets and scripts imply their type")
        .with_language(Language::Html)
        .with_targets(&[Target::HtmlElement]),

        Rule::new(
            "entity-references",
            "Write '{entity}' as the character itself",
            html::entity_references,
        )
        .with_description("Only escape characters with special meaning in HTML and invisible characters")
        .with_language(Language::Html)
        .with_targets(&[Target::HtmlElement, Target::HtmlText]),

        Rule::new(
            "meta-charset",
            "Declare the encoding with <meta charset=\"utf-8\">",
            html::meta_charset,
        )
        .with_description("Documents declare UTF-8 as their encoding")
        .with_language(Language::Html)
        .with_targets(&[Target::HtmlElement]),

        // CSS
        Rule::new(
            "single-quotes",
            "Use single quotes for {quoted}",
            css::single_quotes,
        )
        .with_description("Strings in values and attribute selectors use single quotation marks")
        .with_language(Language::Css)
        .with_targets(&[Target::CssStyleRule, Target::CssAtRule, Target::CssDeclaration]),

        Rule::new(
            "url-unquoted",
            "Do not quote the url() argument {quoted}",
            css::url_unquoted,
        )
        .with_description("url() arguments are written without quotes")
        .with_language(Language::Css)
        .with_targets(&[Target::CssAtRule, Target::CssDeclaration]),

        Rule::new(
            "charset-double-quotes",
            "@charset takes a double-quoted encoding name",
            css::charset_double_quotes,
        )
        .with_description("The only valid form of @charset uses double quotes")
        .with_language(Language::Css)
        .with_targets(&[Target::CssAtRule]),

        Rule::new(
            "id-class-hyphen",
            "Separate words in '{name}' with hyphens",
            css::id_class_hyphen,
        )
        .with_description("Id and class names use hyphens as word delimiters")
        .with_language(Language::Css)
        .with_targets(&[Target::CssStyleRule]),

        Rule::new(
            "three-digit-hex",
            "'{color}' can be written as '{short}'",
            css::three_digit_hex,
        )
        .with_description("Use 3-character hexadecimal notation where possible")
        .with_language(Language::Css)
        .with_targets(&[Target::CssDeclaration]),

        Rule::new(
            "leading-zero",
            "Drop the leading zero of '{number}'",
            css::leading_zero,
        )
        .with_description("Values between -1 and 1 are written without a leading 0")
        .with_language(Language::Css)
        .with_targets(&[Target::CssAtRule, Target::CssDeclaration]),

        Rule::new("zero-unit", "Omit the unit of '{value}'", css::zero_unit)
            .with_description("A zero length needs no unit")
            .with_language(Language::Css)
            .with_targets(&[Target::CssDeclaration]),

        Rule::new(
            "declaration-semicolon",
            "End the declaration of '{property}' with a semicolon",
            css::declaration_semicolon,
        )
        .with_description("Every declaration ends with a semicolon, including the last one")
        .with_language(Language::Css)
        .with_targets(&[Target::CssBlock]),

        Rule::new(
            "property-colon-space",
            "Write '{property}:' followed by a single space",
            css::property_colon_space,
        )
        .with_description("No space before a property's colon and one space after it")
        .with_language(Language::Css)
        .with_targets(&[Target::CssDeclaration]),

        Rule::new(
            "brace-spacing",
            "Put a single space between the selector and '{'",
            css::brace_spacing,
        )
        .with_description("Opening braces follow the selector on the same line after one space")
        .with_language(Language::Css)
        .with_targets(&[Target::CssStyleRule, Target::CssAtRule]),

        Rule::new(
            "alphabetical-declarations",
            "'{property}' should come before '{previous}'",
            css::alphabetical_declarations,
        )
        .with_description("Declarations are sorted alphabetically, ignoring vendor prefixes")
        .with_language(Language::Css)
        .with_targets(&[Target::CssBlock]),

        Rule::new(
            "type-selector-qualifier",
            "Do not qualify '{qualifier}' with the type selector '{name}'",
            css::type_selector_qualifier,
        )
        .with_description("Id and class selectors are not qualified with element names")
        .with_language(Language::Css)
        .with_targets(&[Target::CssStyleRule]),

        Rule::new(
            "important",
            "Avoid !important on '{property}'",
            css::important,
        )
        .with_description("Specificity should come from selectors, not !important")
        .with_language(Language::Css)
        .with_targets(&[Target::CssDeclaration]),

        Rule::new(
            "id-selector",
            "Avoid the id selector '{name}'",
            css::id_selector,
        )
        .with_description("Prefer class selectors over id selectors")
        .with_language(Language::Css)
        .with_targets(&[Target::CssStyleRule])
        .disabled_by_default(),

        Rule::new(
            "declaration-newline",
            "Put the declaration of '{property}' on its own line",
            css::declaration_newline,
        )
        .with_description("Each declaration of a multi-line block starts a new line")
        .with_language(Language::Css)
        .with_targets(&[Target::CssBlock]),

        Rule::new(
            "selector-newline",
            "Start selector '{selector}' on a new line",
            css::selector_newline,
        )
        .with_description("Each selector of a group starts a new line")
        .with_language(Language::Css)
        .with_targets(&[Target::CssStyleRule]),

        Rule::new(
            "rule-blank-line",
            "Separate rules with a blank line",
            css::rule_blank_line,
        )
        .with_description("Sibling rules are separated by one blank line")
        .with_language(Language::Css)
        .with_targets(&[Target::CssRuleList]),
    ]
}

/// Run one rule over a snippet and keep only its findings
#[cfg(test)]
pub(crate) fn check_rule(rule_id: &str, file: &str, text: &str) -> Vec<crate::diagnostic::Diagnostic> {
    use crate::config::ResolvedConfig;
    use crate::engine::Engine;

    let engine = Engine::new(ResolvedConfig::only(&[rule_id]));
    engine
        .check_file(std::path::Path::new(file), text)
        .expect("supported file")
        .into_iter()
        .filter(|d| d.rule_id == rule_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_rule_ids_unique() {
        let rules = builtin_rules();
        let ids: HashSet<_> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), rules.len());
        assert_eq!(rules.len(), 31);
    }

    #[test]
    fn test_opt_in_rules() {
        let disabled: Vec<_> = builtin_rules()
            .into_iter()
            .filter(|r| !r.enabled)
            .map(|r| r.id)
            .collect();
        assert_eq!(disabled, vec!["optional-tags", "id-selector"]);
    }

    #[test]
    fn test_language_scoped_rules() {
        let rules = builtin_rules();
        let css_only = rules.iter().find(|r| r.id == "zero-unit").unwrap();
        assert_eq!(css_only.languages, vec![Language::Css]);
        let both = rules.iter().find(|r| r.id == "indentation").unwrap();
        assert_eq!(both.languages.len(), 2);
    }
}
