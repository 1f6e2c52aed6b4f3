//! Text and markup sanitizers used by the coercion pipeline.

use ammonia::Builder;
use regex_lite::Regex;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:script|style)[^>]*>.*?</(?:script|style)\s*>")
        .expect("script/style pattern is valid")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[a-zA-Z/!?][^>]*>?").expect("tag pattern is valid"));

static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n\t ]+").expect("whitespace pattern is valid"));

static OCTET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[a-fA-F0-9]{2}").expect("octet pattern is valid"));

static SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("space pattern is valid"));

/// Plain-text sanitizer for single-line input.
///
/// Drops `<script>`/`<style>` blocks with their content, strips every other
/// tag, folds line breaks and tabs into single spaces, removes
/// percent-encoded octets and remaining control characters, and trims.
pub fn sanitize_text(input: &str) -> String {
    let mut text = SCRIPT_OR_STYLE.replace_all(input, "").into_owned();
    text = TAG.replace_all(&text, "").into_owned();
    text = LINE_BREAKS.replace_all(&text, " ").into_owned();
    while OCTET.is_match(&text) {
        text = OCTET.replace_all(&text, "").into_owned();
    }
    text.retain(|c| !c.is_control());
    SPACES.replace_all(text.trim(), " ").into_owned()
}

/// Normalizes a meta key: lower-case ASCII letters, digits, `_` and `-`.
pub fn sanitize_key(input: &str) -> String {
    input
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Restricted markup sanitizer for `html` values.
pub fn sanitize_html(input: &str) -> String {
    html_policy().clean(input).to_string()
}

/// Global attributes allowed on every permitted tag.
const GLOBAL_ATTRIBUTES: &[&str] = &["class", "dir", "id", "lang", "role", "style", "title", "xml:lang"];

/// The host's post-content allow-list.
const POST_TAGS: &[(&str, &[&str])] = &[
    ("a", &["href", "rel", "rev", "name", "target", "download", "hreflang", "referrerpolicy"]),
    ("abbr", &[]),
    ("acronym", &[]),
    ("address", &[]),
    ("area", &["alt", "coords", "href", "nohref", "shape", "target"]),
    ("article", &["align"]),
    ("aside", &["align"]),
    ("audio", &["autoplay", "controls", "loop", "muted", "preload", "src"]),
    ("b", &[]),
    ("bdo", &[]),
    ("big", &[]),
    ("blockquote", &["cite"]),
    ("br", &[]),
    ("button", &["disabled", "name", "type", "value"]),
    ("caption", &["align"]),
    ("cite", &[]),
    ("code", &[]),
    ("col", &["align", "char", "charoff", "span", "valign", "width"]),
    ("colgroup", &["align", "char", "charoff", "span", "valign", "width"]),
    ("dd", &[]),
    ("del", &["datetime"]),
    ("details", &["align", "open"]),
    ("dfn", &[]),
    ("div", &["align"]),
    ("dl", &[]),
    ("dt", &[]),
    ("em", &[]),
    ("fieldset", &[]),
    ("figcaption", &["align"]),
    ("figure", &["align"]),
    ("font", &["color", "face", "size"]),
    ("footer", &["align"]),
    ("h1", &["align"]),
    ("h2", &["align"]),
    ("h3", &["align"]),
    ("h4", &["align"]),
    ("h5", &["align"]),
    ("h6", &["align"]),
    ("header", &["align"]),
    ("hgroup", &["align"]),
    ("hr", &["align", "noshade", "size", "width"]),
    ("i", &[]),
    ("img", &["alt", "align", "border", "height", "hspace", "loading", "longdesc", "vspace", "src", "usemap", "width"]),
    ("ins", &["datetime", "cite"]),
    ("kbd", &[]),
    ("label", &["for"]),
    ("legend", &["align"]),
    ("li", &["align", "value"]),
    ("main", &["align"]),
    ("map", &["name"]),
    ("mark", &[]),
    ("menu", &["type"]),
    ("nav", &["align"]),
    ("object", &["data", "type"]),
    ("ol", &["start", "type", "reversed"]),
    ("p", &["align"]),
    ("pre", &["width"]),
    ("q", &["cite"]),
    ("rb", &[]),
    ("rp", &[]),
    ("rt", &[]),
    ("rtc", &[]),
    ("ruby", &[]),
    ("s", &[]),
    ("samp", &[]),
    ("section", &["align"]),
    ("small", &[]),
    ("span", &["align"]),
    ("strike", &[]),
    ("strong", &[]),
    ("sub", &[]),
    ("summary", &["align"]),
    ("sup", &[]),
    ("table", &["align", "bgcolor", "border", "cellpadding", "cellspacing", "rules", "summary", "width"]),
    ("tbody", &["align", "char", "charoff", "valign"]),
    ("td", &["abbr", "align", "axis", "bgcolor", "char", "charoff", "colspan", "headers", "height", "nowrap", "rowspan", "scope", "valign", "width"]),
    ("textarea", &["cols", "rows", "disabled", "name", "readonly"]),
    ("tfoot", &["align", "char", "charoff", "valign"]),
    ("th", &["abbr", "align", "axis", "bgcolor", "char", "charoff", "colspan", "headers", "height", "nowrap", "rowspan", "scope", "valign", "width"]),
    ("thead", &["align", "char", "charoff", "valign"]),
    ("title", &[]),
    ("tr", &["align", "bgcolor", "char", "charoff", "valign"]),
    ("track", &["default", "kind", "label", "src", "srclang"]),
    ("tt", &[]),
    ("u", &[]),
    ("ul", &["type"]),
    ("var", &[]),
    ("video", &["autoplay", "controls", "height", "loop", "muted", "playsinline", "poster", "preload", "src", "width"]),
];

/// Document-level tags permitted on top of the post allow-list.
const DOCUMENT_TAGS: &[(&str, &[&str])] = &[
    ("body", &["class"]),
    ("center", &["class", "style"]),
    ("head", &["class"]),
    ("html", &["class"]),
    ("meta", &["charset", "name", "content", "http-equiv"]),
    ("style", &[]),
];

/// CSS properties kept inside inline `style` attributes.
const SAFE_CSS_PROPERTIES: &[&str] = &[
    "background", "background-color", "background-image", "background-position",
    "background-repeat", "background-size", "background-attachment", "background-blend-mode",
    "border", "border-radius", "border-width", "border-color", "border-style",
    "border-right", "border-right-color", "border-right-style", "border-right-width",
    "border-bottom", "border-bottom-color", "border-bottom-style", "border-bottom-width",
    "border-left", "border-left-color", "border-left-style", "border-left-width",
    "border-top", "border-top-color", "border-top-style", "border-top-width",
    "border-spacing", "border-collapse", "caption-side",
    "columns", "column-count", "column-fill", "column-gap", "column-rule", "column-span", "column-width",
    "color", "filter", "font", "font-family", "font-size", "font-style", "font-variant", "font-weight",
    "letter-spacing", "line-height", "text-align", "text-decoration", "text-indent", "text-transform",
    "height", "min-height", "max-height", "width", "min-width", "max-width",
    "margin", "margin-right", "margin-bottom", "margin-left", "margin-top",
    "padding", "padding-right", "padding-bottom", "padding-left", "padding-top",
    "flex", "flex-basis", "flex-direction", "flex-flow", "flex-grow", "flex-shrink", "flex-wrap",
    "gap", "column-gap", "row-gap",
    "grid-template-columns", "grid-auto-flow", "grid-column-start", "grid-column-end",
    "grid-row-start", "grid-row-end", "grid-gap",
    "justify-content", "justify-items", "justify-self", "align-content", "align-items", "align-self",
    "clear", "cursor", "direction", "float", "list-style-type", "object-fit", "object-position",
    "overflow", "vertical-align", "writing-mode",
    "display",
];

fn html_policy() -> Builder<'static> {
    let mut attributes: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
    for (tag, attrs) in POST_TAGS.iter().chain(DOCUMENT_TAGS) {
        attributes.entry(*tag).or_default().extend(attrs.iter().copied());
    }
    let mut builder = Builder::default();
    builder
        .tags(attributes.keys().copied().collect())
        .clean_content_tags(HashSet::from(["script"]))
        .tag_attributes(attributes)
        .generic_attributes(GLOBAL_ATTRIBUTES.iter().copied().collect())
        .generic_attribute_prefixes(HashSet::from(["aria-", "data-"]))
        .link_rel(None)
        .attribute_filter(filter_inline_style);
    builder
}

/// Keeps only safe declarations in `style` attributes; other attributes pass.
fn filter_inline_style<'u>(_element: &str, attribute: &str, value: &'u str) -> Option<Cow<'u, str>> {
    if attribute != "style" {
        return Some(Cow::Borrowed(value));
    }
    let kept: Vec<&str> = value
        .split(';')
        .map(str::trim)
        .filter(|declaration| is_safe_declaration(declaration))
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(Cow::Owned(kept.join(";")))
    }
}

fn is_safe_declaration(declaration: &str) -> bool {
    let Some((property, value)) = declaration.split_once(':') else {
        return false;
    };
    let property = property.trim().to_ascii_lowercase();
    SAFE_CSS_PROPERTIES.contains(&property.as_str())
        && !value.contains(['\\', '(', '&', '}', '=', '<'])
        && !value.contains("/*")
}
