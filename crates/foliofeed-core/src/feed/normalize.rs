//! Conversion of raw items from any source into [`FeedItem`]s.
//!
//! Every source goes through the same functions here, so the shape of a
//! resolved list does not depend on which source produced it.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::models::{FeedItem, RawItem};

const ELLIPSIS: &str = "...";
const MAX_CATEGORIES: usize = 3;
const UNTITLED: &str = "Untitled";

fn markup_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"))
}

fn html_entity() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(nbsp|amp|lt|gt|quot|#39);").expect("valid regex"))
}

fn img_src() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).expect("valid regex")
    })
}

fn anchor() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("valid regex"))
}

fn class_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\bclass\s*=\s*["']([^"']*)["']"#).expect("valid regex"))
}

/// Settings that shape normalized output
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub summary_max_chars: usize,
    pub placeholder_thumbnail: String,
}

impl From<&crate::config::FeedConfig> for NormalizeOptions {
    fn from(config: &crate::config::FeedConfig) -> Self {
        Self {
            summary_max_chars: config.summary_max_chars,
            placeholder_thumbnail: config.placeholder_thumbnail.clone(),
        }
    }
}

fn strip_once(text: &str) -> String {
    let without_tags = markup_tag().replace_all(text, "");
    let decoded = html_entity().replace_all(&without_tags, |caps: &Captures| {
        match &caps[1] {
            "nbsp" => " ",
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "quot" => "\"",
            _ => "'",
        }
    });
    decoded.trim().to_string()
}

/// Remove markup and decode the common entities.
///
/// Decoding can expose new tags or entities (`&lt;b&gt;`), so the pass is
/// repeated until the text stops changing. Each pass that changes the text
/// shortens it, which bounds the loop and makes the function idempotent.
pub fn strip_markup(html: &str) -> String {
    let mut current = strip_once(html);
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// `src` of the first `<img>` tag in `html`
pub fn extract_first_image(html: &str) -> Option<String> {
    img_src()
        .captures(html)
        .map(|caps| caps[1].trim().to_string())
        .filter(|src| !src.is_empty())
}

/// Text of anchors whose class list contains `tag`, in document order
pub fn extract_tag_anchors(html: &str) -> Vec<String> {
    anchor()
        .captures_iter(html)
        .filter(|caps| {
            class_attr()
                .captures(&caps[1])
                .map(|class| class[1].split_whitespace().any(|c| c == "tag"))
                .unwrap_or(false)
        })
        .map(|caps| strip_markup(&caps[2]))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Cut `text` to `max_chars` characters, appending an ellipsis when anything was cut
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(ELLIPSIS);
    out
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn absolute_link(link: Option<&str>) -> Option<String> {
    let link = non_empty(link)?;
    let parsed = url::Url::parse(link).ok()?;
    matches!(parsed.scheme(), "http" | "https").then(|| link.to_string())
}

/// Build the canonical record for `raw`.
///
/// Returns `None` when the item has no absolute link, since the link is the
/// item's identity. Every other missing field gets a default.
pub fn normalize_item(raw: &RawItem, options: &NormalizeOptions) -> Option<FeedItem> {
    let link = absolute_link(raw.link.as_deref())?;

    let title = raw
        .title
        .as_deref()
        .map(strip_markup)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let thumbnail = non_empty(raw.thumbnail.as_deref())
        .map(str::to_string)
        .or_else(|| raw.content.as_deref().and_then(extract_first_image))
        .or_else(|| raw.description.as_deref().and_then(extract_first_image))
        .unwrap_or_else(|| options.placeholder_thumbnail.clone());

    let mut categories: Vec<String> = raw
        .categories
        .iter()
        .map(|c| strip_markup(c))
        .filter(|c| !c.is_empty())
        .collect();
    if categories.is_empty() {
        categories = raw
            .content
            .as_deref()
            .map(extract_tag_anchors)
            .unwrap_or_default();
    }
    categories.truncate(MAX_CATEGORIES);

    let summary_text = raw
        .description
        .as_deref()
        .map(strip_markup)
        .filter(|d| !d.is_empty())
        .or_else(|| raw.content.as_deref().map(strip_markup))
        .unwrap_or_default();

    Some(FeedItem {
        title,
        link,
        thumbnail,
        published_at: non_empty(raw.pub_date.as_deref()).unwrap_or_default().to_string(),
        categories,
        summary: truncate(&summary_text, options.summary_max_chars),
    })
}

/// Normalize a batch: drops unusable items, keeps the first item per link,
/// and stops at `max_items`
pub fn normalize_items(raw: &[RawItem], options: &NormalizeOptions, max_items: usize) -> Vec<FeedItem> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(|item| normalize_item(item, options))
        .filter(|item| seen.insert(item.link.clone()))
        .take(max_items)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACEHOLDER: &str = "https://example.com/placeholder.png";

    fn options() -> NormalizeOptions {
        NormalizeOptions {
            summary_max_chars: 150,
            placeholder_thumbnail: PLACEHOLDER.to_string(),
        }
    }

    fn raw(title: &str, link: &str) -> RawItem {
        RawItem {
            title: Some(title.to_string()),
            link: Some(link.to_string()),
            ..RawItem::default()
        }
    }

    #[test]
    fn test_strip_markup_removes_tags_and_decodes() {
        assert_eq!(
            strip_markup("  <p>Tom &amp; Jerry&nbsp;say &quot;hi&quot; &#39;there&#39;</p> "),
            "Tom & Jerry say \"hi\" 'there'"
        );
        assert_eq!(strip_markup("a &lt; b"), "a < b");
    }

    #[test]
    fn test_strip_markup_is_idempotent() {
        let inputs = [
            "<p>Hello <b>world</b></p>",
            "&lt;b&gt;bold&lt;/b&gt;",
            "&amp;lt;script&amp;gt;",
            "fish &amp; chips",
            "x < y > z",
            "  &nbsp;&nbsp;padded&nbsp; ",
            "",
        ];
        for input in inputs {
            let once = strip_markup(input);
            assert_eq!(strip_markup(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_extract_first_image() {
        let html = r#"<figure><img alt="x" src="https://cdn.example/a.png"><img src='https://cdn.example/b.png'></figure>"#;
        assert_eq!(extract_first_image(html).as_deref(), Some("https://cdn.example/a.png"));
        assert_eq!(extract_first_image("<p>no image</p>"), None);
        assert_eq!(
            extract_first_image(r#"<IMG SRC="https://cdn.example/upper.jpg" />"#).as_deref(),
            Some("https://cdn.example/upper.jpg")
        );
    }

    #[test]
    fn test_truncate_bounds() {
        assert_eq!(truncate("short", 150), "short");
        let long = "x".repeat(500);
        let cut = truncate(&long, 150);
        assert_eq!(cut.chars().count(), 153);
        assert!(cut.ends_with("..."));

        for len in [0, 1, 149, 150, 151, 1000] {
            let text = "é".repeat(len);
            assert!(truncate(&text, 150).chars().count() <= 153);
        }
    }

    #[test]
    fn test_missing_thumbnail_uses_placeholder() {
        let mut item = raw("X", "http://a");
        item.description = Some("<p>no image</p>".to_string());

        let normalized = normalize_item(&item, &options()).unwrap();
        assert_eq!(normalized.thumbnail, PLACEHOLDER);
        assert_eq!(normalized.summary, "no image");
        assert!(normalized.categories.is_empty());
        assert_eq!(normalized.published_at, "");
    }

    #[test]
    fn test_thumbnail_precedence() {
        let mut item = raw("X", "https://a.example/post");
        item.description = Some(r#"<img src="https://img/desc.png">"#.to_string());
        assert_eq!(normalize_item(&item, &options()).unwrap().thumbnail, "https://img/desc.png");

        item.content = Some(r#"<img src="https://img/content.png">"#.to_string());
        assert_eq!(normalize_item(&item, &options()).unwrap().thumbnail, "https://img/content.png");

        item.thumbnail = Some("https://img/explicit.png".to_string());
        assert_eq!(normalize_item(&item, &options()).unwrap().thumbnail, "https://img/explicit.png");
    }

    #[test]
    fn test_tag_anchor_categories_capped_in_order() {
        let mut item = raw("X", "https://a.example/post");
        item.content = Some(
            r#"<p>body</p>
            <a href="/t/rust" class="tag">Rust</a>
            <a href="/home">Home</a>
            <a class="tag link" href="/t/async">Async</a>
            <a class="tag" href="/t/tokio">Tokio</a>
            <a class="tag" href="/t/serde">Serde</a>
            <a class="tag" href="/t/xml">XML</a>"#
                .to_string(),
        );

        let normalized = normalize_item(&item, &options()).unwrap();
        assert_eq!(normalized.categories, vec!["Rust", "Async", "Tokio"]);
    }

    #[test]
    fn test_explicit_categories_win_over_anchors() {
        let mut item = raw("X", "https://a.example/post");
        item.categories = vec!["one".into(), " ".into(), "two".into(), "three".into(), "four".into()];
        item.content = Some(r#"<a class="tag">anchor</a>"#.to_string());

        let normalized = normalize_item(&item, &options()).unwrap();
        assert_eq!(normalized.categories, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_title_defaults_and_sanitizes() {
        let item = raw("<b>Fish &amp; Chips</b>", "https://a.example/1");
        assert_eq!(normalize_item(&item, &options()).unwrap().title, "Fish & Chips");

        let item = raw("<br/>", "https://a.example/2");
        assert_eq!(normalize_item(&item, &options()).unwrap().title, "Untitled");
    }

    #[test]
    fn test_relative_or_missing_link_dropped() {
        assert!(normalize_item(&raw("X", "/posts/1"), &options()).is_none());
        assert!(normalize_item(&raw("X", "mailto:a@b.c"), &options()).is_none());
        assert!(normalize_item(&RawItem::default(), &options()).is_none());
    }

    #[test]
    fn test_summary_falls_back_to_content() {
        let mut item = raw("X", "https://a.example/1");
        item.description = Some("<p></p>".to_string());
        item.content = Some(format!("<p>{}</p>", "word ".repeat(60)));

        let summary = normalize_item(&item, &options()).unwrap().summary;
        assert!(summary.starts_with("word word"));
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), 153);
    }

    #[test]
    fn test_normalize_items_dedupes_and_caps() {
        let items = vec![
            raw("first", "https://a.example/1"),
            raw("dup", "https://a.example/1"),
            raw("no link", ""),
            raw("second", "https://a.example/2"),
            raw("third", "https://a.example/3"),
            raw("fourth", "https://a.example/4"),
        ];

        let normalized = normalize_items(&items, &options(), 3);
        let titles: Vec<_> = normalized.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }
}
