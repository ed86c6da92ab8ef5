use std::sync::OnceLock;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::{Captures, Regex};
use serde::Deserialize;

use super::models::RawItem;
use crate::{Error, Result};

/// Text-bearing child elements of an RSS `<item>` or Atom `<entry>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    PubDate,
    Updated,
    Description,
    Content,
    Category,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"pubDate" | b"published" | b"dc:date" => Some(Field::PubDate),
            b"updated" => Some(Field::Updated),
            b"description" | b"summary" => Some(Field::Description),
            b"content:encoded" | b"content" => Some(Field::Content),
            b"category" => Some(Field::Category),
            _ => None,
        }
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| {
            attr.unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned())
        })
}

/// Pull what the attributes of an element say about the current item.
/// Returns true when the attributes already supplied the element's value.
fn apply_attributes(item: &mut RawItem, e: &BytesStart<'_>) -> bool {
    match e.name().as_ref() {
        // Atom: <link rel="alternate" href="..."/>
        b"link" => {
            let rel = attribute(e, b"rel");
            if item.link.is_none() && matches!(rel.as_deref(), None | Some("alternate")) {
                item.link = attribute(e, b"href");
            }
        }
        // Atom: <category term="..."/>
        b"category" => {
            if let Some(term) = attribute(e, b"term") {
                item.categories.push(term);
                return true;
            }
        }
        b"media:thumbnail" => {
            if item.thumbnail.is_none() {
                item.thumbnail = attribute(e, b"url");
            }
        }
        b"media:content" | b"enclosure" => {
            let is_image = attribute(e, b"medium").as_deref() == Some("image")
                || attribute(e, b"type").is_some_and(|t| t.starts_with("image/"));
            if item.thumbnail.is_none() && is_image {
                item.thumbnail = attribute(e, b"url");
            }
        }
        _ => {}
    }
    false
}

fn named_entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").expect("valid regex"))
}

/// Unescape XML text. Predefined and numeric references are decoded; HTML
/// named entities such as `&nbsp;` are kept verbatim for the normalizer.
fn decode_text(raw: &str) -> String {
    let escaped = named_entity_regex().replace_all(raw, |caps: &Captures<'_>| match &caps[1] {
        "amp" | "lt" | "gt" | "quot" | "apos" => caps[0].to_string(),
        name => format!("&amp;{};", name),
    });

    match unescape(&escaped) {
        Ok(text) => text.into_owned(),
        Err(_) => raw.to_string(),
    }
}

fn assign(item: &mut RawItem, field: Field, text: String) {
    let text = text.trim().to_string();
    if text.is_empty() {
        return;
    }
    match field {
        Field::Title => item.title = Some(text),
        Field::Link => item.link = Some(text),
        Field::PubDate => item.pub_date = Some(text),
        Field::Updated => {
            if item.pub_date.is_none() {
                item.pub_date = Some(text);
            }
        }
        Field::Description => item.description = Some(text),
        Field::Content => item.content = Some(text),
        Field::Category => item.categories.push(text),
    }
}

/// Parse an RSS 2.0 or Atom document into raw items, in document order
pub fn parse_feed_document(xml: &str) -> Result<Vec<RawItem>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<RawItem> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" | b"entry" => {
                    current = Some(RawItem::default());
                    field = None;
                }
                tag => {
                    if let Some(item) = current.as_mut() {
                        // Elements nested inside a field are part of its text
                        if field.is_none() && !apply_attributes(item, &e) {
                            field = Field::from_tag(tag);
                            text.clear();
                        }
                    }
                }
            },
            Ok(Event::Empty(e)) => {
                if let Some(item) = current.as_mut() {
                    if field.is_none() {
                        apply_attributes(item, &e);
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if field.is_some() {
                    text.push_str(&decode_text(&String::from_utf8_lossy(&e)));
                }
            }
            Ok(Event::CData(e)) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"item" | b"entry" => {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                    field = None;
                }
                tag => {
                    if let (Some(active), Some(item)) = (field, current.as_mut()) {
                        if Field::from_tag(tag) == Some(active) {
                            assign(item, active, std::mem::take(&mut text));
                            field = None;
                        }
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::FeedParse(format!(
                    "Invalid feed XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(items)
}

/// Response body of the feed-to-JSON conversion service
#[derive(Debug, Deserialize)]
pub struct JsonFeedResponse {
    pub status: String,
    #[serde(default)]
    pub items: Option<Vec<JsonFeedItem>>,
}

#[derive(Debug, Deserialize)]
pub struct JsonFeedItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl From<JsonFeedItem> for RawItem {
    fn from(item: JsonFeedItem) -> Self {
        RawItem {
            title: item.title,
            link: item.link,
            thumbnail: item.thumbnail,
            pub_date: item.pub_date,
            categories: item.categories.unwrap_or_default(),
            description: item.description,
            content: item.content,
        }
    }
}

/// Parse the JSON service response; anything but `status == "ok"` is an error
pub fn parse_json_feed(body: &str) -> Result<Vec<RawItem>> {
    let response: JsonFeedResponse = serde_json::from_str(body)?;

    if response.status != "ok" {
        return Err(Error::FeedParse(format!(
            "Feed service returned status '{}'",
            response.status
        )));
    }

    Ok(response
        .items
        .unwrap_or_default()
        .into_iter()
        .map(RawItem::from)
        .collect())
}
