mod chain;
mod fallback;
mod models;
mod normalize;
mod panel;
mod parser;
pub mod sources;

pub use chain::FeedChain;
pub use fallback::fallback_items;
pub use models::{FeedItem, FetchOutcome, RawItem, ResolvedFeed};
pub use normalize::{
    extract_first_image, extract_tag_anchors, normalize_item, normalize_items, strip_markup,
    truncate, NormalizeOptions,
};
pub use panel::{format_date, BlogPanel, Card, FeedState};
pub use parser::{parse_feed_document, parse_json_feed};
