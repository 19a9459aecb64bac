//! Builds the RSS 2.0 feed from the chronologically-ordered posts. The feed
//! carries at most a configured number of items; each item links to the
//! post's permanent URL, reuses that URL as a permalink guid, and resolves
//! its description from the post's summary, then its description, then a
//! plain-text excerpt of the body. An empty post set produces no feed at
//! all, not an empty one.

use std::fmt;
use std::io::Write;

use atom_syndication::LinkBuilder;
use rss::extension::atom::AtomExtensionBuilder;
use rss::validation::{Validate, ValidationError};
use rss::{Channel, ChannelBuilder, GuidBuilder, ItemBuilder};

use crate::config::SiteConfig;
use crate::post::Post;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

/// Assembles the feed channel. Returns `Ok(None)` when there are no posts;
/// callers must not create the output file in that case. Expects `posts` to
/// already be ordered most recent first and caps the item count at
/// `config.feed_limit`.
pub fn channel(
    config: &SiteConfig,
    posts: &[Post],
) -> Result<Option<Channel>> {
    let newest = match posts.first() {
        Some(post) => post,
        None => return Ok(None),
    };

    let mut items = Vec::with_capacity(posts.len().min(config.feed_limit));
    for post in posts.iter().take(config.feed_limit) {
        let link = config
            .base_url
            .join(&format!("{}/", post.slug))?
            .to_string();
        items.push(
            ItemBuilder::default()
                .title(Some(post.title.clone()))
                .link(Some(link.clone()))
                .guid(Some(
                    GuidBuilder::default()
                        .permalink(true)
                        .value(link)
                        .build(),
                ))
                .pub_date(Some(post.date.to_rfc2822()))
                .description(Some(description(post, config.excerpt_limit)))
                .build(),
        );
    }

    let self_link = config.base_url.join(&config.feed_path)?;
    let channel = ChannelBuilder::default()
        .title(config.title.clone())
        .link(config.base_url.to_string())
        .description(config.description.clone())
        .language(Some(config.language.clone()))
        .last_build_date(Some(newest.date.to_rfc2822()))
        .atom_ext(Some(
            AtomExtensionBuilder::default()
                .links(vec![LinkBuilder::default()
                    .href(self_link.to_string())
                    .rel("self".to_string())
                    .mime_type(Some("application/rss+xml".to_string()))
                    .build()])
                .build(),
        ))
        .items(items)
        .build();
    channel.validate()?;
    Ok(Some(channel))
}

/// Writes a channel as indented XML behind a UTF-8 declaration.
pub fn write_channel<W: Write>(channel: &Channel, mut w: W) -> Result<()> {
    w.write_all(XML_DECLARATION.as_bytes())?;
    channel.pretty_write_to(w, b' ', 2)?;
    Ok(())
}

/// Resolves a feed item's description: the post's summary, then its
/// description, then an excerpt of the body. Candidates that are empty or
/// whitespace-only are passed over.
fn description(post: &Post, excerpt_limit: usize) -> String {
    for candidate in [&post.summary, &post.description] {
        if let Some(text) = candidate {
            if !text.trim().is_empty() {
                return text.clone();
            }
        }
    }
    excerpt(&post.raw_body, excerpt_limit)
}

/// Derives a plain-text excerpt from a raw markdown body: whitespace runs
/// collapse to single spaces and the result is capped at `limit` characters
/// (not bytes), with an ellipsis appended when truncation happened. A limit
/// of zero disables the cap.
pub fn excerpt(raw: &str, limit: usize) -> String {
    let collapsed =
        raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if limit == 0 || collapsed.chars().count() <= limit {
        return collapsed;
    }
    let truncated: String = collapsed.chars().take(limit).collect();
    format!("{}…", truncated.trim_end())
}

/// The result of a feed-assembly operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error assembling or writing the feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when joining a post slug onto the base URL fails.
    Url(url::ParseError),

    /// Returned when the assembled channel fails RSS validation.
    Validation(ValidationError),

    /// Returned when encoding the channel as XML fails.
    Rss(rss::Error),

    /// Returned for I/O errors while writing the feed.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Url(err) => err.fmt(f),
            Error::Validation(err) => err.fmt(f),
            Error::Rss(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Url(err) => Some(err),
            Error::Validation(err) => Some(err),
            Error::Rss(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. This allows us to
    /// use the `?` operator for URL joins.
    fn from(err: url::ParseError) -> Error {
        Error::Url(err)
    }
}

impl From<ValidationError> for Error {
    /// Converts a [`ValidationError`] into an [`Error`]. This allows us to
    /// use the `?` operator when validating the channel.
    fn from(err: ValidationError) -> Error {
        Error::Validation(err)
    }
}

impl From<rss::Error> for Error {
    /// Converts an [`rss::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator when encoding the channel.
    fn from(err: rss::Error) -> Error {
        Error::Rss(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn config() -> SiteConfig {
        SiteConfig::default()
    }

    fn post(slug: &str, day: u32) -> Post {
        Post {
            slug: slug.to_owned(),
            title: format!("Title of {}", slug),
            date: Utc.with_ymd_and_hms(2025, 3, day, 0, 0, 0).unwrap(),
            tags: Vec::new(),
            summary: None,
            description: None,
            draft: false,
            html: String::new(),
            raw_body: "Some body text.".to_owned(),
            source_path: PathBuf::from(slug),
        }
    }

    #[test]
    fn test_channel_empty_posts_produce_no_feed() -> Result<()> {
        assert!(channel(&config(), &[])?.is_none());
        Ok(())
    }

    #[test]
    fn test_channel_caps_items() -> Result<()> {
        let mut config = config();
        config.feed_limit = 2;
        let posts =
            vec![post("three", 3), post("two", 2), post("one", 1)];
        let channel = channel(&config, &posts)?.unwrap();
        assert_eq!(2, channel.items().len());
        assert_eq!(Some("Title of three"), channel.items()[0].title());
        Ok(())
    }

    #[test]
    fn test_channel_link_and_guid_are_permalinks() -> Result<()> {
        let posts = vec![post("ops/oncall", 1)];
        let channel = channel(&config(), &posts)?.unwrap();
        let item = &channel.items()[0];
        assert_eq!(
            Some("https://example.com/ops/oncall/"),
            item.link(),
        );
        let guid = item.guid().unwrap();
        assert!(guid.is_permalink());
        assert_eq!("https://example.com/ops/oncall/", guid.value());
        Ok(())
    }

    #[test]
    fn test_channel_summary_wins_over_body() -> Result<()> {
        let mut p = post("summarized", 1);
        p.summary = Some("Short and sweet".to_owned());
        p.raw_body = "x".repeat(5000);
        let channel = channel(&config(), &[p])?.unwrap();
        assert_eq!(
            Some("Short and sweet"),
            channel.items()[0].description(),
        );
        Ok(())
    }

    #[test]
    fn test_channel_description_beats_excerpt() -> Result<()> {
        let mut p = post("described", 1);
        p.summary = Some("   ".to_owned());
        p.description = Some("From the description field".to_owned());
        let channel = channel(&config(), &[p])?.unwrap();
        assert_eq!(
            Some("From the description field"),
            channel.items()[0].description(),
        );
        Ok(())
    }

    #[test]
    fn test_channel_falls_back_to_capped_excerpt() -> Result<()> {
        let mut config = config();
        config.excerpt_limit = 40;
        let mut p = post("long", 1);
        p.raw_body = "word ".repeat(100);
        let channel = channel(&config, &[p])?.unwrap();
        let description = channel.items()[0].description().unwrap();
        assert!(description.ends_with('…'), "{}", description);
        assert!(description.chars().count() <= 41);
        Ok(())
    }

    #[test]
    fn test_channel_pub_date_is_rfc2822() -> Result<()> {
        let channel = channel(&config(), &[post("dated", 7)])?.unwrap();
        let pub_date = channel.items()[0].pub_date().unwrap();
        assert!(pub_date.contains("7 Mar 2025"), "{}", pub_date);
        assert!(pub_date.ends_with("+0000"), "{}", pub_date);
        Ok(())
    }

    #[test]
    fn test_excerpt_collapses_whitespace() {
        assert_eq!(
            "a b c",
            excerpt("  a\n\nb\t \r\n c  ", 100),
        );
    }

    #[test]
    fn test_excerpt_counts_characters_not_bytes() {
        let text = "é".repeat(10);
        let capped = excerpt(&text, 4);
        assert_eq!(5, capped.chars().count());
        assert!(capped.ends_with('…'));
    }

    #[test]
    fn test_excerpt_short_input_untouched() {
        assert_eq!("short", excerpt("short", 200));
    }

    #[test]
    fn test_excerpt_unlimited_when_zero() {
        let text = "word ".repeat(100);
        assert!(!excerpt(&text, 0).ends_with('…'));
    }

    #[test]
    fn test_write_channel_declares_encoding() -> Result<()> {
        let channel = channel(&config(), &[post("only", 1)])?.unwrap();
        let mut out = Vec::new();
        write_channel(&channel, &mut out)?;
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.starts_with(XML_DECLARATION), "{}", xml);
        assert!(xml.contains("<rss"), "{}", xml);
        Ok(())
    }
}
