//! Converts post bodies from markdown into HTML fragments. Rendering is
//! done with [`pulldown_cmark`] with the common extensions (tables,
//! strikethrough, footnotes, task lists) enabled, and a post-processing pass
//! that gives every heading a deterministic anchor id derived from its text.
//! Raw inline HTML in the source passes through unescaped: post bodies are
//! authored by the site owner, not by untrusted users.

use std::collections::HashSet;
use std::fmt;
use std::string::FromUtf8Error;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::tag;

/// Renders a markdown body into an HTML fragment. Headings without an
/// explicit `{#id}` attribute receive one derived from their text; repeated
/// heading texts get `-1`, `-2`, … suffixes so anchors stay unique within a
/// document.
pub fn to_html(markdown: &str) -> Result<String> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options.insert(Options::ENABLE_GFM);

    let events: Vec<Event> = Parser::new_ext(markdown, options).collect();
    let events = anchor_headings(events);

    let mut out = Vec::new();
    html::write_html_io(&mut out, events.into_iter())?;
    Ok(String::from_utf8(out)?)
}

/// Fills in the `id` slot of every heading that lacks one. Ids are derived
/// from the heading's visible text with the same collapse rule as tag
/// normalization, so `## Rolling Back` anchors as `rolling-back`. Explicit
/// ids are kept verbatim and still count toward collision suffixes.
fn anchor_headings(events: Vec<Event>) -> Vec<Event> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(events.len());

    for (i, event) in events.iter().enumerate() {
        let Event::Start(Tag::Heading {
            level,
            id,
            classes,
            attrs,
        }) = event
        else {
            out.push(event.clone());
            continue;
        };

        let id = match id {
            Some(explicit) => {
                taken.insert(explicit.to_string());
                Some(explicit.clone())
            }
            None => {
                let base = anchor_id(&heading_text(&events[i + 1..]));
                Some(CowStr::from(unique_id(base, &mut taken)))
            }
        };
        out.push(Event::Start(Tag::Heading {
            level: *level,
            id,
            classes: classes.clone(),
            attrs: attrs.clone(),
        }));
    }
    out
}

/// Collects the visible text of a heading: everything up to the heading's
/// end event, with inline code included and other markup ignored.
fn heading_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}

fn anchor_id(text: &str) -> String {
    if text.chars().any(char::is_alphanumeric) {
        tag::normalize(text)
    } else {
        "section".to_owned()
    }
}

fn unique_id(base: String, taken: &mut HashSet<String>) -> String {
    let mut candidate = base.clone();
    let mut n = 0;
    while !taken.insert(candidate.clone()) {
        n += 1;
        candidate = format!("{}-{}", base, n);
    }
    candidate
}

/// The result of a markdown rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error rendering markdown to HTML.
#[derive(Debug)]
pub enum Error {
    /// Returned when writing the rendered events fails.
    Io(std::io::Error),

    /// Returned when the rendered bytes are not valid UTF-8.
    Utf8(FromUtf8Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Utf8(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Utf8(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator when writing rendered HTML.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<FromUtf8Error> for Error {
    /// Converts a [`FromUtf8Error`] into an [`Error`]. This allows us to use
    /// the `?` operator when recovering the rendered string.
    fn from(err: FromUtf8Error) -> Error {
        Error::Utf8(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_to_html_heading_anchor() -> Result<()> {
        let html = to_html("## Rolling Back\n")?;
        assert!(html.contains(r##"<h2 id="rolling-back">"##), "{}", html);
        Ok(())
    }

    #[test]
    fn test_to_html_duplicate_headings_get_suffixes() -> Result<()> {
        let html = to_html("# Setup\n\n# Setup\n\n# Setup\n")?;
        assert!(html.contains(r##"<h1 id="setup">"##), "{}", html);
        assert!(html.contains(r##"<h1 id="setup-1">"##), "{}", html);
        assert!(html.contains(r##"<h1 id="setup-2">"##), "{}", html);
        Ok(())
    }

    #[test]
    fn test_to_html_keeps_explicit_heading_id() -> Result<()> {
        let html = to_html("# Setup {#custom}\n")?;
        assert!(html.contains(r##"<h1 id="custom">"##), "{}", html);
        Ok(())
    }

    #[test]
    fn test_to_html_anchor_from_punctuated_text() -> Result<()> {
        let html = to_html("### What Went Wrong, Exactly?\n")?;
        assert!(
            html.contains(r##"<h3 id="what-went-wrong-exactly">"##),
            "{}",
            html
        );
        Ok(())
    }

    #[test]
    fn test_to_html_raw_html_passes_through() -> Result<()> {
        let html = to_html("before\n\n<div class=\"aside\">kept</div>\n")?;
        assert!(html.contains("<div class=\"aside\">kept</div>"), "{}", html);
        Ok(())
    }

    #[test]
    fn test_to_html_table_extension() -> Result<()> {
        let html = to_html("| a | b |\n|---|---|\n| 1 | 2 |\n")?;
        assert!(html.contains("<table>"), "{}", html);
        assert!(html.contains("<td>1</td>"), "{}", html);
        Ok(())
    }

    #[test]
    fn test_to_html_strikethrough_extension() -> Result<()> {
        let html = to_html("~~gone~~\n")?;
        assert!(html.contains("<del>gone</del>"), "{}", html);
        Ok(())
    }

    #[test]
    fn test_to_html_escapes_plain_text() -> Result<()> {
        let html = to_html("a < b\n")?;
        assert!(html.contains("a &lt; b"), "{}", html);
        Ok(())
    }
}
