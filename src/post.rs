//! Defines the [`Post`] type and the logic for loading posts from the
//! content directory. Loading walks the tree once, in filesystem order,
//! turning each markdown file into a fully-resolved [`Post`]: front matter
//! split off, body rendered to HTML, slug derived from the file's location,
//! and the title defaulted from the slug when the front matter has none.
//! Drafts are dropped after their metadata is read and before their body is
//! rendered, so they never reach any downstream collection. The first error
//! aborts the whole load; a half-built site is worse than a failed build.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

use crate::{frontmatter, markdown, slug};

const MARKDOWN_EXTENSION: &str = "md";

/// One rendered post. Immutable once built; the pipeline only ever reads
/// from it.
#[derive(Debug)]
pub struct Post {
    /// Canonical identifier derived from the source path; doubles as the
    /// output path segment.
    pub slug: String,

    /// The resolved title: front matter `title`, or the humanized last slug
    /// segment when absent.
    pub title: String,

    /// The publish date. Always present; a post without one fails the
    /// build.
    pub date: DateTime<Utc>,

    /// Raw tag labels as written in the front matter.
    pub tags: Vec<String>,

    pub summary: Option<String>,
    pub description: Option<String>,

    /// Always false for loaded posts; drafts are skipped during loading.
    pub draft: bool,

    /// The rendered body. Trusted markup, never re-escaped downstream.
    pub html: String,

    /// The unrendered body, kept only to derive a feed excerpt when neither
    /// `summary` nor `description` is set.
    pub raw_body: String,

    /// Where the post came from, for error reporting.
    pub source_path: PathBuf,
}

/// Walks `content_dir` and returns the non-draft posts ordered by publish
/// date, most recent first; posts with equal dates keep their discovery
/// order. Files without the `.md` extension are skipped silently. The
/// `cancel` flag is checked before each file so a shutdown request can
/// abort the walk between posts; a set flag surfaces as
/// [`Error::Cancelled`].
pub fn load_posts(
    content_dir: &Path,
    cancel: &AtomicBool,
) -> Result<Vec<Post>> {
    let mut posts = Vec::new();
    for entry in WalkDir::new(content_dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry
            .path()
            .extension()
            .map_or(true, |ext| ext != MARKDOWN_EXTENSION)
        {
            continue;
        }
        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }
        match load_post(content_dir, entry.path()) {
            Ok(Some(post)) => posts.push(post),
            Ok(None) => {} // draft
            Err(err) => {
                return Err(Error::Annotated(
                    format!("loading post `{}`", entry.path().display()),
                    Box::new(err),
                ));
            }
        }
    }

    sort_recent_first(&mut posts);
    Ok(posts)
}

/// Orders posts by publish date, most recent first. The sort is stable:
/// posts with equal dates keep their existing (discovery) order.
fn sort_recent_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Loads a single post. Returns `Ok(None)` for drafts.
fn load_post(content_dir: &Path, path: &Path) -> Result<Option<Post>> {
    let contents = std::fs::read_to_string(path)?;
    let (front, body) = frontmatter::split(&contents)?;
    if front.draft {
        return Ok(None);
    }
    let date = front.date.ok_or(frontmatter::Error::MissingDate)?;

    let slug = slug::from_path(content_dir, path);
    let html = markdown::to_html(body)?;
    let title = match front.title.filter(|t| !t.trim().is_empty()) {
        Some(title) => title,
        None => slug::humanize(&slug),
    };

    Ok(Some(Post {
        slug,
        title,
        date,
        tags: front.tags.unwrap_or_default(),
        summary: front.summary,
        description: front.description,
        draft: front.draft,
        html,
        raw_body: body.to_owned(),
        source_path: path.to_owned(),
    }))
}

/// The result of a post-loading operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Post`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the front matter cannot be split or decoded, or lacks
    /// its publish date.
    FrontMatter(frontmatter::Error),

    /// Returned when the body fails to render.
    Render(markdown::Error),

    /// Returned when the walk is aborted by the cancellation flag.
    Cancelled,

    /// Returned for directory-walk errors.
    WalkDir(walkdir::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// An error with an annotation, typically the offending file path.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontMatter(err) => err.fmt(f),
            Error::Render(err) => err.fmt(f),
            Error::Cancelled => write!(f, "build cancelled"),
            Error::WalkDir(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontMatter(err) => Some(err),
            Error::Render(err) => Some(err),
            Error::Cancelled => None,
            Error::WalkDir(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<frontmatter::Error> for Error {
    /// Converts a [`frontmatter::Error`] into an [`Error`]. This allows us
    /// to use the `?` operator when splitting front matter.
    fn from(err: frontmatter::Error) -> Error {
        Error::FrontMatter(err)
    }
}

impl From<markdown::Error> for Error {
    /// Converts a [`markdown::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator when rendering bodies.
    fn from(err: markdown::Error) -> Error {
        Error::Render(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator during the directory walk.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
