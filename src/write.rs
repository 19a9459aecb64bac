//! Turns built posts into HTML files on disk. Each page kind has its own
//! view struct carrying exactly the fields its template needs; views
//! convert into template values via `derive(Gtmpl)` rather than ad-hoc
//! maps, so a template referring to a field that no page supplies is
//! caught by reading the view definitions instead of debugging output.

use std::fmt;
use std::io;
use std::path::Path;

use gtmpl::Template;
use gtmpl_derive::Gtmpl;

use crate::config::SiteConfig;
use crate::post::Post;
use crate::tag::{self, TagGroup};

/// Responsible for templating and writing the site's HTML pages from built
/// [`Post`]s.
pub struct Writer<'a> {
    /// The template for the front page listing all posts.
    pub index_template: &'a Template,

    /// The template for individual post pages.
    pub post_template: &'a Template,

    /// The template for the page listing all tags.
    pub tag_index_template: &'a Template,

    /// The template for a single tag's post listing.
    pub tag_template: &'a Template,

    /// The root of the output tree.
    pub output_dir: &'a Path,

    pub config: &'a SiteConfig,
}

/// A tag reference as shown on post pages and listings.
#[derive(Clone, Gtmpl)]
struct TagItem {
    name: String,
    url: String,
}

/// One row in a post listing.
#[derive(Clone, Gtmpl)]
struct PostItem {
    title: String,
    url: String,
    date: String,
    summary: String,
    tags: Vec<TagItem>,
}

/// The front page: every non-draft post, most recent first.
#[derive(Gtmpl)]
struct IndexView {
    title: String,
    posts: Vec<PostItem>,
}

/// A single post page.
#[derive(Gtmpl)]
struct PostView {
    title: String,
    date: String,
    html: String,
    description: String,
    tags: Vec<TagItem>,
    base_url: String,
    repository: String,
}

/// One row on the tag index page.
#[derive(Clone, Gtmpl)]
struct TagGroupItem {
    name: String,
    url: String,
    count: u64,
}

/// The page listing every tag.
#[derive(Gtmpl)]
struct TagIndexView {
    title: String,
    tags: Vec<TagGroupItem>,
}

/// A single tag's post listing.
#[derive(Gtmpl)]
struct TagView {
    title: String,
    name: String,
    posts: Vec<PostItem>,
}

impl Writer<'_> {
    /// Writes one page per post at `{output_dir}/{slug}/index.html`.
    pub fn write_posts(&self, posts: &[Post]) -> Result<()> {
        for post in posts {
            let path =
                self.output_dir.join(&post.slug).join("index.html");
            self.render(self.post_template, &path, post_view(post, self.config))?;
        }
        Ok(())
    }

    /// Writes the front page at `{output_dir}/index.html`.
    pub fn write_index(&self, posts: &[Post]) -> Result<()> {
        let view = IndexView {
            title: self.config.title.clone(),
            posts: posts.iter().map(post_item).collect(),
        };
        self.render(
            self.index_template,
            &self.output_dir.join("index.html"),
            view,
        )
    }

    /// Writes the tag index at `{output_dir}/tags/index.html`.
    pub fn write_tag_index(&self, groups: &[TagGroup]) -> Result<()> {
        let view = TagIndexView {
            title: "Tags".to_owned(),
            tags: groups
                .iter()
                .map(|group| TagGroupItem {
                    name: group.name.clone(),
                    url: tag_url(&group.slug),
                    count: group.posts.len() as u64,
                })
                .collect(),
        };
        self.render(
            self.tag_index_template,
            &self.output_dir.join("tags").join("index.html"),
            view,
        )
    }

    /// Writes one listing page per tag at
    /// `{output_dir}/tags/{tag_slug}/index.html`.
    pub fn write_tag_pages(&self, groups: &[TagGroup]) -> Result<()> {
        for group in groups {
            let view = TagView {
                title: format!("Tag: {}", group.name),
                name: group.name.clone(),
                posts: group
                    .posts
                    .iter()
                    .map(|post| post_item(post))
                    .collect(),
            };
            let path = self
                .output_dir
                .join("tags")
                .join(&group.slug)
                .join("index.html");
            self.render(self.tag_template, &path, view)?;
        }
        Ok(())
    }

    /// Templates a single view and writes it to `path`, creating parent
    /// directories as needed.
    fn render<V: Into<gtmpl::Value>>(
        &self,
        template: &Template,
        path: &Path,
        view: V,
    ) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let value: gtmpl::Value = view.into();
        let context =
            gtmpl::Context::from(value).map_err(Error::Template)?;
        let mut file = std::fs::File::create(path)?;
        template.execute(&mut file, &context)?;
        Ok(())
    }
}

fn post_view(post: &Post, config: &SiteConfig) -> PostView {
    PostView {
        title: post.title.clone(),
        date: format_date(post),
        html: post.html.clone(),
        description: page_description(post),
        tags: tag_items(&post.tags),
        base_url: config.base_url.to_string(),
        repository: config.repository.clone(),
    }
}

fn post_item(post: &Post) -> PostItem {
    PostItem {
        title: post.title.clone(),
        url: format!("/{}/", post.slug),
        date: format_date(post),
        summary: post.summary.clone().unwrap_or_default(),
        tags: tag_items(&post.tags),
    }
}

fn tag_items(raw_tags: &[String]) -> Vec<TagItem> {
    raw_tags
        .iter()
        .map(|raw| raw.trim())
        .filter(|name| !name.is_empty())
        .map(|name| TagItem {
            name: name.to_owned(),
            url: tag_url(&tag::normalize(name)),
        })
        .collect()
}

fn tag_url(tag_slug: &str) -> String {
    format!("/tags/{}/", tag_slug)
}

fn format_date(post: &Post) -> String {
    post.date.format("%Y-%m-%d").to_string()
}

/// The post page's meta description: the explicit description first, then
/// the summary. Pages differ from the feed here; the feed prefers the
/// shorter summary, a page's `<meta>` tag the fuller description.
fn page_description(post: &Post) -> String {
    for candidate in [&post.description, &post.summary] {
        if let Some(text) = candidate {
            if !text.trim().is_empty() {
                return text.clone();
            }
        }
    }
    String::new()
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`].
    /// This allows us to use the `?` operator for template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}
