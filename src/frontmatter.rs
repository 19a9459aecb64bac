//! Splits a post source file into its YAML front matter and markdown body.
//! The front matter is fenced by lines consisting solely of `---` (both LF
//! and CRLF line endings are tolerated). A file without an opening fence is
//! all body with default metadata; an opening fence without a closing one is
//! an error. Splitting is a pure function of the input text.

use std::fmt;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

const FENCE: &str = "---";

/// The decoded front matter of a post. Every field is optional at this
/// layer; [`crate::post`] enforces that a publish date is present before a
/// post is built.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,

    /// The publish date, either `YYYY-MM-DD` or RFC 3339. Date-only values
    /// resolve to midnight UTC.
    #[serde(deserialize_with = "deserialize_date")]
    pub date: Option<DateTime<Utc>>,

    pub tags: Option<Vec<String>>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub draft: bool,
}

/// Splits `input` into front matter and body. Returns the decoded
/// [`FrontMatter`] and the body text with leading line breaks trimmed.
///
/// An input that does not start with a fence line is returned verbatim as
/// the body with default metadata. An opening fence with no closing fence
/// fails with [`Error::Unterminated`]; a fenced span that is not a valid
/// mapping fails with [`Error::Yaml`]; a fenced mapping without a `date`
/// fails with [`Error::MissingDate`].
pub fn split(input: &str) -> Result<(FrontMatter, &str)> {
    let meta_start = match opening_fence_len(input) {
        Some(len) => len,
        None => return Ok((FrontMatter::default(), input)),
    };

    let remaining = &input[meta_start..];
    let (meta, body) = match closing_fence(remaining) {
        Some((meta_end, body_start)) => {
            (&remaining[..meta_end], &remaining[body_start..])
        }
        None => return Err(Error::Unterminated),
    };

    // an empty span between the fences is an empty mapping, not a decode
    // error
    let front: FrontMatter = if meta.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(meta)?
    };
    if front.date.is_none() {
        return Err(Error::MissingDate);
    }
    Ok((front, body.trim_start_matches(['\r', '\n'])))
}

/// Returns the length of the opening fence line (including its line break)
/// when `input` starts with one.
fn opening_fence_len(input: &str) -> Option<usize> {
    for prefix in ["---\r\n", "---\n"] {
        if input.starts_with(prefix) {
            return Some(prefix.len());
        }
    }
    None
}

/// Finds the first line consisting solely of `---` (a trailing `\r` is
/// tolerated). Returns the byte offset where the metadata span ends and the
/// offset where the body begins.
fn closing_fence(input: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for line in input.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == FENCE {
            return Some((offset, offset + line.len()));
        }
        offset += line.len();
    }
    None
}

fn deserialize_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_date(&raw).map(Some).map_err(|_| {
            D::Error::custom(format!(
                "invalid date `{}` (expected YYYY-MM-DD or RFC 3339)",
                raw
            ))
        }),
    }
}

fn parse_date(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(naive) =
        chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
    {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// The result of a front matter split.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error splitting or decoding front matter.
#[derive(Debug)]
pub enum Error {
    /// Returned when the opening fence has no matching closing fence line.
    Unterminated,

    /// Returned when the fenced span is not a valid YAML mapping of the
    /// expected fields.
    Yaml(serde_yaml::Error),

    /// Returned when the decoded metadata has no publish date.
    MissingDate,
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Unterminated => {
                write!(f, "front matter is missing its closing `---`")
            }
            Error::Yaml(err) => err.fmt(f),
            Error::MissingDate => {
                write!(f, "front matter is missing the required `date` field")
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Unterminated => None,
            Error::Yaml(err) => Some(err),
            Error::MissingDate => None,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator for front matter deserialization.
    fn from(err: serde_yaml::Error) -> Error {
        Error::Yaml(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_split_full_front_matter() -> Result<()> {
        let (front, body) = split(
            "---\n\
             title: Incident Review\n\
             date: 2025-11-06\n\
             tags: [DevOps, postmortem]\n\
             summary: What went wrong\n\
             description: A longer account\n\
             draft: false\n\
             ---\n\
             \n\
             Body text.\n",
        )?;
        assert_eq!(Some("Incident Review".to_owned()), front.title);
        assert_eq!(
            Some(Utc.with_ymd_and_hms(2025, 11, 6, 0, 0, 0).unwrap()),
            front.date,
        );
        assert_eq!(
            Some(vec!["DevOps".to_owned(), "postmortem".to_owned()]),
            front.tags,
        );
        assert_eq!(Some("What went wrong".to_owned()), front.summary);
        assert!(!front.draft);
        assert_eq!("Body text.\n", body);
        Ok(())
    }

    #[test]
    fn test_split_without_fence_returns_body_verbatim() -> Result<()> {
        let input = "Just a paragraph.\n\nAnother one.\n";
        let (front, body) = split(input)?;
        assert!(front.title.is_none());
        assert!(front.date.is_none());
        assert_eq!(input, body);
        Ok(())
    }

    #[test]
    fn test_split_unterminated_fence_fails() {
        let err = split("---\ntitle: Oops\ndate: 2025-01-01\n").unwrap_err();
        assert!(matches!(err, Error::Unterminated));
    }

    #[test]
    fn test_split_missing_date_fails() {
        let err = split("---\ntitle: No Date\n---\nBody\n").unwrap_err();
        assert!(matches!(err, Error::MissingDate));
    }

    #[test]
    fn test_split_undecodable_metadata_fails() {
        let err = split("---\n- just\n- a\n- list\n---\nBody\n").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn test_split_invalid_date_fails_as_yaml() {
        let err =
            split("---\ndate: next tuesday\n---\nBody\n").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn test_split_tolerates_crlf() -> Result<()> {
        let (front, body) =
            split("---\r\ndate: 2025-02-03\r\n---\r\nBody\r\n")?;
        assert_eq!(
            Some(Utc.with_ymd_and_hms(2025, 2, 3, 0, 0, 0).unwrap()),
            front.date,
        );
        assert_eq!("Body\r\n", body);
        Ok(())
    }

    #[test]
    fn test_split_accepts_rfc3339_date() -> Result<()> {
        let (front, _) =
            split("---\ndate: 2025-02-03T04:05:06Z\n---\nBody\n")?;
        assert_eq!(
            Some(Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap()),
            front.date,
        );
        Ok(())
    }

    #[test]
    fn test_split_trims_leading_breaks_from_body() -> Result<()> {
        let (_, body) = split("---\ndate: 2025-01-01\n---\n\n\nBody\n")?;
        assert_eq!("Body\n", body);
        Ok(())
    }
}
