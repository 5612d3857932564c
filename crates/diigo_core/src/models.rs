use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DiigoError;
use crate::timestamp::parse_diigo_datetime;

#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub read_later: bool,
    pub private: bool,
    pub annotations: Vec<Annotation>,
    pub comments: Vec<String>,
}

/// A highlighted passage and the comments attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub content: String,
    pub comments: Vec<String>,
}

/// One row of a Raindrop.io import file. Field order is the column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RaindropRow {
    pub url: String,
    pub folder: String,
    pub title: String,
    pub note: String,
    pub tags: String,
    pub created: String,
}

/// A bookmark exactly as the `bookmarks` endpoint returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct BookmarkPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub shared: String,
    #[serde(default)]
    pub readlater: String,
    #[serde(default)]
    pub annotations: Vec<AnnotationPayload>,
    #[serde(default)]
    pub comments: Vec<CommentPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationPayload {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub comments: Vec<CommentPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentPayload {
    #[serde(default)]
    pub content: String,
}

impl BookmarkPayload {
    pub fn into_bookmark(self) -> Result<Bookmark, DiigoError> {
        let created_at = parse_diigo_datetime(&self.created_at)?;
        let read_later = parse_flag("readlater", &self.readlater, false)?;
        let private = !parse_flag("shared", &self.shared, true)?;
        let tags = split_tags(&self.tags);

        let mut annotations: Vec<Annotation> = Vec::new();
        for annotation in self.annotations {
            let comments = annotation.comments.into_iter().map(|c| c.content);
            match annotations
                .iter_mut()
                .find(|existing| existing.content == annotation.content)
            {
                Some(existing) => existing.comments.extend(comments),
                None => annotations.push(Annotation {
                    content: annotation.content,
                    comments: comments.collect(),
                }),
            }
        }

        Ok(Bookmark {
            url: self.url,
            title: self.title,
            description: self.desc,
            tags,
            created_at,
            read_later,
            private,
            annotations,
            comments: self.comments.into_iter().map(|c| c.content).collect(),
        })
    }
}

/// Diigo sends tags as one comma-separated string.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(field: &str, value: &str, default: bool) -> Result<bool, DiigoError> {
    match value.trim() {
        "yes" => Ok(true),
        "no" => Ok(false),
        "" => Ok(default),
        other => Err(DiigoError::InvalidResponse(format!(
            "field {field} must be \"yes\" or \"no\", got {other:?}"
        ))),
    }
}
