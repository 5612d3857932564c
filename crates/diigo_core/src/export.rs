use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Builder;
use tracing::info;

use crate::client::{validate_page_size, ClientOptions, DiigoClient, RetryPolicy, MAX_PAGE_SIZE};
use crate::credentials::Credentials;
use crate::csv_utils::{resolve_encoding, write_rows};
use crate::errors::{DiigoError, ExportError};
use crate::models::{Bookmark, BookmarkPayload, RaindropRow};
use crate::timestamp::format_created;

pub const DEFAULT_EXPORT_FILENAME: &str = "diigo_export.csv";
pub const DEFAULT_ROOT_FOLDER: &str = "Diigo Import";
pub const TAG_DELIMITER: &str = ", ";

#[derive(Debug, Clone)]
pub struct ExportProgress {
    pub pages: u32,
    pub fetched: u64,
}

pub type ProgressCallback = Arc<dyn Fn(ExportProgress) + Send + Sync + 'static>;

#[derive(Clone)]
pub struct ExportOptions {
    pub credentials: Credentials,
    pub csv_path: PathBuf,
    pub encoding: String,
    pub page_size: u32,
    pub timeout_secs: u64,
    pub root_folder: String,
    pub base_url: Option<String>,
    pub retry: RetryPolicy,
    pub progress_callback: Option<ProgressCallback>,
}

impl ExportOptions {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            csv_path: PathBuf::from(DEFAULT_EXPORT_FILENAME),
            encoding: "utf-8".to_string(),
            page_size: MAX_PAGE_SIZE,
            timeout_secs: 30,
            root_folder: DEFAULT_ROOT_FOLDER.to_string(),
            base_url: None,
            retry: RetryPolicy::default(),
            progress_callback: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportResult {
    pub csv_path: PathBuf,
    pub bookmarks: Vec<Bookmark>,
    pub pages: u32,
}

/// Fetches every bookmark and writes the Raindrop.io CSV.
///
/// Nothing touches the destination until all pages are in memory and
/// mapped, so a failed run leaves any previous export intact.
pub async fn export_bookmarks(options: ExportOptions) -> Result<ExportResult, ExportError> {
    validate_page_size(options.page_size)?;
    resolve_encoding(&options.encoding)?;

    let client_options = ClientOptions {
        timeout: Duration::from_secs(options.timeout_secs),
        base_url: options.base_url.clone(),
        retry: options.retry.clone(),
    };
    let client = DiigoClient::new(options.credentials, client_options)?;

    client
        .authenticate()
        .await
        .map_err(|err| ExportError::from(err).context("signing in to Diigo"))?;

    let progress_callback = options.progress_callback.clone();
    let mut pages = 0u32;
    let payloads = client
        .fetch_all(options.page_size, |progress| {
            pages = progress.pages;
            if let Some(callback) = progress_callback.as_ref() {
                callback(ExportProgress {
                    pages: progress.pages,
                    fetched: progress.fetched,
                });
            }
        })
        .await
        .map_err(|err| ExportError::from(err).context("fetching bookmarks"))?;
    info!(count = payloads.len(), pages, "fetched bookmarks from Diigo");

    let bookmarks = payloads
        .into_iter()
        .map(BookmarkPayload::into_bookmark)
        .collect::<Result<Vec<_>, DiigoError>>()?;
    let rows: Vec<RaindropRow> = bookmarks
        .iter()
        .map(|bookmark| build_row(bookmark, &options.root_folder))
        .collect();

    write_rows(&options.csv_path, &options.encoding, &rows).map_err(|err| {
        ExportError::from(err).context(format!("saving {}", options.csv_path.display()))
    })?;
    info!(path = %options.csv_path.display(), rows = rows.len(), "export saved");

    Ok(ExportResult {
        csv_path: options.csv_path,
        bookmarks,
        pages,
    })
}

pub fn export_bookmarks_blocking(options: ExportOptions) -> Result<ExportResult, ExportError> {
    let rt = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| DiigoError::Config(format!("failed to start Tokio runtime: {err}")))?;
    rt.block_on(export_bookmarks(options))
}

/// Projects a bookmark onto the Raindrop.io import columns.
pub fn build_row(bookmark: &Bookmark, root_folder: &str) -> RaindropRow {
    RaindropRow {
        url: bookmark.url.clone(),
        folder: build_folder(bookmark, root_folder),
        title: bookmark.title.clone(),
        note: build_note(bookmark),
        tags: bookmark.tags.join(TAG_DELIMITER),
        created: format_created(&bookmark.created_at),
    }
}

fn build_folder(bookmark: &Bookmark, root_folder: &str) -> String {
    let mut folder = root_folder.to_string();
    if bookmark.read_later {
        folder.push_str("/Read Later");
    }
    if bookmark.private {
        folder.push_str("/Private");
    }
    folder
}

/// Description, then highlights as block quotes each followed by its
/// comments, then bookmark-level comments.
fn build_note(bookmark: &Bookmark) -> String {
    let mut note = bookmark.description.clone();
    if !bookmark.annotations.is_empty() {
        push_section(&mut note, "Annotations:");
        for annotation in &bookmark.annotations {
            note.push_str("\n\n");
            note.push_str(&block_quote(&annotation.content));
            for comment in &annotation.comments {
                note.push_str("\n\n");
                note.push_str(comment);
            }
        }
    }
    if !bookmark.comments.is_empty() {
        push_section(&mut note, "Comments:");
        for comment in &bookmark.comments {
            note.push_str("\n\n");
            note.push_str(comment);
        }
    }
    note
}

fn push_section(note: &mut String, heading: &str) {
    if !note.is_empty() {
        note.push_str("\n\n");
    }
    note.push_str(heading);
}

fn block_quote(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
