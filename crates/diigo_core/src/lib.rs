pub mod client;
pub mod credentials;
pub mod csv_utils;
pub mod errors;
pub mod export;
pub mod models;
pub mod timestamp;

pub use client::{ClientOptions, DiigoClient, PageProgress, RetryPolicy, DEFAULT_BASE_URL, MAX_PAGE_SIZE};
pub use credentials::{
    CredentialProvider, Credentials, Login, StaticCredentials, API_KEY_ENV, PASSWORD_ENV,
    USERNAME_ENV,
};
pub use csv_utils::{read_csv_rows, render_rows, write_rows, CsvRow, FIELDNAMES};
pub use errors::{DiigoError, ErrorKind, ExportError};
pub use export::{
    build_row,
    export_bookmarks,
    export_bookmarks_blocking,
    ExportOptions,
    ExportProgress,
    ExportResult,
    ProgressCallback,
    DEFAULT_EXPORT_FILENAME,
    DEFAULT_ROOT_FOLDER,
    TAG_DELIMITER,
};
pub use models::{Annotation, Bookmark, BookmarkPayload, RaindropRow};
pub use timestamp::{format_created, parse_diigo_datetime};
