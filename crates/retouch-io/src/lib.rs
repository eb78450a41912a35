//! retouch-io: Browser I/O for the photo editor.
//!
//! Reads uploaded `File`s, offers exported images as Blob downloads, and
//! talks to the `retouch-worker` module so filters run off the main
//! thread.

pub mod download;
pub mod upload;
pub mod worker;

pub use download::{Download, DownloadError, download_export, trigger_download};
pub use upload::read_file;
pub use worker::{FilterJob, FilterWorker};
