//! Backend commands queued from UI to backend worker.

use shared::domain::TempName;
use std::path::PathBuf;

pub enum BackendCommand {
    UploadFiles {
        paths: Vec<PathBuf>,
    },
    Reorder {
        order: Vec<TempName>,
    },
    RemoveFile {
        temp_name: TempName,
    },
    Merge {
        compress: bool,
    },
    DownloadMerged,
    Clear,
}
