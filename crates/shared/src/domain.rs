use serde::{Deserialize, Serialize};

macro_rules! handle_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

handle_newtype!(TempName);
handle_newtype!(MergeHandle);

/// Merging needs at least this many files; below the threshold the workflow
/// resets to its empty state.
pub const MIN_MERGE_FILES: usize = 2;

/// Upper bound the server puts on one upload batch; checked client-side so
/// an oversized batch never leaves the machine.
pub const MAX_MERGE_FILES: usize = 10;

/// Per-file upload ceiling enforced client-side before any bytes leave the
/// machine. The server enforces the same limit.
pub const MAX_FILE_SIZE_BYTES: u64 = 20 * 1024 * 1024;

/// Exact media type accepted for candidates; no wildcard or subtype matching.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";
