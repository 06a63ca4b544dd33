use serde::{Deserialize, Serialize};

use crate::domain::{MergeHandle, TempName};

/// One uploaded file as acknowledged by the server: the server-assigned
/// temporary handle plus the user-facing display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub temp_name: TempName,
    pub original_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub files: Vec<FileDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    pub file_order: Vec<TempName>,
    pub compress: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResponse {
    pub merged_file: MergeHandle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub compressed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_response_matches_server_wire_format() {
        let response: UploadResponse = serde_json::from_str(
            r#"{"files": [{"temp_name": "temp_ab12_a.pdf", "original_name": "a.pdf"}]}"#,
        )
        .expect("upload response");
        assert_eq!(response.files.len(), 1);
        assert_eq!(
            response.files[0].temp_name,
            TempName::from("temp_ab12_a.pdf")
        );
        assert_eq!(response.files[0].original_name, "a.pdf");
    }

    #[test]
    fn merge_request_serializes_order_and_flag() {
        let request = MergeRequest {
            file_order: vec![TempName::from("t1"), TempName::from("t2")],
            compress: true,
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"file_order": ["t1", "t2"], "compress": true})
        );
    }

    #[test]
    fn merge_response_tolerates_missing_stats() {
        let response: MergeResponse =
            serde_json::from_str(r#"{"merged_file": "merged_x.pdf"}"#).expect("merge response");
        assert_eq!(response.merged_file, MergeHandle::from("merged_x.pdf"));
        assert!(response.file_size.is_none());
        assert!(response.page_count.is_none());
        assert!(!response.compressed);
    }

    #[test]
    fn error_payload_round_trips() {
        let payload: crate::error::ErrorResponse =
            serde_json::from_str(r#"{"error": "a.txt is not a PDF file"}"#).expect("error payload");
        assert_eq!(payload.error, "a.txt is not a PDF file");
        assert_eq!(payload.to_string(), "a.txt is not a PDF file");
    }
}
