//! Payload decoding: gzip, then JSON

use std::io::Read;

use flate2::read::GzDecoder;

use crate::app::dataset::Dataset;
use crate::errors::{FetchError, FetchResult};

/// Gunzip a payload into UTF-8 text
///
/// # Errors
///
/// Returns `FetchError::Decompression` if the payload is not valid gzip or
/// does not decompress to UTF-8
pub fn gunzip(payload: &[u8]) -> FetchResult<String> {
    let mut text = String::new();
    GzDecoder::new(payload)
        .read_to_string(&mut text)
        .map_err(|e| FetchError::Decompression {
            message: e.to_string(),
        })?;
    Ok(text)
}

/// Decode a compressed upstream payload into a dataset
///
/// # Errors
///
/// Returns `FetchError::Decompression` for bad gzip and `FetchError::Parse`
/// for bad JSON or a document that is not an object
pub fn decode_dataset(payload: &[u8]) -> FetchResult<Dataset> {
    let text = gunzip(payload)?;
    let document: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| FetchError::Parse {
            message: e.to_string(),
        })?;
    Dataset::from_value(document)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    pub(crate) fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    /// Test decode valid payload
    #[test]
    fn test_decode_valid_payload() {
        let payload = gzip(r#"{"gorivos": [{"id": 1, "naziv": "EUROSUPER 95"}]}"#);
        let dataset = decode_dataset(&payload).unwrap();
        assert_eq!(dataset.section("gorivos").unwrap().len(), 1);
    }

    /// Test plain JSON is decompression error
    #[test]
    fn test_plain_json_is_decompression_error() {
        let result = decode_dataset(br#"{"gorivos": []}"#);
        assert!(matches!(result, Err(FetchError::Decompression { .. })));
    }

    /// Test invalid JSON is parse error
    #[test]
    fn test_invalid_json_is_parse_error() {
        let result = decode_dataset(&gzip("{\"gorivos\": ["));
        assert!(matches!(result, Err(FetchError::Parse { .. })));
    }

    /// Test non object document is parse error
    #[test]
    fn test_non_object_document_is_parse_error() {
        let result = decode_dataset(&gzip("[]"));
        assert!(matches!(result, Err(FetchError::Parse { .. })));
    }
}
