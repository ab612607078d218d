//! [`PageConfig`] → JSON serialization.

use crate::error::SerializeError;
use crate::types::PageConfig;

/// Serialize a page config to a pretty JSON string (bare page form, no
/// transport envelope).
///
/// The config should typically be normalized before serialization. Maps
/// preserve insertion order, so serializing a parsed config keeps the
/// original field order stable.
pub fn serialize(config: &PageConfig) -> Result<String, SerializeError> {
    serde_json::to_string_pretty(config).map_err(|e| SerializeError {
        message: format!("failed to serialize page config: {}", e),
    })
}
