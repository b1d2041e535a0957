use serde::{Deserialize, Deserializer, Serialize};

/// One "interactives uploaded" notification.
///
/// `current_files` lists destination paths written by earlier imports of the
/// same interactive; it drives version inference for re-uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEvent {
    pub id: String,
    pub collection_id: String,
    /// Storage key of the uploaded zip.
    #[serde(rename = "path")]
    pub source_path: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub current_files: Vec<String>,
}

impl ImportEvent {
    /// Decode an event from a raw message body.
    pub fn from_slice(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
