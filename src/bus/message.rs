/// One frame on a named queue. The lock protocol uses the correlation id
/// as `id` and routes with a `to` header.
#[derive(Clone, Debug)]
pub struct Message {
    pub id: String,
    /// `lock.query` or `lock.reply`.
    pub message_type: String,
    /// bitcode-encoded body.
    pub payload: Vec<u8>,
    /// Routing headers for a proxy-routed transport.
    pub metadata: Option<Vec<(String, String)>>,
}

impl Message {
    pub fn new(id: impl Into<String>, message_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            message_type: message_type.into(),
            payload,
            metadata: None,
        }
    }

    pub fn encode<T: serde::Serialize>(
        id: impl Into<String>,
        message_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, bitcode::Error> {
        let bytes = bitcode::serialize(payload)?;
        Ok(Self::new(id, message_type, bytes))
    }

    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, bitcode::Error> {
        bitcode::deserialize(&self.payload)
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
