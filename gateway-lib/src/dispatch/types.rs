use serde::{Deserialize, Serialize};

/// One RPC request: fetch `path` on behalf of `client_id`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskRequest {
    pub client_id: String,
    pub path: String,
}

/// RPC response. `status_code == 0` signals a connectivity/policy failure;
/// the human-readable reason is in `error_message`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskResponse {
    pub client_id: String,
    pub status_code: i32,
    #[serde(with = "serde_bytes_as_base64")]
    pub body: Vec<u8>,
    pub error_message: String,
}

impl TaskResponse {
    pub fn failure(client_id: String, message: impl Into<String>) -> Self {
        Self { client_id, status_code: 0, body: Vec::new(), error_message: message.into() }
    }

    pub fn success(client_id: String, status_code: i32, body: Vec<u8>) -> Self {
        Self { client_id, status_code, body, error_message: String::new() }
    }
}

/// `TaskResponse.body` is arbitrary bytes but the wire format is JSON;
/// base64-encode it rather than relying on serde_json's lossy string
/// handling of non-UTF-8 byte vectors.
mod serde_bytes_as_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json_with_binary_body() {
        let resp = TaskResponse::success("client-1".to_string(), 200, vec![0, 159, 146, 150]);
        let json = serde_json::to_string(&resp).unwrap();
        let back: TaskResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.body, resp.body);
        assert_eq!(back.status_code, 200);
    }

    #[test]
    fn failure_has_zero_status() {
        let resp = TaskResponse::failure("client-1".to_string(), "whitelist empty");
        assert_eq!(resp.status_code, 0);
        assert_eq!(resp.error_message, "whitelist empty");
    }
}
