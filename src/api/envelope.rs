use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ConsoleError;

/// Response shape a route answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `{ success, message, data }`
    Standard,
    /// `{ data }` without a success flag.
    DataOnly,
    /// The payload itself.
    Bare,
}

#[derive(Debug, Deserialize)]
struct StandardEnvelope<T> {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: Option<T>,
}

impl Envelope {
    /// Unwraps a 2xx body into its payload.
    ///
    /// `Ok(None)` means the response carried no payload: an empty body, or a
    /// wrapper without `data`. A standard wrapper with `success: false` is a
    /// [`ConsoleError::Rejected`] carrying the server's message.
    pub fn decode<T: DeserializeOwned>(self, body: &[u8]) -> Result<Option<T>, ConsoleError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        match self {
            Self::Standard => {
                let envelope: StandardEnvelope<T> = parse(body)?;
                if !envelope.success {
                    return Err(ConsoleError::Rejected(envelope.message));
                }
                Ok(envelope.data)
            }
            Self::DataOnly => Ok(parse::<DataEnvelope<T>>(body)?.data),
            Self::Bare => parse(body).map(Some),
        }
    }
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, ConsoleError> {
    serde_json::from_slice(body).map_err(|err| ConsoleError::Decode(err.to_string()))
}

/// Error body of a non-2xx response. Routes disagree on the field name.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).or(self.title)
    }
}

#[cfg(test)]
mod tests {
    use serde::de::IgnoredAny;

    use super::{Envelope, ErrorBody};
    use crate::error::ConsoleError;

    #[test]
    fn rejected_standard_body_keeps_server_message() {
        let body = br#"{ "success": false, "message": "Staff unavailable" }"#;

        match Envelope::Standard.decode::<IgnoredAny>(body) {
            Err(ConsoleError::Rejected(Some(message))) => assert_eq!(message, "Staff unavailable"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn each_shape_finds_its_payload() {
        let standard: Option<Vec<i64>> = Envelope::Standard
            .decode(br#"{ "success": true, "message": "ok", "data": [1, 2] }"#)
            .unwrap();
        assert_eq!(standard, Some(vec![1, 2]));

        let data_only: Option<Vec<i64>> = Envelope::DataOnly.decode(br#"{ "data": [3] }"#).unwrap();
        assert_eq!(data_only, Some(vec![3]));

        let bare: Option<Vec<i64>> = Envelope::Bare.decode(b"[4, 5]").unwrap();
        assert_eq!(bare, Some(vec![4, 5]));
    }

    #[test]
    fn missing_data_and_empty_bodies_carry_nothing() {
        let missing: Option<Vec<i64>> = Envelope::Standard.decode(br#"{ "success": true }"#).unwrap();
        assert!(missing.is_none());

        let null: Option<i64> = Envelope::DataOnly.decode(br#"{ "data": null }"#).unwrap();
        assert!(null.is_none());

        let empty: Option<i64> = Envelope::Bare.decode(b"  \n").unwrap();
        assert!(empty.is_none());
    }

    #[test]
    fn wrong_shape_is_a_decode_error() {
        let result = Envelope::Bare.decode::<Vec<i64>>(br#"{ "data": [1] }"#);
        assert!(matches!(result, Err(ConsoleError::Decode(_))));

        let result = Envelope::Standard.decode::<i64>(b"not json");
        assert!(matches!(result, Err(ConsoleError::Decode(_))));
    }

    #[test]
    fn error_body_falls_back_across_field_names() {
        let body: ErrorBody = serde_json::from_slice(br#"{ "error": "boom" }"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("boom"));
    }
}
