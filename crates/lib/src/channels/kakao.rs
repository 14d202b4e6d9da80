//! Kakao i Open Builder skill payloads.

use serde::Serialize;
use serde_json::Value;

/// Skill request body, reduced to the two fields the webhook reads. Each field is
/// extracted on its own: a missing or mistyped field defaults without affecting the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillRequest {
    utterance: Option<String>,
    user_id: Option<String>,
}

impl SkillRequest {
    /// Parse a raw body. A body that is not JSON becomes an empty request rather than an error.
    pub fn from_slice(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(v) => Self::from_value(&v),
            Err(e) => {
                if !body.is_empty() {
                    log::warn!("skill request: unparsable body treated as empty: {}", e);
                }
                Self::default()
            }
        }
    }

    /// `userRequest.utterance` when it is a string; `userRequest.user.id` as a string
    /// (numbers are stringified, null and other shapes are dropped).
    pub fn from_value(v: &Value) -> Self {
        let utterance = v
            .pointer("/userRequest/utterance")
            .and_then(Value::as_str)
            .map(str::to_string);
        let user_id = match v.pointer("/userRequest/user/id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(n @ Value::Number(_)) => Some(n.to_string()),
            _ => None,
        };
        Self { utterance, user_id }
    }

    /// `userRequest.utterance`, or "" when absent.
    pub fn utterance(&self) -> &str {
        self.utterance.as_deref().unwrap_or("")
    }

    /// `userRequest.user.id`, used only to correlate log lines.
    pub fn user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}

/// Response envelope: `{"version":"2.0","template":{"outputs":[{"simpleText":{"text":...}}]}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillResponse {
    pub version: String,
    pub template: SkillTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillTemplate {
    pub outputs: Vec<SkillOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillOutput {
    #[serde(rename = "simpleText")]
    pub simple_text: SimpleText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleText {
    pub text: String,
}

impl SkillResponse {
    pub fn simple_text(text: impl Into<String>) -> Self {
        Self {
            version: "2.0".to_string(),
            template: SkillTemplate {
                outputs: vec![SkillOutput {
                    simple_text: SimpleText { text: text.into() },
                }],
            },
        }
    }

    /// Text of the first simpleText output.
    pub fn text(&self) -> &str {
        self.template
            .outputs
            .first()
            .map(|o| o.simple_text.text.as_str())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_payload() {
        let req = SkillRequest::from_slice(
            br#"{"userRequest":{"utterance":"hi","user":{"id":"abc","type":"botUserKey"}},"bot":{"id":"x"}}"#,
        );
        assert_eq!(req.utterance(), "hi");
        assert_eq!(req.user_id().as_deref(), Some("abc"));
    }

    #[test]
    fn missing_fields_default() {
        let bodies: [&[u8]; 4] = [
            br#"{}"#,
            br#"{"userRequest":{}}"#,
            br#"{"userRequest":{"user":{}}}"#,
            br#"{"userRequest":{"utterance":"x","user":{"id":null}}}"#,
        ];
        for body in bodies {
            let req = SkillRequest::from_slice(body);
            assert!(req.user_id().is_none());
        }
        assert_eq!(SkillRequest::from_slice(br#"{"userRequest":{}}"#).utterance(), "");
    }

    #[test]
    fn garbage_body_is_empty_request() {
        let req = SkillRequest::from_slice(b"not json");
        assert_eq!(req.utterance(), "");
        let req = SkillRequest::from_slice(br#"[1,2,3]"#);
        assert_eq!(req.utterance(), "");
        let req = SkillRequest::from_slice(b"");
        assert_eq!(req.utterance(), "");
    }

    #[test]
    fn mistyped_sibling_keeps_utterance() {
        let bodies: [&[u8]; 4] = [
            br#"{"userRequest":{"utterance":"hello","user":"abc"}}"#,
            br#"{"userRequest":{"utterance":"hello","user":{"id":["x"]}}}"#,
            br#"{"userRequest":{"utterance":"hello","user":null}}"#,
            br#"{"userRequest":{"utterance":"hello","user":{"id":"u","properties":{"a":1}}},"action":7}"#,
        ];
        for body in bodies {
            assert_eq!(SkillRequest::from_slice(body).utterance(), "hello");
        }
        let req = SkillRequest::from_slice(br#"{"userRequest":{"utterance":"hello","user":"abc"}}"#);
        assert!(req.user_id().is_none());
    }

    #[test]
    fn mistyped_utterance_is_empty() {
        let req = SkillRequest::from_slice(br#"{"userRequest":{"utterance":12,"user":{"id":"u"}}}"#);
        assert_eq!(req.utterance(), "");
        assert_eq!(req.user_id().as_deref(), Some("u"));
    }

    #[test]
    fn numeric_user_id() {
        let req = SkillRequest::from_slice(br#"{"userRequest":{"user":{"id":42}}}"#);
        assert_eq!(req.user_id().as_deref(), Some("42"));
    }

    #[test]
    fn envelope_shape() {
        let resp = SkillResponse::simple_text("hello");
        assert_eq!(resp.text(), "hello");
        let v = serde_json::to_value(resp).unwrap();
        assert_eq!(
            v,
            json!({
                "version": "2.0",
                "template": { "outputs": [ { "simpleText": { "text": "hello" } } ] }
            })
        );
    }
}
