//! Triage decision types and response validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::llm::LlmError;

/// What the service desk should do with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Answer directly from the policies.
    #[serde(rename = "AUTO_RESOLVER")]
    AutoResolve,
    /// Ask the user for missing details.
    #[serde(rename = "PEDIR_INFO")]
    RequestInfo,
    /// Open a ticket (exceptions, approvals, special access).
    #[serde(rename = "ABRIR_CHAMADO")]
    OpenTicket,
}

impl Decision {
    pub const ALL: [Decision; 3] = [
        Decision::AutoResolve,
        Decision::RequestInfo,
        Decision::OpenTicket,
    ];

    /// Wire value used in the JSON payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::AutoResolve => "AUTO_RESOLVER",
            Decision::RequestInfo => "PEDIR_INFO",
            Decision::OpenTicket => "ABRIR_CHAMADO",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgent the request is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Urgency {
    #[serde(rename = "BAIXA")]
    Low,
    #[serde(rename = "MEDIA")]
    Medium,
    #[serde(rename = "ALTA")]
    High,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Urgency::Low, Urgency::Medium, Urgency::High];

    /// Wire value used in the JSON payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "BAIXA",
            Urgency::Medium => "MEDIA",
            Urgency::High => "ALTA",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triage verdict for one message.
///
/// Exactly three keys on the wire; unknown keys are rejected and none are
/// optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriageResult {
    #[serde(rename = "decisao")]
    pub decision: Decision,
    #[serde(rename = "urgencia")]
    pub urgency: Urgency,
    #[serde(rename = "campos_faltantes")]
    pub missing_fields: Vec<String>,
}

impl TriageResult {
    /// Pretty JSON in the wire format.
    pub fn to_json_pretty(&self) -> String {
        // Serializing plain enums and strings cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Parse and validate a raw model reply.
///
/// Accepts the JSON object bare or wrapped in a markdown code fence. Anything
/// that does not match the schema is an error; the reply is never repaired.
pub fn parse_triage_response(raw: &str) -> Result<TriageResult, LlmError> {
    let body = strip_code_fence(raw);
    serde_json::from_str(body).map_err(|e| {
        LlmError::Parse(format!(
            "Triage reply does not match schema: {} (reply: {})",
            e,
            truncate_for_log(raw, 200)
        ))
    })
}

/// Remove a surrounding ```json ... ``` fence if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Info string ("json") may be followed by a newline or by the body itself
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.trim_end().trim_end_matches("```").trim()
}

fn truncate_for_log(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let result = parse_triage_response(
            r#"{"decisao":"AUTO_RESOLVER","urgencia":"BAIXA","campos_faltantes":[]}"#,
        )
        .unwrap();
        assert_eq!(result.decision, Decision::AutoResolve);
        assert_eq!(result.urgency, Urgency::Low);
        assert!(result.missing_fields.is_empty());
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\n  \"decisao\": \"PEDIR_INFO\",\n  \"urgencia\": \"MEDIA\",\n  \"campos_faltantes\": [\"tema\", \"contexto\"]\n}\n```";
        let result = parse_triage_response(raw).unwrap();
        assert_eq!(result.decision, Decision::RequestInfo);
        assert_eq!(result.urgency, Urgency::Medium);
        assert_eq!(result.missing_fields, vec!["tema", "contexto"]);
    }

    #[test]
    fn test_parse_bare_fence() {
        let raw = "```\n{\"decisao\":\"ABRIR_CHAMADO\",\"urgencia\":\"ALTA\",\"campos_faltantes\":[]}\n```";
        let result = parse_triage_response(raw).unwrap();
        assert_eq!(result.decision, Decision::OpenTicket);
        assert_eq!(result.urgency, Urgency::High);
    }

    #[test]
    fn test_parse_single_line_fence() {
        let raw = r#"```json {"decisao":"PEDIR_INFO","urgencia":"BAIXA","campos_faltantes":["tema"]}```"#;
        let result = parse_triage_response(raw).unwrap();
        assert_eq!(result.decision, Decision::RequestInfo);
        assert_eq!(result.missing_fields, vec!["tema"]);

        let raw = r#"```JSON{"decisao":"ABRIR_CHAMADO","urgencia":"ALTA","campos_faltantes":[]}```"#;
        assert_eq!(
            parse_triage_response(raw).unwrap().decision,
            Decision::OpenTicket
        );

        let raw = r#"```{"decisao":"AUTO_RESOLVER","urgencia":"MEDIA","campos_faltantes":[]}```"#;
        assert_eq!(parse_triage_response(raw).unwrap().urgency, Urgency::Medium);
    }

    #[test]
    fn test_rejects_unknown_enum_value() {
        let raw = r#"{"decisao":"ESCALAR","urgencia":"BAIXA","campos_faltantes":[]}"#;
        assert!(matches!(
            parse_triage_response(raw),
            Err(LlmError::Parse(_))
        ));

        let raw = r#"{"decisao":"PEDIR_INFO","urgencia":"baixa","campos_faltantes":[]}"#;
        assert!(parse_triage_response(raw).is_err());
    }

    #[test]
    fn test_rejects_missing_key() {
        let raw = r#"{"decisao":"PEDIR_INFO","urgencia":"BAIXA"}"#;
        assert!(parse_triage_response(raw).is_err());
    }

    #[test]
    fn test_rejects_extra_key() {
        let raw = r#"{"decisao":"PEDIR_INFO","urgencia":"BAIXA","campos_faltantes":[],"motivo":"x"}"#;
        assert!(parse_triage_response(raw).is_err());
    }

    #[test]
    fn test_rejects_prose() {
        assert!(parse_triage_response("I think this should be a ticket.").is_err());
        assert!(parse_triage_response("").is_err());
    }

    #[test]
    fn test_serialized_keys_are_exactly_the_schema() {
        for decision in Decision::ALL {
            for urgency in Urgency::ALL {
                let result = TriageResult {
                    decision,
                    urgency,
                    missing_fields: vec!["centro_de_custo".to_string()],
                };
                let value: serde_json::Value =
                    serde_json::from_str(&result.to_json_pretty()).unwrap();
                let obj = value.as_object().unwrap();
                let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
                keys.sort_unstable();
                assert_eq!(keys, vec!["campos_faltantes", "decisao", "urgencia"]);
                assert_eq!(obj["decisao"], decision.as_str());
                assert_eq!(obj["urgencia"], urgency.as_str());
            }
        }
    }

    #[test]
    fn test_truncate_for_log_is_char_safe() {
        assert_eq!(truncate_for_log("ação", 2), "aç...");
        assert_eq!(truncate_for_log("ok", 10), "ok");
    }
}
