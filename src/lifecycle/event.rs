//! Provider lifecycle events.
//!
//! Webhook bodies are loosely typed JSON. `LifecycleEvent::from_webhook`
//! turns them into a closed set of variants up front so the reducer never
//! touches raw fields. Anything unrecognised becomes `Unknown` and is ignored.

use serde_json::Value;

/// Outcome data reported when a call ends
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallReport {
    pub ended_reason: Option<String>,
    pub duration_seconds: Option<u32>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub recording_url: Option<String>,
    pub cost: Option<f64>,
}

/// How a transcript event changes the stored transcript
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptUpdate {
    /// One new utterance, appended as a line
    Append(String),
    /// The full conversation so far
    Replace(String),
}

/// A parsed provider event, keyed by the provider's call id
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    CallStarted {
        call_id: String,
        /// Provider-side assistant id, when the provider sends one
        assistant_id: Option<String>,
        metadata: Value,
    },
    CallEnded {
        call_id: String,
        report: CallReport,
    },
    Transcript {
        call_id: String,
        update: TranscriptUpdate,
    },
    Forwarded {
        call_id: String,
        destination: Option<String>,
    },
    FunctionCall {
        call_id: String,
        name: String,
        /// Function result if present, otherwise its arguments
        payload: Value,
    },
    Unknown {
        event_type: String,
        call_id: Option<String>,
    },
}

impl LifecycleEvent {
    /// Parse a webhook body: either `{"message": {...}}` or the bare message.
    pub fn from_webhook(body: &Value) -> Self {
        let message = match body.get("message") {
            Some(m) if m.is_object() => m,
            _ => body,
        };

        let event_type = str_field(message, &["type"]).unwrap_or_default();
        let call_id = call_id(message);

        let Some(id) = call_id.clone() else {
            return LifecycleEvent::Unknown { event_type, call_id };
        };

        match event_type.as_str() {
            "call-started" => started(id, message),
            "status-update" => match str_field(message, &["status"]).as_deref() {
                Some("in-progress") => started(id, message),
                _ => LifecycleEvent::Unknown { event_type, call_id },
            },
            "call-ended" | "end-of-call-report" => LifecycleEvent::CallEnded {
                call_id: id,
                report: report(message),
            },
            "transcript" => {
                if str_field(message, &["transcriptType"]).as_deref() == Some("partial") {
                    return LifecycleEvent::Unknown { event_type, call_id };
                }
                match str_field(message, &["transcript"]) {
                    Some(text) => {
                        let line = match str_field(message, &["role"]) {
                            Some(role) => format!("{}: {}", role, text),
                            None => text,
                        };
                        LifecycleEvent::Transcript {
                            call_id: id,
                            update: TranscriptUpdate::Append(line),
                        }
                    }
                    None => LifecycleEvent::Unknown { event_type, call_id },
                }
            }
            "message" => match full_transcript(message) {
                Some(text) => LifecycleEvent::Transcript {
                    call_id: id,
                    update: TranscriptUpdate::Replace(text),
                },
                None => LifecycleEvent::Unknown { event_type, call_id },
            },
            "call-forwarding-started" | "transfer" | "transfer-destination-request" => LifecycleEvent::Forwarded {
                call_id: id,
                destination: destination(message),
            },
            "function-call" | "tool-calls" => match function_call(message) {
                Some((name, payload)) => LifecycleEvent::FunctionCall {
                    call_id: id,
                    name,
                    payload,
                },
                None => LifecycleEvent::Unknown { event_type, call_id },
            },
            _ => LifecycleEvent::Unknown { event_type, call_id },
        }
    }

    /// Provider call id the event refers to
    pub fn call_id(&self) -> Option<&str> {
        match self {
            LifecycleEvent::CallStarted { call_id, .. }
            | LifecycleEvent::CallEnded { call_id, .. }
            | LifecycleEvent::Transcript { call_id, .. }
            | LifecycleEvent::Forwarded { call_id, .. }
            | LifecycleEvent::FunctionCall { call_id, .. } => Some(call_id),
            LifecycleEvent::Unknown { call_id, .. } => call_id.as_deref(),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            LifecycleEvent::CallStarted { .. } => "call-started",
            LifecycleEvent::CallEnded { .. } => "call-ended",
            LifecycleEvent::Transcript { .. } => "transcript",
            LifecycleEvent::Forwarded { .. } => "call-forwarded",
            LifecycleEvent::FunctionCall { .. } => "function-call",
            LifecycleEvent::Unknown { event_type, .. } => event_type,
        }
    }
}

/// First non-empty string among `keys`
fn str_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| value.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn call_id(message: &Value) -> Option<String> {
    message
        .get("call")
        .and_then(|call| str_field(call, &["id", "external_call_id"]))
        .or_else(|| str_field(message, &["callId", "call_id"]))
}

fn metadata(message: &Value) -> Value {
    message
        .get("call")
        .and_then(|call| call.get("metadata"))
        .filter(|m| m.is_object())
        .or_else(|| message.get("metadata").filter(|m| m.is_object()))
        .cloned()
        .unwrap_or(Value::Null)
}

fn started(call_id: String, message: &Value) -> LifecycleEvent {
    let assistant_id = message
        .get("call")
        .and_then(|call| str_field(call, &["assistantId"]))
        .or_else(|| message.get("assistant").and_then(|a| str_field(a, &["id"])));

    LifecycleEvent::CallStarted {
        call_id,
        assistant_id,
        metadata: metadata(message),
    }
}

fn report(message: &Value) -> CallReport {
    let artifact = message.get("artifact").unwrap_or(&Value::Null);
    let analysis = message.get("analysis").unwrap_or(&Value::Null);

    let duration_seconds = ["durationSeconds", "duration"]
        .iter()
        .filter_map(|k| message.get(*k).and_then(Value::as_f64))
        .find(|d| *d >= 0.0)
        .map(|d| d.round() as u32);

    CallReport {
        ended_reason: str_field(message, &["endedReason"])
            .or_else(|| message.get("call").and_then(|c| str_field(c, &["endedReason"]))),
        duration_seconds,
        transcript: str_field(message, &["transcript"]).or_else(|| str_field(artifact, &["transcript"])),
        summary: str_field(message, &["summary"]).or_else(|| str_field(analysis, &["summary"])),
        recording_url: str_field(message, &["recordingUrl"]).or_else(|| str_field(artifact, &["recordingUrl"])),
        cost: message.get("cost").and_then(Value::as_f64),
    }
}

fn full_transcript(message: &Value) -> Option<String> {
    str_field(message, &["transcript"])
        .or_else(|| message.get("artifact").and_then(|a| str_field(a, &["transcript"])))
        .or_else(|| {
            let lines: Vec<String> = message
                .get("messages")?
                .as_array()?
                .iter()
                .filter_map(|m| {
                    let role = str_field(m, &["role"])?;
                    let text = str_field(m, &["message", "content"])?;
                    Some(format!("{}: {}", role, text))
                })
                .collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        })
}

fn destination(message: &Value) -> Option<String> {
    match message.get("destination") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(d @ Value::Object(_)) => str_field(d, &["number", "sipUri"]),
        _ => str_field(message, &["forwardingPhoneNumber"]),
    }
}

/// Arguments may arrive as an object or as a JSON-encoded string
fn arguments(value: Option<&Value>) -> Value {
    match value {
        Some(Value::String(s)) => serde_json::from_str(s).unwrap_or(Value::Null),
        Some(v) => v.clone(),
        None => Value::Null,
    }
}

fn function_call(message: &Value) -> Option<(String, Value)> {
    if let Some(fc) = message.get("functionCall") {
        let name = str_field(fc, &["name"])?;
        let payload = match fc.get("result").or_else(|| message.get("result")) {
            Some(result) if result.is_object() => result.clone(),
            _ => arguments(fc.get("parameters")),
        };
        return Some((name, payload));
    }

    let first = message
        .get("toolCallList")
        .or_else(|| message.get("toolCalls"))
        .and_then(Value::as_array)
        .and_then(|calls| calls.first())?;
    let function = first.get("function")?;
    let name = str_field(function, &["name"])?;
    Some((name, arguments(function.get("arguments"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_end_of_call_report_envelope() {
        let body = json!({
            "message": {
                "type": "end-of-call-report",
                "endedReason": "customer-did-not-answer",
                "durationSeconds": 12.6,
                "cost": 0.04,
                "summary": "No answer",
                "artifact": { "transcript": "AI: Bonjour", "recordingUrl": "https://rec/1.wav" },
                "call": { "id": "vapi-1" }
            }
        });

        let event = LifecycleEvent::from_webhook(&body);
        assert_eq!(
            event,
            LifecycleEvent::CallEnded {
                call_id: "vapi-1".to_string(),
                report: CallReport {
                    ended_reason: Some("customer-did-not-answer".to_string()),
                    duration_seconds: Some(13),
                    transcript: Some("AI: Bonjour".to_string()),
                    summary: Some("No answer".to_string()),
                    recording_url: Some("https://rec/1.wav".to_string()),
                    cost: Some(0.04),
                },
            }
        );
    }

    #[test]
    fn test_bare_call_ended() {
        let body = json!({ "type": "call-ended", "call": { "external_call_id": "x-9" } });
        assert_eq!(LifecycleEvent::from_webhook(&body).call_id(), Some("x-9"));
        assert_eq!(LifecycleEvent::from_webhook(&body).kind(), "call-ended");
    }

    #[test]
    fn test_status_update_in_progress_is_call_started() {
        let body = json!({
            "message": {
                "type": "status-update",
                "status": "in-progress",
                "call": { "id": "vapi-2", "assistantId": "asst_1", "metadata": { "organizationId": "org-1" } }
            }
        });
        match LifecycleEvent::from_webhook(&body) {
            LifecycleEvent::CallStarted {
                call_id,
                assistant_id,
                metadata,
            } => {
                assert_eq!(call_id, "vapi-2");
                assert_eq!(assistant_id.as_deref(), Some("asst_1"));
                assert_eq!(metadata["organizationId"], "org-1");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_status_update_ended_is_ignored() {
        let body = json!({ "message": { "type": "status-update", "status": "ended", "call": { "id": "v" } } });
        assert!(matches!(LifecycleEvent::from_webhook(&body), LifecycleEvent::Unknown { .. }));
    }

    #[test]
    fn test_transcript_final_appends_with_role() {
        let body = json!({
            "message": { "type": "transcript", "transcriptType": "final", "role": "user", "transcript": "Oui", "call": { "id": "v" } }
        });
        assert_eq!(
            LifecycleEvent::from_webhook(&body),
            LifecycleEvent::Transcript {
                call_id: "v".to_string(),
                update: TranscriptUpdate::Append("user: Oui".to_string()),
            }
        );
    }

    #[test]
    fn test_partial_transcript_is_ignored() {
        let body = json!({
            "message": { "type": "transcript", "transcriptType": "partial", "transcript": "Ou", "call": { "id": "v" } }
        });
        assert!(matches!(LifecycleEvent::from_webhook(&body), LifecycleEvent::Unknown { .. }));
    }

    #[test]
    fn test_message_replaces_transcript() {
        let body = json!({
            "message": {
                "type": "message",
                "messages": [
                    { "role": "bot", "message": "Bonjour" },
                    { "role": "user", "message": "Salut" }
                ],
                "call": { "id": "v" }
            }
        });
        assert_eq!(
            LifecycleEvent::from_webhook(&body),
            LifecycleEvent::Transcript {
                call_id: "v".to_string(),
                update: TranscriptUpdate::Replace("bot: Bonjour\nuser: Salut".to_string()),
            }
        );
    }

    #[test]
    fn test_forwarding_destination_object() {
        let body = json!({
            "message": { "type": "transfer", "destination": { "type": "number", "number": "+33100000000" }, "call": { "id": "v" } }
        });
        assert_eq!(
            LifecycleEvent::from_webhook(&body),
            LifecycleEvent::Forwarded {
                call_id: "v".to_string(),
                destination: Some("+33100000000".to_string()),
            }
        );
    }

    #[test]
    fn test_function_call_prefers_result() {
        let body = json!({
            "message": {
                "type": "function-call",
                "functionCall": {
                    "name": "book_appointment",
                    "parameters": { "date": "2026-01-01" },
                    "result": { "date": "2026-01-02", "time": "10:00" }
                },
                "call": { "id": "v" }
            }
        });
        match LifecycleEvent::from_webhook(&body) {
            LifecycleEvent::FunctionCall { name, payload, .. } => {
                assert_eq!(name, "book_appointment");
                assert_eq!(payload["date"], "2026-01-02");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tool_calls_with_string_arguments() {
        let body = json!({
            "message": {
                "type": "tool-calls",
                "toolCallList": [
                    { "id": "t1", "function": { "name": "book_appointment", "arguments": "{\"time\":\"09:00\"}" } }
                ],
                "call": { "id": "v" }
            }
        });
        match LifecycleEvent::from_webhook(&body) {
            LifecycleEvent::FunctionCall { payload, .. } => assert_eq!(payload["time"], "09:00"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_call_id_is_unknown() {
        let body = json!({ "message": { "type": "end-of-call-report" } });
        assert_eq!(
            LifecycleEvent::from_webhook(&body),
            LifecycleEvent::Unknown {
                event_type: "end-of-call-report".to_string(),
                call_id: None,
            }
        );
    }

    #[test]
    fn test_unrecognised_type() {
        let body = json!({ "message": { "type": "speech-update", "call": { "id": "v" } } });
        assert_eq!(LifecycleEvent::from_webhook(&body).kind(), "speech-update");
    }
}
