//! Property-based tests for the Gemini translation layer
//!
//! These tests verify that translation between our internal types and the
//! wire format preserves key invariants:
//! - The system instruction only ever appears in `systemInstruction`
//! - Message order, roles and text survive translation
//! - Response text is the in-order concatenation of non-thought parts

use super::gemini::{GeminiResponse, GeminiService};
use super::types::{LlmMessage, LlmRequest, MessageRole};
use proptest::prelude::*;
use serde_json::{json, Value};

// ============================================================================
// Strategies
// ============================================================================

fn arb_role() -> impl Strategy<Value = MessageRole> {
    prop_oneof![Just(MessageRole::User), Just(MessageRole::Model)]
}

fn arb_message() -> impl Strategy<Value = LlmMessage> {
    (arb_role(), "[a-zA-Z0-9 .,?]{0,60}").prop_map(|(role, text)| LlmMessage { role, text })
}

fn arb_request() -> impl Strategy<Value = LlmRequest> {
    (
        proptest::option::of("[a-zA-Z .']{1,80}"),
        proptest::collection::vec(arb_message(), 0..10),
    )
        .prop_map(|(system, messages)| LlmRequest {
            system,
            messages,
            max_tokens: None,
        })
}

/// Response part: (text, is_thought)
fn arb_parts() -> impl Strategy<Value = Vec<(String, bool)>> {
    proptest::collection::vec(("[a-zA-Z0-9 .]{0,20}", any::<bool>()), 0..6)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_translation_preserves_messages(request in arb_request()) {
        let wire = serde_json::to_value(GeminiService::translate_request(&request)).unwrap();
        let contents = wire["contents"].as_array().cloned().unwrap_or_default();

        prop_assert_eq!(contents.len(), request.messages.len());
        for (content, msg) in contents.iter().zip(&request.messages) {
            prop_assert_eq!(content["role"].as_str(), Some(msg.role.as_str()));
            prop_assert_eq!(content["parts"][0]["text"].as_str(), Some(msg.text.as_str()));
        }

        match &request.system {
            Some(system) => {
                prop_assert_eq!(
                    wire["systemInstruction"]["parts"][0]["text"].as_str(),
                    Some(system.as_str())
                );
                prop_assert!(contents.iter().all(|c| c["role"] != "system"));
            }
            None => prop_assert!(wire.get("systemInstruction").is_none()),
        }
    }

    #[test]
    fn prop_response_text_skips_thoughts(parts in arb_parts()) {
        let wire_parts: Vec<Value> = parts
            .iter()
            .map(|(text, thought)| {
                if *thought {
                    json!({ "text": text, "thought": true })
                } else {
                    json!({ "text": text })
                }
            })
            .collect();
        let resp: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "role": "model", "parts": wire_parts },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        let expected: String = parts
            .iter()
            .filter(|(_, thought)| !thought)
            .map(|(text, _)| text.as_str())
            .collect();

        let normalized = GeminiService::normalize_response(resp).unwrap();
        prop_assert_eq!(normalized.text(), expected);
        prop_assert_eq!(normalized.usage.input_tokens, 0);
    }
}
