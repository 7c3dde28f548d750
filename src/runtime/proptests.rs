//! Property-based tests for the submit cycle
//!
//! Invariants checked across arbitrary submission sequences:
//! - The seed turn stays at index 0 and never shows up in the scrollback
//! - Every accepted submission grows the store by exactly two turns
//! - Blank or refusing replies are shown as the canonical refusal
//! - Failed calls are shown with the error prefix and never resent

use super::testing::MockLlm;
use super::{SessionManager, SubmitError};
use crate::conversation::{Role, Turn};
use crate::gateway::{normalize_reply, CompletionGateway};
use crate::llm::{LlmError, LlmResponse};
use crate::system_prompt::{CANONICAL_REFUSAL, ERROR_PREFIX, REFUSAL_PHRASE, SYSTEM_INSTRUCTION};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Strategies
// ============================================================================

/// What the upstream model does for one submission
#[derive(Debug, Clone)]
enum Upstream {
    Answer(String),
    Blank(String),
    Refuse(String),
    Fail(String),
}

fn arb_upstream() -> impl Strategy<Value = Upstream> {
    prop_oneof![
        4 => "[a-zA-Z0-9 .,]{0,40}[a-zA-Z0-9.]".prop_map(Upstream::Answer),
        1 => "[ \t\n]{0,6}".prop_map(Upstream::Blank),
        1 => ("[a-zA-Z ]{0,20}", "[a-zA-Z ]{0,20}")
            .prop_map(|(pre, post)| Upstream::Refuse(format!("{pre}{REFUSAL_PHRASE}{post}"))),
        1 => "[a-zA-Z ]{1,30}".prop_map(Upstream::Fail),
    ]
}

/// User input, occasionally blank
fn arb_input() -> impl Strategy<Value = String> {
    prop_oneof![
        5 => "[a-zA-Z0-9 ]{0,30}[a-zA-Z0-9]",
        1 => "[ \t]{0,4}",
    ]
}

fn expected_reply(upstream: &Upstream) -> Turn {
    match upstream {
        Upstream::Answer(text) => Turn::model(text.clone()),
        Upstream::Blank(_) | Upstream::Refuse(_) => Turn::model(CANONICAL_REFUSAL),
        Upstream::Fail(message) => Turn::error(format!("{ERROR_PREFIX}{message}")),
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_submit_cycle_invariants(
        steps in proptest::collection::vec((arb_input(), arb_upstream()), 1..12)
    ) {
        runtime().block_on(async {
            let llm = Arc::new(MockLlm::new("mock"));
            for (input, upstream) in &steps {
                if input.trim().is_empty() {
                    continue;
                }
                match upstream {
                    Upstream::Answer(t) | Upstream::Blank(t) | Upstream::Refuse(t) => {
                        llm.queue_response(LlmResponse::from_text(t.clone()));
                    }
                    Upstream::Fail(m) => llm.queue_error(LlmError::unknown(m.clone())),
                }
            }

            let manager = SessionManager::new(CompletionGateway::new(llm.clone()));
            let session = manager.create_session().await;
            let mut expected_len = 1;
            let mut accepted = 0;

            for (input, upstream) in &steps {
                let result = manager.submit(&session.id, input).await;
                let all = manager.all_turns(&session.id).await.unwrap();

                if input.trim().is_empty() {
                    prop_assert_eq!(result.unwrap_err(), SubmitError::EmptyInput);
                    prop_assert_eq!(all.len(), expected_len);
                    continue;
                }

                let exchange = result.unwrap();
                accepted += 1;
                expected_len += 2;
                prop_assert_eq!(all.len(), expected_len);
                prop_assert_eq!(&all[0], &Turn::system(SYSTEM_INSTRUCTION));
                prop_assert_eq!(&exchange.user, &Turn::user(input.clone()));
                prop_assert_eq!(&exchange.reply, &expected_reply(upstream));
                prop_assert!(exchange.turns.iter().all(|t| t.role != Role::System));
                prop_assert_eq!(exchange.turns.len(), all.len() - 1);
            }

            let requests = llm.recorded_requests();
            prop_assert_eq!(requests.len(), accepted);
            for request in &requests {
                prop_assert_eq!(request.system.as_deref(), Some(SYSTEM_INSTRUCTION));
                prop_assert!(request
                    .messages
                    .iter()
                    .all(|m| m.text != SYSTEM_INSTRUCTION && !m.text.starts_with(ERROR_PREFIX)));
            }
            Ok(())
        })?;
    }

    #[test]
    fn prop_normalize_output_is_input_or_refusal(text in ".{0,80}") {
        let out = normalize_reply(&text);
        if text.trim().is_empty() || text.contains(REFUSAL_PHRASE) {
            prop_assert_eq!(out, CANONICAL_REFUSAL);
        } else {
            prop_assert_eq!(out, text);
        }
    }

    #[test]
    fn prop_refusal_phrase_anywhere_is_normalized(
        pre in "[a-zA-Z0-9 .!]{0,30}",
        post in "[a-zA-Z0-9 .!]{0,30}",
    ) {
        let out = normalize_reply(&format!("{pre}{REFUSAL_PHRASE}{post}"));
        prop_assert_eq!(out, CANONICAL_REFUSAL);
    }
}
