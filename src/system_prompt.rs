//! Fixed instruction text for the unit-conversion assistant
//!
//! The topical restriction lives entirely in this prompt. The only local
//! enforcement is the refusal normalization in the gateway, which keys off
//! `REFUSAL_PHRASE`.

/// Instruction seeded at index 0 of every conversation
pub const SYSTEM_INSTRUCTION: &str = "You are a chatbot exclusively designed for unit conversions.  Only answer questions related to unit conversions. If a question is not about unit conversions, please respond with: 'I am designed only for unit conversions.'";

/// Phrase the model is told to use when it declines
pub const REFUSAL_PHRASE: &str = "I am designed only for unit conversions.";

/// Uniform wording shown whenever the model declines or answers blank
pub const CANONICAL_REFUSAL: &str =
    "I am designed only for unit conversions. Please ask a question related to unit conversion.";

/// Prefix of every turn produced from a failed generation call
pub const ERROR_PREFIX: &str = "An error occurred: ";
