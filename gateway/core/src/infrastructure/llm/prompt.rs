// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Prompt helpers for raw-completion backends

use crate::domain::llm::GenerationRequest;

/// `System: ..\n\nUser: ..\n\nAssistant:` framing used by textgen and
/// huggingface. Without a system prompt the user prompt goes out raw.
pub(crate) fn assistant_prompt(request: &GenerationRequest) -> String {
    match request.system() {
        Some(system) => format!(
            "System: {}\n\nUser: {}\n\nAssistant:",
            system, request.prompt
        ),
        None => request.prompt.clone(),
    }
}

/// Drop an echoed copy of `prompt` from the front of `text`.
///
/// Only a full-prompt prefix counts as an echo; the remainder is trimmed.
/// Text that does not start with the prompt is returned unchanged.
pub(crate) fn strip_echoed_prompt(text: &str, prompt: &str) -> String {
    match text.strip_prefix(prompt) {
        Some(rest) if !prompt.is_empty() => rest.trim().to_string(),
        _ => text.to_string(),
    }
}

/// Whitespace word count, used where a backend reports no token counters.
pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
