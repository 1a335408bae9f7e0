// Shared prompt fragments. Each feature keeps its own prompts.rs alongside it;
// this file holds the cross-cutting pieces.

/// Opening for every prompt whose answer must be machine-readable.
pub const JSON_ONLY_PREAMBLE: &str = "You are a strict JSON generator. \
    Return ONLY valid JSON and nothing else (no markdown, no backticks, no commentary).";

/// Follow-up used when a first answer could not be read as JSON.
pub const STRICT_JSON_RETRY: &str =
    "Reformat the previous extraction as STRICT JSON only. Do not include any text other than the JSON object.";
