// Fragments shared by every JSON-mode prompt. Task prompts live beside their module.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    If any information is not found, use null for that field.";
