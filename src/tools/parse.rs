/// Strip a surrounding markdown code fence from a model response.
///
/// Fenced output is common even when the prompt asks for plain markdown;
/// anything that is not a single surrounding fence passes through untouched.
pub fn strip_code_fences(response: &str) -> String {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") || !trimmed.ends_with("```") || trimmed.len() < 6 {
        return trimmed.to_string();
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() < 2 {
        return trimmed.to_string();
    }
    // Drop the opening line (``` or ```markdown) and the closing ```.
    lines[1..lines.len() - 1].join("\n")
}
