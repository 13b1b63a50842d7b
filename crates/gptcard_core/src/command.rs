/// Key code of the confirmation keystroke (Enter).
pub const ENTER_KEY_CODE: u32 = 13;

/// Line prefix that turns a line of card text into a command.
pub const TRIGGER_PREFIX: &str = "hey gpt,";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSettings {
    /// Matched case-insensitively against the start of the trailing line.
    pub prefix: String,
    pub confirm_key_code: u32,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            prefix: TRIGGER_PREFIX.to_string(),
            confirm_key_code: ENTER_KEY_CODE,
        }
    }
}

/// Last line of the rendered text, trimmed. Empty text yields `""`.
pub fn last_line(text: &str) -> &str {
    text.trim().lines().last().map(str::trim).unwrap_or("")
}

/// Returns the query if the trailing line of `text` is a command.
///
/// The prefix is stripped by length and the remainder trimmed; an empty
/// query is still a command.
pub fn extract_query<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let line = last_line(text);
    let head = line.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    Some(line[prefix.len()..].trim())
}
