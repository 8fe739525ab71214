//! Prompt rendering for the completion service.

/// Render persona, transcript and the bot's name cue into one prompt.
///
/// The prompt ends with `"<name>:"` so the model continues as the bot:
///
/// ```text
/// A helpful bot
///
/// Alice: hi
/// Botty:
/// ```
pub fn render(name: &str, identity: &str, transcript: &[String]) -> String {
    let body_len: usize = transcript.iter().map(|line| line.len() + 1).sum();
    let mut prompt = String::with_capacity(identity.len() + body_len + name.len() + 3);

    prompt.push_str(identity);
    prompt.push_str("\n\n");
    for line in transcript {
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt.push_str(name);
    prompt.push(':');
    prompt
}

/// One `"<name>:"` stop per participant, so generation halts before the
/// model speaks for a human.
pub fn stop_sequences(participants: &[String]) -> Vec<String> {
    participants.iter().map(|name| format!("{name}:")).collect()
}
