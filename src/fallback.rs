//! Keyword responder used when the remote assistant cannot be reached.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::Conversation;

pub const GENERIC_REPLY: &str = "I can offer general wellbeing guidance, but this is not medical advice. If this feels urgent, please contact local emergency services.";

/// Checked in order; the first match wins.
static RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        ("hello|hi|hey", "Hi there! I'm MindMate. Would you like breathing, grounding, or sleep tips?"),
        ("anx|panic|worry|nervous|overwhelmed", "Let's try 4-7-8 breathing: inhale 4s, hold 7s, exhale 8s. Repeat 4 times."),
        ("stress|tense|pressure", "Notice 5 things you see, 4 touch, 3 hear, 2 smell, 1 taste. It can ground you."),
        ("sleep|insomnia|tired", "Aim for a wind-down: lights dim, no screens 30 min, slow breaths. Want a quick routine?"),
        ("mood|sad|low|depress", "I'm here to listen. If symptoms persist, consider speaking to a professional you trust."),
        ("focus|study|work|productivity", "Try Pomodoro: 25 min focus + 5 min break. Want tips to get started?"),
        ("exercise|fitness|walk|yoga", "Even 10 minutes of movement can lift mood. A short walk or stretches now?"),
        ("diet|food|eat|nutrition", "Small, regular meals and hydration support energy and mood."),
        ("help|support|talk|guidance", "You're not alone. I can share coping techniques or help you structure a plan."),
    ]
    .into_iter()
    .filter_map(|(pattern, reply)| Regex::new(pattern).ok().map(|re| (re, reply)))
    .collect()
});

/// Canned reply for a piece of user text.
pub fn reply_for(text: &str) -> &'static str {
    let text = text.to_lowercase();
    RULES
        .iter()
        .find(|(re, _)| re.is_match(&text))
        .map(|(_, reply)| *reply)
        .unwrap_or(GENERIC_REPLY)
}

/// Canned reply for the most recent user message in a conversation.
pub fn reply_to_conversation(conv: &Conversation) -> &'static str {
    reply_for(conv.last_user_message().map(|m| m.text.as_str()).unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;

    #[test]
    fn anxious_gets_breathing_technique() {
        assert!(reply_for("I feel so ANXIOUS today").contains("4-7-8 breathing"));
    }

    #[test]
    fn sleep_gets_wind_down() {
        assert!(reply_for("I can't sleep at night").contains("wind-down"));
    }

    #[test]
    fn unmatched_text_gets_generic_disclaimer() {
        assert_eq!(reply_for("purple elephants"), GENERIC_REPLY);
        assert_eq!(reply_for(""), GENERIC_REPLY);
    }

    #[test]
    fn earlier_rules_take_priority() {
        // Matches both the greeting and the stress rule
        assert!(reply_for("hey, work stress").starts_with("Hi there!"));
        assert!(reply_for("stress about food").starts_with("Notice 5 things"));
    }

    #[test]
    fn every_rule_is_compiled() {
        assert_eq!(RULES.len(), 9);
    }

    #[test]
    fn uses_latest_user_message() {
        let mut conv = Conversation::new("t");
        conv.messages.push(Message::user("I feel nervous"));
        conv.messages.push(Message::assistant("try yoga and some sleep"));
        conv.messages.push(Message::user("my diet is bad"));

        assert!(reply_to_conversation(&conv).starts_with("Small, regular meals"));
    }

    #[test]
    fn conversation_without_user_messages_gets_generic() {
        let conv = Conversation::new("t");
        assert_eq!(reply_to_conversation(&conv), GENERIC_REPLY);
    }
}
