//! Classification prompt

/// Build the instruction sent to the AI backend.
pub fn build_prompt(channel_name: &str, sender_name: &str, text: &str) -> String {
    format!(
        r#"You are a spam filter for group chats. Decide whether the message below is spam.

Spam indicators:
- invitations to join trading, crypto, forex or investment groups
- promises of guaranteed profit, fixed daily returns or doubling money
- paid trading signals, "account managers", mentorship or training schemes
- multi-level marketing, recruitment and "work from home" schemes
- gambling, betting, casino or lottery promotion
- adult content or escort advertising
- links to other groups posted together with any of the above

Not spam:
- ordinary conversation, questions and jokes between members
- event plans, news and links shared for discussion
- a group admin sharing an invite link without a sales pitch
- people discussing markets or crypto prices without selling anything

Channel: {channel}
Sender: {sender}
Message:
"""
{text}
"""

Reply with a single JSON object and nothing else:
{{"isSpam": true or false, "confidence": integer from 0 to 100, "reason": "short explanation"}}"#,
        channel = channel_name,
        sender = sender_name,
        text = text,
    )
}
