//! Inbound session commands.

use chunkworld_core::chunk_id::Direction;
use serde::Deserialize;

/// A command sent by a session's client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move one cell in the given direction.
    Step(Direction),
    /// Advance the ground color under the session.
    Paint,
    /// Re-send the session's current chunk.
    Status,
}

/// Raw inbound frame: `{ "k": "<token>" }`.
#[derive(Debug, Deserialize)]
struct InboundMessage {
    #[serde(default)]
    k: Option<String>,
}

impl Command {
    /// Maps a key token to a command. Matching is case-insensitive; unknown
    /// tokens yield `None`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "up" | "arrowup" => Some(Self::Step(Direction::Up)),
            "down" | "arrowdown" => Some(Self::Step(Direction::Down)),
            "left" | "arrowleft" => Some(Self::Step(Direction::Left)),
            "right" | "arrowright" => Some(Self::Step(Direction::Right)),
            "c" | "color" | "color++" => Some(Self::Paint),
            "whereami" => Some(Self::Status),
            _ => None,
        }
    }

    /// Decodes a JSON text frame. Malformed frames and unknown tokens yield
    /// `None`.
    #[must_use]
    pub fn from_message(text: &str) -> Option<Self> {
        let message: InboundMessage = serde_json::from_str(text).ok()?;
        Self::parse(message.k.as_deref()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_maps_direction_tokens() {
        assert_eq!(Command::parse("up"), Some(Command::Step(Direction::Up)));
        assert_eq!(Command::parse("ArrowDown"), Some(Command::Step(Direction::Down)));
        assert_eq!(Command::parse("LEFT"), Some(Command::Step(Direction::Left)));
        assert_eq!(Command::parse("arrowright"), Some(Command::Step(Direction::Right)));
    }

    #[test]
    fn test_parse_maps_paint_and_status_tokens() {
        for token in ["c", "C", "color", "color++"] {
            assert_eq!(Command::parse(token), Some(Command::Paint));
        }
        assert_eq!(Command::parse("whereami"), Some(Command::Status));
    }

    #[test]
    fn test_parse_ignores_unknown_tokens() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("jump"), None);
    }

    #[test]
    fn test_from_message_reads_k_field() {
        assert_eq!(
            Command::from_message(r#"{"k":"ArrowUp"}"#),
            Some(Command::Step(Direction::Up))
        );
        assert_eq!(Command::from_message(r#"{"k":"c","extra":1}"#), Some(Command::Paint));
    }

    #[test]
    fn test_from_message_ignores_malformed_frames() {
        assert_eq!(Command::from_message("not json"), None);
        assert_eq!(Command::from_message("{}"), None);
        assert_eq!(Command::from_message(r#"{"k":null}"#), None);
        assert_eq!(Command::from_message(r#"{"k":5}"#), None);
    }
}
