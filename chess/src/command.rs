//! Commands addressed to individual pieces.

use serde::{Deserialize, Serialize};

use crate::types::{Cell, PieceId};

/// What a command asks a piece to do. Doubles as the event label on state
/// machine transition edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CommandKind {
    Idle,
    Move,
    Jump,
    Attack,
    /// Motion of the current state finished.
    Complete,
    /// Rest period of the current state expired.
    Timeout,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Move => "move",
            Self::Jump => "jump",
            Self::Attack => "attack",
            Self::Complete => "complete",
            Self::Timeout => "timeout",
        }
    }

    /// Player actions that displace (or lift) the piece.
    pub fn is_motion(self) -> bool {
        matches!(self, Self::Move | Self::Jump)
    }
}

/// Where a command came from. Only internal commands may bypass the piece
/// cooldown, and only the engine itself can create them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOrigin {
    /// Issued by the input layer on behalf of a player.
    #[default]
    External,
    /// Synthesised by the engine (motion completion, rest expiry, corrections).
    Internal,
}

/// An immutable request for a piece to act, consumed once per dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub timestamp: u64,
    pub piece_id: PieceId,
    pub kind: CommandKind,
    pub source: Option<Cell>,
    pub destination: Option<Cell>,
    /// Never read back: a deserialized command is always external.
    #[serde(skip_deserializing)]
    origin: CommandOrigin,
}

impl Command {
    /// An external command with no cell parameters.
    pub fn new(timestamp: u64, piece_id: PieceId, kind: CommandKind) -> Self {
        Self {
            timestamp,
            piece_id,
            kind,
            source: None,
            destination: None,
            origin: CommandOrigin::External,
        }
    }

    pub fn move_to(timestamp: u64, piece_id: PieceId, from: Cell, to: Cell) -> Self {
        Self {
            source: Some(from),
            destination: Some(to),
            ..Self::new(timestamp, piece_id, CommandKind::Move)
        }
    }

    pub fn jump(timestamp: u64, piece_id: PieceId, at: Cell) -> Self {
        Self {
            source: Some(at),
            destination: Some(at),
            ..Self::new(timestamp, piece_id, CommandKind::Jump)
        }
    }

    pub(crate) fn internal(timestamp: u64, piece_id: PieceId, kind: CommandKind) -> Self {
        Self {
            origin: CommandOrigin::Internal,
            ..Self::new(timestamp, piece_id, kind)
        }
    }

    pub fn origin(&self) -> CommandOrigin {
        self.origin
    }

    pub fn is_internal(&self) -> bool {
        self.origin == CommandOrigin::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_constructors_are_external() {
        let id = PieceId(3);
        let mv = Command::move_to(10, id, Cell::new(6, 4), Cell::new(4, 4));
        assert_eq!(mv.origin(), CommandOrigin::External);
        assert_eq!(mv.kind, CommandKind::Move);
        assert_eq!(mv.destination, Some(Cell::new(4, 4)));

        let jump = Command::jump(10, id, Cell::new(1, 1));
        assert!(!jump.is_internal());
        assert_eq!(jump.source, jump.destination);
    }

    #[test]
    fn test_internal_commands() {
        let cmd = Command::internal(5, PieceId(1), CommandKind::Timeout);
        assert!(cmd.is_internal());
        assert_eq!(cmd.kind.as_str(), "timeout");
        assert!(cmd.destination.is_none());
    }

    #[test]
    fn test_deserialized_commands_are_external() {
        let cmd = Command::internal(5, PieceId(1), CommandKind::Move);
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("Internal"));
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back.origin(), CommandOrigin::External);
        assert_eq!(back.kind, CommandKind::Move);

        let forged: Command = serde_json::from_str(
            r#"{"timestamp":0,"piece_id":1,"kind":"Move","source":null,"destination":{"row":0,"col":1},"origin":"Internal"}"#,
        )
        .unwrap();
        assert!(!forged.is_internal());
    }
}
