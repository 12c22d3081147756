pub mod arbiter;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod factory;
pub mod game;
pub mod graph;
pub mod layout;
pub mod legality;
pub mod motion;
pub mod moves;
pub mod observers;
pub mod piece;
pub mod state;
pub mod types;

pub use arbiter::{resolve_collisions, Arbitration, Capture};
pub use command::{Command, CommandKind, CommandOrigin};
pub use config::EngineConfig;
pub use error::{BuildError, FactoryError, LayoutError, RuleError};
pub use events::{EventBus, EventKind, GameEvent, Shared, Subscriber, SubscriptionId};
pub use factory::PieceFactory;
pub use game::{BoardSnapshot, Game, GameOutcome, GamePhase, PieceView};
pub use graph::{PieceRules, StateGraphBuilder, StateRules};
pub use layout::BoardLayout;
pub use legality::{check_move, is_legal, legal_destinations, IllegalMove, Occupancy, Occupant};
pub use motion::{Animation, AnimationSpec, Motion, MotionPhase, MotionProfile};
pub use moves::{MoveQualifier, MoveRule, MoveTable};
pub use observers::{MoveLog, MoveRecord, ScoreBoard};
pub use piece::Piece;
pub use state::{LiveGraph, LiveState, StateGraph, StateId, StateTemplate};
pub use types::{BoardDims, Cell, Offset, PieceCode, PieceColor, PieceId, PieceKind};
