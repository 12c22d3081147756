//! Builds per-piece-type state-machine templates from declarative rule data.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::command::CommandKind;
use crate::config::EngineConfig;
use crate::error::BuildError;
use crate::motion::{AnimationSpec, MotionProfile};
use crate::moves::MoveTable;
use crate::state::{StateGraph, StateTemplate, ATTACK, IDLE, JUMP, LONG_REST, MOVE, SHORT_REST};
use crate::types::{BoardDims, PieceCode};

/// States every template must end up with.
pub const REQUIRED_STATES: [&str; 3] = [IDLE, MOVE, LONG_REST];

/// Per-state configuration as declared in rule data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateRules {
    pub animation: Option<AnimationSpec>,
    /// Overrides the engine move speed for this state.
    pub ms_per_cell: Option<u64>,
}

/// Everything known about one piece type before its template is built.
#[derive(Debug, Clone)]
pub struct PieceRules {
    pub code: PieceCode,
    pub moves: MoveTable,
    pub states: BTreeMap<String, StateRules>,
    /// Generic visuals of the piece type, used for synthesized states.
    pub generic_visuals: Option<AnimationSpec>,
}

impl PieceRules {
    pub fn new(code: PieceCode, moves: MoveTable) -> Self {
        Self {
            code,
            moves,
            states: BTreeMap::new(),
            generic_visuals: None,
        }
    }

    /// Standard chess movement with the full default state set.
    pub fn standard(code: PieceCode, dims: BoardDims) -> Self {
        let mut rules = Self::new(code, MoveTable::standard(code, dims));
        for name in [IDLE, MOVE, JUMP, SHORT_REST, LONG_REST] {
            rules.states.insert(name.to_string(), StateRules::default());
        }
        rules.generic_visuals = Some(AnimationSpec::default());
        rules
    }

    pub fn with_state(mut self, name: impl Into<String>, state: StateRules) -> Self {
        self.states.insert(name.into(), state);
        self
    }

    /// Visuals to borrow for a synthesized state: the type's generic assets,
    /// else whatever the idle state (or any declared state) uses.
    fn fallback_visuals(&self) -> Option<AnimationSpec> {
        self.generic_visuals
            .or_else(|| self.states.get(IDLE).and_then(|s| s.animation))
            .or_else(|| self.states.values().find_map(|s| s.animation))
    }
}

pub struct StateGraphBuilder {
    config: EngineConfig,
}

impl StateGraphBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    fn rest_for(&self, name: &str) -> Option<u64> {
        match name {
            LONG_REST => Some(self.config.long_rest_ms),
            SHORT_REST => Some(self.config.short_rest_ms),
            _ => None,
        }
    }

    fn profile_for(&self, state: &StateRules) -> MotionProfile {
        let mut profile = self.config.motion_profile();
        if let Some(ms) = state.ms_per_cell {
            profile.ms_per_cell = ms;
        }
        profile
    }

    /// Build the immutable template graph of one piece type.
    pub fn build(&self, rules: &PieceRules) -> Result<Arc<StateGraph>, BuildError> {
        let code = rules.code;
        if rules.moves.is_empty() {
            return Err(BuildError::NoMoveData { code });
        }
        let moves = Arc::new(rules.moves.clone());
        let fallback = rules.fallback_visuals();
        let mut graph = StateGraph::new(code);

        for (name, state) in &rules.states {
            let animation = state
                .animation
                .or(fallback)
                .unwrap_or_else(AnimationSpec::placeholder);
            graph.insert(StateTemplate::new(
                name.as_str(),
                Arc::clone(&moves),
                self.rest_for(name),
                animation,
                self.profile_for(state),
            ));
        }

        for name in REQUIRED_STATES {
            if graph.contains(name) {
                continue;
            }
            let animation = fallback.ok_or_else(|| BuildError::NoFallbackVisuals {
                code,
                state: name.to_string(),
            })?;
            tracing::debug!(%code, state = name, "Synthesizing missing state");
            graph.insert(StateTemplate::new(
                name,
                Arc::clone(&moves),
                self.rest_for(name),
                animation,
                self.config.motion_profile(),
            ));
        }

        Self::wire_defaults(&mut graph);
        graph.set_initial(IDLE);
        Ok(Arc::new(graph))
    }

    fn wire_defaults(graph: &mut StateGraph) {
        graph.connect(IDLE, CommandKind::Move, MOVE);
        graph.connect(IDLE, CommandKind::Jump, JUMP);
        graph.connect(IDLE, CommandKind::Attack, ATTACK);

        let after_move = if graph.contains(LONG_REST) { LONG_REST } else { IDLE };
        graph.connect(MOVE, CommandKind::Complete, after_move);
        let after_jump = if graph.contains(SHORT_REST) { SHORT_REST } else { IDLE };
        graph.connect(JUMP, CommandKind::Complete, after_jump);

        graph.connect(LONG_REST, CommandKind::Timeout, IDLE);
        graph.connect(SHORT_REST, CommandKind::Timeout, IDLE);
        graph.connect(ATTACK, CommandKind::Complete, IDLE);
    }
}

impl Default for StateGraphBuilder {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
