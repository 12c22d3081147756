//! Per-piece finite-state machine.
//!
//! Two distinct node types keep shared rule data apart from per-instance
//! timers:
//!
//! - [`StateTemplate`] nodes form an immutable [`StateGraph`] per piece type.
//!   Templates are never entered.
//! - [`LiveState`] nodes form a [`LiveGraph`] owned by exactly one piece. A
//!   live graph is cloned from its template in a single pass when the piece
//!   is created, and its transition edges index into that same live graph.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::command::{Command, CommandKind};
use crate::motion::{Animation, AnimationSpec, Motion, MotionPhase, MotionProfile};
use crate::moves::MoveTable;
use crate::types::{Cell, PieceCode, PieceId};

pub const IDLE: &str = "idle";
pub const MOVE: &str = "move";
pub const JUMP: &str = "jump";
pub const ATTACK: &str = "attack";
pub const SHORT_REST: &str = "short_rest";
pub const LONG_REST: &str = "long_rest";

/// Index of a node within a state graph. Template and live graphs of the
/// same piece type share the numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(usize);

/// Immutable node of a piece type's state machine.
#[derive(Debug, Clone)]
pub struct StateTemplate {
    name: String,
    moves: Arc<MoveTable>,
    rest_ms: Option<u64>,
    animation: AnimationSpec,
    motion: MotionProfile,
    transitions: BTreeMap<CommandKind, StateId>,
}

impl StateTemplate {
    pub(crate) fn new(
        name: impl Into<String>,
        moves: Arc<MoveTable>,
        rest_ms: Option<u64>,
        animation: AnimationSpec,
        motion: MotionProfile,
    ) -> Self {
        Self {
            name: name.into(),
            moves,
            rest_ms,
            animation,
            motion,
            transitions: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn moves(&self) -> &Arc<MoveTable> {
        &self.moves
    }

    pub fn is_rest(&self) -> bool {
        self.rest_ms.is_some()
    }

    pub fn rest_duration_ms(&self) -> u64 {
        self.rest_ms.unwrap_or(0)
    }

    pub fn animation(&self) -> &AnimationSpec {
        &self.animation
    }

    pub fn motion_profile(&self) -> MotionProfile {
        self.motion
    }

    pub fn transitions(&self) -> &BTreeMap<CommandKind, StateId> {
        &self.transitions
    }
}

/// The template state machine of one piece type. Built once, cached, and
/// never mutated afterwards.
#[derive(Debug)]
pub struct StateGraph {
    code: PieceCode,
    states: Vec<StateTemplate>,
    initial: StateId,
}

impl StateGraph {
    pub(crate) fn new(code: PieceCode) -> Self {
        Self {
            code,
            states: Vec::new(),
            initial: StateId(0),
        }
    }

    pub(crate) fn insert(&mut self, template: StateTemplate) -> StateId {
        if let Some(id) = self.id_of(template.name()) {
            self.states[id.0] = template;
            return id;
        }
        self.states.push(template);
        StateId(self.states.len() - 1)
    }

    pub(crate) fn connect(&mut self, from: &str, on: CommandKind, to: &str) -> bool {
        match (self.id_of(from), self.id_of(to)) {
            (Some(from), Some(to)) => {
                self.states[from.0].transitions.insert(on, to);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn set_initial(&mut self, name: &str) {
        if let Some(id) = self.id_of(name) {
            self.initial = id;
        }
    }

    pub fn code(&self) -> PieceCode {
        self.code
    }

    pub fn id_of(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|s| s.name == name)
            .map(StateId)
    }

    pub fn get(&self, name: &str) -> Option<&StateTemplate> {
        self.id_of(name).map(|id| &self.states[id.0])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.id_of(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|s| s.name())
    }

    /// Name of the state an edge from `from` on `on` leads to.
    pub fn target_of(&self, from: &str, on: CommandKind) -> Option<&str> {
        let template = self.get(from)?;
        template
            .transitions
            .get(&on)
            .map(|id| self.states[id.0].name())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Deep-clone every template into a live graph owned by one piece,
    /// positioned at `at` and resting in the initial state.
    pub fn instantiate(&self, piece_id: PieceId, at: Cell) -> LiveGraph {
        let states = self
            .states
            .iter()
            .enumerate()
            .map(|(idx, t)| LiveState {
                id: StateId(idx),
                name: t.name.clone(),
                moves: Arc::clone(&t.moves),
                rest_ms: t.rest_ms,
                start_time_ms: 0,
                transitions: t.transitions.clone(),
                profile: t.motion,
                motion: Motion::settled(at, t.motion),
                animation: Animation::new(t.animation),
            })
            .collect();
        LiveGraph {
            piece_id,
            states,
            current: self.initial,
        }
    }
}

/// A state node owned by a single piece, with its own entry time and
/// collaborator state.
#[derive(Debug, Clone)]
pub struct LiveState {
    id: StateId,
    name: String,
    moves: Arc<MoveTable>,
    rest_ms: Option<u64>,
    start_time_ms: u64,
    transitions: BTreeMap<CommandKind, StateId>,
    profile: MotionProfile,
    motion: Motion,
    animation: Animation,
}

impl LiveState {
    /// Enter this state: restart the rest baseline and both collaborators
    /// from `cmd`, continuing from the position context handed over by the
    /// previous state.
    pub fn enter(&mut self, cmd: &Command, mut motion: Motion) {
        self.start_time_ms = cmd.timestamp;
        motion.set_profile(self.profile);
        motion.restart(cmd);
        self.motion = motion;
        self.animation.restart(cmd.timestamp);
    }

    /// A rest state holds the piece until its duration has elapsed.
    pub fn can_leave(&self, now: u64) -> bool {
        match self.rest_ms {
            Some(rest) => now.saturating_sub(self.start_time_ms) >= rest,
            None => true,
        }
    }

    /// The state `cmd` leads to, or `None` when the command is dropped
    /// (rest still running, or no edge for its kind).
    pub fn next_on(&self, cmd: &Command, now: u64) -> Option<StateId> {
        if !self.can_leave(now) {
            return None;
        }
        self.transitions.get(&cmd.kind).copied()
    }

    /// Tick the collaborators and report which synthetic command, if any,
    /// should fire: `Complete` when motion finishes, otherwise `Timeout`
    /// once a rest state has expired.
    pub fn advance(&mut self, now: u64) -> Option<CommandKind> {
        self.animation.update(now);
        if self.motion.update(now) {
            return Some(CommandKind::Complete);
        }
        if self.is_rest() && self.can_leave(now) && self.transitions.contains_key(&CommandKind::Timeout)
        {
            return Some(CommandKind::Timeout);
        }
        None
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn moves(&self) -> &MoveTable {
        &self.moves
    }

    pub fn is_rest(&self) -> bool {
        self.rest_ms.is_some()
    }

    pub fn rest_duration_ms(&self) -> u64 {
        self.rest_ms.unwrap_or(0)
    }

    pub fn start_time_ms(&self) -> u64 {
        self.start_time_ms
    }

    pub fn transitions(&self) -> &BTreeMap<CommandKind, StateId> {
        &self.transitions
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }
}

/// The live state machine of one piece. Exactly one node is current.
#[derive(Debug, Clone)]
pub struct LiveGraph {
    piece_id: PieceId,
    states: Vec<LiveState>,
    current: StateId,
}

impl LiveGraph {
    pub fn current(&self) -> &LiveState {
        &self.states[self.current.0]
    }

    pub fn state(&self, id: StateId) -> Option<&LiveState> {
        self.states.get(id.0)
    }

    pub fn id_of(&self, name: &str) -> Option<StateId> {
        self.states.iter().position(|s| s.name == name).map(StateId)
    }

    /// Offer a command to the current state. Returns true if a transition
    /// happened.
    pub fn dispatch(&mut self, cmd: &Command, now: u64) -> bool {
        match self.current().next_on(cmd, now) {
            Some(next) => {
                self.enter(next, cmd);
                true
            }
            None => false,
        }
    }

    /// Tick the current state and follow a timer-driven edge if one fires.
    /// Returns the kind of the synthetic command that caused a transition.
    pub fn advance(&mut self, now: u64) -> Option<CommandKind> {
        let kind = self.states[self.current.0].advance(now)?;
        let cmd = Command::internal(now, self.piece_id, kind);
        self.dispatch(&cmd, now).then_some(kind)
    }

    /// Enter the named state unconditionally, ignoring edges and rest timers.
    pub(crate) fn force(&mut self, name: &str, cmd: &Command) -> bool {
        match self.id_of(name) {
            Some(id) => {
                self.enter(id, cmd);
                true
            }
            None => false,
        }
    }

    /// Abort an in-flight transit, returning the piece to its pre-move cell.
    pub(crate) fn cancel_motion(&mut self) {
        self.states[self.current.0].motion.cancel();
    }

    fn enter(&mut self, next: StateId, cmd: &Command) {
        let motion = self.current().motion.clone();
        tracing::trace!(
            piece = %self.piece_id,
            from = self.current().name(),
            to = self.states[next.0].name(),
            kind = cmd.kind.as_str(),
            "state transition"
        );
        self.states[next.0].enter(cmd, motion);
        self.current = next;
    }

    pub fn cell(&self) -> Cell {
        self.current().motion.cell()
    }

    pub fn phase(&self) -> MotionPhase {
        self.current().motion.phase()
    }
}
