//! Template cache and piece creation.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{BuildError, FactoryError, LayoutError};
use crate::graph::{PieceRules, StateGraphBuilder};
use crate::layout::BoardLayout;
use crate::piece::Piece;
use crate::state::StateGraph;
use crate::types::{Cell, PieceCode, PieceId};

/// Builds each piece type's template once and stamps out pieces with fresh
/// ids and independent live state machines.
#[derive(Debug)]
pub struct PieceFactory {
    config: EngineConfig,
    templates: BTreeMap<PieceCode, Arc<StateGraph>>,
    next_id: u32,
}

impl PieceFactory {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            templates: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// A factory knowing every standard piece code.
    pub fn standard(config: EngineConfig) -> Self {
        let mut factory = Self::new(config);
        for code in PieceCode::all() {
            let rules = PieceRules::standard(code, config.board);
            if let Err(e) = factory.register(&rules) {
                tracing::error!("Failed to build {}: {}", code, e);
            }
        }
        factory
    }

    /// Build and cache the template for one piece type, replacing any
    /// previous one for that code.
    pub fn register(&mut self, rules: &PieceRules) -> Result<(), BuildError> {
        let graph = StateGraphBuilder::new(self.config).build(rules)?;
        tracing::debug!(code = %rules.code, states = graph.len(), "Registered piece template");
        self.templates.insert(rules.code, graph);
        Ok(())
    }

    /// Register every rule set, logging and skipping the ones that fail.
    /// Returns the failures.
    pub fn register_all<'a>(
        &mut self,
        rules: impl IntoIterator<Item = &'a PieceRules>,
    ) -> Vec<BuildError> {
        let mut failed = Vec::new();
        for r in rules {
            if let Err(e) = self.register(r) {
                tracing::warn!("Skipping piece type {}: {}", r.code, e);
                failed.push(e);
            }
        }
        failed
    }

    pub fn template(&self, code: PieceCode) -> Option<&Arc<StateGraph>> {
        self.templates.get(&code)
    }

    pub fn codes(&self) -> impl Iterator<Item = PieceCode> + '_ {
        self.templates.keys().copied()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn create(&mut self, code: PieceCode, at: Cell) -> Result<Piece, FactoryError> {
        let template = self
            .templates
            .get(&code)
            .ok_or(FactoryError::UnknownPieceType(code))?;
        if !self.config.board.contains(at) {
            return Err(FactoryError::OutOfBounds(at));
        }
        let id = PieceId(self.next_id);
        self.next_id += 1;
        Ok(Piece::new(id, Arc::clone(template), at, self.config.cooldown_ms))
    }

    /// One piece per placement, ids in row-major order.
    pub fn create_layout(&mut self, layout: &BoardLayout) -> Result<Vec<Piece>, LayoutError> {
        layout
            .placements()
            .iter()
            .map(|&(cell, code)| self.create(code, cell).map_err(LayoutError::from))
            .collect()
    }
}
