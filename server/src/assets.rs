//! Loads piece-type rule data and the initial board from a pieces directory.
//!
//! ```text
//! pieces/
//!   board.csv
//!   QW/
//!     moves.txt
//!     states/
//!       idle/config.json
//!       idle/sprites/1.png ...
//! ```

use std::path::{Path, PathBuf};

use kfchess::{
    AnimationSpec, BoardDims, BoardLayout, EngineConfig, LayoutError, MoveTable, PieceCode,
    PieceFactory, PieceRules, StateRules,
};
use serde::Deserialize;

const BOARD_FILE: &str = "board.csv";
const MOVES_FILE: &str = "moves.txt";
const STATES_DIR: &str = "states";
const STATE_CONFIG_FILE: &str = "config.json";
const SPRITES_DIR: &str = "sprites";

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid board layout: {0}")]
    Layout(#[from] LayoutError),
}

/// Per-state `config.json`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StateConfigFile {
    graphics: GraphicsConfig,
    physics: PhysicsConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GraphicsConfig {
    frames_per_sec: Option<f64>,
    is_loop: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PhysicsConfig {
    /// Cells per second.
    speed_m_per_sec: Option<f64>,
}

/// Rule data for every piece type plus the starting layout.
#[derive(Debug, Clone)]
pub struct PieceAssets {
    pub rules: Vec<PieceRules>,
    pub layout: BoardLayout,
}

impl PieceAssets {
    /// Built-in rules on the standard starting position.
    pub fn standard() -> Self {
        let layout = BoardLayout::standard();
        let rules = PieceCode::all()
            .map(|code| PieceRules::standard(code, layout.dims()))
            .collect();
        Self { rules, layout }
    }

    pub fn dims(&self) -> BoardDims {
        self.layout.dims()
    }

    /// A factory sized to the layout, with every buildable template
    /// registered. Types that fail to build are logged and left out.
    pub fn factory(&self, config: EngineConfig) -> PieceFactory {
        let mut factory = PieceFactory::new(EngineConfig {
            board: self.dims(),
            ..config
        });
        let failed = factory.register_all(&self.rules);
        if !failed.is_empty() {
            tracing::warn!("{} piece type(s) unavailable", failed.len());
        }
        factory
    }
}

/// Load everything under `dir`. A missing directory yields the built-in
/// standard rules.
pub fn load_assets(dir: &Path) -> Result<PieceAssets, AssetError> {
    if !dir.is_dir() {
        tracing::info!("No pieces directory at {:?}, using standard rules", dir);
        return Ok(PieceAssets::standard());
    }

    let layout = load_layout(dir)?;
    let dims = layout.dims();
    let mut rules = Vec::new();
    for code in PieceCode::all() {
        let piece_dir = dir.join(code.to_string());
        if !piece_dir.is_dir() {
            tracing::debug!(%code, "No rule data, using standard movement");
            rules.push(PieceRules::standard(code, dims));
            continue;
        }
        match load_piece(&piece_dir, code, dims) {
            Ok(r) => rules.push(r),
            Err(e) => tracing::warn!("Skipping piece type {}: {}", code, e),
        }
    }

    tracing::info!(types = rules.len(), pieces = layout.len(), "Loaded assets from {:?}", dir);
    Ok(PieceAssets { rules, layout })
}

fn load_layout(dir: &Path) -> Result<BoardLayout, AssetError> {
    let path = dir.join(BOARD_FILE);
    if !path.exists() {
        return Ok(BoardLayout::standard());
    }
    let text = read_to_string(&path)?;
    Ok(BoardLayout::parse(&text)?)
}

/// Rule data of one piece type. A missing `moves.txt` gives an empty table,
/// which the template builder rejects.
fn load_piece(dir: &Path, code: PieceCode, dims: BoardDims) -> Result<PieceRules, AssetError> {
    let moves_path = dir.join(MOVES_FILE);
    let moves = if moves_path.exists() {
        MoveTable::parse(&read_to_string(&moves_path)?, dims)
    } else {
        MoveTable::new(Vec::new(), dims)
    };
    let mut rules = PieceRules::new(code, moves);

    let states_dir = dir.join(STATES_DIR);
    if !states_dir.is_dir() {
        return Ok(rules);
    }
    let entries = std::fs::read_dir(&states_dir).map_err(|source| AssetError::Io {
        path: states_dir.clone(),
        source,
    })?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        rules.states.insert(name.to_string(), load_state(&path));
    }
    Ok(rules)
}

fn load_state(dir: &Path) -> StateRules {
    let config_path = dir.join(STATE_CONFIG_FILE);
    let config = if config_path.exists() {
        read_state_config(&config_path).unwrap_or_else(|e| {
            tracing::warn!("{}; using defaults", e);
            StateConfigFile::default()
        })
    } else {
        StateConfigFile::default()
    };

    let defaults = AnimationSpec::default();
    let animation = AnimationSpec {
        frame_count: count_sprites(&dir.join(SPRITES_DIR)),
        fps: config.graphics.frames_per_sec.unwrap_or(defaults.fps),
        looping: config.graphics.is_loop.unwrap_or(defaults.looping),
    };
    let ms_per_cell = config
        .physics
        .speed_m_per_sec
        .filter(|speed| *speed > 0.0)
        .map(|speed| ((1000.0 / speed).round() as u64).max(1));

    StateRules {
        animation: Some(animation),
        ms_per_cell,
    }
}

fn read_state_config(path: &Path) -> Result<StateConfigFile, AssetError> {
    let text = read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| AssetError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Number of sprite files. Zero frames is a valid placeholder.
fn count_sprites(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .filter(|e| e.path().is_file())
            .count(),
        Err(_) => 0,
    }
}

fn read_to_string(path: &Path) -> Result<String, AssetError> {
    std::fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kfchess::{Cell, PieceColor, PieceKind};
    use std::fs;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn rules_for(assets: &PieceAssets, code: PieceCode) -> &PieceRules {
        assets.rules.iter().find(|r| r.code == code).unwrap()
    }

    #[test]
    fn test_missing_dir_uses_standard_rules() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = load_assets(&tmp.path().join("nope")).unwrap();
        assert_eq!(assets.rules.len(), 12);
        assert_eq!(assets.layout.len(), 32);
    }

    #[test]
    fn test_loads_moves_states_and_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(&root.join("board.csv"), "RW,,\n,,\n,,KB\n");
        write(&root.join("RW/moves.txt"), "# rook\n1,0\n-1,0\n0,1\n0,-1\nbogus\n");
        write(
            &root.join("RW/states/idle/config.json"),
            r#"{"graphics": {"frames_per_sec": 12, "is_loop": false}}"#,
        );
        write(&root.join("RW/states/idle/sprites/1.png"), "");
        write(&root.join("RW/states/idle/sprites/2.png"), "");
        write(
            &root.join("RW/states/move/config.json"),
            r#"{"physics": {"speed_m_per_sec": 4.0}}"#,
        );

        let assets = load_assets(root).unwrap();
        assert_eq!(assets.dims(), BoardDims { rows: 3, cols: 3 });
        assert_eq!(assets.layout.len(), 2);

        let rook = rules_for(&assets, PieceCode::new(PieceKind::Rook, PieceColor::White));
        assert_eq!(rook.moves.len(), 4);
        let idle = rook.states["idle"].animation.unwrap();
        assert_eq!(idle.frame_count, 2);
        assert_eq!(idle.fps, 12.0);
        assert!(!idle.looping);
        assert_eq!(rook.states["move"].ms_per_cell, Some(250));

        // Types without a directory keep the built-in movement.
        let king = rules_for(&assets, PieceCode::new(PieceKind::King, PieceColor::Black));
        assert_eq!(king.moves.len(), 8);
    }

    #[test]
    fn test_bad_state_config_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(&root.join("NB/moves.txt"), "1,2\n2,1\n");
        write(&root.join("NB/states/idle/config.json"), "{ not json");

        let assets = load_assets(root).unwrap();
        let knight = rules_for(&assets, PieceCode::new(PieceKind::Knight, PieceColor::Black));
        let idle = &knight.states["idle"];
        assert_eq!(idle.ms_per_cell, None);
        assert_eq!(idle.animation.unwrap().frame_count, 0);
    }

    #[test]
    fn test_unbuildable_type_is_skipped_by_factory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        // No moves.txt: nothing to build.
        write(&root.join("QB/states/idle/config.json"), "{}");

        let assets = load_assets(root).unwrap();
        let mut factory = assets.factory(EngineConfig::default());
        let queen = PieceCode::new(PieceKind::Queen, PieceColor::Black);
        assert!(factory.template(queen).is_none());
        assert_eq!(factory.codes().count(), 11);
        assert!(factory
            .create(PieceCode::new(PieceKind::Pawn, PieceColor::White), Cell::new(6, 0))
            .is_ok());
    }

    #[test]
    fn test_invalid_board_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(&tmp.path().join("board.csv"), "KW,XX\n");
        assert!(matches!(
            load_assets(tmp.path()),
            Err(AssetError::Layout(LayoutError::InvalidCode { .. }))
        ));
    }
}
