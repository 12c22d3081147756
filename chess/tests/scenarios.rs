use kfchess::*;

fn config() -> EngineConfig {
    EngineConfig {
        cooldown_ms: 500,
        ms_per_cell: 500,
        ..EngineConfig::default()
    }
}

fn game(csv: &str) -> Game {
    let mut factory = PieceFactory::standard(config());
    let layout = BoardLayout::parse(csv).unwrap();
    let mut game = Game::from_layout(&mut factory, &layout).unwrap();
    game.start(0);
    game
}

fn id_at(game: &Game, row: i32, col: i32) -> PieceId {
    game.piece_at(Cell::new(row, col)).unwrap().id()
}

fn count(events: &[GameEvent], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind() == kind).count()
}

mod legality {
    use super::*;

    #[test]
    fn rook_path_blocked_by_intervening_piece() {
        let mut factory = PieceFactory::standard(config());
        let rook = factory
            .create(PieceCode::new(PieceKind::Rook, PieceColor::White), Cell::new(0, 0))
            .unwrap();
        let mut board = std::collections::BTreeMap::new();
        board.insert(
            Cell::new(0, 0),
            Occupant {
                id: rook.id(),
                color: PieceColor::White,
            },
        );
        assert!(rook.moves().candidates(Cell::new(0, 0)).contains(&Cell::new(0, 5)));
        assert!(is_legal(&rook, Cell::new(0, 0), Cell::new(0, 5), &board));

        board.insert(
            Cell::new(0, 3),
            Occupant {
                id: PieceId(99),
                color: PieceColor::Black,
            },
        );
        assert!(!is_legal(&rook, Cell::new(0, 0), Cell::new(0, 5), &board));
    }

    #[test]
    fn pawn_double_step_only_on_first_move() {
        let mut game = game(
            ",,,,,,,\n,,,,,,,\n,,,,,,,\n,,,,,,,\n,,,,,,,\n,,,,,,,\n,,,,PW,,,\n,,,,,,,\n",
        );
        let pawn = id_at(&game, 6, 4);

        assert_eq!(game.request_move(pawn, Cell::new(4, 4), 500), Ok(()));
        game.tick(500);
        let p = game.piece(pawn).unwrap();
        assert!(p.has_moved());
        assert_eq!(p.state_name(), "move");

        // Arrive, rest, back to idle.
        game.tick(1500);
        game.tick(3500);
        let p = game.piece(pawn).unwrap();
        assert_eq!(p.cell(), Cell::new(4, 4));
        assert_eq!(p.state_name(), "idle");

        assert_eq!(
            game.request_move(pawn, Cell::new(2, 4), 4000),
            Err(IllegalMove::DoubleStepUsed)
        );
        // Even unvalidated, the piece refuses before its state machine sees it.
        game.submit(Command::move_to(4000, pawn, Cell::new(4, 4), Cell::new(2, 4)));
        let events = game.tick(4000);
        assert_eq!(count(&events, EventKind::MoveAccepted), 0);
        let p = game.piece(pawn).unwrap();
        assert_eq!(p.state_name(), "idle");
        assert_eq!(p.move_count(), 1);
    }
}

mod arbitration {
    use super::*;

    #[test]
    fn mover_captures_idle_opponent() {
        let mut game = game(",,,,\n,,,,\n,,,,\nRW,,,NB,\n");
        let attacker = id_at(&game, 3, 0);
        let defender = id_at(&game, 3, 3);

        game.request_move(attacker, Cell::new(3, 3), 500).unwrap();
        let mut events = game.tick(500);
        events.extend(game.tick(1000));
        events.extend(game.tick(1800));

        assert_eq!(count(&events, EventKind::PieceCaptured), 1);
        assert!(game.piece(defender).is_none());
        assert_eq!(game.piece(attacker).unwrap().cell(), Cell::new(3, 3));
        let captured = events.iter().find_map(|e| match e {
            GameEvent::PieceCaptured { capture, .. } => Some(*capture),
            _ => None,
        });
        assert_eq!(captured.map(|c| c.captured), Some(defender));
    }

    #[test]
    fn friendly_mover_is_sent_back() {
        let mut game = game(",,,,,,\n,,,,,,\n,,QW,,,RW,\n");
        let stationary = id_at(&game, 2, 2);
        let mover = id_at(&game, 2, 5);

        // Bypasses legality: the conflict emerges in flight.
        game.submit(Command::move_to(500, mover, Cell::new(2, 5), Cell::new(2, 0)));
        let mut events = game.tick(500);
        events.extend(game.tick(2000));

        let m = game.piece(mover).unwrap();
        assert_eq!(m.cell(), Cell::new(2, 5));
        assert_eq!(m.state_name(), "idle");
        assert_eq!(m.phase(), MotionPhase::Settled);
        assert_eq!(game.piece(stationary).unwrap().cell(), Cell::new(2, 2));
        assert_eq!(game.pieces().len(), 2);
        assert_eq!(count(&events, EventKind::PieceCaptured), 0);
    }
}

mod timing {
    use super::*;

    #[test]
    fn long_rest_drops_commands_until_it_expires() {
        let mut game = game(",,,\n,,,\n,,,\nRW,,,\n");
        let rook = id_at(&game, 3, 0);

        game.request_move(rook, Cell::new(2, 0), 500).unwrap();
        game.tick(500);
        game.tick(1000);
        let p = game.piece(rook).unwrap();
        assert_eq!(p.state_name(), "long_rest");
        assert_eq!(p.state().start_time_ms(), 1000);

        game.submit(Command::move_to(2500, rook, Cell::new(2, 0), Cell::new(2, 3)));
        let events = game.tick(2500);
        assert_eq!(count(&events, EventKind::MoveAccepted), 0);
        assert_eq!(game.piece(rook).unwrap().state_name(), "long_rest");

        game.submit(Command::move_to(3100, rook, Cell::new(2, 0), Cell::new(2, 3)));
        let events = game.tick(3100);
        assert_eq!(count(&events, EventKind::MoveAccepted), 1);
        assert_eq!(game.piece(rook).unwrap().state_name(), "move");
    }

    #[test]
    fn cooldown_outlasts_short_rest() {
        let mut factory = PieceFactory::standard(EngineConfig {
            cooldown_ms: 3000,
            jump_ms: 500,
            ..EngineConfig::default()
        });
        let layout = BoardLayout::parse(",,\n,NW,\n").unwrap();
        let mut game = Game::from_layout(&mut factory, &layout).unwrap();
        game.start(0);
        let knight = id_at(&game, 1, 1);

        game.request_jump(knight, 3000).unwrap();
        game.tick(3000);
        game.tick(3500);
        assert_eq!(game.piece(knight).unwrap().state_name(), "short_rest");
        game.tick(4500);
        let k = game.piece(knight).unwrap();
        assert_eq!(k.state_name(), "idle");
        // Out of rest, still cooling down.
        assert!(k.is_on_cooldown(4500));

        game.request_jump(knight, 4500).unwrap();
        let events = game.tick(4500);
        assert_eq!(count(&events, EventKind::MoveAccepted), 0);
    }
}

mod lifecycle {
    use super::*;

    #[test]
    fn observers_follow_a_short_game() {
        let mut game = game(",KB,\n,,\n,KW,\n,QW,\n");
        let score = Shared::new(ScoreBoard::new());
        let log = Shared::new(MoveLog::new());
        game.events_mut().subscribe(EventKind::PieceCaptured, score.clone());
        game.events_mut().subscribe(EventKind::MoveAccepted, log.clone());

        let king = id_at(&game, 2, 1);
        game.request_move(king, Cell::new(1, 1), 500).unwrap();
        let mut events = game.tick(500);
        for t in (600..=2000).step_by(100) {
            events.extend(game.tick(t));
        }
        assert_eq!(game.piece(king).unwrap().cell(), Cell::new(1, 1));
        let queen = id_at(&game, 3, 1);
        assert!(matches!(
            game.request_move(queen, Cell::new(0, 1), 2000),
            Err(IllegalMove::PathBlocked { .. })
        ));

        // Rest ends at t=3000.
        game.request_move(king, Cell::new(0, 1), 3000).unwrap();
        for t in (3000..=4000).step_by(100) {
            events.extend(game.tick(t));
        }

        assert_eq!(count(&events, EventKind::GameEnded), 1);
        assert_eq!(game.outcome(), Some(GameOutcome::Winner(PieceColor::White)));
        score.with(|s| assert_eq!(s.captured().len(), 1));
        log.with(|l| assert_eq!(l.len(), 2));
    }
}
