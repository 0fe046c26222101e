//! End-to-end search scenarios.

use lucena::board::Board;
use lucena::movegen::{self, generate_legal};
use lucena::moves::{move_to_uci, parse_uci_move, Color, PieceKind, MOVE_NONE};
use lucena::search::{SearchParams, Searcher, MATE};

fn search_fen(fen: &str, depth: u8) -> lucena::SearchResult {
    lucena::init();
    let board = Board::from_fen(fen).unwrap();
    let mut searcher = Searcher::new(board, SearchParams::new().max_depth(depth));
    searcher.search().unwrap()
}

#[test]
fn finds_back_rank_mate() {
    let result = search_fen("6k1/5ppp/8/8/8/8/5PPP/4R1K1 w - - 0 1", 3);
    assert_eq!(move_to_uci(result.best_move), "e1e8");
    assert!(result.score_cp >= MATE - 3);
}

#[test]
fn stalemate_is_a_draw() {
    lucena::init();
    let mut board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(generate_legal(&mut board).is_empty());
    assert!(movegen::is_stalemate(&mut board));

    let result = search_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 3);
    assert_eq!(result.score_cp, 0);
    assert_eq!(result.best_move, MOVE_NONE);
}

#[test]
fn en_passant_regression() {
    lucena::init();
    let mut board = Board::new();
    for uci in ["e2e4", "d7d5", "e4e5", "f7f5"] {
        let legal = generate_legal(&mut board);
        board.make_move(parse_uci_move(uci, &legal).unwrap());
    }

    let legal = generate_legal(&mut board);
    let ep = parse_uci_move("e5f6", &legal).expect("en passant must be generated");

    board.make_move(ep);
    assert_eq!(board.piece_on(37), None, "f5 pawn captured");
    assert_eq!(
        board.piece_on(45),
        Some((PieceKind::Pawn, Color::White)),
        "capturing pawn on f6"
    );
    assert_eq!(board.ep_square(), None);

    board.unmake_move();
    assert_eq!(board.piece_on(37), Some((PieceKind::Pawn, Color::Black)));
    assert_eq!(board.piece_on(45), None);
    assert_eq!(board.ep_square(), Some(45), "ep target restored to f6");
}

#[test]
fn castling_through_check_forbidden() {
    lucena::init();
    let mut board = Board::from_fen("r3k2r/8/8/8/8/5q2/8/R3K2R w KQkq - 0 1").unwrap();
    let moves: Vec<String> = generate_legal(&mut board)
        .iter()
        .map(|&m| move_to_uci(m))
        .collect();
    assert!(!moves.contains(&"e1g1".to_string()), "f1 is attacked");
    assert!(moves.contains(&"e1c1".to_string()), "queenside is clean");
}

#[test]
fn promotion_offers_all_four_pieces() {
    lucena::init();
    let mut board = Board::from_fen("8/P7/8/8/8/8/8/4k2K w - - 0 1").unwrap();
    let mut from_a7: Vec<String> = generate_legal(&mut board)
        .iter()
        .filter(|&&m| lucena::moves::move_from(m) == 48)
        .map(|&m| move_to_uci(m))
        .collect();
    from_a7.sort();
    assert_eq!(from_a7, vec!["a7a8b", "a7a8n", "a7a8q", "a7a8r"]);
}

#[test]
fn perft_smoke_gate() {
    lucena::init();
    let mut board = Board::new();
    assert_eq!(lucena::perft(&mut board, 4), 197_281);
}

#[test]
fn mate_in_two_needs_depth_three() {
    // 1.Kg6 Kg8 2.Ra8#; a mate in N is visible from depth 2N-1.
    let fen = "7k/8/8/6K1/8/8/8/R7 w - - 0 1";
    let result = search_fen(fen, 5);
    assert!(
        result.score_cp >= MATE - 3,
        "expected mate in two, got {}",
        result.score_cp
    );

    // At depth 1 the mate is beyond the horizon.
    let shallow = search_fen(fen, 1);
    assert!(shallow.score_cp < MATE - 3);
}

#[test]
fn prefers_winning_material_at_low_depth() {
    // Free queen on d5.
    let result = search_fen("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1", 4);
    assert_eq!(move_to_uci(result.best_move), "e4d5");
}

#[test]
fn search_result_is_well_formed() {
    let result = search_fen(
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 0 3",
        5,
    );
    assert_eq!(result.depth_reached, 5);
    assert!(result.nodes > 0);
    assert!(!result.pv.is_empty());
    assert_eq!(result.pv[0], result.best_move);

    // The PV replays as a legal line.
    let mut board = Board::from_fen(
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 0 3",
    )
    .unwrap();
    for &mv in &result.pv {
        let legal = generate_legal(&mut board);
        assert!(legal.contains(&mv));
        board.make_move(mv);
    }
}

#[test]
fn fifty_move_draw_scores_zero_in_search() {
    // Black is a rook down, but every quiet reply pushes the halfmove clock
    // to 100: all lines are draws and the score is exactly zero.
    let result = search_fen("8/8/8/3k4/8/3K4/4R3/8 b - - 99 80", 3);
    assert_eq!(result.score_cp, 0);
}
