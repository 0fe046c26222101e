//! UCI engine loop.
//!
//! The engine speaks the line-oriented UCI protocol over stdin/stdout. The
//! search core is single-threaded, so `go` runs synchronously and `bestmove`
//! follows the final `info` line; `go infinite` maps to the maximum depth
//! cap. Position commands apply atomically: a bad FEN or an illegal move in
//! the list leaves the current position untouched.

use std::io::{self, BufRead, Write};

use super::options::UciOptions;
use super::parser::{parse_command, GoParams, UciCommand};
use crate::board::Board;
use crate::moves::{move_to_uci, parse_uci_move};
use crate::search::{SearchParams, Searcher, MAX_PLY};
use crate::time::TimeManager;

const ENGINE_NAME: &str = concat!("Lucena ", env!("CARGO_PKG_VERSION"));

pub struct UciEngine {
    position: Board,
    searcher: Searcher,
    options: UciOptions,
    running: bool,
}

impl UciEngine {
    pub fn new() -> Self {
        let options = UciOptions::default();
        let searcher = Searcher::new(
            Board::new(),
            SearchParams::new()
                .tt_size_mb(options.hash_mb)
                .report_info(true),
        );
        Self {
            position: Board::new(),
            searcher,
            options,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn handle_command(&mut self, cmd: UciCommand) -> Vec<String> {
        let mut out = Vec::new();
        match cmd {
            UciCommand::Uci => {
                out.push(format!("id name {ENGINE_NAME}"));
                out.push("id author the Lucena authors".to_string());
                out.extend(UciOptions::declarations());
                out.push("uciok".to_string());
            }
            UciCommand::IsReady => out.push("readyok".to_string()),
            UciCommand::UciNewGame => {
                self.position = Board::new();
                self.searcher.reset_tables();
            }
            UciCommand::Position { fen, moves } => {
                self.apply_position(fen.as_deref(), &moves, &mut out);
            }
            UciCommand::Go(params) => {
                self.go(&params, &mut out);
            }
            UciCommand::SetOption { name, value } => {
                match self.options.set(&name, value.as_deref()) {
                    Ok(()) => {
                        self.searcher.set_params(
                            SearchParams::new()
                                .tt_size_mb(self.options.hash_mb)
                                .aspiration(self.options.aspiration)
                                .report_info(true),
                        );
                    }
                    Err(e) => out.push(format!("info string {e}")),
                }
            }
            UciCommand::Stop => {
                // Searches run synchronously; by the time stop arrives the
                // previous go has already produced its bestmove.
            }
            UciCommand::Quit => self.running = false,
            UciCommand::Unknown(line) => {
                if !line.is_empty() {
                    out.push(format!("info string unknown command: {line}"));
                }
            }
        }
        out
    }

    /// Build the position on a scratch board and commit only if the FEN and
    /// every move in the list check out.
    fn apply_position(&mut self, fen: Option<&str>, moves: &[String], out: &mut Vec<String>) {
        let mut board = match fen {
            None => Board::new(),
            Some(fen) => match Board::from_fen(fen) {
                Ok(board) => board,
                Err(e) => {
                    out.push(format!("info string {e}"));
                    return;
                }
            },
        };

        for uci in moves {
            let legal = crate::movegen::generate_legal(&mut board);
            match parse_uci_move(uci, &legal) {
                Ok(mv) => board.make_move(mv),
                Err(e) => {
                    out.push(format!("info string {e}"));
                    return;
                }
            }
        }

        self.position = board;
    }

    fn go(&mut self, params: &GoParams, out: &mut Vec<String>) {
        let side = self.position.side_to_move();
        let movetime = TimeManager::allocate(&params.clock(), side);

        let max_depth = if params.infinite {
            MAX_PLY as u8 - 1
        } else {
            params.depth.unwrap_or(MAX_PLY as u8 - 1)
        };

        let mut search_params = SearchParams::new()
            .max_depth(max_depth)
            .aspiration(self.options.aspiration)
            .tt_size_mb(self.options.hash_mb)
            .report_info(true);
        if let Some(ms) = movetime {
            search_params = search_params.movetime(ms);
        } else if params.depth.is_none() && !params.infinite {
            // Bare "go": neither depth nor clock; fall back to a fixed
            // per-move budget so the reply always arrives.
            search_params = search_params.movetime(5000);
        }

        self.searcher.set_board(self.position.clone());
        self.searcher.set_params(search_params);

        match self.searcher.search() {
            Ok(result) => {
                out.push(format!("bestmove {}", move_to_uci(result.best_move)));
            }
            Err(e) => {
                out.push(format!("info string {e}"));
                out.push("bestmove 0000".to_string());
            }
        }
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Feed one input line through the engine; exposed for the integration tests.
pub fn process_line(engine: &mut UciEngine, line: &str) -> Vec<String> {
    engine.handle_command(parse_command(line))
}

/// Blocking stdin/stdout loop.
pub fn run() -> io::Result<()> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    let mut engine = UciEngine::new();
    let mut line = String::new();

    while engine.is_running() {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        for response in process_line(&mut engine, &line) {
            writeln!(writer, "{response}")?;
        }
        // Flush per command so GUIs see replies immediately.
        writer.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uci_handshake() {
        let mut engine = UciEngine::new();
        let out = process_line(&mut engine, "uci");
        assert!(out.first().unwrap().starts_with("id name Lucena"));
        assert_eq!(out.last().unwrap(), "uciok");
        assert!(out.iter().any(|l| l.starts_with("option name Hash")));

        let out = process_line(&mut engine, "isready");
        assert_eq!(out, vec!["readyok"]);
    }

    #[test]
    fn position_and_go_produce_a_bestmove() {
        let mut engine = UciEngine::new();
        assert!(process_line(&mut engine, "position startpos moves e2e4 e7e5").is_empty());
        let out = process_line(&mut engine, "go depth 3");
        assert!(out.last().unwrap().starts_with("bestmove "));
        assert_ne!(out.last().unwrap(), "bestmove 0000");
    }

    #[test]
    fn invalid_fen_leaves_position_unchanged() {
        let mut engine = UciEngine::new();
        process_line(&mut engine, "position startpos moves e2e4");
        let before = engine.position.to_fen();

        let out = process_line(&mut engine, "position fen not a real fen at all x");
        assert!(out[0].starts_with("info string"));
        assert_eq!(engine.position.to_fen(), before);
    }

    #[test]
    fn illegal_move_in_list_leaves_position_unchanged() {
        let mut engine = UciEngine::new();
        let before = engine.position.to_fen();
        let out = process_line(&mut engine, "position startpos moves e2e5");
        assert!(out[0].starts_with("info string"));
        assert_eq!(engine.position.to_fen(), before);
    }

    #[test]
    fn mate_position_reports_null_bestmove() {
        let mut engine = UciEngine::new();
        process_line(
            &mut engine,
            "position fen 4R1k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1",
        );
        let out = process_line(&mut engine, "go depth 2");
        assert_eq!(out.last().unwrap(), "bestmove 0000");
    }

    #[test]
    fn setoption_updates_and_rejects() {
        let mut engine = UciEngine::new();
        assert!(process_line(&mut engine, "setoption name Hash value 32").is_empty());
        assert_eq!(engine.options.hash_mb, 32);
        assert!(process_line(&mut engine, "setoption name Aspiration value false").is_empty());
        assert!(!engine.options.aspiration);
        let out = process_line(&mut engine, "setoption name Bogus value 1");
        assert!(out[0].starts_with("info string"));
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut engine = UciEngine::new();
        assert!(engine.is_running());
        process_line(&mut engine, "quit");
        assert!(!engine.is_running());
    }
}
