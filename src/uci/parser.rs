//! UCI command parser.

use crate::time::Clock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoParams {
    pub depth: Option<u8>,
    pub movetime: Option<u64>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u32>,
    pub nodes: Option<u64>,
    pub infinite: bool,
}

impl Default for GoParams {
    fn default() -> Self {
        Self {
            depth: None,
            movetime: None,
            wtime: None,
            btime: None,
            winc: None,
            binc: None,
            movestogo: None,
            nodes: None,
            infinite: false,
        }
    }
}

impl GoParams {
    pub fn clock(&self) -> Clock {
        Clock {
            wtime: self.wtime,
            btime: self.btime,
            winc: self.winc,
            binc: self.binc,
            movestogo: self.movestogo,
            movetime: self.movetime,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position { fen: Option<String>, moves: Vec<String> },
    Go(GoParams),
    SetOption { name: String, value: Option<String> },
    Stop,
    Quit,
    Unknown(String),
}

/// Parse one line of UCI input. Unknown or malformed lines come back as
/// `Unknown` so the loop can report and carry on.
pub fn parse_command(line: &str) -> UciCommand {
    let mut tokens = line.split_whitespace();
    let Some(head) = tokens.next() else {
        return UciCommand::Unknown(String::new());
    };

    match head {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::UciNewGame,
        "stop" => UciCommand::Stop,
        "quit" => UciCommand::Quit,
        "position" => parse_position(&mut tokens),
        "go" => parse_go(&mut tokens),
        "setoption" => parse_setoption(&mut tokens),
        _ => UciCommand::Unknown(line.trim().to_string()),
    }
}

fn parse_position<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> UciCommand {
    let fen = match tokens.next() {
        Some("startpos") => None,
        Some("fen") => {
            // FEN is six space-separated fields.
            let fields: Vec<&str> = tokens.by_ref().take(6).collect();
            Some(fields.join(" "))
        }
        other => {
            return UciCommand::Unknown(format!(
                "position {}",
                other.unwrap_or_default()
            ))
        }
    };

    let mut moves = Vec::new();
    match tokens.next() {
        Some("moves") => moves.extend(tokens.map(str::to_string)),
        Some(tok) => return UciCommand::Unknown(format!("position trailing '{tok}'")),
        None => {}
    }

    UciCommand::Position { fen, moves }
}

fn parse_go<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> UciCommand {
    let mut params = GoParams::default();
    let tokens: Vec<&str> = tokens.collect();
    let mut i = 0;

    while i < tokens.len() {
        let value = tokens.get(i + 1);
        match tokens[i] {
            "infinite" => {
                params.infinite = true;
                i += 1;
                continue;
            }
            "ponder" => {
                // Parsed and ignored; pondering is not supported.
                i += 1;
                continue;
            }
            "depth" => params.depth = value.and_then(|v| v.parse().ok()),
            "movetime" => params.movetime = value.and_then(|v| v.parse().ok()),
            "wtime" => params.wtime = value.and_then(|v| v.parse().ok()),
            "btime" => params.btime = value.and_then(|v| v.parse().ok()),
            "winc" => params.winc = value.and_then(|v| v.parse().ok()),
            "binc" => params.binc = value.and_then(|v| v.parse().ok()),
            "movestogo" => params.movestogo = value.and_then(|v| v.parse().ok()),
            "nodes" => params.nodes = value.and_then(|v| v.parse().ok()),
            "mate" => {} // parsed and ignored
            _ => {}
        }
        i += 2;
    }

    UciCommand::Go(params)
}

fn parse_setoption<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> UciCommand {
    // setoption name <name...> [value <value...>]
    let tokens: Vec<&str> = tokens.collect();
    if tokens.first() != Some(&"name") {
        return UciCommand::Unknown("setoption without name".to_string());
    }
    let value_pos = tokens.iter().position(|&t| t == "value");
    let (name_tokens, value_tokens) = match value_pos {
        Some(pos) => (&tokens[1..pos], Some(&tokens[pos + 1..])),
        None => (&tokens[1..], None),
    };

    UciCommand::SetOption {
        name: name_tokens.join(" "),
        value: value_tokens.map(|v| v.join(" ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_commands() {
        assert_eq!(parse_command("uci"), UciCommand::Uci);
        assert_eq!(parse_command("isready"), UciCommand::IsReady);
        assert_eq!(parse_command("ucinewgame"), UciCommand::UciNewGame);
        assert_eq!(parse_command("stop"), UciCommand::Stop);
        assert_eq!(parse_command("quit"), UciCommand::Quit);
        assert!(matches!(parse_command("banana"), UciCommand::Unknown(_)));
    }

    #[test]
    fn position_startpos_with_moves() {
        let cmd = parse_command("position startpos moves e2e4 e7e5");
        assert_eq!(
            cmd,
            UciCommand::Position {
                fen: None,
                moves: vec!["e2e4".to_string(), "e7e5".to_string()],
            }
        );
    }

    #[test]
    fn position_fen() {
        let cmd = parse_command(
            "position fen r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1 moves e1g1",
        );
        assert_eq!(
            cmd,
            UciCommand::Position {
                fen: Some("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".to_string()),
                moves: vec!["e1g1".to_string()],
            }
        );
    }

    #[test]
    fn go_with_limits() {
        let cmd = parse_command("go depth 6 movetime 1500");
        let UciCommand::Go(params) = cmd else {
            panic!("expected go")
        };
        assert_eq!(params.depth, Some(6));
        assert_eq!(params.movetime, Some(1500));
        assert!(!params.infinite);
    }

    #[test]
    fn go_with_clock() {
        let cmd = parse_command("go wtime 60000 btime 55000 winc 1000 binc 1000 movestogo 38");
        let UciCommand::Go(params) = cmd else {
            panic!("expected go")
        };
        assert_eq!(params.wtime, Some(60_000));
        assert_eq!(params.btime, Some(55_000));
        assert_eq!(params.movestogo, Some(38));
    }

    #[test]
    fn go_infinite() {
        let UciCommand::Go(params) = parse_command("go infinite") else {
            panic!("expected go")
        };
        assert!(params.infinite);
    }

    #[test]
    fn setoption_with_and_without_value() {
        assert_eq!(
            parse_command("setoption name Hash value 128"),
            UciCommand::SetOption {
                name: "Hash".to_string(),
                value: Some("128".to_string()),
            }
        );
        assert_eq!(
            parse_command("setoption name Clear Hash"),
            UciCommand::SetOption {
                name: "Clear Hash".to_string(),
                value: None,
            }
        );
    }
}
