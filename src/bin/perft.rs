//! Perft validation binary: counts nodes with our generator and with
//! shakmaty as an independent reference, and compares.

use clap::Parser;
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Position};

use lucena::board::{Board, START_FEN};

#[derive(Parser, Debug)]
#[command(author, version, about = "Cross-checked perft node counter")]
struct Args {
    /// Position to count from.
    #[arg(short, long, default_value_t = String::from(START_FEN))]
    fen: String,

    /// Leaf depth.
    #[arg(short, long, default_value_t = 5)]
    depth: u32,
}

fn perft_reference(pos: &Chess, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut nodes = 0;
    for mv in pos.legal_moves() {
        let mut next = pos.clone();
        next.play_unchecked(&mv);
        nodes += perft_reference(&next, depth - 1);
    }
    nodes
}

fn main() {
    lucena::init();
    let args = Args::parse();

    println!("perft({}) on '{}'", args.depth, args.fen);

    let mut board = match Board::from_fen(&args.fen) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    let start = std::time::Instant::now();
    let ours = lucena::perft(&mut board, args.depth);
    let ours_time = start.elapsed();

    let pos: Chess = args
        .fen
        .parse::<Fen>()
        .expect("FEN already validated")
        .into_position(CastlingMode::Standard)
        .expect("position already validated");
    let start = std::time::Instant::now();
    let reference = perft_reference(&pos, args.depth);
    let reference_time = start.elapsed();

    println!(
        "lucena   {:>14} nodes in {:>6} ms ({:.2} Mnps)",
        ours,
        ours_time.as_millis(),
        ours as f64 / ours_time.as_micros().max(1) as f64
    );
    println!(
        "shakmaty {:>14} nodes in {:>6} ms ({:.2} Mnps)",
        reference,
        reference_time.as_millis(),
        reference as f64 / reference_time.as_micros().max(1) as f64
    );

    if ours == reference {
        println!("counts match");
    } else {
        println!("MISMATCH: difference {}", ours as i64 - reference as i64);
        std::process::exit(1);
    }
}
