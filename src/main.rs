//! UCI entry point.

fn main() {
    lucena::init();

    if let Err(e) = lucena::uci::run() {
        eprintln!("fatal: {e}");
        std::process::exit(1);
    }
}
