use chessboard_reader::{EngineConfig, get_best_move};

// A promotion race, a position where white can castle kingside, one where
// black can, and one with the white king missing entirely.
const FENS: [&str; 4] = [
    "8/P7/8/8/8/8/8/7k w - - 0 1",
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQK2R w KQkq - 0 1",
    "rnbqk2r/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1",
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1BNR w Kk - 0 1",
];

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 1. Engine setup: the stock candidate list, one second per move
    let config = EngineConfig::default();

    // 2. Query each position
    for fen in FENS {
        println!("------------------------------------------------");
        println!("Testing FEN: {fen}");
        let result = get_best_move(fen, &config);

        // 3. Output Results
        match &result.best_move {
            Some(m) => println!("Best Move: {m}"),
            None => println!("Best Move: No move found"),
        }
        println!("Checkmate: {}", result.is_checkmate);
        println!("Castling: {:?}", result.is_castling);
    }
}
