//! Read a chessboard photograph and ask an engine for the best move.
//!
//!
//! The image is cut into 64 cells, each cell is labelled by an image
//! classifier (an ONNX model by default), and the labels are assembled
//! into a board. The board gets a minimal repair (both kings present),
//! is encoded as FEN, and is handed to a UCI engine such as Stockfish
//! running as a child process. The engine's move is checked for
//! legality with `shakmaty` before it is reported.
//!
//! The principal type is [`BoardReader`], which takes the classifier as
//! an explicit dependency. The individual stages are exposed as free
//! functions for callers that already have part of the pipeline, e.g.
//! [`get_best_move`] for a FEN string.
//!
//! The library re‑exports `shakmaty` to make working with moves easy.

mod board;
mod classifier;
mod config;
mod engine;
mod error;
mod grid;
mod labels;
mod pipeline;
mod preprocess;
mod types;

/// End-to-end entry point.
pub use pipeline::BoardReader;

/// Error type produced by library operations.
pub use error::ReaderError;

/// Board grid, king repair and FEN encoding.
pub use board::{BoardGrid, EMPTY, FEN_SUFFIX, board_to_fen, encode_fen, enforce_kings};

/// Cell classification.
pub use classifier::{
    Backend, CELL_SHAPE, CONFIDENCE_THRESHOLD, CellClassifier, OnnxClassifier, classify_cell,
};

pub use config::{CONFIG_ENV, EngineConfig, ReaderConfig};

/// Engine discovery and queries.
pub use engine::{get_best_move, locate_engine, parse_position};

pub use grid::{assemble_board, split_cells};

pub use labels::{DEFAULT_LABELS, LabelTable, PieceLabel};

pub use preprocess::{load_board_image, preprocess_image};

/// Output data structures.
pub use types::{Analysis, CellLabel, Classification, MoveResult};

/// Re-export of `shakmaty` for convenience when handling positions and moves.
pub use shakmaty;
