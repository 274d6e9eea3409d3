//! Error types for the chessboard reader.
//!
//! This crate uses `thiserror` to provide a single enumeration of the
//! errors that may occur anywhere along the pipeline. The variants wrap
//! underlying errors from ONNX Runtime, image decoding, chess parsing
//! and tensor operations, plus the failures of the engine subprocess,
//! giving the caller one error type to handle.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaderError {
    /// Wraps an error returned by the underlying ONNX Runtime bindings.
    #[error("ONNX Runtime error: {0}")]
    OrtError(#[from] ort::Error),

    /// The board image could not be decoded.
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// The input image path does not exist.
    #[error("Image not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    /// The board image cannot be cut into an 8x8 grid of equal cells.
    #[error("Image dimensions must be divisible by 8, got {height}x{width}")]
    Dimension { height: usize, width: usize },

    /// A cell does not have the shape the classifier was built for.
    #[error("Cell shape {found:?} does not match classifier input {expected:?}")]
    CellShape {
        expected: [usize; 3],
        found: [usize; 3],
    },

    /// The classifier produced a different number of classes than the
    /// label table holds.
    #[error("Classifier returned {found} probabilities, label table has {expected}")]
    LabelCount { expected: usize, found: usize },

    /// A board cell holds a character outside the notation alphabet.
    #[error("Invalid symbol {symbol:?} at row {row}, column {col}")]
    InvalidSymbol { row: usize, col: usize, symbol: char },

    /// The provided FEN string could not be parsed.
    #[error("Invalid FEN: {0}")]
    InvalidFen(#[from] shakmaty::fen::ParseFenError),

    /// A parsed position is invalid from the perspective of `shakmaty`.
    #[error("Invalid Chess Position: {0}")]
    InvalidPosition(#[from] shakmaty::PositionError<shakmaty::Chess>),

    /// No engine executable exists at any candidate location.
    #[error("No engine executable found")]
    EngineNotFound,

    /// The engine closed its pipes or exited mid-conversation.
    #[error("Engine process terminated unexpectedly")]
    EngineTerminated,

    /// The engine did not finish within the wall-clock cap.
    #[error("Engine did not answer within {0:?}")]
    EngineTimeout(Duration),

    /// The engine sent something that is not valid UCI.
    #[error("Engine protocol error: {0}")]
    EngineProtocol(String),

    /// The engine proposed a move that is not legal in the position.
    #[error("Illegal move attempted: {0}")]
    IllegalMove(String),

    /// Occurs when an ndarray has an unexpected shape during tensor
    /// preparation or extraction.
    #[error("Tensor shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration or label table file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
