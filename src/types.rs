use shakmaty::uci::UciMove;

use crate::{board::BoardGrid, labels::PieceLabel};

/// What the classifier made of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellLabel {
    Piece(PieceLabel),
    /// The best class scored below the confidence threshold.
    Uncertain,
}

impl CellLabel {
    /// Notation symbol for the cell. Uncertain cells read as empty.
    pub fn symbol(self) -> char {
        match self {
            CellLabel::Piece(label) => label.symbol(),
            CellLabel::Uncertain => '.',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: CellLabel,
    /// Probability of the arg-max class, in `[0, 1]`
    pub confidence: f32,
}

/// Outcome of an engine query.
///
/// `best_move` is `None` when no engine was found, the engine failed or
/// its move was rejected; the flags are then `false` and `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MoveResult {
    pub best_move: Option<UciMove>,
    /// Whether the queried position itself is checkmate. This is not
    /// evaluated after `best_move` is played.
    pub is_checkmate: bool,
    pub is_castling: Option<bool>,
}

impl MoveResult {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Everything produced for one board image.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Grid after king repair
    pub board: BoardGrid,
    pub fen: Option<String>,
    /// Present only when a FEN could be produced.
    pub result: Option<MoveResult>,
}
