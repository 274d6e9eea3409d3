use std::{fs, path::Path, sync::LazyLock};

use serde::{Deserialize, Serialize};

use crate::error::ReaderError;

// JSON representation of the class vocabulary the cell classifier was
// trained with. The file maps output indices (array position) to piece
// labels. The `include_str!` macro embeds the data at compile time,
// avoiding an extra filesystem dependency at runtime.
const LABELS_JSON: &str = include_str!("data/labels.json");

/// Default label table, lazily parsed on first access.
pub static DEFAULT_LABELS: LazyLock<LabelTable> = LazyLock::new(|| {
    serde_json::from_str(LABELS_JSON).expect("Failed to parse labels.json")
});

/// The closed set of things a board cell can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceLabel {
    #[serde(rename = "Empty")]
    Empty,
    #[serde(rename = "Pawn_White")]
    PawnWhite,
    #[serde(rename = "Pawn_Black")]
    PawnBlack,
    #[serde(rename = "Knight_White")]
    KnightWhite,
    #[serde(rename = "Knight_Black")]
    KnightBlack,
    #[serde(rename = "Bishop_White")]
    BishopWhite,
    #[serde(rename = "Bishop_Black")]
    BishopBlack,
    #[serde(rename = "Rook_White")]
    RookWhite,
    #[serde(rename = "Rook_Black")]
    RookBlack,
    #[serde(rename = "Queen_White")]
    QueenWhite,
    #[serde(rename = "Queen_Black")]
    QueenBlack,
    #[serde(rename = "King_White")]
    KingWhite,
    #[serde(rename = "King_Black")]
    KingBlack,
}

impl PieceLabel {
    pub const ALL: [PieceLabel; 13] = [
        PieceLabel::Empty,
        PieceLabel::PawnWhite,
        PieceLabel::PawnBlack,
        PieceLabel::KnightWhite,
        PieceLabel::KnightBlack,
        PieceLabel::BishopWhite,
        PieceLabel::BishopBlack,
        PieceLabel::RookWhite,
        PieceLabel::RookBlack,
        PieceLabel::QueenWhite,
        PieceLabel::QueenBlack,
        PieceLabel::KingWhite,
        PieceLabel::KingBlack,
    ];

    /// Name used in training data and in label table files.
    pub fn name(self) -> &'static str {
        match self {
            PieceLabel::Empty => "Empty",
            PieceLabel::PawnWhite => "Pawn_White",
            PieceLabel::PawnBlack => "Pawn_Black",
            PieceLabel::KnightWhite => "Knight_White",
            PieceLabel::KnightBlack => "Knight_Black",
            PieceLabel::BishopWhite => "Bishop_White",
            PieceLabel::BishopBlack => "Bishop_Black",
            PieceLabel::RookWhite => "Rook_White",
            PieceLabel::RookBlack => "Rook_Black",
            PieceLabel::QueenWhite => "Queen_White",
            PieceLabel::QueenBlack => "Queen_Black",
            PieceLabel::KingWhite => "King_White",
            PieceLabel::KingBlack => "King_Black",
        }
    }

    /// FEN letter for the piece, `.` for an empty square.
    pub fn symbol(self) -> char {
        match self {
            PieceLabel::Empty => '.',
            PieceLabel::PawnWhite => 'P',
            PieceLabel::PawnBlack => 'p',
            PieceLabel::KnightWhite => 'N',
            PieceLabel::KnightBlack => 'n',
            PieceLabel::BishopWhite => 'B',
            PieceLabel::BishopBlack => 'b',
            PieceLabel::RookWhite => 'R',
            PieceLabel::RookBlack => 'r',
            PieceLabel::QueenWhite => 'Q',
            PieceLabel::QueenBlack => 'q',
            PieceLabel::KingWhite => 'K',
            PieceLabel::KingBlack => 'k',
        }
    }
}

/// Mapping from classifier output index to label.
///
/// The order must be exactly the order the classifier was trained with,
/// otherwise every prediction is silently shifted onto the wrong piece.
/// Tables carry a version so a retrained model can ship its own ordering
/// next to its weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTable {
    pub version: u32,
    pub labels: Vec<PieceLabel>,
}

impl LabelTable {
    /// Load a table from a JSON file with the same layout as the
    /// embedded one.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<PieceLabel> {
        self.labels.get(index).copied()
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        DEFAULT_LABELS.clone()
    }
}
