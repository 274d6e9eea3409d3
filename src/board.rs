//! The recognised board and its FEN encoding.
//!
//! A [`BoardGrid`] is an 8x8 matrix of notation symbols, row 0 being
//! rank 8 and column 0 file a. Raw grids straight from the classifier
//! carry no guarantees; [`enforce_kings`] patches the one defect the
//! engine cannot live with before [`encode_fen`] turns the grid into a
//! position string.

use std::fmt;

use log::{debug, error, warn};

use crate::error::ReaderError;

/// Symbol of an empty square.
pub const EMPTY: char = '.';

/// Side to move, castling rights, en passant square and move counters
/// appended to every encoded board. These are defaults, not recovered
/// game state.
pub const FEN_SUFFIX: &str = " w KQkq - 0 1";

const WHITE_KING_HOME: (usize, usize) = (7, 4);
const BLACK_KING_HOME: (usize, usize) = (0, 4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardGrid(pub [[char; 8]; 8]);

impl BoardGrid {
    pub fn empty() -> Self {
        Self([[EMPTY; 8]; 8])
    }

    pub fn get(&self, row: usize, col: usize) -> char {
        self.0[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, symbol: char) {
        self.0[row][col] = symbol;
    }

    pub fn rows(&self) -> &[[char; 8]; 8] {
        &self.0
    }

    pub fn count(&self, symbol: char) -> usize {
        self.0.iter().flatten().filter(|&&c| c == symbol).count()
    }
}

impl Default for BoardGrid {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for BoardGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.0.iter().enumerate() {
            let line: Vec<String> = row.iter().map(char::to_string).collect();
            write!(f, "{}", line.join(" "))?;
            if i < 7 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

fn is_symbol(c: char) -> bool {
    c == EMPTY || "PNBRQKpnbrqk".contains(c)
}

/// Make sure each side has a king.
///
/// A side without one gets its king dropped on the e-file home square,
/// overwriting whatever was recognised there. Extra kings are left alone
/// and no other piece counts are checked.
///
/// Placing one king can overwrite the other side's only king, so the
/// checks repeat until both are present. A second pass always suffices.
pub fn enforce_kings(board: &mut BoardGrid) -> &mut BoardGrid {
    while board.count('K') == 0 || board.count('k') == 0 {
        if board.count('K') == 0 {
            let (row, col) = WHITE_KING_HOME;
            warn!("No white king recognised, placing one at row {row}, column {col}");
            board.set(row, col, 'K');
        }
        if board.count('k') == 0 {
            let (row, col) = BLACK_KING_HOME;
            warn!("No black king recognised, placing one at row {row}, column {col}");
            board.set(row, col, 'k');
        }
    }
    board
}

/// Encode the piece placement and append [`FEN_SUFFIX`].
pub fn encode_fen(board: &BoardGrid) -> Result<String, ReaderError> {
    let mut ranks = Vec::with_capacity(8);

    for (row, cells) in board.rows().iter().enumerate() {
        let mut rank = String::with_capacity(8);
        let mut empty_run = 0;

        for (col, &symbol) in cells.iter().enumerate() {
            if !is_symbol(symbol) {
                return Err(ReaderError::InvalidSymbol { row, col, symbol });
            }
            if symbol == EMPTY {
                empty_run += 1;
            } else {
                if empty_run > 0 {
                    rank.push_str(&empty_run.to_string());
                    empty_run = 0;
                }
                rank.push(symbol);
            }
        }
        if empty_run > 0 {
            rank.push_str(&empty_run.to_string());
        }

        ranks.push(rank);
    }

    Ok(ranks.join("/") + FEN_SUFFIX)
}

/// Repair the kings, then encode.
///
/// Never fails: an encoding error is logged and reported as `None`.
pub fn board_to_fen(board: &mut BoardGrid) -> Option<String> {
    enforce_kings(board);
    debug!("Normalised board:\n{board}");

    match encode_fen(board) {
        Ok(fen) => Some(fen),
        Err(e) => {
            error!("FEN conversion error: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: [&str; 8]) -> BoardGrid {
        let mut board = BoardGrid::empty();
        for (r, row) in rows.iter().enumerate() {
            for (c, ch) in row.chars().enumerate() {
                board.set(r, c, ch);
            }
        }
        board
    }

    #[test]
    fn empty_board_encodes_to_eights() {
        let fen = encode_fen(&BoardGrid::empty()).unwrap();
        assert_eq!(fen, "8/8/8/8/8/8/8/8 w KQkq - 0 1");
    }

    #[test]
    fn lone_white_king() {
        let mut board = BoardGrid::empty();
        board.set(7, 4, 'K');
        assert_eq!(encode_fen(&board).unwrap(), "8/8/8/8/8/8/8/4K3 w KQkq - 0 1");
    }

    #[test]
    fn start_position() {
        let board = grid([
            "rnbqkbnr", "pppppppp", "........", "........", "........", "........",
            "PPPPPPPP", "RNBQKBNR",
        ]);
        assert_eq!(
            encode_fen(&board).unwrap(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn runs_are_split_around_pieces() {
        let board = grid([
            ".k......", "........", "...p..P.", "........", "........", "........",
            "........", "Q......K",
        ]);
        assert_eq!(
            encode_fen(&board).unwrap(),
            "1k6/8/3p2P1/8/8/8/8/Q6K w KQkq - 0 1"
        );
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let mut board = BoardGrid::empty();
        board.set(3, 5, 'x');
        match encode_fen(&board) {
            Err(ReaderError::InvalidSymbol { row, col, symbol }) => {
                assert_eq!((row, col, symbol), (3, 5, 'x'));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert_eq!(board_to_fen(&mut board), None);
    }

    #[test]
    fn missing_black_king_goes_home() {
        let mut board = BoardGrid::empty();
        board.set(7, 4, 'K');
        board.set(0, 4, 'r');
        enforce_kings(&mut board);
        assert_eq!(board.count('k'), 1);
        assert_eq!(board.get(0, 4), 'k');
        assert_eq!(board.count('K'), 1);
    }

    #[test]
    fn extra_kings_are_kept() {
        let mut board = BoardGrid::empty();
        board.set(1, 1, 'K');
        board.set(2, 2, 'K');
        board.set(5, 5, 'k');
        enforce_kings(&mut board);
        assert_eq!(board.count('K'), 2);
        assert_eq!(board.count('k'), 1);
        assert_eq!(board.get(7, 4), EMPTY);
    }

    #[test]
    fn normalising_twice_changes_nothing() {
        let samples = [
            BoardGrid::empty(),
            grid([
                "....K...", "........", "........", "........", "........", "........",
                "........", "....k...",
            ]),
            grid([
                "rnbq.bnr", "pppppppp", "........", "........", "........", "........",
                "PPPPPPPP", "RNBQ.BNR",
            ]),
            grid([
                "....K...", "........", "........", "........", "........", "........",
                "........", "........",
            ]),
            grid([
                "........", "........", "........", "........", "........", "........",
                "........", "....k...",
            ]),
        ];
        for sample in samples {
            let mut once = sample;
            enforce_kings(&mut once);
            let mut twice = once;
            enforce_kings(&mut twice);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn king_on_wrong_home_square_is_overwritten() {
        // A lone black king sitting on e1 is replaced by the white king,
        // after which black is missing a king and gets one on e8.
        let mut board = BoardGrid::empty();
        board.set(7, 4, 'k');
        enforce_kings(&mut board);
        assert_eq!(board.get(7, 4), 'K');
        assert_eq!(board.get(0, 4), 'k');
    }

    #[test]
    fn white_king_on_black_home_square_survives() {
        // The black king lands on e8 and wipes out the only white king,
        // which then has to be put back on e1.
        let mut board = BoardGrid::empty();
        board.set(0, 4, 'K');
        enforce_kings(&mut board);
        assert_eq!(board.count('K'), 1);
        assert_eq!(board.count('k'), 1);
        assert_eq!(board.get(0, 4), 'k');
        assert_eq!(board.get(7, 4), 'K');

        let mut again = board;
        enforce_kings(&mut again);
        assert_eq!(again, board);
    }

    #[test]
    fn board_to_fen_repairs_first() {
        let mut board = BoardGrid::empty();
        assert_eq!(
            board_to_fen(&mut board).as_deref(),
            Some("4k3/8/8/8/8/8/8/4K3 w KQkq - 0 1")
        );
    }
}
