use log::{debug, trace};
use ndarray::{ArrayView3, s};

use crate::{
    board::BoardGrid,
    classifier::{CellClassifier, classify_cell},
    error::ReaderError,
    labels::LabelTable,
};

/// Cut a `[height, width, channels]` board image into its 64 squares.
///
/// Cells come out row-major: rank 8 to rank 1, and file a to file h
/// within each rank. Both dimensions must be divisible by 8; cells are
/// views into the original image, without padding or overlap.
pub fn split_cells(image: ArrayView3<'_, f32>) -> Result<Vec<ArrayView3<'_, f32>>, ReaderError> {
    let (height, width, _) = image.dim();
    if height % 8 != 0 || width % 8 != 0 {
        return Err(ReaderError::Dimension { height, width });
    }

    let (m, n) = (height / 8, width / 8);
    let mut cells = Vec::with_capacity(64);
    for i in 0..8 {
        for j in 0..8 {
            cells.push(image.slice_move(s![i * m..(i + 1) * m, j * n..(j + 1) * n, ..]));
        }
    }

    Ok(cells)
}

/// Classify every square of a board image into a raw [`BoardGrid`].
pub fn assemble_board<C: CellClassifier + ?Sized>(
    classifier: &mut C,
    labels: &LabelTable,
    image: ArrayView3<f32>,
    threshold: f32,
) -> Result<BoardGrid, ReaderError> {
    let cells = split_cells(image)?;
    let mut board = BoardGrid::empty();

    for (index, cell) in cells.into_iter().enumerate() {
        let (row, col) = (index / 8, index % 8);
        let result = classify_cell(classifier, labels, cell, threshold)?;
        trace!(
            "cell ({row}, {col}): {:?} at {:.3}",
            result.label, result.confidence
        );
        board.set(row, col, result.label.symbol());
    }

    debug!("Recognised board:\n{board}");
    Ok(board)
}
