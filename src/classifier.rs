use log::warn;
use ndarray::{Array1, Array4, ArrayView3, Axis, Ix2};
use ort::{session::Session, value::Tensor};
use serde::{Deserialize, Serialize};

use crate::{
    error::ReaderError,
    labels::LabelTable,
    types::{CellLabel, Classification},
};

/// Classifications scoring below this are reported as uncertain.
pub const CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Per-cell input the classifier expects: height, width, channels.
pub const CELL_SHAPE: [usize; 3] = [300, 150, 3];

/// Anything that maps a batch of one cell image to class probabilities.
///
/// The output is expected to have one entry per label in the
/// [`LabelTable`] the caller classifies with.
pub trait CellClassifier {
    /// Shape of a single cell, without the batch dimension.
    fn input_shape(&self) -> [usize; 3] {
        CELL_SHAPE
    }

    /// Run inference on a `[1, height, width, channels]` batch.
    fn predict(&mut self, batch: Array4<f32>) -> Result<Array1<f32>, ReaderError>;
}

/// ONNX Runtime implementation to use for inference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Tract,
    Candle,
}

impl Backend {
    /// Select this backend for the process. Only the first selection
    /// takes effect; later ones return `false`.
    fn install(self) -> bool {
        let installed = match self {
            Backend::Tract => ort::set_api(ort_tract::api()),
            Backend::Candle => ort::set_api(ort_candle::api()),
        };
        if !installed {
            warn!("ONNX backend already selected, {self:?} request ignored");
        }
        installed
    }
}

/// Cell classifier backed by an ONNX model.
pub struct OnnxClassifier {
    session: Session,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    /// Initialize from a local `.onnx` file path
    pub fn from_file(
        path: &str,
        backend: Backend,
        input_name: &str,
        output_name: &str,
    ) -> Result<Self, ReaderError> {
        backend.install();
        let session = Session::builder()?.commit_from_file(path)?;

        Ok(Self {
            session,
            input_name: input_name.to_owned(),
            output_name: output_name.to_owned(),
        })
    }

    /// Initialize from raw bytes
    pub fn from_memory(
        model_bytes: &[u8],
        backend: Backend,
        input_name: &str,
        output_name: &str,
    ) -> Result<Self, ReaderError> {
        backend.install();
        let session = Session::builder()?.commit_from_memory(model_bytes)?;

        Ok(Self {
            session,
            input_name: input_name.to_owned(),
            output_name: output_name.to_owned(),
        })
    }
}

impl CellClassifier for OnnxClassifier {
    fn predict(&mut self, batch: Array4<f32>) -> Result<Array1<f32>, ReaderError> {
        let outputs = self.session.run(ort::inputs! {
            self.input_name.as_str() => Tensor::from_array(batch)?,
        })?;

        // Output is [batch, classes]; we only ever send one cell.
        let probs = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix2>()?;

        Ok(probs.index_axis(Axis(0), 0).to_owned())
    }
}

/// Classify one cell image.
///
/// The cell gets a leading batch dimension before inference. Its shape
/// must already match the classifier's input; resizing is the job of
/// preprocessing. The arg-max class wins, unless its probability is
/// below `threshold`, in which case the cell is [`CellLabel::Uncertain`].
pub fn classify_cell<C: CellClassifier + ?Sized>(
    classifier: &mut C,
    labels: &LabelTable,
    cell: ArrayView3<f32>,
    threshold: f32,
) -> Result<Classification, ReaderError> {
    let expected = classifier.input_shape();
    let (h, w, c) = cell.dim();
    if [h, w, c] != expected {
        return Err(ReaderError::CellShape {
            expected,
            found: [h, w, c],
        });
    }

    let batch = cell.insert_axis(Axis(0)).to_owned();
    let probs = classifier.predict(batch)?;
    if probs.len() != labels.len() {
        return Err(ReaderError::LabelCount {
            expected: labels.len(),
            found: probs.len(),
        });
    }

    // First maximum wins on ties; NaN never wins.
    let mut best = 0;
    let mut confidence = f32::NEG_INFINITY;
    for (i, &p) in probs.iter().enumerate() {
        if p > confidence {
            best = i;
            confidence = p;
        }
    }

    let label = match labels.get(best) {
        Some(piece) if confidence >= threshold => CellLabel::Piece(piece),
        _ => CellLabel::Uncertain,
    };

    Ok(Classification { label, confidence })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::PieceLabel;
    use ndarray::{Array3, array};

    /// Returns the same distribution for every cell.
    struct Fixed {
        shape: [usize; 3],
        probs: Array1<f32>,
        seen: Vec<Vec<usize>>,
    }

    impl CellClassifier for Fixed {
        fn input_shape(&self) -> [usize; 3] {
            self.shape
        }

        fn predict(&mut self, batch: Array4<f32>) -> Result<Array1<f32>, ReaderError> {
            self.seen.push(batch.shape().to_vec());
            Ok(self.probs.clone())
        }
    }

    fn fixed(probs: Array1<f32>) -> Fixed {
        Fixed {
            shape: [4, 2, 3],
            probs,
            seen: Vec::new(),
        }
    }

    fn one_hot(index: usize, p: f32) -> Array1<f32> {
        let mut probs = Array1::from_elem(13, (1.0 - p) / 12.0);
        probs[index] = p;
        probs
    }

    #[test]
    fn confident_prediction_maps_to_label() {
        let labels = LabelTable::default();
        // index 4 of the alphabetical table is King_White
        let mut clf = fixed(one_hot(4, 0.9));
        let cell = Array3::<f32>::zeros((4, 2, 3));

        let result = classify_cell(&mut clf, &labels, cell.view(), CONFIDENCE_THRESHOLD).unwrap();
        assert_eq!(result.label, CellLabel::Piece(PieceLabel::KingWhite));
        assert_eq!(result.label.symbol(), 'K');
        assert!((result.confidence - 0.9).abs() < 1e-6);
        assert_eq!(clf.seen, vec![vec![1, 4, 2, 3]]);
    }

    #[test]
    fn low_confidence_is_uncertain() {
        let labels = LabelTable::default();
        let mut clf = fixed(one_hot(11, 0.69));
        let cell = Array3::<f32>::zeros((4, 2, 3));

        let result = classify_cell(&mut clf, &labels, cell.view(), CONFIDENCE_THRESHOLD).unwrap();
        assert_eq!(result.label, CellLabel::Uncertain);
        assert_eq!(result.label.symbol(), '.');
    }

    #[test]
    fn threshold_is_inclusive() {
        let labels = LabelTable::default();
        let mut clf = fixed(one_hot(11, 0.7));
        let cell = Array3::<f32>::zeros((4, 2, 3));

        let result = classify_cell(&mut clf, &labels, cell.view(), CONFIDENCE_THRESHOLD).unwrap();
        assert_eq!(result.label, CellLabel::Piece(PieceLabel::RookBlack));
    }

    #[test]
    fn ties_pick_first_index() {
        let labels = LabelTable::default();
        let mut probs = Array1::zeros(13);
        probs[2] = 0.5;
        probs[7] = 0.5;
        let mut clf = fixed(probs);
        let cell = Array3::<f32>::zeros((4, 2, 3));

        let result = classify_cell(&mut clf, &labels, cell.view(), 0.5).unwrap();
        assert_eq!(result.label, CellLabel::Piece(PieceLabel::Empty));
    }

    #[test]
    fn wrong_cell_shape_is_an_error() {
        let labels = LabelTable::default();
        let mut clf = fixed(one_hot(0, 1.0));
        let cell = Array3::<f32>::zeros((2, 4, 3));

        let err = classify_cell(&mut clf, &labels, cell.view(), CONFIDENCE_THRESHOLD).unwrap_err();
        assert!(matches!(err, ReaderError::CellShape { .. }));
        assert!(clf.seen.is_empty());
    }

    #[test]
    fn backend_is_selected_once_per_process() {
        Backend::Tract.install();
        assert!(!Backend::Candle.install());
    }

    #[test]
    fn wrong_class_count_is_an_error() {
        let labels = LabelTable::default();
        let mut clf = fixed(array![0.1, 0.9]);
        let cell = Array3::<f32>::zeros((4, 2, 3));

        let err = classify_cell(&mut clf, &labels, cell.view(), CONFIDENCE_THRESHOLD).unwrap_err();
        assert!(matches!(
            err,
            ReaderError::LabelCount {
                expected: 13,
                found: 2
            }
        ));
    }
}
