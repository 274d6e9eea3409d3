use std::path::Path;

use log::info;
use ndarray::ArrayView3;

use crate::{
    board::{BoardGrid, board_to_fen},
    classifier::{CellClassifier, OnnxClassifier},
    config::ReaderConfig,
    engine::get_best_move,
    error::ReaderError,
    grid::assemble_board,
    labels::LabelTable,
    preprocess::load_board_image,
    types::{Analysis, MoveResult},
};

/// Board image in, best move out.
///
/// The reader owns its classifier; any [`CellClassifier`] can be supplied
/// through [`BoardReader::new`].
pub struct BoardReader<C> {
    classifier: C,
    labels: LabelTable,
    config: ReaderConfig,
}

impl BoardReader<OnnxClassifier> {
    /// Load the ONNX model and label table named in `config`.
    pub fn from_config(config: ReaderConfig) -> Result<Self, ReaderError> {
        let model_path = config.model_path.to_string_lossy().into_owned();
        let classifier = OnnxClassifier::from_file(
            &model_path,
            config.backend,
            &config.input_name,
            &config.output_name,
        )?;
        let labels = config.labels()?;

        Ok(Self::new(classifier, labels, config))
    }
}

impl<C: CellClassifier> BoardReader<C> {
    pub fn new(classifier: C, labels: LabelTable, config: ReaderConfig) -> Self {
        Self {
            classifier,
            labels,
            config,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Recognise the raw, unrepaired board in a preprocessed image.
    pub fn read_board(&mut self, image: ArrayView3<f32>) -> Result<BoardGrid, ReaderError> {
        assemble_board(
            &mut self.classifier,
            &self.labels,
            image,
            self.config.confidence_threshold,
        )
    }

    /// Recognise, repair and encode. `Ok(None)` means encoding failed.
    pub fn read_fen(&mut self, image: ArrayView3<f32>) -> Result<Option<String>, ReaderError> {
        let mut board = self.read_board(image)?;
        Ok(board_to_fen(&mut board))
    }

    /// Run the whole pipeline on an image already in tensor form.
    pub fn analyze(&mut self, image: ArrayView3<f32>) -> Result<Analysis, ReaderError> {
        let mut board = self.read_board(image)?;
        let fen = board_to_fen(&mut board);

        let result = fen.as_deref().map(|fen| {
            info!("FEN: {fen}");
            self.best_move(fen)
        });

        Ok(Analysis { board, fen, result })
    }

    /// Load an image file and run the whole pipeline on it.
    pub fn analyze_file(&mut self, path: &Path) -> Result<Analysis, ReaderError> {
        let image = load_board_image(path, self.classifier.input_shape())?;
        self.analyze(image.view())
    }

    pub fn best_move(&self, fen: &str) -> MoveResult {
        get_best_move(fen, &self.config.engine)
    }
}
