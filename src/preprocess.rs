use std::path::Path;

use image::{RgbImage, imageops::FilterType};
use log::debug;
use ndarray::Array3;

use crate::{classifier::CELL_SHAPE, error::ReaderError};

/// Load a board photograph as a `[height, width, 3]` tensor with values
/// in `[0, 1]`.
///
/// The image is resized so every one of the 64 cells matches `cell`
/// (height, width, channels), i.e. the board becomes
/// `8 * cell[0]` by `8 * cell[1]` pixels.
pub fn load_board_image(path: &Path, cell: [usize; 3]) -> Result<Array3<f32>, ReaderError> {
    if !path.exists() {
        return Err(ReaderError::ImageNotFound(path.to_path_buf()));
    }

    let rgb = image::open(path)?.to_rgb8();
    debug!(
        "Loaded {} ({}x{})",
        path.display(),
        rgb.width(),
        rgb.height()
    );

    let width = (cell[1] * 8) as u32;
    let height = (cell[0] * 8) as u32;
    let resized = image::imageops::resize(&rgb, width, height, FilterType::Triangle);

    to_tensor(&resized)
}

/// Same as [`load_board_image`] for the default classifier cell size.
pub fn preprocess_image(path: &Path) -> Result<Array3<f32>, ReaderError> {
    load_board_image(path, CELL_SHAPE)
}

fn to_tensor(image: &RgbImage) -> Result<Array3<f32>, ReaderError> {
    let (width, height) = image.dimensions();
    let data: Vec<f32> = image.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
    Ok(Array3::from_shape_vec((height as usize, width as usize, 3), data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn tensor_is_height_width_channels() {
        let mut img = RgbImage::new(4, 2);
        img.put_pixel(3, 1, Rgb([255, 0, 51]));

        let tensor = to_tensor(&img).unwrap();
        assert_eq!(tensor.dim(), (2, 4, 3));
        assert_eq!(tensor[[1, 3, 0]], 1.0);
        assert_eq!(tensor[[1, 3, 1]], 0.0);
        assert!((tensor[[1, 3, 2]] - 0.2).abs() < 1e-6);
        assert_eq!(tensor[[0, 0, 0]], 0.0);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = preprocess_image(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, ReaderError::ImageNotFound(_)));
    }

    #[test]
    fn image_is_resized_to_cell_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.png");
        RgbImage::from_pixel(37, 53, Rgb([10, 20, 30])).save(&path).unwrap();

        let tensor = load_board_image(&path, [6, 3, 3]).unwrap();
        assert_eq!(tensor.dim(), (48, 24, 3));
    }
}
