use tiledet::lowlevel::OutputTensor;
use tiledet::{ImageView, ModelInfo, OwnedImage, PixelFormat, TileDetError};

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u8; 12];

    let err = ImageView::from_slice(&data, 0, 1, PixelFormat::Rgb8).err().unwrap();
    assert_eq!(
        err,
        TileDetError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );

    let err = ImageView::from_slice(&data, 1, 0, PixelFormat::Rgba8).err().unwrap();
    assert_eq!(
        err,
        TileDetError::InvalidDimensions {
            width: 1,
            height: 0,
        }
    );
}

#[test]
fn image_view_rejects_invalid_stride() {
    let data = [0u8; 24];

    let err = ImageView::new(&data, 4, 1, 11, PixelFormat::Rgb8).err().unwrap();
    assert_eq!(
        err,
        TileDetError::InvalidStride {
            row_len: 12,
            stride: 11,
        }
    );
}

#[test]
fn image_view_rejects_small_buffer() {
    let data = [0u8; 15];

    let err = ImageView::new(&data, 2, 2, 8, PixelFormat::Rgba8).err().unwrap();
    assert_eq!(err, TileDetError::BufferTooSmall { needed: 16, got: 15 });
}

#[test]
fn image_view_accepts_padded_rows() {
    // 2x2 RGB with one padding byte per row.
    let data = [1u8, 2, 3, 4, 5, 6, 0, 7, 8, 9, 10, 11, 12];
    let view = ImageView::new(&data, 2, 2, 7, PixelFormat::Rgb8).unwrap();
    assert_eq!(view.rgb(1, 0), Some([4, 5, 6]));
    assert_eq!(view.rgb(0, 1), Some([7, 8, 9]));
    assert_eq!(view.row(1).unwrap(), &[7u8, 8, 9, 10, 11, 12]);
}

#[test]
fn roi_rejects_regions_past_the_edge() {
    let img = OwnedImage::filled_rgb(4, 4, [0, 0, 0]).unwrap();
    let err = img.view().roi(3, 3, 2, 2).err().unwrap();
    assert_eq!(
        err,
        TileDetError::RoiOutOfBounds {
            x: 3,
            y: 3,
            width: 2,
            height: 2,
            img_width: 4,
            img_height: 4,
        }
    );
}

#[test]
fn owned_image_rejects_mismatched_length() {
    let err = OwnedImage::new(vec![0u8; 13], 2, 2, PixelFormat::Rgb8).err().unwrap();
    assert_eq!(err, TileDetError::InvalidDimensions { width: 2, height: 2 });
}

#[test]
fn model_info_reports_configuration_errors() {
    let err = ModelInfo::from_dims(&[1, 640, 640, 3], &[1, 84]).err().unwrap();
    assert!(matches!(err, TileDetError::InvalidModelShape { .. }));
    assert!(err.to_string().contains("output rank"));

    let info = ModelInfo::from_dims(&[1, 640, 640, 3], &[1, 84, 8400]).unwrap();
    assert_eq!(info.output().num_classes(), 80);
}

#[test]
fn output_tensor_checks_length_against_shape() {
    let data = vec![0.0f32; 5 * 3];
    assert!(OutputTensor::new(&data, 5, 3).is_ok());
    assert_eq!(
        OutputTensor::new(&data, 5, 4).err().unwrap(),
        TileDetError::TensorShapeMismatch {
            expected: 20,
            got: 15
        }
    );
}
