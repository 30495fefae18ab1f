//! Image decoding and tensor preparation for the forgery model.

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::path::Path;
use tract_onnx::prelude::{tract_ndarray, Tensor};

use super::{ChannelOrder, DetectionError};

/// Square input edge expected by the model.
pub const INPUT_SIZE: u32 = 224;

/// Number of colour channels fed to the model.
pub const INPUT_CHANNELS: usize = 3;

/// Decode an image file, sniffing the format from its content.
pub fn load_image(image_path: &Path) -> Result<DynamicImage, DetectionError> {
    let image = ImageReader::open(image_path)?
        .with_guessed_format()?
        .decode()?;
    Ok(image)
}

/// Decode `image_path` and build the `[1, 224, 224, 3]` f32 input tensor
/// with intensities scaled to [0, 1].
pub fn preprocess(image_path: &Path, order: ChannelOrder) -> Result<Tensor, DetectionError> {
    let image = load_image(image_path)?;
    Ok(image_to_tensor(&image, order))
}

/// Resize with bilinear filtering (aspect ratio is not preserved) and pack
/// as NHWC.
pub fn image_to_tensor(image: &DynamicImage, order: ChannelOrder) -> Tensor {
    let resized = image::imageops::resize(&image.to_rgb8(), INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
    let size = INPUT_SIZE as usize;

    let array = tract_ndarray::Array4::<f32>::from_shape_fn(
        (1, size, size, INPUT_CHANNELS),
        |(_, y, x, c)| {
            let pixel = resized.get_pixel(x as u32, y as u32);
            let channel = match order {
                ChannelOrder::Rgb => c,
                ChannelOrder::Bgr => INPUT_CHANNELS - 1 - c,
            };
            f32::from(pixel[channel]) / 255.0
        },
    );

    array.into()
}
