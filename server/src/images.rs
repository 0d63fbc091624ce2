//! Floor-plan backgrounds are normalized to the logical canvas size so that
//! stored booth coordinates line up in every renderer.

use std::io::Cursor;

use floorplan_shared::{CANVAS_HEIGHT, CANVAS_WIDTH};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::error::ApiError;

pub const MAX_UPLOAD_SIZE: usize = 20 * 1024 * 1024;
const JPEG_QUALITY: u8 = 85;

pub fn background_key(event_id: &str) -> String {
    format!("backgrounds/{event_id}.jpg")
}

pub fn prepare_background(data: &[u8]) -> Result<Vec<u8>, ApiError> {
    if data.is_empty() {
        return Err(ApiError::Image("empty upload".into()));
    }
    if data.len() > MAX_UPLOAD_SIZE {
        return Err(ApiError::Image(format!(
            "upload too large: {} bytes (max {MAX_UPLOAD_SIZE})",
            data.len()
        )));
    }
    let img = image::load_from_memory(data).map_err(|e| ApiError::Image(e.to_string()))?;
    let resized = img.resize_exact(
        CANVAS_WIDTH as u32,
        CANVAS_HEIGHT as u32,
        FilterType::Triangle,
    );

    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
        resized
            .to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|e| ApiError::Image(format!("jpeg encoding failed: {e}")))?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use image::{ImageFormat, RgbImage};

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn any_upload_becomes_canvas_sized_jpeg() {
        let jpeg = prepare_background(&png(300, 500)).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 1200);
        assert_eq!(decoded.height(), 800);
        assert_eq!(
            image::guess_format(&jpeg).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn rejects_non_images() {
        assert!(matches!(
            prepare_background(b"definitely not a png"),
            Err(ApiError::Image(_))
        ));
        assert!(matches!(prepare_background(&[]), Err(ApiError::Image(_))));
    }
}
