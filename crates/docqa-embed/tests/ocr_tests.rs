#![cfg(feature = "ocr")]

use std::io::Cursor;

use candle_core::Device;
use docqa_core::config::OcrSettings;
use docqa_embed::ocr::{load_ocr_extractor, preprocess};
use image::{ImageFormat, Rgb, RgbImage};

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| if x < width / 2 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).expect("encode png");
    buf.into_inner()
}

#[test]
fn image_is_resized_and_normalised() {
    let pixels = preprocess(&png(40, 12), 16, &Device::Cpu).expect("preprocess");
    assert_eq!(pixels.dims(), &[1, 3, 16, 16]);
    let values: Vec<f32> = pixels.flatten_all().expect("flatten").to_vec1().expect("to_vec1");
    assert!(values.iter().all(|v| (-1.0..=1.0).contains(v)));
    assert!(values.iter().any(|v| *v > 0.5) && values.iter().any(|v| *v < -0.5));
}

#[test]
fn corrupt_image_is_an_error() {
    assert!(preprocess(b"\x89PNG\r\n\x1a\nnot really", 16, &Device::Cpu).is_err());
    assert!(preprocess(b"plain text", 16, &Device::Cpu).is_err());
}

#[test]
fn disabled_ocr_loads_nothing() {
    let settings = OcrSettings { enabled: false, model_dir: None };
    assert!(load_ocr_extractor(&settings).expect("load").is_none());
}

#[test]
fn missing_ocr_model_is_reported() {
    let tmp = tempfile::TempDir::new().expect("tmp");
    std::env::remove_var("APP_OCR_MODEL_DIR");
    let settings = OcrSettings { enabled: true, model_dir: Some(tmp.path().join("absent").display().to_string()) };
    let err = load_ocr_extractor(&settings).err().expect("should fail");
    assert!(err.to_string().contains("ocr.model_dir"), "{err}");
}
