use std::io::Cursor;

use anyhow::anyhow;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{ImageFormat, Luma};
use qrcode::QrCode;

const MIN_SIZE: u32 = 256;

/// Renders `text` as a QR code and returns it as a PNG `data:` URL.
pub fn png_data_url(text: &str) -> anyhow::Result<String> {
    let code = QrCode::new(text.as_bytes()).map_err(|e| anyhow!("cannot encode {text} as QR: {e}"))?;
    let img = code.render::<Luma<u8>>().min_dimensions(MIN_SIZE, MIN_SIZE).build();

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(&png)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_becomes_png_data_url() {
        let url = png_data_url("http://127.0.0.1:5173/").unwrap();
        let payload = url.strip_prefix("data:image/png;base64,").unwrap();
        let png = BASE64.decode(payload).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert!(decoded.width() >= MIN_SIZE);
    }
}
