// SPDX-License-Identifier: MPL-2.0
//! Best-effort extraction of embedded generation metadata.
//!
//! The generation pipeline embeds the positive prompt in the files it
//! writes: JPEG outputs carry it in the EXIF `UserComment` tag, PNG outputs
//! in a `tEXt` chunk. Both readers are deliberately forgiving: a file
//! without metadata, a bad signature, or a truncated chunk yields `None`
//! rather than an error. Chunk CRCs are not verified.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::warn;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Length of the EXIF `UserComment` character-code prefix (`UNICODE\0`).
const USER_COMMENT_PREFIX_LEN: usize = 8;

/// Extracts the embedded positive prompt from a generated image.
///
/// Dispatches on the file extension; unsupported extensions and unreadable
/// files return `None`.
pub fn extract_prompt(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => extract_jpeg_prompt(path),
        "png" => extract_png_prompt(path),
        _ => None,
    }
}

/// Reads the EXIF `UserComment` tag from a JPEG file.
///
/// A readable JPEG without EXIF data or without the tag still produces a
/// user-visible message; only an unreadable file produces `None`.
fn extract_jpeg_prompt(path: &Path) -> Option<String> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!("failed to open {:?}: {}", path, e);
            return None;
        }
    };
    let mut reader = BufReader::new(file);

    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(_) => return Some("JPG: Exif\nNo EXIF data found.".to_string()),
    };

    if let Some(field) = exif.get_field(exif::Tag::UserComment, exif::In::PRIMARY) {
        if let exif::Value::Undefined(ref raw, _) = field.value {
            return Some(format!(
                "JPG: Exif\nPositive prompt: {}",
                decode_user_comment(raw)
            ));
        }
    }

    Some("JPG: No User Comment found.".to_string())
}

/// Recovers prompt text from raw `UserComment` bytes.
///
/// The upstream tool writes an 8-byte `UNICODE\0` character code followed by
/// UTF-16-BE text whose high bytes are all zero. Skipping the prefix and the
/// first high byte, every second byte is the text.
fn decode_user_comment(raw: &[u8]) -> String {
    raw.iter()
        .skip(USER_COMMENT_PREFIX_LEN + 1)
        .step_by(2)
        .map(|&b| b as char)
        .collect()
}

/// Walks PNG chunks looking for the first `tEXt` chunk.
///
/// Returns `None` on a bad signature, truncation, or end-of-file without a
/// `tEXt` chunk.
fn extract_png_prompt(path: &Path) -> Option<String> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!("failed to open {:?}: {}", path, e);
            return None;
        }
    };
    let mut reader = BufReader::new(file);

    let mut signature = [0u8; 8];
    reader.read_exact(&mut signature).ok()?;
    if signature != PNG_SIGNATURE {
        return None;
    }

    loop {
        let mut length_bytes = [0u8; 4];
        reader.read_exact(&mut length_bytes).ok()?;
        let length = u32::from_be_bytes(length_bytes) as usize;

        let mut chunk_type = [0u8; 4];
        reader.read_exact(&mut chunk_type).ok()?;

        // The length field is untrusted; read what is actually there
        // instead of pre-allocating the claimed size.
        let mut payload = Vec::new();
        reader
            .by_ref()
            .take(length as u64)
            .read_to_end(&mut payload)
            .ok()?;
        if payload.len() != length {
            return None;
        }

        // CRC is read past, not verified.
        let mut crc = [0u8; 4];
        reader.read_exact(&mut crc).ok()?;

        if &chunk_type == b"tEXt" {
            let value = text_chunk_value(&payload)?;
            return Some(format!("PNG: tEXt\nPositive prompt: {}", value));
        }
    }
}

/// Splits a `tEXt` payload at the first NUL into keyword and value, and
/// decodes the value as text.
fn text_chunk_value(payload: &[u8]) -> Option<String> {
    let nul = payload.iter().position(|&b| b == 0)?;
    Some(String::from_utf8_lossy(&payload[nul + 1..]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    /// Builds a PNG chunk: length, type, payload, placeholder CRC.
    fn png_chunk(chunk_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut chunk = Vec::new();
        chunk.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        chunk.extend_from_slice(chunk_type);
        chunk.extend_from_slice(payload);
        chunk.extend_from_slice(&[0u8; 4]); // CRC is never checked
        chunk
    }

    fn write_png_with_text_chunk(dir: &Path, name: &str, keyword: &str, value: &str) -> PathBuf {
        let mut payload = Vec::new();
        payload.extend_from_slice(keyword.as_bytes());
        payload.push(0);
        payload.extend_from_slice(value.as_bytes());

        let mut data = Vec::new();
        data.extend_from_slice(&PNG_SIGNATURE);
        data.extend_from_slice(&png_chunk(b"tEXt", &payload));
        data.extend_from_slice(&png_chunk(b"IEND", &[]));

        let path = dir.join(name);
        fs::write(&path, data).expect("failed to write test png");
        path
    }

    /// Builds a minimal JPEG whose EXIF APP1 segment carries a `UserComment`
    /// in the upstream tool's encoding: `UNICODE\0` prefix + UTF-16-BE text.
    fn write_jpeg_with_user_comment(dir: &Path, name: &str, text: &str) -> PathBuf {
        let mut comment = Vec::new();
        comment.extend_from_slice(b"UNICODE\0");
        for unit in text.encode_utf16() {
            comment.extend_from_slice(&unit.to_be_bytes());
        }

        // Big-endian TIFF: IFD0 (one ExifIFDPointer entry) at offset 8,
        // Exif IFD (one UserComment entry) at 26, payload at 44.
        let mut tiff = Vec::new();
        tiff.extend_from_slice(&[0x4D, 0x4D, 0x00, 0x2A]);
        tiff.extend_from_slice(&8u32.to_be_bytes());

        tiff.extend_from_slice(&1u16.to_be_bytes());
        tiff.extend_from_slice(&0x8769u16.to_be_bytes()); // ExifIFDPointer
        tiff.extend_from_slice(&4u16.to_be_bytes()); // LONG
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&26u32.to_be_bytes());
        tiff.extend_from_slice(&0u32.to_be_bytes());

        tiff.extend_from_slice(&1u16.to_be_bytes());
        tiff.extend_from_slice(&0x9286u16.to_be_bytes()); // UserComment
        tiff.extend_from_slice(&7u16.to_be_bytes()); // UNDEFINED
        tiff.extend_from_slice(&(comment.len() as u32).to_be_bytes());
        tiff.extend_from_slice(&44u32.to_be_bytes());
        tiff.extend_from_slice(&0u32.to_be_bytes());
        tiff.extend_from_slice(&comment);

        let mut app1 = Vec::new();
        app1.extend_from_slice(b"Exif\0\0");
        app1.extend_from_slice(&tiff);

        let mut jpeg = Vec::new();
        jpeg.extend_from_slice(&[0xFF, 0xD8]); // SOI
        jpeg.extend_from_slice(&[0xFF, 0xE1]); // APP1
        jpeg.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
        jpeg.extend_from_slice(&app1);
        jpeg.extend_from_slice(&[0xFF, 0xD9]); // EOI

        let path = dir.join(name);
        fs::write(&path, jpeg).expect("failed to write test jpeg");
        path
    }

    /// Builds a minimal JPEG whose EXIF APP1 segment carries only a `Make`
    /// tag, so EXIF data exists but no `UserComment` does.
    fn write_jpeg_without_user_comment(dir: &Path, name: &str) -> PathBuf {
        // Big-endian TIFF: IFD0 with a single inline ASCII Make entry.
        let mut tiff = Vec::new();
        tiff.extend_from_slice(&[0x4D, 0x4D, 0x00, 0x2A]);
        tiff.extend_from_slice(&8u32.to_be_bytes());

        tiff.extend_from_slice(&1u16.to_be_bytes());
        tiff.extend_from_slice(&0x010Fu16.to_be_bytes()); // Make
        tiff.extend_from_slice(&2u16.to_be_bytes()); // ASCII
        tiff.extend_from_slice(&4u32.to_be_bytes());
        tiff.extend_from_slice(b"gen\0");
        tiff.extend_from_slice(&0u32.to_be_bytes());

        let mut app1 = Vec::new();
        app1.extend_from_slice(b"Exif\0\0");
        app1.extend_from_slice(&tiff);

        let mut jpeg = Vec::new();
        jpeg.extend_from_slice(&[0xFF, 0xD8]); // SOI
        jpeg.extend_from_slice(&[0xFF, 0xE1]); // APP1
        jpeg.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
        jpeg.extend_from_slice(&app1);
        jpeg.extend_from_slice(&[0xFF, 0xD9]); // EOI

        let path = dir.join(name);
        fs::write(&path, jpeg).expect("failed to write test jpeg");
        path
    }

    #[test]
    fn png_text_chunk_yields_prompt_message() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = write_png_with_text_chunk(temp_dir.path(), "gen.png", "Comment", "a prompt");

        let prompt = extract_prompt(&path);
        assert_eq!(
            prompt.as_deref(),
            Some("PNG: tEXt\nPositive prompt: a prompt")
        );
    }

    #[test]
    fn png_without_text_chunk_yields_none() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let mut data = Vec::new();
        data.extend_from_slice(&PNG_SIGNATURE);
        data.extend_from_slice(&png_chunk(b"IEND", &[]));
        let path = temp_dir.path().join("plain.png");
        fs::write(&path, data).expect("failed to write test png");

        assert_eq!(extract_prompt(&path), None);
    }

    #[test]
    fn png_with_bad_signature_yields_none() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("broken.png");
        fs::write(&path, b"definitely not a png").expect("failed to write test file");

        assert_eq!(extract_prompt(&path), None);
    }

    #[test]
    fn truncated_png_chunk_yields_none() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let mut data = Vec::new();
        data.extend_from_slice(&PNG_SIGNATURE);
        // Chunk header claims 100 payload bytes but the file ends early.
        data.extend_from_slice(&100u32.to_be_bytes());
        data.extend_from_slice(b"tEXt");
        data.extend_from_slice(b"short");
        let path = temp_dir.path().join("truncated.png");
        fs::write(&path, data).expect("failed to write test file");

        assert_eq!(extract_prompt(&path), None);
    }

    #[test]
    fn oversized_chunk_length_reads_what_exists_and_yields_none() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let mut data = Vec::new();
        data.extend_from_slice(&PNG_SIGNATURE);
        // Chunk header claims 4 GiB; only a handful of bytes follow.
        data.extend_from_slice(&u32::MAX.to_be_bytes());
        data.extend_from_slice(b"tEXt");
        data.extend_from_slice(b"Comment\0oops");
        let path = temp_dir.path().join("oversized.png");
        fs::write(&path, data).expect("failed to write test file");

        assert_eq!(extract_prompt(&path), None);
    }

    #[test]
    fn jpeg_user_comment_round_trips_prompt_text() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = write_jpeg_with_user_comment(temp_dir.path(), "gen.jpg", "prompt text");

        let prompt = extract_prompt(&path);
        assert_eq!(
            prompt.as_deref(),
            Some("JPG: Exif\nPositive prompt: prompt text")
        );
    }

    #[test]
    fn jpeg_with_exif_but_no_user_comment_reports_missing_tag() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = write_jpeg_without_user_comment(temp_dir.path(), "tagged.jpg");

        let prompt = extract_prompt(&path);
        assert_eq!(prompt.as_deref(), Some("JPG: No User Comment found."));
    }

    #[test]
    fn jpeg_without_exif_reports_no_exif_data() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("plain.jpg");
        image_rs::DynamicImage::new_rgb8(1, 1)
            .save(&path)
            .expect("failed to write test jpeg");

        let prompt = extract_prompt(&path);
        assert_eq!(prompt.as_deref(), Some("JPG: Exif\nNo EXIF data found."));
    }

    #[test]
    fn unsupported_extension_yields_none() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("readme.txt");
        fs::write(&path, b"hello").expect("failed to write test file");

        assert_eq!(extract_prompt(&path), None);
    }

    #[test]
    fn missing_file_yields_none() {
        assert_eq!(extract_prompt(Path::new("/nonexistent/gen.png")), None);
    }

    #[test]
    fn user_comment_decoding_skips_prefix_and_high_bytes() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"UNICODE\0");
        for unit in "a prompt".encode_utf16() {
            raw.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_user_comment(&raw), "a prompt");
    }

    #[test]
    fn empty_user_comment_decodes_to_empty_string() {
        assert_eq!(decode_user_comment(b"UNICODE\0"), "");
    }
}
