//! Attachment tests against the real filesystem.

use base64::Engine;
use courier::{encode_attachment, Attachment, AttachmentEncoding, FsSource, MailError};

// ============================================================================
// Constructor Tests
// ============================================================================

#[test]
fn from_path_names_attachment_after_file() {
    let attachment = Attachment::from_path("/srv/exports/2024-q1.csv");
    assert_eq!(attachment.name, "2024-q1.csv");
    assert_eq!(attachment.content_type(), "text/csv");
}

#[test]
fn content_type_is_guessed_from_extension() {
    assert_eq!(Attachment::new("x", "photo.jpg").content_type(), "image/jpeg");
    assert_eq!(Attachment::new("x", "archive.zip").content_type(), "application/zip");
    assert_eq!(Attachment::new("x", "data.bin").content_type(), "application/octet-stream");
}

// ============================================================================
// Encoding Tests
// ============================================================================

#[test]
fn encodes_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.png");
    let data: Vec<u8> = (0u8..=255).rev().collect();
    std::fs::write(&path, &data).unwrap();

    let part = encode_attachment(
        &Attachment::new("Holiday photo.png", path.to_string_lossy()),
        &FsSource,
        AttachmentEncoding::Base64,
    )
    .unwrap();

    assert_eq!(part.headers.get("Content-Type"), Some("image/png"));
    assert_eq!(
        part.headers.get("Content-Disposition"),
        Some("attachment; filename=\"Holiday photo.png\"")
    );

    let joined: String = String::from_utf8(part.body).unwrap().split("\r\n").collect();
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(joined)
        .unwrap();
    assert_eq!(decoded, data);
}

#[test]
fn raw_encoding_keeps_file_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "first\r\nsecond").unwrap();

    let part = encode_attachment(
        &Attachment::from_path(&path),
        &FsSource,
        AttachmentEncoding::Raw,
    )
    .unwrap();
    assert_eq!(part.body, b"first\r\nsecond");
    assert_eq!(part.headers.get("Content-Disposition"), Some("attachment; filename=\"notes.txt\""));
}

#[test]
fn missing_file_fails_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.pdf");
    let attachment = Attachment::from_path(&path);

    let err = encode_attachment(&attachment, &FsSource, AttachmentEncoding::Base64).unwrap_err();
    assert_eq!(
        err,
        MailError::AttachmentReadFailed {
            path: path.to_string_lossy().into_owned(),
            message: match std::fs::read(&path) {
                Err(e) => e.to_string(),
                Ok(_) => unreachable!(),
            },
        }
    );
}
