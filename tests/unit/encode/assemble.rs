use super::*;

fn solid(w: u32, h: u32, px: [u8; 4]) -> Frame {
    Frame::new(w, h, px.repeat((w * h) as usize)).unwrap()
}

#[test]
fn extensions_match_formats() {
    assert_eq!(OutputFormat::Apng.extension(), "png");
    assert_eq!(OutputFormat::Gif.extension(), "gif");
    assert!(OutputFormat::Gif.uses_key_compositing());
    assert!(!OutputFormat::Apng.uses_key_compositing());
}

#[test]
fn export_result_requires_consistent_input() {
    let a = solid(2, 2, [1, 2, 3, 255]);
    let b = solid(3, 2, [1, 2, 3, 255]);

    assert!(matches!(
        ExportResult::new(vec![], vec![]),
        Err(TurntableError::EncodeFailed(_))
    ));
    assert!(matches!(
        ExportResult::new(vec![a.clone(), b], vec![10, 10]),
        Err(TurntableError::EncodeFailed(_))
    ));
    assert!(matches!(
        ExportResult::new(vec![a.clone()], vec![10, 10]),
        Err(TurntableError::EncodeFailed(_))
    ));
    assert!(matches!(
        ExportResult::new(vec![a.clone()], vec![0]),
        Err(TurntableError::EncodeFailed(_))
    ));

    let ok = ExportResult::new(vec![a.clone(), a], vec![33, 33]).unwrap();
    assert_eq!(ok.len(), 2);
    assert_eq!(ok.geometry(), CanvasGeometry::new(2, 2).unwrap());
}

#[test]
fn zero_area_frames_are_rejected() {
    let empty = Frame::new(0, 4, Vec::new()).unwrap();
    assert!(matches!(
        ExportResult::new(vec![empty], vec![10]),
        Err(TurntableError::EncodeFailed(_))
    ));
}

#[test]
fn assemble_dispatches_on_format() {
    let frames = vec![solid(4, 4, [255, 0, 0, 255]); 3];
    let png = assemble(
        ExportResult::new(frames.clone(), vec![50; 3]).unwrap(),
        OutputFormat::Apng,
        &GifOpts::default(),
    )
    .unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let gif = assemble(
        ExportResult::new(frames, vec![50; 3]).unwrap(),
        OutputFormat::Gif,
        &GifOpts::default(),
    )
    .unwrap();
    assert_eq!(&gif[..6], b"GIF89a");
}
