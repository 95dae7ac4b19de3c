use super::*;
use crate::foundation::core::Resolution;

#[test]
fn transparent_src_is_noop() {
    let dst = [10, 20, 30, 255];
    assert_eq!(over(dst, [255, 255, 255, 0]), dst);
}

#[test]
fn opaque_src_replaces_dst() {
    assert_eq!(over([0, 0, 0, 255], [255, 0, 0, 255]), [255, 0, 0, 255]);
}

#[test]
fn half_black_box_darkens_opaque_background() {
    // Black at alpha 128 over white.
    let out = over([255, 255, 255, 255], [0, 0, 0, 128]);
    assert_eq!(out, [127, 127, 127, 255]);
}

#[test]
fn blit_clips_to_destination() {
    let mut frame = FrameRGBA::new(Resolution::new(4, 4).unwrap());
    for px in frame.data.chunks_exact_mut(4) {
        px.copy_from_slice(&[0, 0, 255, 255]);
    }
    let src = [255u8, 0, 0, 255].repeat(9);

    blit_over(&mut frame, &src, 3, 3, 2, -1).unwrap();
    assert_eq!(frame.pixel(2, 0), [255, 0, 0, 255]);
    assert_eq!(frame.pixel(3, 1), [255, 0, 0, 255]);
    assert_eq!(frame.pixel(1, 0), [0, 0, 255, 255]);
    assert_eq!(frame.pixel(2, 2), [0, 0, 255, 255]);
}

#[test]
fn blit_fully_outside_is_noop() {
    let mut frame = FrameRGBA::new(Resolution::new(2, 2).unwrap());
    let before = frame.clone();
    blit_over(&mut frame, &[255; 4], 1, 1, 5, 5).unwrap();
    assert_eq!(frame, before);
}

#[test]
fn blit_rejects_bad_buffer() {
    let mut frame = FrameRGBA::new(Resolution::new(2, 2).unwrap());
    assert!(blit_over(&mut frame, &[0; 5], 1, 1, 0, 0).is_err());
}
