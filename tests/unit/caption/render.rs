use super::*;

fn renderer() -> Option<CaptionRenderer> {
    match CaptionRenderer::from_style(CaptionStyle::default()) {
        Ok(r) => Some(r),
        Err(e) => {
            eprintln!("skipping: no caption font available: {e}");
            None
        }
    }
}

#[test]
fn caption_has_translucent_box_and_transparent_surroundings() {
    let Some(mut r) = renderer() else {
        return;
    };
    let img = r
        .render(0, "Hola. Mundo.", 1280, 360, CaptionLayout::CenteredFrame)
        .unwrap();

    assert_eq!((img.width, img.height), (1280, 360));
    assert_eq!(img.rgba8_premul.len(), 1280 * 360 * 4);
    // Corners are outside the box.
    assert_eq!(img.alpha_at(0, 0), 0);
    assert_eq!(img.alpha_at(1279, 359), 0);
    // Center of a one-line block is inside the box.
    assert!(img.alpha_at(640, 180) >= 120);
}

#[test]
fn long_text_wraps_and_grows_image() {
    let Some(mut r) = renderer() else {
        return;
    };
    let text = "palabra ".repeat(200);
    let img = r
        .render(3, &text, 640, 360, CaptionLayout::CenteredFrame)
        .unwrap();
    assert_eq!(img.segment_index, 3);
    assert_eq!(img.width, 640);
    assert!(img.height > 360, "height {}", img.height);
}

#[test]
fn bottom_anchored_text_sits_low() {
    let Some(mut r) = renderer() else {
        return;
    };
    let img = r
        .render(0, "Abajo.", 800, 360, CaptionLayout::BottomAnchored)
        .unwrap();
    assert_eq!(img.alpha_at(400, 60), 0);
    assert!(img.alpha_at(400, 300) > 0);
}

#[test]
fn straight_alpha_conversion_keeps_alpha() {
    let img = CaptionImage {
        segment_index: 0,
        width: 1,
        height: 1,
        rgba8_premul: vec![64, 0, 0, 128],
    };
    assert_eq!(img.to_straight_rgba8(), vec![128, 0, 0, 128]);
}

#[test]
fn zero_width_is_rejected() {
    let Some(mut r) = renderer() else {
        return;
    };
    assert!(r.render(0, "x.", 0, 360, CaptionLayout::CenteredFrame).is_err());
}

#[test]
fn png_export_round_trips_dimensions() {
    let img = CaptionImage {
        segment_index: 2,
        width: 3,
        height: 2,
        rgba8_premul: [0u8, 0, 0, 128].repeat(6),
    };
    let dir = std::path::PathBuf::from("target").join("unit_caption_png");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("caption-2.png");
    img.save_png(&path).unwrap();

    let back = image::open(&path).unwrap().to_rgba8();
    assert_eq!(back.dimensions(), (3, 2));
    assert_eq!(back.get_pixel(1, 1).0, [0, 0, 0, 128]);
}
