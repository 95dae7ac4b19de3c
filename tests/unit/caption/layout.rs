use super::*;

const M: FontVMetrics = FontVMetrics {
    ascent: 30.0,
    descent: 10.0,
};

#[test]
fn centered_block_is_vertically_centered_in_hint() {
    let style = CaptionStyle::default();
    let g = plan_caption(&[400.0, 600.0], M, 1280, 360, &style, CaptionLayout::CenteredFrame);

    assert_eq!((g.width, g.height), (1280, 360));
    // Block is 2 * 50 = 100 px tall, starting at (360 - 100) / 2 = 130.
    // Glyph box 40 px in a 50 px slot: baseline at top + 5 + 30.
    assert_eq!(g.lines[0].baseline, 165.0);
    assert_eq!(g.lines[1].baseline, 215.0);
    assert_eq!(g.lines[0].x, 440.0);
    assert_eq!(g.lines[1].x, 340.0);
}

#[test]
fn box_covers_widest_line_plus_padding() {
    let style = CaptionStyle::default();
    let g = plan_caption(&[400.0, 600.0], M, 1280, 360, &style, CaptionLayout::CenteredFrame);
    assert_eq!(g.text_box, kurbo::Rect::new(330.0, 120.0, 950.0, 240.0));

    for line in &g.lines {
        assert!(f64::from(line.baseline - M.ascent) >= g.text_box.y0);
        assert!(f64::from(line.baseline + M.descent) <= g.text_box.y1);
    }
}

#[test]
fn bottom_anchored_block_sits_above_bottom_margin() {
    let style = CaptionStyle::default();
    let g = plan_caption(&[500.0], M, 960, 360, &style, CaptionLayout::BottomAnchored);
    assert_eq!(g.height, 360);
    // Block bottom = 360 - 40 = 320; one line of 50 starts at 270.
    assert_eq!(g.lines[0].baseline, 270.0 + 35.0);
    assert_eq!(g.text_box.y1, 330.0);
}

#[test]
fn tall_text_grows_the_image() {
    let style = CaptionStyle::default();
    let advances = vec![100.0; 10];
    let g = plan_caption(&advances, M, 1280, 360, &style, CaptionLayout::CenteredFrame);
    // 10 * 50 + 2 * 10 padding.
    assert_eq!(g.height, 520);
    assert_eq!(g.text_box.y0, 0.0);
    assert_eq!(g.text_box.y1, 520.0);
}

#[test]
fn wrap_width_subtracts_margin() {
    let style = CaptionStyle::default();
    assert_eq!(wrap_width(1280, &style), 1220.0);
    assert_eq!(wrap_width(10, &style), 1.0);
}

#[test]
fn frame_placement_per_layout() {
    assert_eq!(
        placement_on_frame(1280, 360, 1280, 720, CaptionLayout::CenteredFrame),
        (0, 180)
    );
    assert_eq!(
        placement_on_frame(640, 360, 1280, 720, CaptionLayout::BottomAnchored),
        (320, 360)
    );
    assert_eq!(caption_width(1280, 640, CaptionLayout::BottomAnchored), 640);
    assert_eq!(caption_width(1280, 1920, CaptionLayout::BottomAnchored), 1280);
    assert_eq!(caption_width(1280, 640, CaptionLayout::CenteredFrame), 1280);
}
