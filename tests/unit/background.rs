use super::*;

fn source(duration_sec: f64, width: u32, height: u32) -> BackgroundSource {
    BackgroundSource {
        info: VideoSourceInfo {
            source_path: PathBuf::from("bg.mp4"),
            width,
            height,
            fps_num: 30,
            fps_den: 1,
            duration_sec,
            has_audio: true,
        },
    }
}

fn compositor(target: Option<Resolution>, policy: ResizePolicy) -> BackgroundCompositor {
    BackgroundCompositor {
        target_resolution: target,
        resize_policy: policy,
        fps: Fps::new(24, 1).unwrap(),
    }
}

#[test]
fn loop_count_covers_total() {
    assert_eq!(loop_count(5.0, 12.0), 3);
    assert_eq!(loop_count(5.0, 10.0), 2);
    assert_eq!(loop_count(5.0, 3.0), 1);
    assert_eq!(loop_count(5.0, 5.0), 1);
    assert_eq!(loop_count(4.0, 12.000000001), 3);
    assert_eq!(loop_count(0.0, 3.0), 1);
}

#[test]
fn pieces_sum_to_total() {
    assert_eq!(loop_pieces(5.0, 12.0), vec![5.0, 5.0, 2.0]);
    assert_eq!(loop_pieces(10.0, 4.0), vec![4.0]);
    for (native, total) in [(3.3, 10.0), (0.7, 9.1), (12.0, 11.999)] {
        let pieces = loop_pieces(native, total);
        let sum: f64 = pieces.iter().sum();
        assert!((sum - total).abs() < 1e-9, "{native} {total}");
        assert_eq!(pieces.len() as u32, loop_count(native, total));
    }
}

#[test]
fn short_background_is_looped_then_trimmed() {
    let c = compositor(Some(Resolution::new(1280, 720).unwrap()), ResizePolicy::Stretch);
    let track = c.prepare(&source(5.0, 640, 360), 12.0).unwrap();
    assert_eq!(track.loop_count, 3);
    assert_eq!(track.trimmed_duration_secs, 12.0);
    assert_eq!(track.resolution, Resolution::new(1280, 720).unwrap());
    assert_eq!(track.frame_count(), 288);
    assert_eq!(track.filter, "scale=1280:720,setsar=1,fps=24");
}

#[test]
fn long_background_is_trimmed_only() {
    let c = compositor(None, ResizePolicy::Stretch);
    let track = c.prepare(&source(30.0, 1921, 1081), 7.5).unwrap();
    assert_eq!(track.loop_count, 1);
    assert_eq!(track.pieces, vec![7.5]);
    assert_eq!(track.resolution, Resolution::new(1920, 1080).unwrap());
    assert_eq!(track.native_resolution.width, 1921);
}

#[test]
fn letterbox_policy_pads() {
    let c = compositor(Some(Resolution::new(1280, 720).unwrap()), ResizePolicy::Letterbox);
    let track = c.prepare(&source(5.0, 720, 1280), 2.0).unwrap();
    assert!(track.filter.contains("pad=1280:720"));
}

#[test]
fn piece_frames_partition_the_output() {
    let fps = Fps::new(24, 1).unwrap();
    assert_eq!(
        piece_frame_counts(&[5.0, 5.0, 2.0], fps, 288),
        vec![120, 120, 48]
    );
    let counts = piece_frame_counts(&[1.01, 1.01, 0.5], fps, fps.frames_to_cover(2.52));
    assert_eq!(counts.iter().sum::<u64>(), fps.frames_to_cover(2.52));
}

#[test]
fn missing_background_is_load_error() {
    let err = BackgroundSource::probe(Path::new("no/such/background.mp4")).unwrap_err();
    assert!(matches!(err, NarrationError::BackgroundLoad(_)));
}

#[test]
fn zero_total_duration_is_rejected() {
    let c = compositor(None, ResizePolicy::Stretch);
    assert!(c.prepare(&source(5.0, 640, 360), 0.0).is_err());
}

#[test]
fn solid_source_fills_frames() {
    let r = Resolution::new(4, 2).unwrap();
    let mut s = SolidFrameSource::new(r, [1, 2, 3, 255]);
    let mut buf = vec![0u8; r.rgba8_len()];
    s.next_frame(&mut buf).unwrap();
    assert!(buf.chunks_exact(4).all(|p| p == [1, 2, 3, 255]));
    assert_eq!(s.frames_served, 1);
    assert!(s.next_frame(&mut [0u8; 3]).is_err());
}
