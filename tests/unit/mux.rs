use super::*;
use crate::assets::media::AudioPcm;
use crate::background::SolidFrameSource;
use crate::caption::render::CaptionImage;
use crate::encode::sink::InMemorySink;
use crate::foundation::core::Resolution;
use crate::text::segment::Segment;
use crate::tts::synth::SynthesizedAudio;

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const GREY: [u8; 4] = [40, 40, 40, 255];

fn timeline(parts: &[(f64, [u8; 4])]) -> Timeline {
    let segments = (0..parts.len())
        .map(|index| Segment {
            index,
            text: format!("Frase {index}."),
        })
        .collect::<Vec<_>>();
    let audios = parts
        .iter()
        .enumerate()
        .map(|(i, &(d, _))| SynthesizedAudio {
            segment_index: i,
            path: PathBuf::from(format!("seg-{i}.mp3")),
            byte_len: 1,
            duration_secs: d,
            pcm: AudioPcm::default(),
        })
        .collect();
    let captions = parts
        .iter()
        .enumerate()
        .map(|(i, &(_, color))| CaptionImage {
            segment_index: i,
            width: 2,
            height: 2,
            rgba8_premul: color.repeat(4),
        })
        .collect();
    Timeline::build(&segments, audios, captions).unwrap()
}

#[test]
fn each_frame_shows_the_caption_active_at_its_start() {
    let tl = timeline(&[(1.0, RED), (0.5, GREEN)]);
    let fps = Fps::new(4, 1).unwrap();
    let frame_count = fps.frames_to_cover(tl.total_duration_secs);
    assert_eq!(frame_count, 6);

    let mut bg = SolidFrameSource::new(Resolution::new(4, 4).unwrap(), GREY);
    let mut sink = InMemorySink::new();
    let n = VideoMuxer::compose_frames(
        &tl,
        &mut bg,
        &mut sink,
        fps,
        frame_count,
        CaptionLayout::CenteredFrame,
        None,
    )
    .unwrap();

    assert_eq!(n, 6);
    assert!(sink.ended());
    assert_eq!(bg.frames_served, 6);
    let frames = sink.frames();
    assert_eq!(frames.len(), 6);
    for (i, (idx, frame)) in frames.iter().enumerate() {
        assert_eq!(idx.0, i as u64);
        let expected = if i < 4 { RED } else { GREEN };
        assert_eq!(frame.pixel(1, 1), expected, "frame {i}");
        assert_eq!(frame.pixel(2, 2), expected, "frame {i}");
        assert_eq!(frame.pixel(0, 0), GREY, "frame {i}");
        assert_eq!(frame.pixel(3, 3), GREY, "frame {i}");
    }
}

#[test]
fn bottom_anchored_caption_sits_on_the_bottom_edge() {
    let tl = timeline(&[(0.5, RED)]);
    let fps = Fps::new(2, 1).unwrap();
    let mut bg = SolidFrameSource::new(Resolution::new(4, 4).unwrap(), GREY);
    let mut sink = InMemorySink::new();
    VideoMuxer::compose_frames(
        &tl,
        &mut bg,
        &mut sink,
        fps,
        1,
        CaptionLayout::BottomAnchored,
        None,
    )
    .unwrap();

    let (_, frame) = &sink.frames()[0];
    assert_eq!(frame.pixel(1, 3), RED);
    assert_eq!(frame.pixel(2, 2), RED);
    assert_eq!(frame.pixel(1, 1), GREY);
}

#[test]
fn translucent_caption_blends_with_background() {
    let tl = timeline(&[(1.0, [0, 0, 0, 128])]);
    let fps = Fps::new(1, 1).unwrap();
    let mut bg = SolidFrameSource::new(Resolution::new(2, 2).unwrap(), [255, 255, 255, 255]);
    let mut sink = InMemorySink::new();
    VideoMuxer::compose_frames(
        &tl,
        &mut bg,
        &mut sink,
        fps,
        1,
        CaptionLayout::CenteredFrame,
        None,
    )
    .unwrap();
    assert_eq!(sink.frames()[0].1.pixel(0, 0), [127, 127, 127, 255]);
}

#[test]
fn audio_input_is_forwarded_to_sink() {
    let tl = timeline(&[(1.0, RED)]);
    let mut bg = SolidFrameSource::new(Resolution::new(2, 2).unwrap(), GREY);
    let mut sink = InMemorySink::new();
    VideoMuxer::compose_frames(
        &tl,
        &mut bg,
        &mut sink,
        Fps::new(1, 1).unwrap(),
        1,
        CaptionLayout::CenteredFrame,
        Some(AudioInputConfig {
            path: PathBuf::from("narration.f32le"),
            sample_rate: 48_000,
            channels: 2,
        }),
    )
    .unwrap();
    let cfg = sink.config().unwrap();
    assert_eq!(cfg.frame_count, 1);
    assert_eq!(cfg.audio.as_ref().unwrap().sample_rate, 48_000);
}

#[test]
fn partial_path_is_a_hidden_sibling_with_same_extension() {
    let out = Path::new("out/dir/story.mp4");
    let p = partial_output_path(out);
    assert_eq!(p.parent(), out.parent());
    let name = p.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(".story.partial-"), "{name}");
    assert_eq!(p.extension().unwrap(), "mp4");
    assert_ne!(partial_output_path(out), p);
}

#[test]
fn created_output_dirs_are_removed_on_release_and_kept_when_dismissed() {
    let root = PathBuf::from("target/unit_mux").join(uuid::Uuid::new_v4().simple().to_string());
    std::fs::create_dir_all(&root).unwrap();

    let mut rm = ResourceManager::new();
    let ids = create_output_dirs(&root.join("a/b/story.mp4"), &mut rm).unwrap();
    assert_eq!(ids.len(), 2);
    assert!(root.join("a/b").is_dir());
    assert!(rm.release_all().is_empty());
    assert!(!root.join("a").exists());
    assert!(root.is_dir());

    let ids = create_output_dirs(&root.join("c/story.mp4"), &mut rm).unwrap();
    for id in ids {
        assert!(rm.dismiss(id));
    }
    assert!(rm.release_all().is_empty());
    assert!(root.join("c").is_dir());

    assert!(create_output_dirs(&root.join("c/other.mp4"), &mut rm).unwrap().is_empty());
    let _ = std::fs::remove_dir_all(&root);
}
