use super::*;

const MP4_INFOS: &str = "\
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'clip.mp4':
  Metadata:
    major_brand     : isom
  Duration: 00:00:10.03, start: 0.000000, bitrate: 1205 kb/s
    Stream #0:0(und): Video: h264 (High) (avc1 / 0x31637661), yuv420p, 1280x720 [SAR 1:1 DAR 16:9], 1070 kb/s, 29.97 fps, 29.97 tbr, 30k tbn, 59.94 tbc (default)
    Metadata:
      rotate          : 90
      handler_name    : VideoHandler
    Stream #0:1(und): Audio: aac (LC) (mp4a / 0x6134706D), 44100 Hz, stereo, fltp, 128 kb/s (default)
At least one output file must be specified
";

#[test]
fn parses_a_typical_mp4_banner() {
    let info = parse_infos(MP4_INFOS, true, FpsSource::Tbr, false).unwrap();
    assert_eq!(info.duration, Some(10.03));
    assert!(info.video_found);
    assert_eq!(info.video_size, Some(Size::new(1280, 720)));
    let fps = info.video_fps.unwrap();
    assert!((fps - 30.0 * 1000.0 / 1001.0).abs() < 1e-9);
    assert_eq!(info.video_nframes, Some((10.03 * fps) as u64 + 1));
    assert_eq!(info.video_duration, Some(10.03));
    assert_eq!(info.video_rotation, 90);
    assert!(info.audio_found);
    assert_eq!(info.audio_fps, Some(44_100));
}

#[test]
fn fps_source_picks_the_field_and_falls_back() {
    let line = "Duration: 00:00:01.00, start: 0\n  Stream #0:0: Video: vp9, yuv420p, 64x48, 24 fps, 1k tbr, 1k tbn\n";
    let tbr = parse_infos(line, true, FpsSource::Tbr, false).unwrap();
    assert_eq!(tbr.video_fps, Some(1000.0));
    let fps = parse_infos(line, true, FpsSource::Fps, false).unwrap();
    assert_eq!(fps.video_fps, Some(24.0));

    let only_fps = "Duration: 00:00:01.00\n  Stream #0:0: Video: vp9, 64x48, 12 fps\n";
    let info = parse_infos(only_fps, true, FpsSource::Tbr, false).unwrap();
    assert_eq!(info.video_fps, Some(12.0));
}

#[test]
fn exact_rates_are_not_snapped() {
    let text = "Duration: 00:00:02.00\n  Stream #0:0: Video: h264, 10x10, 25 fps, 25 tbr\n";
    let info = parse_infos(text, true, FpsSource::Tbr, false).unwrap();
    assert_eq!(info.video_fps, Some(25.0));
    assert_eq!(info.video_nframes, Some(51));
}

#[test]
fn audio_only_file_has_no_video() {
    let text = "Input #0, wav, from 'a.wav':\n  Duration: 00:01:00.50, bitrate: 1411 kb/s\n    Stream #0:0: Audio: pcm_s16le ([1][0][0][0] / 0x0001), 22050 Hz, 2 channels, s16, 705 kb/s\n";
    let info = parse_infos(text, true, FpsSource::Tbr, false).unwrap();
    assert_eq!(info.duration, Some(60.5));
    assert!(!info.video_found);
    assert_eq!(info.video_fps, None);
    assert_eq!(info.audio_fps, Some(22_050));
}

#[test]
fn gif_duration_comes_from_the_last_progress_line() {
    let text = "  Stream #0:0: Video: gif, bgra, 32x32, 10 fps, 10 tbr\n\
                frame=    5 fps=0.0 q=-0.0 size=N/A time=00:00:00.50 bitrate=N/A\n\
                frame=   12 fps=0.0 q=-0.0 Lsize=N/A time=00:00:01.50 bitrate=N/A\n";
    let info = parse_infos(text, true, FpsSource::Tbr, true).unwrap();
    assert_eq!(info.duration, Some(1.5));
    assert_eq!(info.video_nframes, Some(16));
}

#[test]
fn skipping_the_duration_yields_one_frame() {
    let text = "  Stream #0:0: Video: png, rgba, 8x4, 25 tbr\n";
    let info = parse_infos(text, false, FpsSource::Tbr, false).unwrap();
    assert_eq!(info.duration, None);
    assert_eq!(info.video_nframes, Some(1));
    assert_eq!(info.video_size, Some(Size::new(8, 4)));
}

#[test]
fn missing_file_and_missing_duration_are_probe_errors() {
    let missing = "nope.mp4: No such file or directory\n";
    assert!(matches!(
        parse_infos(missing, true, FpsSource::Tbr, false),
        Err(MontageError::Probe(_))
    ));
    let no_duration = "  Stream #0:0: Video: h264, 10x10, 25 tbr\n";
    let err = parse_infos(no_duration, true, FpsSource::Tbr, false).unwrap_err();
    assert!(err.to_string().contains("duration"));
}

#[test]
fn video_without_a_rate_is_a_probe_error() {
    let text = "Duration: 00:00:01.00\n  Stream #0:0: Video: h264, 10x10\n";
    assert!(matches!(
        parse_infos(text, true, FpsSource::Fps, false),
        Err(MontageError::Probe(_))
    ));
}

#[test]
fn helper_scanners() {
    assert_eq!(find_clock("time=01:02:03.45 bitrate"), Some("01:02:03.45"));
    assert_eq!(find_clock("12:34"), None);
    assert_eq!(
        find_frame_size("Video: h264 (avc1 / 0x31637661), 640x480, 25 fps"),
        Some(Size::new(640, 480))
    );
    assert_eq!(number_before("48k Hz", "Hz"), Some(48_000.0));
    assert_eq!(trailing_integer("    rotate          : 270"), Some(270));
    assert!((snap_ntsc(23.98) - 24_000.0 / 1001.0).abs() < 1e-9);
}
