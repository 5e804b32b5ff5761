use super::*;

fn strings(args: Vec<OsString>) -> Vec<String> {
    args.into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn subclip_copies_streams_between_the_cut_points() {
    let args = strings(extract_subclip_args(
        Path::new("in.mp4"),
        1.5,
        4.0,
        Path::new("out.mp4"),
    ));
    assert_eq!(
        args,
        [
            "-y", "-ss", "1.50", "-i", "in.mp4", "-t", "2.50", "-map", "0", "-vcodec", "copy",
            "-acodec", "copy", "out.mp4"
        ]
    );
}

#[test]
fn subclip_default_name_encodes_the_range_in_ms() {
    assert_eq!(
        subclip_target_name(Path::new("clips/take.mp4"), 1.0, 2.5),
        PathBuf::from("clips/take_SUB1000_2500.mp4")
    );
    assert_eq!(
        subclip_target_name(Path::new("raw"), 0.0, 1.0),
        PathBuf::from("raw_SUB0_1000")
    );
}

#[test]
fn invalid_subclip_range_is_rejected_before_spawning() {
    let cfg = MediaConfig {
        ffmpeg_binary: PathBuf::from("/nonexistent/ffmpeg"),
        ..MediaConfig::default()
    };
    let err = extract_subclip(Path::new("a.mp4"), 3.0, 1.0, Path::new("b.mp4"), &cfg).unwrap_err();
    assert!(matches!(err, MontageError::Validation(_)));
}

#[test]
fn merge_puts_audio_first() {
    let args = strings(merge_video_audio_args(
        Path::new("v.mp4"),
        Path::new("a.mp3"),
        Path::new("o.mp4"),
        "copy",
        "aac",
    ));
    assert_eq!(
        args,
        ["-y", "-i", "a.mp3", "-i", "v.mp4", "-vcodec", "copy", "-acodec", "aac", "o.mp4"]
    );
}

#[test]
fn extract_audio_and_resize_args() {
    let args = strings(extract_audio_args(
        Path::new("v.mp4"),
        Path::new("a.mp3"),
        3000,
        44_100,
    ));
    assert_eq!(args, ["-y", "-i", "v.mp4", "-ab", "3000k", "-ar", "44100", "a.mp3"]);

    let args = strings(resize_video_args(
        Path::new("v.mp4"),
        Path::new("small.mp4"),
        Size::new(320, 240),
    ));
    assert_eq!(args, ["-y", "-i", "v.mp4", "-vf", "scale=320:240", "small.mp4"]);
}

#[test]
fn frames_pattern_uses_the_digit_count() {
    let args = strings(movie_from_frames_args(
        Path::new("frames"),
        24.0,
        6,
        2000,
        Path::new("movie.mp4"),
    ));
    assert_eq!(args[4], "24");
    assert_eq!(
        PathBuf::from(&args[6]),
        Path::new("frames").join("%06d.png")
    );
    assert!(args.windows(2).any(|w| w == ["-b", "2000k"]));
    assert_eq!(args.last().unwrap(), "movie.mp4");
}

#[cfg(unix)]
#[test]
fn tool_failures_surface_stderr() {
    let cfg = MediaConfig {
        ffmpeg_binary: PathBuf::from("false"),
        ..MediaConfig::default()
    };
    let err = resize_video(
        Path::new("in.mp4"),
        Path::new("out.mp4"),
        Size::new(2, 2),
        &cfg,
    )
    .unwrap_err();
    assert!(matches!(err, MontageError::Encode(_)));
}
