use super::*;

fn constant(value: f32, channels: u16, duration: Option<f64>) -> AudioClip {
    AudioClip::from_fn(
        move |tt: &[Time]| {
            SoundArray::new(channels, vec![value; tt.len() * usize::from(channels)])
        },
        channels,
        duration,
        Some(10.0),
    )
}

#[test]
fn mix_respects_each_clip_window() {
    let a = constant(0.25, 1, Some(1.0));
    let b = constant(0.5, 1, Some(1.0)).with_start(0.5, true);
    let mut mix = CompositeAudioClip::new(vec![a, b]).build().unwrap();
    assert_eq!(mix.end(), Some(1.5));
    assert_eq!(mix.duration(), Some(1.5));
    let snd = mix.get_frames(&[0.0, 0.75, 1.25, 2.0]).unwrap();
    assert_eq!(snd.samples(), &[0.25, 0.75, 0.5, 0.0]);
}

#[test]
fn children_are_evaluated_in_local_time() {
    let ramp = AudioClip::from_fn(
        |tt: &[Time]| SoundArray::new(1, tt.iter().map(|t| *t as f32).collect()),
        1,
        Some(2.0),
        None,
    )
    .with_start(1.0, true);
    let mut mix = CompositeAudioClip::new(vec![ramp]).build().unwrap();
    let snd = mix.get_frames(&[1.5, 2.5]).unwrap();
    assert_eq!(snd.samples(), &[0.5, 1.5]);
}

#[test]
fn mono_is_broadcast_to_stereo() {
    let mono = constant(0.25, 1, Some(1.0));
    let stereo = constant(0.5, 2, Some(1.0));
    let mut mix = CompositeAudioClip::new(vec![mono, stereo]).build().unwrap();
    assert_eq!(mix.nchannels(), 2);
    assert_eq!(mix.get_frames(&[0.1]).unwrap().samples(), &[0.75, 0.75]);
}

#[test]
fn unbounded_child_leaves_mix_unbounded() {
    let mix = CompositeAudioClip::new(vec![constant(0.1, 1, Some(1.0)), constant(0.1, 1, None)])
        .build()
        .unwrap();
    assert_eq!(mix.duration(), None);
    assert_eq!(mix.end(), None);
}

#[test]
fn empty_mix_is_rejected() {
    assert!(CompositeAudioClip::new(Vec::new()).build().is_err());
}
