use super::*;
use std::cell::Cell;

#[derive(Clone)]
struct Probe {
    span: Span,
    child: Option<Span>,
    cache: FrameCache<f64>,
    calls: Rc<Cell<usize>>,
    fps: Option<f64>,
}

impl Probe {
    fn new(duration: Option<f64>) -> Self {
        Self {
            span: Span::with_duration(duration),
            child: Some(Span::with_duration(duration)),
            cache: FrameCache::default(),
            calls: Rc::new(Cell::new(0)),
            fps: None,
        }
    }
}

impl Clip for Probe {
    type Frame = f64;

    fn span(&self) -> &Span {
        &self.span
    }

    fn fps(&self) -> Option<f64> {
        self.fps
    }

    fn cache(&mut self) -> &mut FrameCache<f64> {
        &mut self.cache
    }

    fn make_frame(&mut self, t: Time) -> MontageResult<f64> {
        self.calls.set(self.calls.get() + 1);
        Ok(t * 10.0)
    }

    fn for_each_span(&mut self, edit: &mut dyn FnMut(&mut Span)) {
        edit(&mut self.span);
        if let Some(child) = self.child.as_mut() {
            edit(child);
        }
    }
}

#[test]
fn timing_edits_return_new_clips_and_propagate_to_children() {
    let clip = Probe::new(Some(2.0));
    let moved = clip.with_start(3.0, true);
    assert_eq!(clip.start(), 0.0);
    assert_eq!(moved.start(), 3.0);
    assert_eq!(moved.end(), Some(5.0));
    assert_eq!(moved.child.unwrap().end, Some(5.0));
}

#[test]
fn with_duration_holds_for_any_duration() {
    let clip = Probe::new(None).with_start(1.25, true);
    for d in [0.0, 0.5, 3.0, 100.0] {
        let c = clip.with_duration(Some(d), true).unwrap();
        assert_eq!(c.duration(), Some(d));
        assert_eq!(c.end(), Some(c.start() + d));
    }
}

#[test]
fn with_duration_failure_leaves_original_untouched() {
    let clip = Probe::new(None);
    assert!(clip.with_duration(Some(1.0), false).is_err());
    assert_eq!(clip.duration(), None);
}

#[test]
fn memoization_hits_only_on_exact_time() {
    let mut clip = Probe::new(Some(1.0)).with_memoize(true);
    assert_eq!(clip.get_frame(0.5).unwrap(), 5.0);
    assert_eq!(clip.get_frame(0.5).unwrap(), 5.0);
    assert_eq!(clip.calls.get(), 1);
    clip.get_frame(0.5 + 1e-12).unwrap();
    assert_eq!(clip.calls.get(), 2);
}

#[test]
fn without_memoization_every_call_computes() {
    let mut clip = Probe::new(Some(1.0));
    clip.get_frame(0.5).unwrap();
    clip.get_frame(0.5).unwrap();
    assert_eq!(clip.calls.get(), 2);
}

#[test]
fn iter_frames_stops_strictly_before_duration() {
    let mut clip = Probe::new(Some(1.0));
    let times: Vec<f64> = clip
        .iter_frames(Some(4.0))
        .unwrap()
        .map(|r| r.unwrap().0)
        .collect();
    assert_eq!(times, vec![0.0, 0.25, 0.5, 0.75]);
}

#[test]
fn iter_frames_is_restartable_and_counts() {
    let mut clip = Probe::new(Some(0.5));
    clip.fps = Some(10.0);
    let it = clip.iter_frames(None).unwrap();
    assert_eq!(it.total_frames(), 5);
    assert_eq!(it.count(), 5);
    assert_eq!(clip.iter_frames(None).unwrap().count(), 5);
}

#[test]
fn iter_frames_requires_duration_and_fps() {
    let mut unbounded = Probe::new(None);
    assert!(matches!(
        unbounded.iter_frames(Some(1.0)).map(|_| ()),
        Err(MontageError::Configuration(_))
    ));
    let mut no_fps = Probe::new(Some(1.0));
    assert!(matches!(
        no_fps.iter_frames(None).map(|_| ()),
        Err(MontageError::Configuration(_))
    ));
    assert!(matches!(
        no_fps.iter_frames(Some(0.0)).map(|_| ()),
        Err(MontageError::Validation(_))
    ));
}
