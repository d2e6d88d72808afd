use crate::wall::Wall;
use tracing::trace;

pub const MIN_FPS: u32 = 1;
pub const MAX_FPS: u32 = 60;

/// Ordered animation frames plus the working copy of the current one.
///
/// Every operation that moves the cursor or changes the frame list commits the
/// working wall first, so in-progress edits are never dropped.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    frames: Vec<Wall>,
    cur: usize,
    working: Wall,
    last_tick: Option<f64>,
}

impl FrameSequence {
    pub fn new(first: Wall) -> Self {
        Self {
            working: first.clone(),
            frames: vec![first],
            cur: 0,
            last_tick: None,
        }
    }

    /// Replace every frame with `frames`; an empty list is replaced by a blank frame.
    pub fn from_frames(frames: Vec<Wall>, blank: impl FnOnce() -> Wall) -> Self {
        let frames = if frames.is_empty() { vec![blank()] } else { frames };
        Self {
            working: frames[0].clone(),
            frames,
            cur: 0,
            last_tick: None,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Never true: the sequence holds at least one frame.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.cur
    }

    /// Committed frames. The current entry may lag behind [`FrameSequence::working`].
    pub fn frames(&self) -> &[Wall] {
        &self.frames
    }

    pub fn working(&self) -> &Wall {
        &self.working
    }

    pub fn working_mut(&mut self) -> &mut Wall {
        &mut self.working
    }

    pub fn previous_frame(&self) -> Option<&Wall> {
        self.cur.checked_sub(1).map(|idx| &self.frames[idx])
    }

    pub fn next_frame(&self) -> Option<&Wall> {
        self.frames.get(self.cur + 1)
    }

    /// Frames with the working wall folded into the current slot.
    pub fn snapshot(&self) -> Vec<Wall> {
        let mut frames = self.frames.clone();
        frames[self.cur] = self.working.clone();
        frames
    }

    pub fn commit(&mut self) {
        self.frames[self.cur] = self.working.clone();
    }

    fn load_current(&mut self) {
        self.working = self.frames[self.cur].clone();
    }

    /// Returns false at the first frame.
    pub fn goto_prev(&mut self) -> bool {
        if self.cur == 0 {
            return false;
        }

        self.commit();
        self.cur -= 1;
        self.load_current();
        true
    }

    /// Returns false at the last frame.
    pub fn goto_next(&mut self) -> bool {
        if self.cur + 1 >= self.frames.len() {
            return false;
        }

        self.commit();
        self.cur += 1;
        self.load_current();
        true
    }

    /// Insert `wall` (blank when `None`) after the cursor and move onto it.
    pub fn insert_after_current(&mut self, wall: Option<Wall>) {
        self.commit();
        let wall = wall.unwrap_or_else(|| Wall::new(self.working.cols(), self.working.rows()));
        self.frames.insert(self.cur + 1, wall);
        self.cur += 1;
        self.load_current();
    }

    pub fn duplicate_current(&mut self) {
        let copy = self.frames[self.cur].clone();
        self.insert_after_current(Some(copy));
    }

    /// Remove the current frame unless it is the only one.
    pub fn delete_current(&mut self) -> bool {
        if self.frames.len() <= 1 {
            return false;
        }

        self.frames.remove(self.cur);
        self.cur = self.cur.saturating_sub(1);
        self.load_current();
        true
    }

    /// Drop all frames in favour of a single one.
    pub fn reset(&mut self, wall: Wall) {
        *self = Self::new(wall);
    }

    pub fn resize_all(&mut self, cols: usize, rows: usize) {
        self.commit();
        for frame in &mut self.frames {
            *frame = frame.resized(cols, rows);
        }
        self.load_current();
    }

    /// Forget the playback baseline; the next tick starts a new period.
    pub fn stop_clock(&mut self) {
        self.last_tick = None;
    }

    /// Advance playback if a full frame period has elapsed since the last advance.
    ///
    /// `now` is a monotonic timestamp in milliseconds. The first tick only sets
    /// the baseline.
    pub fn tick(&mut self, now: f64, fps: u32, playing: bool) -> bool {
        if !playing {
            self.last_tick = None;
            return false;
        }

        let Some(last) = self.last_tick else {
            self.last_tick = Some(now);
            return false;
        };

        let delay = 1000.0 / f64::from(fps.max(MIN_FPS));
        if now - last < delay {
            return false;
        }

        self.commit();
        self.cur = (self.cur + 1) % self.frames.len();
        self.load_current();
        self.last_tick = Some(now);
        trace!(frame = self.cur, "playback advanced");

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color::Pixel, wall::ActivePanels};

    const RED: Pixel = Pixel::new(255, 0, 0);

    fn paint(seq: &mut FrameSequence, x: i32) {
        seq.working_mut().set_pixel(x, 0, RED, ActivePanels::ONE);
    }

    #[test]
    fn navigation_commits_working_edits() {
        let mut seq = FrameSequence::new(Wall::new(4, 4));
        seq.insert_after_current(None);
        paint(&mut seq, 1);

        assert!(seq.goto_prev());
        assert_eq!(seq.frames()[1].get_pixel(1, 0, ActivePanels::ONE), Some(RED));
        assert_eq!(seq.working().get_pixel(1, 0, ActivePanels::ONE), Some(Pixel::BLACK));
        assert!(!seq.goto_prev());

        assert!(seq.goto_next());
        assert_eq!(seq.working().get_pixel(1, 0, ActivePanels::ONE), Some(RED));
        assert!(!seq.goto_next());
    }

    #[test]
    fn insert_places_blank_after_cursor() {
        let mut seq = FrameSequence::new(Wall::new(4, 4));
        paint(&mut seq, 0);
        seq.insert_after_current(None);

        assert_eq!(seq.len(), 2);
        assert_eq!(seq.current_index(), 1);
        assert_eq!(seq.frames()[0].get_pixel(0, 0, ActivePanels::ONE), Some(RED));
        assert_eq!(seq.working(), &Wall::new(4, 4));
    }

    #[test]
    fn duplicate_copies_committed_frame() {
        let mut seq = FrameSequence::new(Wall::new(4, 4));
        paint(&mut seq, 2);
        seq.duplicate_current();

        assert_eq!(seq.len(), 2);
        assert_eq!(seq.current_index(), 1);
        // the edit lands in the source frame, the copy predates it
        assert_eq!(seq.frames()[0].get_pixel(2, 0, ActivePanels::ONE), Some(RED));
        assert_eq!(seq.working().get_pixel(2, 0, ActivePanels::ONE), Some(Pixel::BLACK));

        paint(&mut seq, 3);
        assert_eq!(seq.frames()[0].get_pixel(3, 0, ActivePanels::ONE), Some(Pixel::BLACK));
    }

    #[test]
    fn delete_keeps_one_frame() {
        let mut seq = FrameSequence::new(Wall::new(2, 2));
        seq.insert_after_current(None);
        seq.insert_after_current(None);
        assert_eq!(seq.current_index(), 2);

        assert!(seq.delete_current());
        assert_eq!(seq.current_index(), 1);
        assert!(seq.delete_current());
        assert_eq!(seq.current_index(), 0);
        assert!(!seq.delete_current());
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn delete_first_frame_stays_at_zero() {
        let mut seq = FrameSequence::new(Wall::new(2, 2));
        seq.insert_after_current(None);
        paint(&mut seq, 0);
        seq.goto_prev();

        assert!(seq.delete_current());
        assert_eq!(seq.current_index(), 0);
        assert_eq!(seq.working().get_pixel(0, 0, ActivePanels::ONE), Some(RED));
    }

    #[test]
    fn tick_waits_for_a_full_period() {
        let mut seq = FrameSequence::new(Wall::new(2, 2));
        seq.insert_after_current(None);
        seq.goto_prev();

        assert!(!seq.tick(0.0, 12, true));
        assert!(!seq.tick(80.0, 12, true));
        assert!(seq.tick(170.0, 12, true));
        assert_eq!(seq.current_index(), 1);

        // wraps around
        assert!(seq.tick(260.0, 12, true));
        assert_eq!(seq.current_index(), 0);
    }

    #[test]
    fn tick_is_inert_when_stopped() {
        let mut seq = FrameSequence::new(Wall::new(2, 2));
        seq.insert_after_current(None);
        assert!(!seq.tick(0.0, 60, false));
        assert!(!seq.tick(5000.0, 60, false));
        assert_eq!(seq.current_index(), 1);

        // stopping drops the baseline
        assert!(!seq.tick(6000.0, 60, true));
        assert!(seq.tick(6017.0, 60, true));
    }

    #[test]
    fn resize_all_touches_every_frame() {
        let mut seq = FrameSequence::new(Wall::new(2, 2));
        seq.insert_after_current(None);
        seq.resize_all(5, 3);
        assert!(seq.frames().iter().all(|wall| (wall.cols(), wall.rows()) == (5, 3)));
        assert_eq!(seq.working().cols(), 5);
    }
}
