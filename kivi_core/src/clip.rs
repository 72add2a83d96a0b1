// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recorded timelines of frames.
//!
//! A [`Clip`] is an append-only, arrival-ordered list of frames under a
//! name. Its frame count is published through a [`ClipLength`] handle that
//! other parts of the application (a timeline slider, a status line) can
//! hold and read without borrowing the clip.
//!
//! A [`ClipLibrary`] holds several clips and tracks which one is current.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::frame::{Frame, RejectedFrame, decode_stream};
use crate::time::{Duration, Timestamp};

/// Shared, read-only view of a clip's frame count.
///
/// Cloning the handle is cheap; every clone observes the same count, which
/// is updated after each append.
#[derive(Clone, Debug, Default)]
pub struct ClipLength(Arc<AtomicUsize>);

impl ClipLength {
    /// Returns the frame count as of the most recent append.
    #[must_use]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, len: usize) {
        self.0.store(len, Ordering::Release);
    }
}

/// A named, arrival-ordered sequence of frames.
#[derive(Debug)]
pub struct Clip {
    name: String,
    frames: Vec<Frame>,
    length: ClipLength,
}

impl Clip {
    /// Creates an empty clip.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frames: Vec::new(),
            length: ClipLength::default(),
        }
    }

    /// Returns the clip's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the clip.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Appends a frame and publishes the new length.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
        self.length.set(self.frames.len());
    }

    /// Decodes `buffers` in order, appending every valid frame.
    ///
    /// The length is published after each append, so a [`ClipLength`]
    /// observer sees the count grow while a long batch is still decoding.
    /// Returns the buffers that failed to decode; they are skipped and the
    /// rest are still appended.
    pub fn ingest<I>(&mut self, buffers: I) -> Vec<RejectedFrame>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut rejected = Vec::new();
        for result in decode_stream(buffers) {
            match result {
                Ok(frame) => self.push(frame),
                Err(e) => rejected.push(e),
            }
        }
        rejected
    }

    /// Returns the number of frames.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns whether the clip has no frames.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns a handle that tracks this clip's frame count.
    #[must_use]
    pub fn length_handle(&self) -> ClipLength {
        self.length.clone()
    }

    /// Returns the frames in arrival order.
    #[inline]
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Returns the frame at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Returns whether timestamps never decrease along the clip. Equal
    /// neighbours are allowed; empty and single-frame clips are sorted.
    #[must_use]
    pub fn is_timestamp_sorted(&self) -> bool {
        self.frames
            .windows(2)
            .all(|w| w[0].timestamp() <= w[1].timestamp())
    }

    /// Returns the timestamp of the last frame minus that of the first.
    ///
    /// Zero for clips with fewer than two frames. The clip is not required to
    /// be sorted; if the last timestamp precedes the first the result
    /// saturates to zero.
    #[must_use]
    pub fn duration(&self) -> Duration {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) if self.frames.len() > 1 => {
                last.timestamp().saturating_duration_since(first.timestamp())
            }
            _ => Duration::ZERO,
        }
    }

    /// Returns the first and last timestamps, if any.
    #[must_use]
    pub fn time_span(&self) -> Option<(Timestamp, Timestamp)> {
        Some((
            self.frames.first()?.timestamp(),
            self.frames.last()?.timestamp(),
        ))
    }

    /// Iterates, in arrival order, the frames stamped at or before `until`.
    pub fn frames_until(&self, until: Timestamp) -> impl Iterator<Item = &Frame> + '_ {
        self.frames.iter().filter(move |f| f.timestamp() <= until)
    }
}

/// A set of clips with one optionally marked as current.
#[derive(Debug, Default)]
pub struct ClipLibrary {
    clips: Vec<Clip>,
    current: Option<usize>,
}

impl ClipLibrary {
    /// Creates an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a clip and returns its index. The first clip added becomes
    /// current.
    pub fn push(&mut self, clip: Clip) -> usize {
        let index = self.clips.len();
        self.clips.push(clip);
        self.current.get_or_insert(index);
        index
    }

    /// Makes the clip at `index` current. Returns `false` (and changes
    /// nothing) if there is no such clip.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.clips.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    /// Index of the current clip.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The current clip.
    #[must_use]
    pub fn current(&self) -> Option<&Clip> {
        self.clips.get(self.current?)
    }

    /// The current clip, mutably.
    pub fn current_mut(&mut self) -> Option<&mut Clip> {
        self.clips.get_mut(self.current?)
    }

    /// The clip at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Clip> {
        self.clips.get(index)
    }

    /// Finds a clip by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.name() == name)
    }

    /// Number of clips.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Returns whether the library is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Iterates the clips in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Clip> + '_ {
        self.clips.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Payload;

    fn frame(t: u128) -> Frame {
        Frame::new(Timestamp(t), "a", Payload::NullData)
    }

    fn clip_of(times: &[u128]) -> Clip {
        let mut clip = Clip::new("test");
        for &t in times {
            clip.push(frame(t));
        }
        clip
    }

    #[test]
    fn push_publishes_length() {
        let mut clip = Clip::new("run");
        let length = clip.length_handle();
        assert_eq!(length.get(), 0);
        clip.push(frame(1));
        clip.push(frame(2));
        assert_eq!(length.get(), 2);
        assert_eq!(clip.len(), 2);
        assert_eq!(clip.length_handle().get(), 2);
    }

    #[test]
    fn length_is_visible_across_threads() {
        let mut clip = Clip::new("run");
        let length = clip.length_handle();
        clip.push(frame(1));
        let seen = std::thread::spawn(move || length.get()).join().unwrap();
        assert_eq!(seen, 1);
    }

    #[test]
    fn sortedness() {
        assert!(clip_of(&[10, 10, 20]).is_timestamp_sorted());
        assert!(!clip_of(&[20, 10]).is_timestamp_sorted());
        assert!(clip_of(&[]).is_timestamp_sorted());
        assert!(clip_of(&[5]).is_timestamp_sorted());
    }

    #[test]
    fn duration_is_last_minus_first() {
        assert_eq!(clip_of(&[5, 5, 30]).duration(), Duration(25));
        assert_eq!(clip_of(&[]).duration(), Duration::ZERO);
        assert_eq!(clip_of(&[7]).duration(), Duration::ZERO);
        assert_eq!(clip_of(&[30, 5]).duration(), Duration::ZERO);
    }

    #[test]
    fn frames_until_is_inclusive() {
        let clip = clip_of(&[1, 5, 3, 9]);
        let picked: Vec<_> = clip.frames_until(Timestamp(5)).map(Frame::timestamp).collect();
        assert_eq!(picked, vec![Timestamp(1), Timestamp(5), Timestamp(3)]);
        assert_eq!(clip.time_span(), Some((Timestamp(1), Timestamp(9))));
    }

    #[test]
    fn ingest_skips_rejected_buffers() {
        let mut clip = Clip::new("wire");
        let length = clip.length_handle();
        let buffers = vec![
            frame(1).encode().unwrap(),
            vec![0xff; 3],
            frame(2).encode().unwrap(),
        ];
        let rejected = clip.ingest(&buffers);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].index, 1);
        assert_eq!(clip.len(), 2);
        assert_eq!(length.get(), 2);
    }

    #[test]
    fn ingest_publishes_length_per_frame() {
        let mut clip = Clip::new("wire");
        let length = clip.length_handle();
        let buffers = vec![
            frame(1).encode().unwrap(),
            frame(2).encode().unwrap(),
            vec![0xff; 3],
            frame(3).encode().unwrap(),
        ];

        // Record the published count each time the decoder pulls a buffer.
        let mut seen = Vec::new();
        let mut pending = buffers.iter();
        let watched = std::iter::from_fn(|| {
            seen.push(length.get());
            pending.next()
        });
        let rejected = clip.ingest(watched);

        assert_eq!(rejected.len(), 1);
        assert_eq!(seen, vec![0, 1, 2, 2, 3]);
        assert_eq!(length.get(), 3);
    }

    #[test]
    fn library_selection() {
        let mut library = ClipLibrary::new();
        assert!(library.current().is_none());

        let first = library.push(Clip::new("first"));
        let second = library.push(Clip::new("second"));
        assert_eq!(library.current_index(), Some(first));

        assert!(library.select(second));
        assert_eq!(library.current().map(Clip::name), Some("second"));
        assert!(!library.select(5));
        assert_eq!(library.current_index(), Some(second));

        library.current_mut().unwrap().push(frame(3));
        assert_eq!(library.get(second).map(Clip::len), Some(1));
        assert_eq!(library.find("first"), Some(first));
        assert_eq!(library.len(), 2);
    }
}
