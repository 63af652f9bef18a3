//! Ripple/roll constraint solver.
//!
//! The solver reduces a multi-edge trim to a single scalar unknown: the
//! drag distance `d` in sequence frames. Every item on every track gets a
//! pair of linear coefficients `(s, e)` such that its new start is
//! `start + s*d` and its new end is `end + e*d`:
//!
//! * a ripple on an item's right edge sets `e += 1` and emits a downstream
//!   shift event `(boundary, +1)`; a left-edge ripple sets `e -= 1` and
//!   emits `(boundary, -1)` -- the trimmed item's own position never moves;
//! * a roll (both edges of one boundary selected) moves the boundary itself:
//!   the left item gets `e += 1`, the right item `s += 1`, no shift event;
//! * every other item receives the cumulative sum of the event coefficients
//!   whose boundary time is at or before its original start, on both `s`
//!   and `e`.
//!
//! Media bounds, minimum durations, and neighbor collisions then each
//! become a one-sided linear constraint `k*d >= rhs` with `rhs <= 0`, so the
//! feasible interval always contains zero. The requested delta is clamped
//! into that interval; clamping to zero yields a `NoOp` outcome.
//!
//! Edges that border empty space get an ephemeral gap item (unbounded
//! source range, minimum duration zero) materialized over the void first,
//! so clips and gaps run through identical trim arithmetic.

use std::collections::{HashMap, HashSet};

use splice_common::{ClipId, MediaId, RationalTime};
use tracing::debug;

use crate::error::TimelineError;
use crate::item::{Edge, EdgeSelection, ItemId};
use crate::projection::{ClipView, MediaView, SequenceView};

/// New geometry for one clip. Values are absolute, not deltas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClipEdit {
    pub clip: ClipId,
    pub start: i64,
    pub duration: i64,
    pub source_in: i64,
    pub source_out: i64,
}

/// The solved result of an edge drag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RipplePreview {
    pub requested_delta: i64,
    /// The delta after clamping; may be smaller in magnitude than requested,
    /// never larger, and never of opposite sign.
    pub effective_delta: i64,
    /// Every clip whose geometry changes, in track order then timeline order.
    pub edits: Vec<ClipEdit>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RippleOutcome {
    Applied(RipplePreview),
    /// The constraints clamped the drag to zero (or zero was requested);
    /// nothing changes and nothing should be logged.
    NoOp { requested_delta: i64 },
}

struct WorkItem {
    id: ItemId,
    start: i64,
    end: i64,
    clip: Option<ClipView>,
    s: i64,
    e: i64,
    trim_left: bool,
    trim_right: bool,
}

impl WorkItem {
    fn from_clip(clip: &ClipView) -> Self {
        Self {
            id: ItemId::Clip(clip.id),
            start: clip.start,
            end: clip.end(),
            clip: Some(clip.clone()),
            s: 0,
            e: 0,
            trim_left: false,
            trim_right: false,
        }
    }

    fn gap(id: u32, start: i64, end: i64) -> Self {
        Self {
            id: ItemId::Gap(id),
            start,
            end,
            clip: None,
            s: 0,
            e: 0,
            trim_left: false,
            trim_right: false,
        }
    }

    fn duration(&self) -> i64 {
        self.end - self.start
    }
}

struct ShiftEvent {
    time: i64,
    coeff: i64,
    owner: ItemId,
}

/// Solve an edge drag against the current sequence state. Pure: the caller
/// applies the returned edits (or previews them during an interactive drag).
pub fn solve(
    sequence: &SequenceView,
    media: &HashMap<MediaId, MediaView>,
    edges: &[EdgeSelection],
    delta: i64,
) -> Result<RippleOutcome, TimelineError> {
    if edges.is_empty() {
        return Err(TimelineError::EmptySelection);
    }
    let mut selected: HashSet<(ClipId, Edge)> = HashSet::new();
    for edge in edges {
        if !sequence.contains_clip(edge.clip) {
            return Err(TimelineError::UnknownClip(edge.clip));
        }
        if !selected.insert((edge.clip, edge.edge)) {
            return Err(TimelineError::DuplicateEdge(edge.clip));
        }
    }

    let mut tracks: Vec<Vec<WorkItem>> = sequence
        .tracks()
        .iter()
        .map(|t| t.clips().map(WorkItem::from_clip).collect())
        .collect();

    materialize_gaps(&mut tracks, &selected);
    let locations = locate_clips(&tracks);

    // Classify each selected edge as one side of a roll or as a ripple, and
    // accumulate trim coefficients plus downstream shift events.
    let mut events: Vec<ShiftEvent> = Vec::new();
    let mut consumed: HashSet<(ClipId, Edge)> = HashSet::new();
    for edge in edges {
        if consumed.contains(&(edge.clip, edge.edge)) {
            continue;
        }
        let (ti, idx) = locations[&edge.clip];
        match edge.edge {
            Edge::Right => {
                let end = tracks[ti][idx].end;
                let roll_partner = tracks[ti].get(idx + 1).and_then(|next| match next.id {
                    ItemId::Clip(next_clip)
                        if next.start == end && selected.contains(&(next_clip, Edge::Left)) =>
                    {
                        Some(next_clip)
                    }
                    _ => None,
                });
                if let Some(partner) = roll_partner {
                    tracks[ti][idx].trim_right = true;
                    tracks[ti][idx].e += 1;
                    tracks[ti][idx + 1].trim_left = true;
                    tracks[ti][idx + 1].s += 1;
                    consumed.insert((edge.clip, Edge::Right));
                    consumed.insert((partner, Edge::Left));
                } else {
                    tracks[ti][idx].trim_right = true;
                    tracks[ti][idx].e += 1;
                    events.push(ShiftEvent {
                        time: end,
                        coeff: 1,
                        owner: tracks[ti][idx].id,
                    });
                    consumed.insert((edge.clip, Edge::Right));
                }
            }
            Edge::Left => {
                let start = tracks[ti][idx].start;
                let roll_partner = idx.checked_sub(1).and_then(|pi| {
                    let prev = &tracks[ti][pi];
                    match prev.id {
                        ItemId::Clip(prev_clip)
                            if prev.end == start
                                && selected.contains(&(prev_clip, Edge::Right)) =>
                        {
                            Some(prev_clip)
                        }
                        _ => None,
                    }
                });
                if let Some(partner) = roll_partner {
                    tracks[ti][idx - 1].trim_right = true;
                    tracks[ti][idx - 1].e += 1;
                    tracks[ti][idx].trim_left = true;
                    tracks[ti][idx].s += 1;
                    consumed.insert((partner, Edge::Right));
                    consumed.insert((edge.clip, Edge::Left));
                } else {
                    tracks[ti][idx].trim_left = true;
                    tracks[ti][idx].e -= 1;
                    events.push(ShiftEvent {
                        time: start,
                        coeff: -1,
                        owner: tracks[ti][idx].id,
                    });
                    consumed.insert((edge.clip, Edge::Left));
                }
            }
        }
    }

    // Cumulative downstream shift: every item picks up the sum of all event
    // coefficients at or before its original start, skipping events it
    // emitted itself (a trimmed item's position is anchored by definition).
    for track in &mut tracks {
        for item in track.iter_mut() {
            let base: i64 = events
                .iter()
                .filter(|ev| ev.time <= item.start && ev.owner != item.id)
                .map(|ev| ev.coeff)
                .sum();
            item.s += base;
            item.e += base;
        }
    }

    let (lo, hi) = feasible_interval(sequence, media, &tracks)?;
    debug_assert!(lo <= 0 && hi >= 0);
    let effective = delta.clamp(lo, hi);
    debug!(
        requested = delta,
        effective,
        lo,
        hi,
        edges = edges.len(),
        "Solved edge drag"
    );

    if effective == 0 {
        return Ok(RippleOutcome::NoOp {
            requested_delta: delta,
        });
    }

    let mut edits = Vec::new();
    for track in &tracks {
        for item in track {
            let Some(clip) = &item.clip else { continue };
            // Untouched items have zero coefficients and no trim flags; a
            // pure slip (both edges of one clip) has zero coefficients but
            // still moves its source window.
            if item.s == 0 && item.e == 0 && !item.trim_left && !item.trim_right {
                continue;
            }
            let new_start = item.start + item.s * effective;
            let new_end = item.end + item.e * effective;
            let native = if item.trim_left || item.trim_right {
                RationalTime::new(effective, sequence.rate)
                    .rescale(clip.rate)?
                    .count
            } else {
                0
            };
            edits.push(ClipEdit {
                clip: clip.id,
                start: new_start,
                duration: new_end - new_start,
                source_in: clip.source_in + if item.trim_left { native } else { 0 },
                source_out: clip.source_out + if item.trim_right { native } else { 0 },
            });
        }
    }

    Ok(RippleOutcome::Applied(RipplePreview {
        requested_delta: delta,
        effective_delta: effective,
        edits,
    }))
}

/// Insert ephemeral gap items over any void adjacent to a selected edge.
fn materialize_gaps(tracks: &mut [Vec<WorkItem>], selected: &HashSet<(ClipId, Edge)>) {
    let mut planned: HashSet<(usize, i64, i64)> = HashSet::new();
    for (ti, track) in tracks.iter().enumerate() {
        for (idx, item) in track.iter().enumerate() {
            let ItemId::Clip(clip_id) = item.id else { continue };
            if selected.contains(&(clip_id, Edge::Right)) {
                if let Some(next) = track.get(idx + 1) {
                    if next.start > item.end {
                        planned.insert((ti, item.end, next.start));
                    }
                }
            }
            if selected.contains(&(clip_id, Edge::Left)) {
                let void_start = if idx == 0 {
                    0
                } else {
                    track[idx - 1].end
                };
                if item.start > void_start {
                    planned.insert((ti, void_start, item.start));
                }
            }
        }
    }

    let mut next_gap_id = 0u32;
    for (ti, start, end) in planned {
        tracks[ti].push(WorkItem::gap(next_gap_id, start, end));
        next_gap_id += 1;
    }
    for track in tracks.iter_mut() {
        track.sort_by_key(|item| item.start);
    }
}

fn locate_clips(tracks: &[Vec<WorkItem>]) -> HashMap<ClipId, (usize, usize)> {
    let mut locations = HashMap::new();
    for (ti, track) in tracks.iter().enumerate() {
        for (idx, item) in track.iter().enumerate() {
            if let ItemId::Clip(clip_id) = item.id {
                locations.insert(clip_id, (ti, idx));
            }
        }
    }
    locations
}

/// Intersect all constraints into one feasible interval for `d`.
fn feasible_interval(
    sequence: &SequenceView,
    media: &HashMap<MediaId, MediaView>,
    tracks: &[Vec<WorkItem>],
) -> Result<(i64, i64), TimelineError> {
    let mut lo = i64::MIN as i128;
    let mut hi = i64::MAX as i128;

    for track in tracks {
        // Collisions between consecutive items: new_start(v) >= new_end(u).
        for pair in track.windows(2) {
            let (u, v) = (&pair[0], &pair[1]);
            let k = (v.s - u.e) as i128;
            let slack = (v.start - u.end) as i128;
            constrain(k, -slack, &mut lo, &mut hi);
        }

        for item in track {
            // Minimum duration: one frame for clips, zero for gaps.
            let k = (item.e - item.s) as i128;
            let min_duration: i128 = if item.id.is_gap() { 0 } else { 1 };
            constrain(k, min_duration - item.duration() as i128, &mut lo, &mut hi);

            // Media bounds, in the clip's native units. `d` native is
            // `d * p / q`; clips without media are unbounded (titles, bars).
            let Some(clip) = &item.clip else { continue };
            if !(item.trim_left || item.trim_right) {
                continue;
            }
            let Some(media_id) = clip.media_id else { continue };
            let media_view = media
                .get(&media_id)
                .ok_or(TimelineError::UnknownMedia(media_id))?;
            let media_native = RationalTime::new(media_view.duration, media_view.rate)
                .rescale(clip.rate)?
                .count as i128;
            let p = sequence.rate.den() as i128 * clip.rate.num() as i128;
            let q = sequence.rate.num() as i128 * clip.rate.den() as i128;
            if item.trim_left {
                // source_in + d*p/q >= 0
                constrain(p, -(clip.source_in as i128) * q, &mut lo, &mut hi);
            }
            if item.trim_right {
                // source_out + d*p/q <= media duration
                constrain(-p, (clip.source_out as i128 - media_native) * q, &mut lo, &mut hi);
            }
        }
    }

    Ok((
        lo.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
        hi.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
    ))
}

/// Tighten `[lo, hi]` with the constraint `k*d >= rhs`.
fn constrain(k: i128, rhs: i128, lo: &mut i128, hi: &mut i128) {
    use std::cmp::Ordering;
    match k.cmp(&0) {
        Ordering::Greater => *lo = (*lo).max(div_ceil(rhs, k)),
        Ordering::Less => *hi = (*hi).min(div_floor(rhs, k)),
        Ordering::Equal => {}
    }
}

fn div_floor(a: i128, b: i128) -> i128 {
    let q = a / b;
    if a % b != 0 && ((a % b < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

fn div_ceil(a: i128, b: i128) -> i128 {
    -div_floor(-a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use splice_common::{FrameRate, SequenceId, TrackId};
    use crate::projection::{TrackType, TrackView};

    struct Fixture {
        sequence: SequenceView,
        media: HashMap<MediaId, MediaView>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                sequence: SequenceView::new(
                    SequenceId::generate(),
                    "Main".into(),
                    FrameRate::FPS_30,
                ),
                media: HashMap::new(),
            }
        }

        fn track(&mut self, index: i32) -> TrackId {
            let id = TrackId::generate();
            self.sequence.add_track(TrackView::new(
                id,
                TrackType::Video,
                index,
                format!("V{}", index + 1),
            ));
            id
        }

        fn media(&mut self, duration: i64) -> MediaId {
            let id = MediaId::generate();
            self.media.insert(
                id,
                MediaView {
                    id,
                    file_path: format!("/media/{id}.mov"),
                    duration,
                    rate: FrameRate::FPS_30,
                },
            );
            id
        }

        /// A clip whose source window starts at 0 in the given media.
        fn clip(&mut self, track: TrackId, start: i64, duration: i64, media: Option<MediaId>) -> ClipId {
            let id = ClipId::generate();
            self.sequence
                .insert_clip(ClipView {
                    id,
                    track_id: track,
                    media_id: media,
                    start,
                    duration,
                    source_in: 0,
                    source_out: duration,
                    rate: FrameRate::FPS_30,
                })
                .unwrap();
            id
        }

        fn solve(&self, edges: &[EdgeSelection], delta: i64) -> RippleOutcome {
            solve(&self.sequence, &self.media, edges, delta).unwrap()
        }

        fn edit(&self, outcome: &RippleOutcome, clip: ClipId) -> ClipEdit {
            match outcome {
                RippleOutcome::Applied(preview) => preview
                    .edits
                    .iter()
                    .find(|e| e.clip == clip)
                    .cloned()
                    .expect("clip should be edited"),
                RippleOutcome::NoOp { .. } => panic!("expected an applied outcome"),
            }
        }
    }

    #[test]
    fn ripple_right_extends_and_shifts_downstream() {
        let mut fx = Fixture::new();
        let t = fx.track(0);
        let m = fx.media(5000);
        let a = fx.clip(t, 0, 1000, Some(m));
        let b = fx.clip(t, 1000, 2000, Some(m));

        let out = fx.solve(&[EdgeSelection::right(a)], 300);
        let ea = fx.edit(&out, a);
        assert_eq!(ea.start, 0, "ripple never moves the trimmed item");
        assert_eq!(ea.duration, 1300);
        assert_eq!(ea.source_out, 1300);

        let eb = fx.edit(&out, b);
        assert_eq!(eb.start, 1300);
        assert_eq!(eb.duration, 2000);
        assert_eq!(eb.source_in, 0, "shifted clips keep their source window");
    }

    #[test]
    fn roll_keeps_total_length_and_neighbors() {
        let mut fx = Fixture::new();
        let t = fx.track(0);
        let m = fx.media(5000);
        let a = fx.clip(t, 0, 1000, Some(m));
        let b = fx.clip(t, 1000, 2000, Some(m));
        let c = fx.clip(t, 3000, 500, Some(m));

        let out = fx.solve(
            &[EdgeSelection::right(a), EdgeSelection::left(b)],
            300,
        );
        let ea = fx.edit(&out, a);
        let eb = fx.edit(&out, b);
        assert_eq!(ea.duration, 1300);
        assert_eq!(eb.start, 1300, "boundary pair stays contiguous");
        assert_eq!(eb.duration, 1700);
        assert_eq!(ea.duration + eb.duration, 3000, "roll preserves total length");
        assert_eq!(eb.source_in, 300);

        // Nothing outside the boundary pair moves.
        match &out {
            RippleOutcome::Applied(p) => assert!(p.edits.iter().all(|e| e.clip != c)),
            _ => panic!("expected applied"),
        }
    }

    #[test]
    fn left_ripple_anchors_position_and_pulls_downstream() {
        let mut fx = Fixture::new();
        let t = fx.track(0);
        let m = fx.media(5000);
        let _a = fx.clip(t, 0, 1000, Some(m));
        let b = fx.clip(t, 1000, 2000, Some(m));
        let c = fx.clip(t, 3000, 500, Some(m));

        let out = fx.solve(&[EdgeSelection::left(b)], 300);
        let eb = fx.edit(&out, b);
        assert_eq!(eb.start, 1000, "left ripple keeps the item's start");
        assert_eq!(eb.duration, 1700);
        assert_eq!(eb.source_in, 300);

        let ec = fx.edit(&out, c);
        assert_eq!(ec.start, 2700, "downstream pulls in by the trimmed amount");
    }

    #[test]
    fn cumulative_shift_nets_across_boundaries() {
        let mut fx = Fixture::new();
        let t = fx.track(0);
        let a = fx.clip(t, 0, 100, None);
        let b = fx.clip(t, 100, 100, None);
        let c = fx.clip(t, 200, 100, None);
        let d = fx.clip(t, 300, 100, None);

        // Boundary 1: A grows by +30. Boundary 2: C trims its left by +30.
        // B sits between the boundaries (moves +30); D sits after both
        // (moves +30 - 30 = 0).
        let out = fx.solve(
            &[EdgeSelection::right(a), EdgeSelection::left(c)],
            30,
        );
        assert_eq!(fx.edit(&out, b).start, 130);
        let ec = fx.edit(&out, c);
        assert_eq!(ec.start, 230);
        assert_eq!(ec.duration, 70);
        match &out {
            RippleOutcome::Applied(p) => {
                assert!(p.edits.iter().all(|e| e.clip != d), "net shift of zero");
            }
            _ => panic!("expected applied"),
        }
    }

    #[test]
    fn multiple_right_trims_on_one_track_stack_shifts() {
        let mut fx = Fixture::new();
        let t = fx.track(0);
        let a = fx.clip(t, 0, 100, None);
        let b = fx.clip(t, 100, 100, None);
        let c = fx.clip(t, 200, 100, None);

        let out = fx.solve(
            &[EdgeSelection::right(a), EdgeSelection::right(b)],
            10,
        );
        let eb = fx.edit(&out, b);
        assert_eq!(eb.start, 110);
        assert_eq!(eb.duration, 110);
        assert_eq!(fx.edit(&out, c).start, 220, "downstream sums both shifts");
    }

    #[test]
    fn media_headroom_clamps_the_delta() {
        let mut fx = Fixture::new();
        let t = fx.track(0);
        let m = fx.media(120);
        let a = fx.clip(t, 0, 100, Some(m));

        let out = fx.solve(&[EdgeSelection::right(a)], 50);
        match &out {
            RippleOutcome::Applied(p) => {
                assert_eq!(p.requested_delta, 50);
                assert_eq!(p.effective_delta, 20);
            }
            _ => panic!("expected applied"),
        }
        assert_eq!(fx.edit(&out, a).duration, 120);
    }

    #[test]
    fn exhausted_media_yields_noop() {
        let mut fx = Fixture::new();
        let t = fx.track(0);
        let m = fx.media(100);
        let a = fx.clip(t, 0, 100, Some(m));

        let out = fx.solve(&[EdgeSelection::right(a)], 50);
        assert_matches!(out, RippleOutcome::NoOp { requested_delta: 50 });
    }

    #[test]
    fn min_duration_clamps_shrink() {
        let mut fx = Fixture::new();
        let t = fx.track(0);
        let a = fx.clip(t, 0, 100, None);

        let out = fx.solve(&[EdgeSelection::right(a)], -500);
        match &out {
            RippleOutcome::Applied(p) => assert_eq!(p.effective_delta, -99),
            _ => panic!("expected applied"),
        }
        assert_eq!(fx.edit(&out, a).duration, 1);
    }

    #[test]
    fn sync_ripple_shifts_other_tracks_and_respects_collisions() {
        let mut fx = Fixture::new();
        let t1 = fx.track(0);
        let t2 = fx.track(1);
        let a = fx.clip(t1, 0, 100, None);
        // Y straddles the boundary on the other track and does not move;
        // Z starts after it and does.
        let y = fx.clip(t2, 50, 100, None);
        let z = fx.clip(t2, 170, 50, None);

        let out = fx.solve(&[EdgeSelection::right(a)], -40);
        match &out {
            RippleOutcome::Applied(p) => {
                assert_eq!(p.effective_delta, -20, "clamped by Z hitting Y");
            }
            _ => panic!("expected applied"),
        }
        assert_eq!(fx.edit(&out, z).start, 150);
        match &out {
            RippleOutcome::Applied(p) => assert!(p.edits.iter().all(|e| e.clip != y)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn ripple_across_a_gap_preserves_the_gap() {
        let mut fx = Fixture::new();
        let t = fx.track(0);
        let a = fx.clip(t, 0, 100, None);
        let b = fx.clip(t, 150, 100, None);

        let out = fx.solve(&[EdgeSelection::right(a)], 30);
        let ea = fx.edit(&out, a);
        let eb = fx.edit(&out, b);
        assert_eq!(ea.duration, 130);
        assert_eq!(eb.start, 180);
        assert_eq!(eb.start - (ea.start + ea.duration), 50, "gap width unchanged");
    }

    #[test]
    fn non_contiguous_edges_are_two_ripples_not_a_roll() {
        let mut fx = Fixture::new();
        let t = fx.track(0);
        let a = fx.clip(t, 0, 100, None);
        let b = fx.clip(t, 150, 100, None);

        let out = fx.solve(
            &[EdgeSelection::right(a), EdgeSelection::left(b)],
            30,
        );
        assert_eq!(fx.edit(&out, a).duration, 130);
        let eb = fx.edit(&out, b);
        assert_eq!(eb.start, 180, "B shifts with A's ripple, then trims in place");
        assert_eq!(eb.duration, 70);
    }

    #[test]
    fn both_edges_of_one_clip_slip_its_source() {
        let mut fx = Fixture::new();
        let t = fx.track(0);
        let m = fx.media(300);
        let a = ClipId::generate();
        fx.sequence
            .insert_clip(ClipView {
                id: a,
                track_id: t,
                media_id: Some(m),
                start: 0,
                duration: 100,
                source_in: 50,
                source_out: 150,
                rate: FrameRate::FPS_30,
            })
            .unwrap();
        let b = fx.clip(t, 100, 50, None);

        let out = fx.solve(
            &[EdgeSelection::left(a), EdgeSelection::right(a)],
            20,
        );
        let ea = fx.edit(&out, a);
        assert_eq!(ea.start, 0);
        assert_eq!(ea.duration, 100);
        assert_eq!(ea.source_in, 70);
        assert_eq!(ea.source_out, 170);
        match &out {
            RippleOutcome::Applied(p) => assert!(p.edits.iter().all(|e| e.clip != b)),
            _ => panic!("expected applied"),
        }
    }

    #[test]
    fn audio_rate_clip_trims_in_samples() {
        let mut fx = Fixture::new();
        let t = fx.track(0);
        let media_id = MediaId::generate();
        fx.media.insert(
            media_id,
            MediaView {
                id: media_id,
                file_path: "/media/voice.wav".into(),
                duration: 480_000,
                rate: FrameRate::AUDIO_48K,
            },
        );
        let a = ClipId::generate();
        fx.sequence
            .insert_clip(ClipView {
                id: a,
                track_id: t,
                media_id: Some(media_id),
                start: 0,
                duration: 100,
                source_in: 0,
                source_out: 160_000,
                rate: FrameRate::AUDIO_48K,
            })
            .unwrap();

        // 10 frames at 30fps == 16,000 samples at 48kHz.
        let out = fx.solve(&[EdgeSelection::right(a)], 10);
        let ea = fx.edit(&out, a);
        assert_eq!(ea.duration, 110);
        assert_eq!(ea.source_out, 176_000);
    }

    #[test]
    fn zero_delta_is_a_noop() {
        let mut fx = Fixture::new();
        let t = fx.track(0);
        let a = fx.clip(t, 0, 100, None);
        assert_matches!(
            fx.solve(&[EdgeSelection::right(a)], 0),
            RippleOutcome::NoOp { requested_delta: 0 }
        );
    }

    #[test]
    fn selection_validation() {
        let mut fx = Fixture::new();
        let t = fx.track(0);
        let a = fx.clip(t, 0, 100, None);

        assert_matches!(
            solve(&fx.sequence, &fx.media, &[], 10),
            Err(TimelineError::EmptySelection)
        );
        assert_matches!(
            solve(
                &fx.sequence,
                &fx.media,
                &[EdgeSelection::right(a), EdgeSelection::right(a)],
                10
            ),
            Err(TimelineError::DuplicateEdge(_))
        );
        assert_matches!(
            solve(
                &fx.sequence,
                &fx.media,
                &[EdgeSelection::right(ClipId::generate())],
                10
            ),
            Err(TimelineError::UnknownClip(_))
        );
    }

    #[test]
    fn div_helpers_round_toward_the_feasible_side() {
        assert_eq!(div_floor(7, 2), 3);
        assert_eq!(div_floor(-7, 2), -4);
        assert_eq!(div_floor(7, -2), -4);
        assert_eq!(div_ceil(7, 2), 4);
        assert_eq!(div_ceil(-7, 2), -3);
        assert_eq!(div_ceil(0, 5), 0);
    }
}
