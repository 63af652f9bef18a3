//! Shared fixtures for the kernel integration tests.

#![allow(dead_code)]

use std::sync::Once;

use splice_common::{ClipId, FrameRate, KernelConfig, MediaId, SequenceId, TrackId};
use splice_kernel::{
    AddMediaArgs, AddTrackArgs, CommandKind, CommandLog, CreateSequenceArgs, ExecutionOutcome,
    InsertClipArgs,
};
use splice_store::Store;
use splice_timeline::TrackType;

static TRACING: Once = Once::new();

/// Route kernel tracing through the test harness; filter with `RUST_LOG`.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub async fn open_log(snapshot_interval: u64) -> CommandLog {
    init_tracing();
    let store = Store::open_in_memory().await.expect("in-memory store");
    let config = KernelConfig::default().with_snapshot_interval(snapshot_interval);
    CommandLog::open(store, config, "test project")
        .await
        .expect("open log")
}

/// Unwrap a committed outcome into its sequence number and pinned payload.
pub fn committed(outcome: ExecutionOutcome) -> (i64, CommandKind) {
    match outcome {
        ExecutionOutcome::Committed {
            sequence_number,
            command,
        } => (sequence_number, command),
        ExecutionOutcome::NoOp => panic!("expected a committed command"),
    }
}

pub async fn create_sequence(log: &mut CommandLog) -> SequenceId {
    let outcome = log
        .execute(CommandKind::CreateSequence(CreateSequenceArgs {
            sequence_id: None,
            name: "Main".into(),
            rate: FrameRate::FPS_30,
        }))
        .await
        .expect("create sequence");
    match committed(outcome).1 {
        CommandKind::CreateSequence(args) => args.sequence_id.expect("pinned id"),
        other => panic!("unexpected command {other:?}"),
    }
}

pub async fn add_track(
    log: &mut CommandLog,
    sequence_id: SequenceId,
    track_type: TrackType,
    index: i32,
) -> TrackId {
    let outcome = log
        .execute(CommandKind::AddTrack(AddTrackArgs {
            track_id: None,
            sequence_id,
            track_type,
            index,
            name: format!("{track_type}{index}"),
        }))
        .await
        .expect("add track");
    match committed(outcome).1 {
        CommandKind::AddTrack(args) => args.track_id.expect("pinned id"),
        other => panic!("unexpected command {other:?}"),
    }
}

pub async fn add_media(log: &mut CommandLog, duration: i64) -> MediaId {
    let outcome = log
        .execute(CommandKind::AddMedia(AddMediaArgs {
            media_id: None,
            file_path: "/media/source.mov".into(),
            duration,
            rate: FrameRate::FPS_30,
        }))
        .await
        .expect("add media");
    match committed(outcome).1 {
        CommandKind::AddMedia(args) => args.media_id.expect("pinned id"),
        other => panic!("unexpected command {other:?}"),
    }
}

/// Insert a clip at the sequence rate with a source window starting at zero.
pub async fn insert_clip(
    log: &mut CommandLog,
    track_id: TrackId,
    media_id: Option<MediaId>,
    start: i64,
    duration: i64,
) -> ClipId {
    let outcome = log
        .execute(CommandKind::InsertClip(InsertClipArgs {
            clip_id: None,
            track_id,
            media_id,
            start,
            duration,
            source_in: 0,
            source_out: duration,
            rate: FrameRate::FPS_30,
        }))
        .await
        .expect("insert clip");
    match committed(outcome).1 {
        CommandKind::InsertClip(args) => args.clip_id.expect("pinned id"),
        other => panic!("unexpected command {other:?}"),
    }
}
