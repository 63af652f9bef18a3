//! The command log: the single entry point for editing a project.
//!
//! `CommandLog` owns the store handle, the in-memory projection, and the
//! undo cursor. Commands run through a fixed pipeline: validate and plan
//! against the projection, persist the mutations and the command row in
//! one transaction, then advance the cursor. Undo and redo never invert
//! mutations; they move the cursor and rebuild state by replay.

use chrono::Utc;
use splice_common::{KernelConfig, ProjectId, SelectionState, SequenceId};
use splice_store::models::{CommandRow, ProjectRow};
use splice_store::{commands, entities, snapshots, Store, StoreError};
use splice_timeline::{
    solve, EdgeSelection, Mutation, MutationBatch, RippleOutcome, SequenceView, TimelineProjection,
};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::command::{CommandKind, ExecutionOutcome};
use crate::error::{CommandError, ReplayIntegrityError, UndoTreeError, ValidationError};
use crate::{snapshot, state};

/// Counters from a history integrity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryStats {
    pub commands: usize,
    pub snapshots: usize,
}

pub struct CommandLog {
    store: Store,
    config: KernelConfig,
    project_id: ProjectId,
    /// `project_id` as stored, avoids re-rendering the uuid on every row.
    project_key: String,
    projection: TimelineProjection,
    /// Log position the materialized state reflects (0 = empty root).
    cursor: i64,
    /// Highest sequence number ever issued, across all branches.
    last_sequence_number: i64,
    in_flight: bool,
}

impl CommandLog {
    /// Open the log for the store's project, creating the project row on
    /// first open. The projection is loaded from the materialized state,
    /// which reflects wherever the cursor pointed when last closed.
    pub async fn open(
        store: Store,
        config: KernelConfig,
        project_name: &str,
    ) -> Result<Self, CommandError> {
        let row = match entities::find_project(store.pool()).await? {
            Some(row) => row,
            None => {
                let row = ProjectRow {
                    id: ProjectId::generate().to_string(),
                    name: project_name.to_string(),
                    cursor_sequence_number: 0,
                    created_at: Utc::now().to_rfc3339(),
                };
                entities::insert_project(store.pool(), &row).await?;
                row
            }
        };

        let project_id = row
            .id
            .parse()
            .map_err(|e: uuid::Error| ValidationError::MalformedArgs(e.to_string()))?;
        let mut conn = store.pool().acquire().await.map_err(StoreError::from)?;
        let projection = state::load_projection(&mut conn).await?;
        drop(conn);
        let last_sequence_number = commands::max_sequence_number(store.pool()).await?;

        info!(
            project = %row.id,
            cursor = row.cursor_sequence_number,
            head = last_sequence_number,
            "Command log opened"
        );

        Ok(Self {
            store,
            config,
            project_id,
            project_key: row.id,
            projection,
            cursor: row.cursor_sequence_number,
            last_sequence_number,
            in_flight: false,
        })
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn projection(&self) -> &TimelineProjection {
        &self.projection
    }

    pub fn sequence(&self, id: SequenceId) -> Option<&SequenceView> {
        self.projection.sequence(id)
    }

    /// Log position the current state reflects.
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Highest sequence number in the log, across all branches.
    pub fn head(&self) -> i64 {
        self.last_sequence_number
    }

    pub fn can_undo(&self) -> bool {
        self.cursor != 0
    }

    pub async fn can_redo(&self) -> Result<bool, CommandError> {
        let children = commands::children_of(self.store.pool(), self.cursor).await?;
        Ok(!children.is_empty())
    }

    /// Run a command: plan it against the projection, persist the result,
    /// and append it to the log as a child of the current cursor.
    ///
    /// A command whose plan turns out empty (a trim clamped to zero, a move
    /// onto the clip's own position) commits nothing and is not logged.
    pub async fn execute(&mut self, command: CommandKind) -> Result<ExecutionOutcome, CommandError> {
        self.enter()?;
        let result = self.execute_inner(command).await;
        self.in_flight = false;
        result
    }

    async fn execute_inner(
        &mut self,
        mut command: CommandKind,
    ) -> Result<ExecutionOutcome, CommandError> {
        let batch = command.forward(&self.projection)?;
        if batch.is_empty() {
            debug!(kind = command.name(), "Command had no effect, not logged");
            return Ok(ExecutionOutcome::NoOp);
        }

        let sequence_number = self.last_sequence_number + 1;
        let parent = (self.cursor != 0).then_some(self.cursor);
        let (pre_selection, playhead_pre) = self.view_state(batch.sequence_id);
        let (post_selection, playhead_post) =
            post_view_state(&batch, pre_selection.clone(), playhead_pre);
        let created_at = Utc::now().to_rfc3339();

        let row = CommandRow {
            sequence_number,
            parent_sequence_number: parent,
            project_id: self.project_key.clone(),
            sequence_id: batch.sequence_id.map(|id| id.to_string()),
            kind: command.name().to_string(),
            // Serialized after planning, so generated ids and clamped
            // deltas pinned by `forward` are what replay sees.
            args_json: command.args_json()?,
            pre_selection_json: state::selection_json(&pre_selection)?,
            post_selection_json: state::selection_json(&post_selection)?,
            playhead_pre,
            playhead_post,
            created_at: created_at.clone(),
        };

        let mut tx = self.store.begin().await?;
        state::apply_batch(&mut tx, &self.project_key, &created_at, &batch).await?;
        commands::insert(&mut *tx, &row).await?;
        entities::update_cursor(&mut *tx, &self.project_key, sequence_number).await?;

        // The batch is applied to a staged copy; `self.projection` only
        // advances once the transaction has committed. A projection
        // rejection or a failed commit leaves the in-memory state exactly
        // where the database is.
        let staged = if batch.invalidates_sequence {
            None
        } else {
            let mut next = self.projection.clone();
            if let Err(err) = next.apply(&batch) {
                drop(tx);
                warn!(kind = command.name(), error = %err, "Command rejected by projection");
                return Err(err.into());
            }
            Some(next)
        };
        tx.commit().await.map_err(StoreError::from)?;

        self.cursor = sequence_number;
        self.last_sequence_number = sequence_number;

        match staged {
            Some(next) => self.projection = next,
            None => {
                if let Some(sequence_id) = batch.sequence_id {
                    self.reload_sequence(sequence_id).await?;
                }
            }
        }

        info!(sequence_number, kind = command.name(), "Command committed");

        if self.config.snapshot_interval > 0
            && sequence_number % self.config.snapshot_interval as i64 == 0
        {
            // The command is already durable; a missed snapshot only widens
            // the window the next replay walks.
            if let Err(err) = snapshot::capture(&self.store, sequence_number).await {
                warn!(sequence_number, error = %err, "Snapshot capture failed");
            }
        }

        Ok(ExecutionOutcome::Committed {
            sequence_number,
            command,
        })
    }

    /// Step the cursor back to the current command's parent and restore the
    /// view state from before that command ran.
    pub async fn undo(&mut self) -> Result<(), CommandError> {
        self.enter()?;
        let result = self.undo_inner().await;
        self.in_flight = false;
        result
    }

    async fn undo_inner(&mut self) -> Result<(), CommandError> {
        if self.cursor == 0 {
            return Err(UndoTreeError::NothingToUndo.into());
        }
        let undone = commands::find(self.store.pool(), self.cursor)
            .await?
            .ok_or(ReplayIntegrityError::MissingCommand {
                sequence_number: self.cursor,
            })?;
        let target = undone.parent_sequence_number.unwrap_or(0);

        self.projection =
            snapshot::replay_to(&self.store, &self.config, &self.project_key, target).await?;
        self.cursor = target;
        self.restore_view_state(
            undone.sequence_id.as_deref(),
            &undone.pre_selection_json,
            undone.playhead_pre,
        )
        .await?;

        info!(undone = undone.sequence_number, cursor = target, "Undo");
        Ok(())
    }

    /// Step the cursor forward to a child of the current command.
    ///
    /// With one child, `child` may be `None`. With several (the cursor sits
    /// at a branch point) the caller must name one, or the call fails
    /// listing the candidates.
    pub async fn redo(&mut self, child: Option<i64>) -> Result<(), CommandError> {
        self.enter()?;
        let result = self.redo_inner(child).await;
        self.in_flight = false;
        result
    }

    async fn redo_inner(&mut self, child: Option<i64>) -> Result<(), CommandError> {
        let children = commands::children_of(self.store.pool(), self.cursor).await?;
        if children.is_empty() {
            return Err(UndoTreeError::NothingToRedo.into());
        }
        let target = match child {
            Some(wanted) => children
                .iter()
                .find(|row| row.sequence_number == wanted)
                .ok_or(UndoTreeError::NotAChild {
                    child: wanted,
                    cursor: self.cursor,
                })?
                .clone(),
            None if children.len() == 1 => children[0].clone(),
            None => {
                return Err(UndoTreeError::AmbiguousRedo {
                    cursor: self.cursor,
                    candidates: children.iter().map(|row| row.sequence_number).collect(),
                }
                .into());
            }
        };

        self.projection = snapshot::replay_to(
            &self.store,
            &self.config,
            &self.project_key,
            target.sequence_number,
        )
        .await?;
        self.cursor = target.sequence_number;
        self.restore_view_state(
            target.sequence_id.as_deref(),
            &target.post_selection_json,
            target.playhead_post,
        )
        .await?;

        info!(redone = target.sequence_number, "Redo");
        Ok(())
    }

    /// Move the cursor to an arbitrary log position (0 = empty root) and
    /// rebuild state there. This is how a branch is abandoned or revisited.
    pub async fn jump_to(&mut self, target: i64) -> Result<(), CommandError> {
        self.enter()?;
        let result = self.jump_inner(target).await;
        self.in_flight = false;
        result
    }

    async fn jump_inner(&mut self, target: i64) -> Result<(), CommandError> {
        if target == self.cursor {
            return Ok(());
        }
        let row = if target == 0 {
            None
        } else {
            Some(
                commands::find(self.store.pool(), target)
                    .await?
                    .ok_or(UndoTreeError::UnknownPosition {
                        sequence_number: target,
                    })?,
            )
        };

        self.projection =
            snapshot::replay_to(&self.store, &self.config, &self.project_key, target).await?;
        self.cursor = target;
        if let Some(row) = row {
            self.restore_view_state(
                row.sequence_id.as_deref(),
                &row.post_selection_json,
                row.playhead_post,
            )
            .await?;
        }

        info!(cursor = target, "Jumped to log position");
        Ok(())
    }

    /// Solve a trim without committing anything. The projection is not
    /// touched; callers use this to drive scrub feedback while dragging.
    pub fn preview_ripple(
        &self,
        sequence_id: SequenceId,
        edges: &[EdgeSelection],
        delta: i64,
    ) -> Result<RippleOutcome, CommandError> {
        let sequence = self
            .projection
            .sequence(sequence_id)
            .ok_or(ValidationError::UnknownEntity {
                kind: "sequence",
                id: sequence_id.to_string(),
            })?;
        Ok(solve(sequence, self.projection.media_map(), edges, delta)?)
    }

    /// Move the playhead. View state only: persisted, not logged.
    pub async fn set_playhead(
        &mut self,
        sequence_id: SequenceId,
        count: i64,
    ) -> Result<(), CommandError> {
        if count < 0 {
            return Err(ValidationError::Negative("playhead", count).into());
        }
        self.require_sequence(sequence_id)?;
        let mut batch = MutationBatch::new(Some(sequence_id));
        batch.push(Mutation::SetPlayhead { sequence_id, count });
        self.apply_view_batch(batch).await
    }

    /// Replace the selection. View state only: persisted, not logged.
    pub async fn set_selection(
        &mut self,
        sequence_id: SequenceId,
        selection: SelectionState,
    ) -> Result<(), CommandError> {
        let sequence = self.require_sequence(sequence_id)?;
        for &clip_id in selection.selected_clips() {
            if !sequence.contains_clip(clip_id) {
                return Err(ValidationError::UnknownEntity {
                    kind: "clip",
                    id: clip_id.to_string(),
                }
                .into());
            }
        }
        let mut batch = MutationBatch::new(Some(sequence_id));
        batch.push(Mutation::SetSelection {
            sequence_id,
            selection,
        });
        self.apply_view_batch(batch).await
    }

    /// Snapshot the current cursor position immediately, regardless of the
    /// interval. The empty root and already-snapshotted positions are left
    /// alone.
    pub async fn snapshot_now(&mut self) -> Result<(), CommandError> {
        if self.cursor == 0 {
            return Ok(());
        }
        let points = snapshots::points(self.store.pool()).await?;
        if points.contains(&self.cursor) {
            return Ok(());
        }
        snapshot::capture(&self.store, self.cursor).await
    }

    /// Walk the whole log and verify it replays: every parent exists and
    /// precedes its child, and every args payload decodes.
    pub async fn validate_history(&self) -> Result<HistoryStats, CommandError> {
        let rows = commands::all(self.store.pool()).await?;
        let mut seen: HashSet<i64> = HashSet::new();
        for row in &rows {
            if let Some(parent) = row.parent_sequence_number {
                if parent >= row.sequence_number || !seen.contains(&parent) {
                    return Err(ReplayIntegrityError::BrokenParentChain {
                        sequence_number: row.sequence_number,
                    }
                    .into());
                }
            }
            CommandKind::from_row(&row.kind, &row.args_json).map_err(|e| {
                ReplayIntegrityError::CommandDecode {
                    sequence_number: row.sequence_number,
                    message: e.to_string(),
                }
            })?;
            seen.insert(row.sequence_number);
        }
        let points = snapshots::points(self.store.pool()).await?;
        Ok(HistoryStats {
            commands: rows.len(),
            snapshots: points.len(),
        })
    }

    fn enter(&mut self) -> Result<(), CommandError> {
        if self.in_flight {
            return Err(ValidationError::ReentrantExecution.into());
        }
        self.in_flight = true;
        Ok(())
    }

    fn require_sequence(&self, id: SequenceId) -> Result<&SequenceView, CommandError> {
        self.projection
            .sequence(id)
            .ok_or_else(|| {
                ValidationError::UnknownEntity {
                    kind: "sequence",
                    id: id.to_string(),
                }
                .into()
            })
    }

    /// Selection and playhead of a sequence as the projection sees them.
    fn view_state(&self, sequence_id: Option<SequenceId>) -> (SelectionState, i64) {
        sequence_id
            .and_then(|id| self.projection.sequence(id))
            .map(|view| (view.selection.clone(), view.playhead))
            .unwrap_or((SelectionState::new(), 0))
    }

    /// Persist and project a view-state batch without logging a command.
    /// As in `execute`, the projection only advances after the commit.
    async fn apply_view_batch(&mut self, batch: MutationBatch) -> Result<(), CommandError> {
        let mut next = self.projection.clone();
        next.apply(&batch)?;
        let mut tx = self.store.begin().await?;
        state::apply_batch(&mut tx, &self.project_key, "", &batch).await?;
        tx.commit().await.map_err(StoreError::from)?;
        self.projection = next;
        Ok(())
    }

    /// Write a recorded selection and playhead back onto a sequence, if it
    /// still exists at the restored position.
    async fn restore_view_state(
        &mut self,
        sequence_id: Option<&str>,
        selection_json: &str,
        playhead: i64,
    ) -> Result<(), CommandError> {
        let Some(raw) = sequence_id else {
            return Ok(());
        };
        let id: SequenceId = raw
            .parse()
            .map_err(|e: uuid::Error| ValidationError::MalformedArgs(e.to_string()))?;
        if self.projection.sequence(id).is_none() {
            return Ok(());
        }
        let selection: SelectionState = serde_json::from_str(selection_json)
            .map_err(|e| ValidationError::MalformedArgs(e.to_string()))?;

        let mut batch = MutationBatch::new(Some(id));
        batch.push(Mutation::SetPlayhead {
            sequence_id: id,
            count: playhead,
        });
        batch.push(Mutation::SetSelection {
            sequence_id: id,
            selection,
        });
        self.apply_view_batch(batch).await
    }

    /// Drop and reload one sequence view from storage. Falls back to a full
    /// projection reload if the sequence is gone.
    async fn reload_sequence(&mut self, sequence_id: SequenceId) -> Result<(), CommandError> {
        let mut conn = self.store.pool().acquire().await.map_err(StoreError::from)?;
        match entities::find_sequence(&mut *conn, &sequence_id.to_string()).await? {
            Some(row) => {
                let view = state::load_sequence_view(&mut conn, &row).await?;
                self.projection.load_sequence(view);
            }
            None => {
                self.projection = state::load_projection(&mut conn).await?;
            }
        }
        Ok(())
    }
}

/// Fold a batch's view-state mutations over the captured pre-state to get
/// the post-state the command row records.
fn post_view_state(
    batch: &MutationBatch,
    mut selection: SelectionState,
    mut playhead: i64,
) -> (SelectionState, i64) {
    for mutation in &batch.mutations {
        match mutation {
            Mutation::SetSelection { selection: s, .. } => selection = s.clone(),
            Mutation::SetPlayhead { count, .. } => playhead = *count,
            _ => {}
        }
    }
    (selection, playhead)
}
