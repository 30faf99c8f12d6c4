//! The stage host: live design tree plus editor state for one session.
//!
//! Only the active side has a live, editable [`DesignTree`]. Every other
//! side exists as a stored [`DesignSnapshot`] inside [`EditorState`]. A side
//! switch serializes the live tree, saves it, and only then loads the next
//! side, so there is never more than one editable tree.

use crate::config::EditorConfig;
use crate::document::{DesignSnapshot, DesignTree, SnapshotError};
use crate::editor::{EditorAction, EditorState};
use crate::nodes::{Node, NodeId};
use crate::preflight::{WarningItem, run_preflight};
use crate::print_spec::{CornerStyle, PrintSpec, SideId};
use crate::selection::{Handle, HandleKind, ManipulationState, get_handles, hit_test_handles};
use crate::snap::{SnapGuide, snap_bounds};
use crate::units::mm_to_px;
use kurbo::{Point, RoundedRect};
use std::sync::Arc;
use thiserror::Error;

/// Errors from stage operations.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Unknown side '{0}'")]
    UnknownSide(SideId),
    #[error("Stored design for side '{side_id}' is unreadable: {source}")]
    CorruptSnapshot {
        side_id: SideId,
        #[source]
        source: SnapshotError,
    },
    #[error("No node is selected")]
    NothingSelected,
    #[error("Node '{0}' not found")]
    UnknownNode(NodeId),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Whether the live tree has changes that were not saved to its side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidePhase {
    Loaded,
    Dirty,
}

/// A side's stored design as handed back to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct SideSnapshot {
    pub side_id: SideId,
    pub snapshot: DesignSnapshot,
}

/// Preflight results of one side.
#[derive(Debug, Clone, PartialEq)]
pub struct SideReport {
    pub side_id: SideId,
    pub warnings: Vec<WarningItem>,
}

/// Runtime editing surface.
#[derive(Debug, Clone)]
pub struct Stage {
    state: EditorState,
    tree: DesignTree,
    config: EditorConfig,
    manipulation: Option<ManipulationState>,
    /// Whether the current drag has pushed its undo state yet.
    drag_recorded: bool,
    guides: Vec<SnapGuide>,
    phase: SidePhase,
}

impl Stage {
    /// Mount a fresh session on the first side with nothing stored.
    pub fn mount(spec: Arc<PrintSpec>, config: EditorConfig) -> Self {
        let state = EditorState::new(spec, config.default_corner_radius_mm);
        let tree = DesignTree::with_undo_limit(config.undo_limit);
        let mut stage = Self {
            state,
            tree,
            config,
            manipulation: None,
            drag_recorded: false,
            guides: Vec::new(),
            phase: SidePhase::Loaded,
        };
        stage.validate();
        log::info!(
            "Mounted '{}' on side '{}'",
            stage.state.spec().id(),
            stage.state.active_side()
        );
        stage
    }

    /// Mount a session with previously exported snapshots.
    ///
    /// Every snapshot is decoded before anything is stored, so a single
    /// corrupt one rejects the whole mount.
    pub fn mount_with_snapshots(
        spec: Arc<PrintSpec>,
        config: EditorConfig,
        snapshots: impl IntoIterator<Item = (SideId, DesignSnapshot)>,
    ) -> Result<Self, StageError> {
        let mut stage = Self::mount(spec, config);
        let snapshots: Vec<_> = snapshots.into_iter().collect();
        for (side_id, snapshot) in &snapshots {
            if !stage.state.spec().has_side(side_id) {
                return Err(StageError::UnknownSide(side_id.clone()));
            }
            snapshot.validate().map_err(|source| {
                log::error!("Rejecting stored design for side '{side_id}': {source}");
                StageError::CorruptSnapshot {
                    side_id: side_id.clone(),
                    source,
                }
            })?;
        }
        for (side_id, snapshot) in snapshots {
            stage
                .state
                .dispatch(EditorAction::SaveSide { side_id, snapshot });
        }
        let active = stage.state.active_side().to_string();
        stage.tree = stage.load_side(&active)?;
        stage.validate();
        Ok(stage)
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn spec(&self) -> &PrintSpec {
        self.state.spec()
    }

    /// The live design tree of the active side.
    pub fn tree(&self) -> &DesignTree {
        &self.tree
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn phase(&self) -> SidePhase {
        self.phase
    }

    pub fn is_dirty(&self) -> bool {
        self.phase == SidePhase::Dirty
    }

    /// Snap guides produced by the latest drag move.
    pub fn guides(&self) -> &[SnapGuide] {
        &self.guides
    }

    pub fn manipulation(&self) -> Option<&ManipulationState> {
        self.manipulation.as_ref()
    }

    pub fn warnings(&self) -> &[WarningItem] {
        self.state.warnings()
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.state.selected_node_id().and_then(|id| self.tree.get(id))
    }

    /// Transform handles attached to the selected node.
    pub fn handles(&self) -> Vec<Handle> {
        self.selected_node().map(get_handles).unwrap_or_default()
    }

    fn mark_dirty(&mut self) {
        self.phase = SidePhase::Dirty;
    }

    /// Run preflight over the live tree and store the result.
    pub fn validate(&mut self) -> &[WarningItem] {
        let ctx = self.state.preflight_context();
        let warnings = run_preflight(&self.tree, &ctx, &self.config.preflight);
        self.state.dispatch(EditorAction::SetWarnings(warnings));
        self.state.warnings()
    }

    /// Select a node, or clear the selection with `None`.
    pub fn select(&mut self, node_id: Option<NodeId>) {
        let node_id = node_id.filter(|id| self.tree.contains(id));
        self.state.dispatch(EditorAction::SetSelectedNode(node_id));
    }

    /// Add a node on top of the design and select it.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id().to_string();
        self.tree.push_undo();
        self.tree.add_node(node);
        self.mark_dirty();
        self.state
            .dispatch(EditorAction::SetSelectedNode(Some(id.clone())));
        self.validate();
        id
    }

    /// Remove a node from the live tree.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        if !self.tree.contains(id) {
            return None;
        }
        self.tree.push_undo();
        let removed = self.tree.remove_node(id);
        if self.state.selected_node_id() == Some(id) {
            self.state.dispatch(EditorAction::SetSelectedNode(None));
        }
        self.mark_dirty();
        self.validate();
        removed
    }

    /// Delete the selected node.
    pub fn delete_selected(&mut self) -> Result<Node, StageError> {
        let id = self
            .state
            .selected_node_id()
            .map(str::to_string)
            .ok_or(StageError::NothingSelected)?;
        self.remove_node(&id).ok_or(StageError::UnknownNode(id))
    }

    /// Edit a node in place, recording an undo state first.
    pub fn update_node(&mut self, id: &str, edit: impl FnOnce(&mut Node)) -> Result<(), StageError> {
        if !self.tree.contains(id) {
            return Err(StageError::UnknownNode(id.to_string()));
        }
        self.tree.push_undo();
        if let Some(node) = self.tree.get_mut(id) {
            edit(node);
            // The id is the node's identity in warnings and snapshots.
            node.set_id(id.to_string());
        }
        self.mark_dirty();
        self.validate();
        Ok(())
    }

    /// Handle a press on the stage.
    ///
    /// A handle of the selected node starts a transform, a node starts a
    /// move, and empty space clears the selection. Returns the selected
    /// node, if any.
    pub fn pointer_down(&mut self, point: Point) -> Option<NodeId> {
        self.guides.clear();
        self.drag_recorded = false;

        if let Some(node) = self.selected_node() {
            if let Some(handle) = hit_test_handles(node, point, self.config.hit_tolerance_px) {
                let id = node.id().to_string();
                self.manipulation = Some(ManipulationState::new(Some(handle), point, node.clone()));
                return Some(id);
            }
        }

        let hit = self
            .tree
            .nodes_at_point(point, self.config.hit_tolerance_px)
            .into_iter()
            .find(|id| !id.is_empty());
        match &hit {
            Some(id) => {
                self.manipulation = self
                    .tree
                    .get(id)
                    .map(|node| ManipulationState::new(None, point, node.clone()));
                self.state
                    .dispatch(EditorAction::SetSelectedNode(Some(id.clone())));
            }
            None => {
                self.manipulation = None;
                self.state.dispatch(EditorAction::SetSelectedNode(None));
            }
        }
        self.validate();
        hit
    }

    /// Continue the current drag. Moves snap to the safe zone and stage
    /// center; guides are recomputed from scratch on every call.
    pub fn drag_move(&mut self, point: Point, keep_aspect_ratio: bool) -> &[SnapGuide] {
        self.guides.clear();
        let Some(manipulation) = self.manipulation.as_mut() else {
            return &self.guides;
        };
        manipulation.current_point = point;
        let mut moved = manipulation.apply(keep_aspect_ratio);

        if manipulation.handle.is_none() {
            let geometry = self.state.active_geometry();
            let snap = snap_bounds(
                moved.bounds(),
                geometry.safe_rect,
                geometry.canvas,
                self.config.snap_threshold_px,
            );
            moved.translate(snap.offset);
            self.guides = snap.guides;
        }

        let id = manipulation.node_id.clone();
        if !self.drag_recorded {
            self.tree.push_undo();
            self.drag_recorded = true;
        }
        if let Some(node) = self.tree.get_mut(&id) {
            *node = moved;
        }
        self.mark_dirty();
        &self.guides
    }

    fn finish_manipulation(&mut self) {
        self.manipulation = None;
        self.drag_recorded = false;
        self.guides.clear();
        self.validate();
    }

    /// Finish a move.
    pub fn drag_end(&mut self) {
        self.finish_manipulation();
    }

    /// Finish a resize or rotation.
    pub fn transform_end(&mut self) {
        self.finish_manipulation();
    }

    /// Handle being dragged, if the drag is a transform.
    pub fn active_handle(&self) -> Option<HandleKind> {
        self.manipulation.as_ref().and_then(|m| m.handle)
    }

    /// Decode a side's stored tree, or an empty tree if it was never saved.
    fn load_side(&self, side_id: &str) -> Result<DesignTree, StageError> {
        let mut tree = match self.state.snapshot(side_id) {
            Some(snapshot) => snapshot.decode().map_err(|source| {
                log::error!("Stored design for side '{side_id}' is unreadable: {source}");
                StageError::CorruptSnapshot {
                    side_id: side_id.to_string(),
                    source,
                }
            })?,
            None => DesignTree::new(),
        };
        tree.set_undo_limit(self.config.undo_limit);
        Ok(tree)
    }

    /// Design tree of any side: the live tree for the active one, the
    /// stored snapshot otherwise.
    pub fn side_tree(&self, side_id: &str) -> Result<DesignTree, StageError> {
        if !self.spec().has_side(side_id) {
            return Err(StageError::UnknownSide(side_id.to_string()));
        }
        if side_id == self.state.active_side() {
            Ok(self.tree.clone())
        } else {
            self.load_side(side_id)
        }
    }

    /// Serialize the live tree into the active side's snapshot.
    pub fn save_active(&mut self) -> Result<(), StageError> {
        let snapshot = self.tree.to_snapshot()?;
        let side_id = self.state.active_side().to_string();
        self.state
            .dispatch(EditorAction::SaveSide { side_id, snapshot });
        self.phase = SidePhase::Loaded;
        Ok(())
    }

    /// Commit the active side and load another one.
    ///
    /// If the target's stored design cannot be decoded, the stage stays on
    /// the current side (which has been saved) and the error is returned.
    pub fn switch_side(&mut self, side_id: &str) -> Result<(), StageError> {
        if !self.spec().has_side(side_id) {
            return Err(StageError::UnknownSide(side_id.to_string()));
        }
        if side_id == self.state.active_side() {
            return Ok(());
        }
        let outgoing = self.state.active_side().to_string();
        self.save_active()?;
        let incoming = self.load_side(side_id)?;

        self.state
            .dispatch(EditorAction::SetActiveSide(side_id.to_string()));
        self.tree = incoming;
        self.manipulation = None;
        self.drag_recorded = false;
        self.guides.clear();
        self.phase = SidePhase::Loaded;
        log::info!("Switched side '{outgoing}' -> '{side_id}'");
        self.validate();
        Ok(())
    }

    /// Copy the selected node into every other side's stored design.
    ///
    /// Each copy gets the id `<original>_<side>` and keeps its position. A
    /// copy from an earlier call is replaced, not duplicated. Other nodes
    /// in those sides are left alone. Returns the ids written.
    pub fn apply_to_all_areas(&mut self) -> Result<Vec<NodeId>, StageError> {
        let node = self.selected_node().cloned().ok_or(StageError::NothingSelected)?;
        let active = self.state.active_side().to_string();

        let targets: Vec<SideId> = self
            .spec()
            .side_ids()
            .iter()
            .filter(|id| **id != active)
            .cloned()
            .collect();
        let mut trees = Vec::with_capacity(targets.len());
        for side_id in targets {
            let tree = self.load_side(&side_id)?;
            trees.push((side_id, tree));
        }

        let mut written = Vec::with_capacity(trees.len());
        for (side_id, mut tree) in trees {
            let clone_id = format!("{}_{}", node.id(), side_id);
            tree.upsert(node.cloned_with_id(clone_id.clone()));
            let snapshot = tree.to_snapshot()?;
            self.state
                .dispatch(EditorAction::SaveSide { side_id, snapshot });
            written.push(clone_id);
        }
        log::info!("Applied '{}' to {} other side(s)", node.id(), written.len());
        Ok(written)
    }

    pub fn set_corner_style(&mut self, style: CornerStyle) {
        self.state.dispatch(EditorAction::SetCornerStyle(style));
        self.validate();
    }

    pub fn set_corner_radius_mm(&mut self, radius_mm: f64) {
        self.state.dispatch(EditorAction::SetCornerRadius(radius_mm));
        self.validate();
    }

    pub fn toggle_rounded_preview(&mut self) {
        self.state.dispatch(EditorAction::ToggleRoundedPreview);
    }

    /// Clip for the design layer, or `None` when no clip applies.
    pub fn preview_clip(&self) -> Option<RoundedRect> {
        if !self.state.rounded_clip_active() {
            return None;
        }
        let geometry = self.state.active_geometry();
        let radius = mm_to_px(self.state.corner_radius_mm(), geometry.dpi);
        Some(RoundedRect::from_rect(geometry.trim_rect, radius))
    }

    /// Undo the last edit of the live tree.
    pub fn undo(&mut self) -> bool {
        self.history_step(DesignTree::undo)
    }

    /// Redo the last undone edit of the live tree.
    pub fn redo(&mut self) -> bool {
        self.history_step(DesignTree::redo)
    }

    fn history_step(&mut self, step: fn(&mut DesignTree) -> bool) -> bool {
        if self.manipulation.is_some() || !step(&mut self.tree) {
            return false;
        }
        if let Some(id) = self.state.selected_node_id() {
            if !self.tree.contains(id) {
                self.state.dispatch(EditorAction::SetSelectedNode(None));
            }
        }
        self.mark_dirty();
        self.validate();
        true
    }

    /// Preflight every side: the live tree for the active side, stored
    /// designs for the rest.
    pub fn preflight_all_sides(&self) -> Result<Vec<SideReport>, StageError> {
        self.spec()
            .sides()
            .iter()
            .map(|side| {
                let tree = self.side_tree(&side.id)?;
                let ctx = self.state.preflight_context_for(side);
                Ok(SideReport {
                    side_id: side.id.clone(),
                    warnings: run_preflight(&tree, &ctx, &self.config.preflight),
                })
            })
            .collect()
    }

    /// Error-severity warnings on any side.
    pub fn export_blockers(&self) -> Result<Vec<WarningItem>, StageError> {
        Ok(self
            .preflight_all_sides()?
            .into_iter()
            .flat_map(|report| report.warnings)
            .filter(WarningItem::is_blocking)
            .collect())
    }

    /// Save the active side and return every side's snapshot in side order.
    ///
    /// Sides that were never edited get an empty design.
    pub fn export_snapshots(&mut self) -> Result<Vec<SideSnapshot>, StageError> {
        self.save_active()?;
        let empty = DesignTree::new().to_snapshot()?;
        Ok(self
            .state
            .snapshots()
            .into_iter()
            .map(|(side_id, snapshot)| SideSnapshot {
                side_id: side_id.to_string(),
                snapshot: snapshot.cloned().unwrap_or_else(|| empty.clone()),
            })
            .collect())
    }
}
