//! Central editor state and its reducer.
//!
//! [`EditorState`] holds everything about a session except the live design
//! tree: which side is active, the stored snapshot of every side, the corner
//! settings, the selection and the latest preflight warnings. It only
//! changes through [`EditorState::reduce`].

use crate::document::DesignSnapshot;
use crate::nodes::NodeId;
use crate::preflight::{PreflightContext, WarningItem};
use crate::print_spec::{CornerStyle, PrintSide, PrintSpec, SideGeometry, SideId};
use std::collections::HashMap;
use std::sync::Arc;

/// Actions accepted by the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    /// Make another side the active one. Clears the selection.
    SetActiveSide(SideId),
    /// Store a side's serialized tree, replacing any previous snapshot.
    SaveSide {
        side_id: SideId,
        snapshot: DesignSnapshot,
    },
    SetSelectedNode(Option<NodeId>),
    SetCornerStyle(CornerStyle),
    /// Corner radius in millimetres.
    SetCornerRadius(f64),
    /// Replace the warning list with the result of a preflight run.
    SetWarnings(Vec<WarningItem>),
    ToggleRoundedPreview,
}

/// Editor session state.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    spec: Arc<PrintSpec>,
    active_side: SideId,
    snapshots: HashMap<SideId, DesignSnapshot>,
    show_rounded_preview: bool,
    corner_style: CornerStyle,
    corner_radius_mm: f64,
    selected_node_id: Option<NodeId>,
    warnings: Vec<WarningItem>,
}

impl EditorState {
    /// Initial state with the first side active and no stored snapshots.
    ///
    /// Corner settings come from the first side when it suggests any,
    /// otherwise square corners with `default_radius_mm` ready for use.
    pub fn new(spec: Arc<PrintSpec>, default_radius_mm: f64) -> Self {
        let first = spec.first_side();
        let (corner_style, corner_radius_mm) = match first.corner {
            Some(corner) => (corner.style, corner.radius_mm),
            None => (CornerStyle::Square, default_radius_mm),
        };
        Self {
            active_side: first.id.clone(),
            spec,
            snapshots: HashMap::new(),
            show_rounded_preview: true,
            corner_style,
            corner_radius_mm,
            selected_node_id: None,
            warnings: Vec::new(),
        }
    }

    /// Apply an action, returning the next state.
    pub fn reduce(mut self, action: EditorAction) -> Self {
        self.dispatch(action);
        self
    }

    /// Apply an action in place.
    pub fn dispatch(&mut self, action: EditorAction) {
        log::debug!("Editor action: {:?}", ActionName(&action));
        match action {
            EditorAction::SetActiveSide(side_id) => {
                if !self.spec.has_side(&side_id) {
                    log::warn!("Ignoring switch to unknown side '{side_id}'");
                    return;
                }
                self.active_side = side_id;
                self.selected_node_id = None;
            }
            EditorAction::SaveSide { side_id, snapshot } => {
                if !self.spec.has_side(&side_id) {
                    log::warn!("Ignoring save for unknown side '{side_id}'");
                    return;
                }
                self.snapshots.insert(side_id, snapshot);
            }
            EditorAction::SetSelectedNode(node_id) => {
                self.selected_node_id = node_id;
            }
            EditorAction::SetCornerStyle(style) => {
                self.corner_style = style;
            }
            EditorAction::SetCornerRadius(radius_mm) => {
                if !radius_mm.is_finite() {
                    log::warn!("Ignoring non-finite corner radius");
                    return;
                }
                self.corner_radius_mm = radius_mm.max(0.0);
            }
            EditorAction::SetWarnings(warnings) => {
                self.warnings = warnings;
            }
            EditorAction::ToggleRoundedPreview => {
                self.show_rounded_preview = !self.show_rounded_preview;
            }
        }
    }

    pub fn spec(&self) -> &Arc<PrintSpec> {
        &self.spec
    }

    pub fn active_side(&self) -> &str {
        &self.active_side
    }

    /// The active side's definition.
    pub fn active_print_side(&self) -> &PrintSide {
        // The reducer only ever activates sides the spec defines.
        self.spec
            .side(&self.active_side)
            .unwrap_or_else(|| self.spec.first_side())
    }

    /// Geometry of the active side at the export resolution.
    pub fn active_geometry(&self) -> SideGeometry {
        self.active_print_side().geometry(self.spec.export_dpi())
    }

    /// Stored snapshot of a side, if one was ever saved.
    pub fn snapshot(&self, side_id: &str) -> Option<&DesignSnapshot> {
        self.snapshots.get(side_id)
    }

    /// Stored snapshots in side order; unsaved sides are `None`.
    pub fn snapshots(&self) -> Vec<(&str, Option<&DesignSnapshot>)> {
        self.spec
            .side_ids()
            .iter()
            .map(|id| (id.as_str(), self.snapshots.get(id)))
            .collect()
    }

    pub fn show_rounded_preview(&self) -> bool {
        self.show_rounded_preview
    }

    pub fn corner_style(&self) -> CornerStyle {
        self.corner_style
    }

    pub fn corner_radius_mm(&self) -> f64 {
        self.corner_radius_mm
    }

    /// Check if the rounded-corner clip should be applied to the design layer.
    pub fn rounded_clip_active(&self) -> bool {
        self.show_rounded_preview
            && self.corner_style == CornerStyle::Rounded
            && self.corner_radius_mm > 0.0
    }

    pub fn selected_node_id(&self) -> Option<&str> {
        self.selected_node_id.as_deref()
    }

    pub fn warnings(&self) -> &[WarningItem] {
        &self.warnings
    }

    /// Preflight inputs for the active side.
    pub fn preflight_context(&self) -> PreflightContext {
        self.preflight_context_for(self.active_print_side())
    }

    /// Preflight inputs for any side, with the current corner settings.
    pub fn preflight_context_for(&self, side: &PrintSide) -> PreflightContext {
        PreflightContext::new(
            side.geometry(self.spec.export_dpi()),
            self.corner_style,
            self.corner_radius_mm,
        )
    }
}

/// Keeps snapshot payloads out of debug logs.
struct ActionName<'a>(&'a EditorAction);

impl std::fmt::Debug for ActionName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            EditorAction::SaveSide { side_id, snapshot } => f
                .debug_struct("SaveSide")
                .field("side_id", side_id)
                .field("bytes", &snapshot.as_str().len())
                .finish(),
            EditorAction::SetWarnings(warnings) => {
                f.debug_tuple("SetWarnings").field(&warnings.len()).finish()
            }
            other => write!(f, "{other:?}"),
        }
    }
}
