//! Toolbar and panel: a view model of the stage plus the actions it emits.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::host::EditorHost;
use printsurface_core::{CornerStyle, NodeId, SideId, Stage};
use printsurface_render::{ExportBundle, ExportOptions, export_stage};

/// Actions that can be triggered from the toolbar, panels or shortcuts.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    SwitchSide(SideId),
    NextSide,
    PreviousSide,
    SetCornerStyle(CornerStyle),
    ToggleCornerStyle,
    /// Corner radius in millimetres.
    SetCornerRadius(f64),
    /// Show or hide the rounded-corner preview mask.
    TogglePreview,
    /// Copy the selected node onto every other side.
    ApplyToAllAreas,
    Undo,
    Redo,
    DeleteSelected,
    ClearSelection,
    Export,
    Close,
}

/// What handling an action did.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// State changed.
    Applied,
    /// Nothing to do (e.g. undo with an empty history).
    Ignored,
    /// Clone ids written by apply-to-all.
    AppliedToAll(Vec<NodeId>),
    Exported(Box<ExportBundle>),
    Closed,
}

/// One tab in the side switcher.
#[derive(Debug, Clone, PartialEq)]
pub struct SideTab {
    pub id: SideId,
    pub name: String,
    pub active: bool,
}

/// Everything the toolbar and warning panel display.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPanel {
    pub sides: Vec<SideTab>,
    pub corner_style: CornerStyle,
    pub corner_radius_mm: f64,
    pub show_rounded_preview: bool,
    /// The preview toggle only does something for rounded corners.
    pub preview_toggle_enabled: bool,
    pub can_apply_to_all: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    pub can_delete: bool,
    /// Warnings on the active side, formatted for display.
    pub warning_lines: Vec<String>,
    pub export_blocked: bool,
}

impl ControlPanel {
    pub fn from_stage(stage: &Stage) -> Self {
        let state = stage.state();
        let spec = stage.spec();
        let has_selection = stage.selected_node().is_some();
        let export_blocked = match stage.export_blockers() {
            Ok(blockers) => !blockers.is_empty(),
            Err(e) => {
                log::error!("Cannot preflight stored sides: {e}");
                true
            }
        };

        Self {
            sides: spec
                .sides()
                .iter()
                .map(|side| SideTab {
                    id: side.id.clone(),
                    name: side.name.clone(),
                    active: side.id == state.active_side(),
                })
                .collect(),
            corner_style: state.corner_style(),
            corner_radius_mm: state.corner_radius_mm(),
            show_rounded_preview: state.show_rounded_preview(),
            preview_toggle_enabled: state.corner_style() == CornerStyle::Rounded,
            can_apply_to_all: has_selection && spec.sides().len() > 1,
            can_undo: stage.tree().can_undo(),
            can_redo: stage.tree().can_redo(),
            can_delete: has_selection,
            warning_lines: stage
                .warnings()
                .iter()
                .map(|w| match w.fix {
                    Some(fix) => format!("[{:?}] {} ({})", w.severity, w.message, fix.tag()),
                    None => format!("[{:?}] {}", w.severity, w.message),
                })
                .collect(),
            export_blocked,
        }
    }
}

/// A mounted stage wired to its host.
pub struct Editor<H: EditorHost> {
    stage: Stage,
    host: H,
    export_options: ExportOptions,
}

impl<H: EditorHost> Editor<H> {
    pub fn new(stage: Stage, host: H, config: &AppConfig) -> Self {
        Self {
            stage,
            host,
            export_options: config.export_options(),
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Direct access for pointer events, which do not go through the toolbar.
    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn panel(&self) -> ControlPanel {
        ControlPanel::from_stage(&self.stage)
    }

    /// Handle a control action.
    pub fn handle(&mut self, action: ControlAction) -> Result<ActionOutcome, AppError> {
        let outcome = match action {
            ControlAction::SwitchSide(side_id) => {
                if side_id == self.stage.state().active_side() {
                    ActionOutcome::Ignored
                } else {
                    self.stage.switch_side(&side_id)?;
                    ActionOutcome::Applied
                }
            }
            ControlAction::NextSide => self.cycle_side(1)?,
            ControlAction::PreviousSide => self.cycle_side(-1)?,
            ControlAction::SetCornerStyle(style) => {
                self.stage.set_corner_style(style);
                ActionOutcome::Applied
            }
            ControlAction::ToggleCornerStyle => {
                let style = self.stage.state().corner_style().toggled();
                self.stage.set_corner_style(style);
                ActionOutcome::Applied
            }
            ControlAction::SetCornerRadius(radius_mm) => {
                self.stage.set_corner_radius_mm(radius_mm);
                ActionOutcome::Applied
            }
            ControlAction::TogglePreview => {
                self.stage.toggle_rounded_preview();
                ActionOutcome::Applied
            }
            ControlAction::ApplyToAllAreas => {
                ActionOutcome::AppliedToAll(self.stage.apply_to_all_areas()?)
            }
            ControlAction::Undo => applied_if(self.stage.undo()),
            ControlAction::Redo => applied_if(self.stage.redo()),
            ControlAction::DeleteSelected => {
                self.stage.delete_selected()?;
                ActionOutcome::Applied
            }
            ControlAction::ClearSelection => {
                self.stage.select(None);
                ActionOutcome::Applied
            }
            ControlAction::Export => {
                let bundle = export_stage(&mut self.stage, self.export_options)?;
                self.host.on_export(&bundle)?;
                ActionOutcome::Exported(Box::new(bundle))
            }
            ControlAction::Close => {
                self.host.on_close();
                ActionOutcome::Closed
            }
        };
        Ok(outcome)
    }

    fn cycle_side(&mut self, step: isize) -> Result<ActionOutcome, AppError> {
        let side_ids = self.stage.spec().side_ids();
        if side_ids.len() < 2 {
            return Ok(ActionOutcome::Ignored);
        }
        let active = self.stage.state().active_side();
        let current = side_ids.iter().position(|id| id == active).unwrap_or(0);
        let len = side_ids.len() as isize;
        let next = (current as isize + step).rem_euclid(len) as usize;
        let target = side_ids[next].clone();
        self.stage.switch_side(&target)?;
        Ok(ActionOutcome::Applied)
    }

    /// Tear down the editor, handing the stage back.
    pub fn into_parts(self) -> (Stage, H) {
        (self.stage, self.host)
    }
}

fn applied_if(changed: bool) -> ActionOutcome {
    if changed {
        ActionOutcome::Applied
    } else {
        ActionOutcome::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use printsurface_core::nodes::Rectangle;
    use printsurface_core::{EditorConfig, PrintSide, PrintSpec};
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingHost {
        exports: Vec<ExportBundle>,
        closed: bool,
    }

    impl EditorHost for RecordingHost {
        fn on_export(&mut self, bundle: &ExportBundle) -> Result<(), AppError> {
            self.exports.push(bundle.clone());
            Ok(())
        }

        fn on_close(&mut self) {
            self.closed = true;
        }
    }

    fn editor() -> Editor<RecordingHost> {
        let spec = PrintSpec::new(
            "card",
            "Card",
            false,
            vec!["front".into(), "back".into()],
            vec![
                PrintSide::new("front", "Front", 85.0, 55.0, 3.0, 3.0),
                PrintSide::new("back", "Back", 85.0, 55.0, 3.0, 3.0),
            ],
            72.0,
        )
        .unwrap();
        let stage = Stage::mount(Arc::new(spec), EditorConfig::default());
        Editor::new(stage, RecordingHost::default(), &AppConfig::default())
    }

    fn add_box(editor: &mut Editor<RecordingHost>, id: &str) {
        let node = Rectangle::with_id(id, Point::new(40.0, 40.0), 20.0, 20.0);
        editor.stage_mut().add_node(node.into());
    }

    #[test]
    fn test_panel_initial_state() {
        let editor = editor();
        let panel = editor.panel();
        assert_eq!(panel.sides.len(), 2);
        assert!(panel.sides[0].active);
        assert!(!panel.sides[1].active);
        assert_eq!(panel.corner_style, CornerStyle::Square);
        assert!(!panel.preview_toggle_enabled);
        assert!(!panel.can_apply_to_all);
        assert!(!panel.can_undo);
        assert!(!panel.export_blocked);
    }

    #[test]
    fn test_switch_side_and_cycle() {
        let mut editor = editor();
        assert_eq!(
            editor.handle(ControlAction::SwitchSide("front".into())).unwrap(),
            ActionOutcome::Ignored
        );
        editor.handle(ControlAction::NextSide).unwrap();
        assert_eq!(editor.stage().state().active_side(), "back");
        editor.handle(ControlAction::NextSide).unwrap();
        assert_eq!(editor.stage().state().active_side(), "front");
        editor.handle(ControlAction::PreviousSide).unwrap();
        assert_eq!(editor.stage().state().active_side(), "back");
    }

    #[test]
    fn test_switch_to_unknown_side_fails() {
        let mut editor = editor();
        let err = editor
            .handle(ControlAction::SwitchSide("inside".into()))
            .unwrap_err();
        assert!(matches!(err, AppError::Stage(_)));
        assert_eq!(editor.stage().state().active_side(), "front");
    }

    #[test]
    fn test_corner_controls() {
        let mut editor = editor();
        editor.handle(ControlAction::ToggleCornerStyle).unwrap();
        editor.handle(ControlAction::SetCornerRadius(5.0)).unwrap();
        let panel = editor.panel();
        assert_eq!(panel.corner_style, CornerStyle::Rounded);
        assert_eq!(panel.corner_radius_mm, 5.0);
        assert!(panel.preview_toggle_enabled);
        assert!(editor.stage().preview_clip().is_some());

        editor.handle(ControlAction::TogglePreview).unwrap();
        assert!(!editor.panel().show_rounded_preview);
        assert!(editor.stage().preview_clip().is_none());
    }

    #[test]
    fn test_apply_to_all_and_undo() {
        let mut editor = editor();
        add_box(&mut editor, "logo");
        assert!(editor.panel().can_apply_to_all);

        let outcome = editor.handle(ControlAction::ApplyToAllAreas).unwrap();
        assert_eq!(outcome, ActionOutcome::AppliedToAll(vec!["logo_back".to_string()]));

        assert!(editor.panel().can_undo);
        assert_eq!(editor.handle(ControlAction::Undo).unwrap(), ActionOutcome::Applied);
        assert!(editor.stage().tree().is_empty());
        assert_eq!(editor.handle(ControlAction::Redo).unwrap(), ActionOutcome::Applied);
        assert_eq!(editor.handle(ControlAction::Redo).unwrap(), ActionOutcome::Ignored);
    }

    #[test]
    fn test_apply_to_all_without_selection() {
        let mut editor = editor();
        let err = editor.handle(ControlAction::ApplyToAllAreas).unwrap_err();
        assert!(matches!(err, AppError::Stage(_)));
    }

    #[test]
    fn test_delete_and_clear_selection() {
        let mut editor = editor();
        add_box(&mut editor, "a");
        editor.handle(ControlAction::ClearSelection).unwrap();
        assert!(!editor.panel().can_delete);
        assert!(editor.handle(ControlAction::DeleteSelected).is_err());

        editor.stage_mut().select(Some("a".into()));
        editor.handle(ControlAction::DeleteSelected).unwrap();
        assert!(editor.stage().tree().is_empty());
    }

    #[test]
    fn test_export_reaches_host() {
        let mut editor = editor();
        add_box(&mut editor, "a");
        let outcome = editor.handle(ControlAction::Export).unwrap();
        let ActionOutcome::Exported(bundle) = outcome else {
            panic!("expected an export");
        };
        assert_eq!(bundle.exports.len(), 2);
        assert_eq!(editor.host().exports.len(), 1);

        assert_eq!(editor.handle(ControlAction::Close).unwrap(), ActionOutcome::Closed);
        assert!(editor.host().closed);
    }

    #[test]
    fn test_warnings_shown_in_panel() {
        let mut editor = editor();
        let node = Rectangle::with_id("edge", Point::new(0.0, 0.0), 20.0, 20.0);
        editor.stage_mut().add_node(node.into());
        let panel = editor.panel();
        assert!(panel.export_blocked);
        assert!(panel.warning_lines.iter().any(|l| l.contains("move-inside-trim")));
    }
}
