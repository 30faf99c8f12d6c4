//! PrintSurface Core Library
//!
//! Print-production geometry, the design node model, and the editing stage
//! that keeps designs inside bleed, trim and safe margins.

pub mod config;
pub mod document;
pub mod editor;
pub mod nodes;
pub mod preflight;
pub mod print_spec;
pub mod selection;
pub mod snap;
pub mod stage;
pub mod units;

pub use config::{EditorConfig, PreflightConfig};
pub use document::{DesignSnapshot, DesignTree, SnapshotError};
pub use editor::{EditorAction, EditorState};
pub use nodes::{Node, NodeId, NodeStyle, NodeTrait, SerializableColor};
pub use preflight::{FixHint, PreflightContext, Severity, WarningItem, WarningKind, run_preflight};
pub use print_spec::{CornerStyle, PrintSide, PrintSpec, SideGeometry, SideId, SpecError};
pub use snap::{SnapGuide, SnapResult, snap_bounds};
pub use stage::{SidePhase, SideReport, SideSnapshot, Stage, StageError};
pub use units::{mm_to_px, px_to_mm};
