//! Keyboard shortcut registry and documentation.

use crate::controls::ControlAction;

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
    /// `None` for modifiers that only document pointer behaviour.
    pub action: Option<ControlAction>,
}

impl Shortcut {
    pub fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
        action: Option<ControlAction>,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
            action,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    fn matches(&self, key: &str, ctrl: bool, shift: bool) -> bool {
        self.ctrl == ctrl && self.shift == shift && self.key.eq_ignore_ascii_case(key)
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        use ControlAction::*;
        vec![
            Shortcut::new("Z", true, false, "Undo", Some(Undo)),
            Shortcut::new("Z", true, true, "Redo", Some(Redo)),
            Shortcut::new("Y", true, false, "Redo", Some(Redo)),
            Shortcut::new("E", true, false, "Export all sides", Some(Export)),
            Shortcut::new(
                "A",
                true,
                true,
                "Apply selection to all areas",
                Some(ApplyToAllAreas),
            ),
            Shortcut::new("R", false, false, "Toggle rounded corners", Some(ToggleCornerStyle)),
            Shortcut::new("P", false, false, "Toggle corner preview mask", Some(TogglePreview)),
            Shortcut::new("Tab", false, false, "Next side", Some(NextSide)),
            Shortcut::new("Tab", false, true, "Previous side", Some(PreviousSide)),
            Shortcut::new("Delete", false, false, "Delete selected object", Some(DeleteSelected)),
            Shortcut::new("Backspace", false, false, "Delete selected object", Some(DeleteSelected)),
            Shortcut::new("Escape", false, false, "Clear selection", Some(ClearSelection)),
            Shortcut::new("W", true, false, "Close editor", Some(Close)),
            Shortcut::new(
                "Shift+Drag",
                false,
                false,
                "Maintain aspect ratio while resizing",
                None,
            ),
        ]
    }

    /// Action bound to a key press, if any.
    pub fn lookup(key: &str, ctrl: bool, shift: bool) -> Option<ControlAction> {
        Self::all()
            .into_iter()
            .find(|shortcut| shortcut.matches(key, ctrl, shift))
            .and_then(|shortcut| shortcut.action)
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        let shortcut = Shortcut::new("Z", true, true, "Redo", None);
        assert_eq!(shortcut.format(), "Ctrl+Shift+Z");
    }

    #[test]
    fn test_lookup() {
        assert_eq!(ShortcutRegistry::lookup("z", true, false), Some(ControlAction::Undo));
        assert_eq!(ShortcutRegistry::lookup("Z", true, true), Some(ControlAction::Redo));
        assert_eq!(
            ShortcutRegistry::lookup("Tab", false, true),
            Some(ControlAction::PreviousSide)
        );
        assert_eq!(ShortcutRegistry::lookup("Z", false, false), None);
        assert_eq!(ShortcutRegistry::lookup("Shift+Drag", false, false), None);
    }

    #[test]
    fn test_no_conflicting_bindings() {
        let all = ShortcutRegistry::all();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                let same_keys = a.key == b.key && a.ctrl == b.ctrl && a.shift == b.shift;
                assert!(!same_keys, "{} bound twice", a.format());
            }
        }
    }
}
