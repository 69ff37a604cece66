//! Component trait: the building block for every pane.

use color_eyre::eyre::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{Frame, layout::Rect};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;

/// Every pane implements Component.
///
/// Lifecycle: `init` → (`handle_key_event` | `handle_mouse_event` | `update` | `render`)*
///
/// `render` only draws. Anything that can fail is computed in `update`
/// (on [`Action::Paint`]) inside the pane's error boundary, so a broken
/// pane degrades to its fallback instead of taking down the frame.
pub trait Component: Send {
    /// Called once when the pane is mounted.
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    /// Handle a keyboard event. Return an Action to dispatch, or None.
    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Handle a mouse event inside `area`, the rect the pane was last drawn in.
    fn handle_mouse_event(&mut self, _mouse: MouseEvent, _area: Rect) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Process a dispatched action. May return a follow-up action.
    fn update(&mut self, _action: &Action) -> Result<Option<Action>> {
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect);

    fn focused(&self) -> bool {
        false
    }

    fn set_focused(&mut self, _focused: bool) {}

    /// Section name, also used in the boundary fallback text.
    fn id(&self) -> &'static str;
}
