use crate::app::state::{App, FocusArea, FooterAction};

/// Runs a button or shortcut. Returns true when the app should exit.
pub fn perform_footer_action(app: &mut App, action: FooterAction) -> bool {
    match action {
        FooterAction::Quit => return true,
        FooterAction::Action(kind) => app.press_action(kind),
        FooterAction::SelectTone(tone) => app.select_tone(tone),
        FooterAction::ConfirmTone => app.confirm_tone(),
        FooterAction::CloseToneSelector => {
            app.controller.collapse_selector();
            app.footer_focus = 0;
            app.dirty = true;
        }
        FooterAction::Copy => app.copy_response(false),
        FooterAction::CopyBody => app.copy_response(true),
        FooterAction::ClearAll => app.clear_all(),
    }
    false
}

/// Esc: collapse an open tone selector, otherwise quit.
pub fn handle_escape(app: &mut App) -> bool {
    if app.controller.expanded_selector().is_some() {
        perform_footer_action(app, FooterAction::CloseToneSelector);
        app.focus = FocusArea::Buttons;
        return false;
    }
    perform_footer_action(app, FooterAction::Quit)
}
