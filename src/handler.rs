use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode, Screen, SetupView};
use crate::chat::Rating;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {
            // Wrap widths changed; re-anchor the transcript.
            app.scroll_chat_to_bottom();
        }
        AppEvent::Tick => {
            app.poll_tasks().await;
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Popups capture input before the screens see it
    if app.show_key_input {
        handle_key_input_popup(app, key);
        return;
    }
    if app.show_example_modal {
        handle_example_modal(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_key_input_popup(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_key_input(),
        KeyCode::Enter => app.adopt_api_key(),
        KeyCode::Backspace => {
            if app.key_input_cursor > 0 {
                app.key_input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.key_input, app.key_input_cursor);
                app.key_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.key_input_cursor = app.key_input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.key_input.chars().count();
            app.key_input_cursor = (app.key_input_cursor + 1).min(char_count);
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.key_input, app.key_input_cursor);
            app.key_input.insert(byte_pos, c);
            app.key_input_cursor += 1;
        }
        _ => {}
    }
}

fn handle_example_modal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_example_modal(),
        KeyCode::Char('j') | KeyCode::Down => {
            app.example_scroll = app.example_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.example_scroll = app.example_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match app.screen {
        Screen::Home => handle_home(app, key),
        Screen::Lab => handle_lab_normal(app, key),
        Screen::Roadmap => handle_roadmap(app, key),
        Screen::Blueprints => handle_blueprints(app, key),
        Screen::Setup => handle_setup(app, key),
    }
}

fn handle_home(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => app.home_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.home_nav_up(),

        // Enter the lab for the selected language
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
            let entry = app.selected_catalog_entry();
            if !entry.coming_soon {
                app.enter_lab(Some(entry.language));
            }
        }

        // Roadmap for the selected language
        KeyCode::Char('m') => {
            let entry = app.selected_catalog_entry();
            if !entry.coming_soon {
                app.open_roadmap(entry.language);
            }
        }

        // General track lab, no language scope
        KeyCode::Char('t') => app.enter_lab(None),

        // Screen switching
        KeyCode::Char('b') => app.screen = Screen::Blueprints,
        KeyCode::Char('s') => app.screen = Screen::Setup,

        // Mock sign in / sign out
        KeyCode::Char('g') => app.toggle_auth(),

        _ => {}
    }
}

fn handle_lab_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        // Back to home
        KeyCode::Esc | KeyCode::Char('q') => app.screen = Screen::Home,

        // Start typing
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.input_mode = InputMode::Editing;
            app.chat_cursor = app.chat_input.chars().count();
            app.refresh_suggestions();
        }

        // Cycle the tutoring scope
        KeyCode::Tab => app.cycle_scope(),

        // Roadmap for the current scope (the general track has none)
        KeyCode::Char('m') => {
            if let Some(language) = app.scope {
                app.open_roadmap(language);
            }
        }

        // Retry the failed exchange
        KeyCode::Char('r') => {
            if app.can_retry_chat() {
                app.retry_chat();
            }
        }

        // API key popup
        KeyCode::Char('K') => app.open_key_input(),

        // Rate the latest reply
        KeyCode::Char('+') | KeyCode::Char('=') => app.rate_last_reply(Rating::Positive),
        KeyCode::Char('-') | KeyCode::Char('_') => app.rate_last_reply(Rating::Negative),

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => {
            app.chat_scroll = app.chat_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.chat_scroll = app.chat_scroll.saturating_sub(1);
        }
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        _ => {}
    }
}

fn handle_roadmap(app: &mut App, key: KeyEvent) {
    match key.code {
        // Back to home
        KeyCode::Esc | KeyCode::Char('q') => app.screen = Screen::Home,

        // Step navigation
        KeyCode::Char('j') | KeyCode::Down => app.roadmap_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.roadmap_nav_up(),

        // Expand/collapse the selected step
        KeyCode::Enter | KeyCode::Char('l') => app.toggle_selected_step(),

        // Concept cursor within the selected step
        KeyCode::Tab => app.concept_next(),
        KeyCode::BackTab => app.concept_prev(),

        // Fetch an example for the highlighted concept
        KeyCode::Char('e') => app.request_concept_example(),

        // Refetch the roadmap
        KeyCode::Char('r') => app.retry_roadmap(),

        // Jump into the lab scoped to this roadmap's language
        KeyCode::Char('t') => {
            if let Some(language) = app.roadmap_language {
                app.enter_lab(Some(language));
            }
        }

        // API key popup
        KeyCode::Char('K') => app.open_key_input(),

        _ => {}
    }
}

fn handle_blueprints(app: &mut App, key: KeyEvent) {
    match key.code {
        // Back to home
        KeyCode::Esc | KeyCode::Char('q') => app.screen = Screen::Home,

        // List navigation
        KeyCode::Char('j') | KeyCode::Down => app.blueprint_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.blueprint_nav_up(),

        // Filters
        KeyCode::Char('f') | KeyCode::Right => app.cycle_blueprint_category(),
        KeyCode::Char('L') => app.cycle_blueprint_language(),

        // Study the blueprint in the lab, scoped to its lead language
        KeyCode::Enter => {
            if let Some(blueprint) = app.selected_blueprint() {
                if let Some(&language) = blueprint.languages.first() {
                    app.enter_lab(Some(language));
                }
            }
        }

        _ => {}
    }
}

fn handle_setup(app: &mut App, key: KeyEvent) {
    match key.code {
        // Back to home
        KeyCode::Esc | KeyCode::Char('q') => app.screen = Screen::Home,

        // View tabs
        KeyCode::Char('1') => app.setup_view = SetupView::Wizard,
        KeyCode::Char('2') => app.setup_view = SetupView::Starter,
        KeyCode::Char('3') => app.setup_view = SetupView::Nix,
        KeyCode::Char('4') => app.setup_view = SetupView::Devcontainer,
        KeyCode::Tab => {
            app.setup_view = match app.setup_view {
                SetupView::Wizard => SetupView::Starter,
                SetupView::Starter => SetupView::Nix,
                SetupView::Nix => SetupView::Devcontainer,
                SetupView::Devcontainer => SetupView::Wizard,
            };
            app.setup_scroll = 0;
        }

        // Wizard moves a cursor; the generated views just scroll
        KeyCode::Char('j') | KeyCode::Down => match app.setup_view {
            SetupView::Wizard => app.setup_cursor_down(),
            _ => app.setup_scroll = app.setup_scroll.saturating_add(1),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.setup_view {
            SetupView::Wizard => app.setup_cursor_up(),
            _ => app.setup_scroll = app.setup_scroll.saturating_sub(1),
        },

        // Wizard toggles
        KeyCode::Char(' ') | KeyCode::Enter => {
            if app.setup_view == SetupView::Wizard {
                app.toggle_setup_language();
            }
        }
        KeyCode::Char('t') => {
            if app.setup_view == SetupView::Wizard {
                app.setup.include_tools = !app.setup.include_tools;
            }
        }
        KeyCode::Char('o') => {
            if app.setup_view == SetupView::Wizard {
                app.setup.target_os = app.setup.target_os.toggled();
            }
        }

        // Starter card controls
        KeyCode::Char('n') => {
            if app.setup_view == SetupView::Starter {
                app.starter_cursor_next();
                app.setup_scroll = 0;
            }
        }
        KeyCode::Char('a') => {
            if app.setup_view == SetupView::Starter {
                app.toggle_starter_flavor();
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    // Only the lab takes free text
    if app.screen != Screen::Lab {
        app.input_mode = InputMode::Normal;
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.suggestion_index = None;
        }
        KeyCode::Enter => {
            app.submit_chat();
        }

        // Suggestion highlight
        KeyCode::Down => app.suggestion_down(),
        KeyCode::Up => app.suggestion_up(),

        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
                app.refresh_suggestions();
            }
        }
        KeyCode::Delete => {
            let char_count = app.chat_input.chars().count();
            if app.chat_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
                app.refresh_suggestions();
            }
        }
        KeyCode::Left => {
            app.chat_cursor = app.chat_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.chat_input.chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.chat_cursor = 0;
        }
        KeyCode::End => {
            app.chat_cursor = app.chat_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
            app.chat_input.insert(byte_pos, c);
            app.chat_cursor += 1;
            app.refresh_suggestions();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::KvStore;

    fn test_app() -> App {
        App::with_parts(Config::new(), KvStore::in_memory())
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "añb";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 1), 1);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 5), s.len());
    }

    #[test]
    fn test_ctrl_c_quits_from_any_mode() {
        let mut app = test_app();
        app.screen = Screen::Lab;
        app.input_mode = InputMode::Editing;

        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn test_home_enter_ignores_coming_soon_entries() {
        let mut app = test_app();
        // Nim is flagged as coming soon and sits last in the catalog.
        for _ in 0..10 {
            handle_key(&mut app, press(KeyCode::Char('j')));
        }
        assert!(app.selected_catalog_entry().coming_soon);

        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Home);
    }

    #[test]
    fn test_editing_inserts_at_cursor_with_multibyte_text() {
        let mut app = test_app();
        app.screen = Screen::Lab;
        app.input_mode = InputMode::Editing;

        for c in "héllo".chars() {
            handle_key(&mut app, press(KeyCode::Char(c)));
        }
        handle_key(&mut app, press(KeyCode::Left));
        handle_key(&mut app, press(KeyCode::Left));
        handle_key(&mut app, press(KeyCode::Char('x')));
        assert_eq!(app.chat_input, "hélxlo");

        handle_key(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.chat_input, "héllo");
    }

    #[test]
    fn test_key_popup_captures_input_before_screens() {
        let mut app = test_app();
        app.screen = Screen::Lab;
        app.open_key_input();

        // 'q' would normally leave the lab; the popup should swallow it.
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert_eq!(app.screen, Screen::Lab);
        assert_eq!(app.key_input, "q");

        handle_key(&mut app, press(KeyCode::Esc));
        assert!(!app.show_key_input);
    }

    #[test]
    fn test_empty_key_submission_only_dismisses_popup() {
        let mut app = test_app();
        let before = app.auth.key_source_label();
        app.open_key_input();

        handle_key(&mut app, press(KeyCode::Enter));
        assert!(!app.show_key_input);
        assert!(app.key_input.is_empty());
        assert_eq!(app.auth.key_source_label(), before);
    }
}
