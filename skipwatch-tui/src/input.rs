use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Screen};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Action {
    None,
    Quit,
    /// Reload bins, alerts, and the route plan from the service.
    Refresh,
    /// Run `service.forecast`(...) for the currently selected bin.
    LoadForecastForCurrentBin,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Char, Down, Enter, Esc, Left, Right, Tab, Up};

    // Global quit shortcuts
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if key.code == Char('q') && key.modifiers.is_empty() {
        return Action::Quit;
    }

    // Global screen cycling and refresh
    match key.code {
        Tab | Right => {
            app.screen = app.screen.next();
            return Action::None;
        }
        Char('r') => return Action::Refresh,
        _ => {}
    }

    let mut action = Action::None;

    match app.screen {
        Screen::Overview => match key.code {
            Up | Char('k') => {
                if app.bin_list_index > 0 {
                    app.bin_list_index -= 1;
                }
            }
            Down | Char('j') => {
                if app.bin_list_index + 1 < app.bins.len() {
                    app.bin_list_index += 1;
                }
            }
            Enter | Char(' ') => {
                action = Action::LoadForecastForCurrentBin;
            }
            _ => {}
        },

        Screen::Alerts | Screen::Route => match key.code {
            Left | Esc | Char('b') => {
                app.screen = Screen::Overview;
            }
            _ => {}
        },

        Screen::Forecast => match key.code {
            Left | Esc | Char('b') => {
                app.screen = Screen::Overview;
                app.forecast = None;
            }
            _ => {}
        },
    }
    action
}
