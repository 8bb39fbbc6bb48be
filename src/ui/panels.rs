use eframe::egui::{self, Color32, RichText, Ui};

use health_dashboard::data::filter::Choice;
use health_dashboard::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter dropdowns
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.table.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    let picked = choice_combo(
        ui,
        "Select Gender",
        &state.selection.gender,
        &state.options.genders,
    );
    if let Some(choice) = picked {
        state.set_gender(choice);
    }
    let picked = choice_combo(
        ui,
        "Select Location",
        &state.selection.location,
        &state.options.locations,
    );
    if let Some(choice) = picked {
        state.set_location(choice);
    }
    let picked = choice_combo(
        ui,
        "Select Race/Ethnicity",
        &state.selection.race,
        &state.options.races,
    );
    if let Some(choice) = picked {
        state.set_race(choice);
    }
}

/// A dropdown offering "All" plus `values`.  Returns the new choice when the
/// user picked something different.
fn choice_combo<S: AsRef<str>>(
    ui: &mut Ui,
    label: &str,
    current: &Choice,
    values: &[S],
) -> Option<Choice> {
    let mut picked = None;
    ui.strong(label);
    egui::ComboBox::from_id_salt(label)
        .selected_text(current.to_string())
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(*current == Choice::All, "All").clicked() {
                picked = Some(Choice::All);
            }
            for value in values {
                let value = value.as_ref();
                let selected = current.as_value() == Some(value);
                if ui.selectable_label(selected, value).clicked() {
                    picked = Some(Choice::only(value));
                }
            }
        });
    ui.add_space(6.0);
    picked.filter(|p| p != current)
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            let mut text = format!("{} of {} records", state.visible(), table.len());
            if let Some((first, last)) = state.year_span {
                text.push_str(&format!(", years {first:.0}–{last:.0}"));
            }
            ui.label(text);
            ui.separator();
            ui.label(RichText::new(state.data_path.display().to_string()).weak());
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open health dataset")
        .add_filter("Supported files", &["csv", "tsv", "tab", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "tsv", "tab"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
        if let Some(table) = &state.table {
            log::info!(
                "Showing {} records from {}",
                table.len(),
                state.data_path.display()
            );
        }
    }
}
