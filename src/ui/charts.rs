use std::ops::RangeInclusive;

use eframe::egui::{self, RichText, Ui};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Plot};

use health_dashboard::data::aggregate::{
    AgeGroups, Counts, Dashboard, GenderMeans, Histogram, Prevalence, Summary,
};
use health_dashboard::state::AppState;

use crate::color::{CategoryColors, NO_COLOR, YES_COLOR};

const CHART_HEIGHT: f32 = 220.0;
const SMALL_CHART_HEIGHT: f32 = 160.0;

// ---------------------------------------------------------------------------
// Central panel – every chart section
// ---------------------------------------------------------------------------

/// Render the chart sections for the current selection.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(dash) = &state.dashboard else {
        ui.centered_and_justified(|ui: &mut Ui| match &state.status_message {
            Some(msg) => ui.heading(RichText::new(msg).color(egui::Color32::RED)),
            None => ui.heading("Open a file to view the dashboard  (File → Open…)"),
        });
        return;
    };

    let genders = CategoryColors::new(&state.options.genders);
    let locations = CategoryColors::new(&state.options.locations);
    let races = CategoryColors::new(&state.options.races);

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Demographic Analysis");
            demographics(ui, dash, &genders, &races);
            ui.separator();

            ui.heading("Prevalence of Health Conditions");
            for (condition, prevalence) in &dash.prevalence {
                ui.strong(format!("Prevalence of {}", condition.title()));
                summary(ui, prevalence, |ui, p| prevalence_chart(ui, condition.column(), p));
            }
            ui.separator();

            ui.heading("Relationships Between Conditions and Demographics");
            for (condition, groups) in &dash.age_vs_condition {
                // Unavailable box plots are skipped silently; the section
                // below already reports missing columns.
                if let Summary::Unavailable(_) = groups {
                    continue;
                }
                ui.strong(format!("Age vs. {}", condition.title()));
                summary(ui, groups, age_box_plot);
            }
            summary(ui, &dash.gender_vs_conditions, |ui, tables| {
                gender_means(ui, tables, &genders)
            });
            ui.separator();

            ui.heading("Location Analysis");
            ui.strong("Distribution of Records by Location");
            summary(ui, &dash.location, |ui, counts| {
                count_chart(ui, "location", counts, &locations)
            });
        });
}

fn demographics(ui: &mut Ui, dash: &Dashboard, genders: &CategoryColors, races: &CategoryColors) {
    ui.strong("Gender Distribution");
    summary(ui, &dash.gender, |ui, counts| count_chart(ui, "gender", counts, genders));

    ui.strong("Age Distribution");
    summary(ui, &dash.age, age_histogram);

    ui.strong("Race Distribution");
    summary(ui, &dash.race, |ui, counts| count_chart(ui, "race", counts, races));
}

/// Draw a ready summary, or the reason there is nothing to draw.
fn summary<T>(ui: &mut Ui, summary: &Summary<T>, draw: impl FnOnce(&mut Ui, &T)) {
    match summary {
        Summary::Ready(value) => draw(ui, value),
        Summary::Empty => {
            ui.label(RichText::new("No data for the selected filters.").italics());
        }
        Summary::Unavailable(why) => {
            ui.label(RichText::new(why.to_string()).italics());
        }
    }
}

// ---------------------------------------------------------------------------
// Individual charts
// ---------------------------------------------------------------------------

/// Static plot: the dashboard charts are not meant to be panned.
fn locked(plot: Plot) -> Plot {
    plot.allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .include_y(0.0)
}

/// Axis labels for bars placed at 0, 1, 2, …
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let v = mark.value;
        if v < 0.0 || (v - v.round()).abs() > 1e-6 {
            return String::new();
        }
        labels.get(v.round() as usize).cloned().unwrap_or_default()
    }
}

fn count_chart(ui: &mut Ui, id: &str, counts: &Counts, colors: &CategoryColors) {
    let labels: Vec<String> = counts.entries.iter().map(|(l, _)| l.clone()).collect();
    let bars: Vec<Bar> = counts
        .entries
        .iter()
        .enumerate()
        .map(|(i, (label, n))| {
            Bar::new(i as f64, *n as f64)
                .name(label)
                .width(0.7)
                .fill(colors.color_for(label))
        })
        .collect();

    locked(Plot::new(format!("{id}_counts")))
        .height(CHART_HEIGHT)
        .x_axis_formatter(category_axis(labels))
        .y_axis_label("Count")
        .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars)));
}

fn age_histogram(ui: &mut Ui, hist: &Histogram) {
    let bars: Vec<Bar> = hist
        .bins
        .iter()
        .map(|b| {
            Bar::new(b.center(), b.count as f64)
                .width(b.width())
                .name(format!("{:.0}–{:.0}", b.lower, b.upper))
        })
        .collect();

    locked(Plot::new("age_histogram"))
        .height(CHART_HEIGHT)
        .x_axis_label("age")
        .y_axis_label("Count")
        .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars)));
}

fn prevalence_chart(ui: &mut Ui, id: &str, p: &Prevalence) {
    let bars = vec![
        Bar::new(0.0, p.yes as f64).name("Yes").width(0.6).fill(YES_COLOR),
        Bar::new(1.0, p.no as f64).name("No").width(0.6).fill(NO_COLOR),
    ];

    locked(Plot::new(format!("{id}_prevalence")))
        .height(CHART_HEIGHT)
        .x_axis_formatter(category_axis(vec!["Yes".into(), "No".into()]))
        .y_axis_label("Count")
        .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars)));
}

fn age_box_plot(ui: &mut Ui, groups: &AgeGroups) {
    let mut boxes = Vec::new();
    for (x, label, stats, color) in [
        (0.0, "Yes", groups.yes_stats(), YES_COLOR),
        (1.0, "No", groups.no_stats(), NO_COLOR),
    ] {
        let Some(s) = stats else { continue };
        boxes.push(
            BoxElem::new(x, BoxSpread::new(s.min, s.q1, s.median, s.q3, s.max))
                .name(label)
                .box_width(0.5)
                .fill(color.gamma_multiply(0.4))
                .stroke(egui::Stroke::new(1.5, color)),
        );
    }

    locked(Plot::new(format!("{}_age_box", groups.condition.column())))
        .height(CHART_HEIGHT)
        .x_axis_formatter(category_axis(vec!["Yes".into(), "No".into()]))
        .y_axis_label("age")
        .show(ui, |plot_ui| plot_ui.box_plot(BoxPlot::new(boxes)));
}

/// One small bar chart per condition: gender → share of "Yes".
fn gender_means(ui: &mut Ui, tables: &[GenderMeans], colors: &CategoryColors) {
    for table in tables {
        ui.strong(format!("Gender vs. {}", table.condition.title()));

        let labels: Vec<String> = table.means.iter().map(|(g, _)| g.clone()).collect();
        let bars: Vec<Bar> = table
            .means
            .iter()
            .enumerate()
            .map(|(i, (gender, mean))| {
                Bar::new(i as f64, *mean)
                    .name(gender)
                    .width(0.6)
                    .fill(colors.color_for(gender))
            })
            .collect();

        locked(Plot::new(format!("{}_by_gender", table.condition.column())))
            .height(SMALL_CHART_HEIGHT)
            .include_y(1.0)
            .x_axis_formatter(category_axis(labels))
            .y_axis_label(table.condition.column())
            .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars)));
    }
}
