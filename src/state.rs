use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data::aggregate::Dashboard;
use crate::data::cache::DatasetCache;
use crate::data::filter::{apply, Choice, FilterOptions, FilterSelection, View};
use crate::data::model::HealthTable;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// The full dashboard session, independent of rendering.
pub struct AppState {
    /// File the canonical table is read from.
    pub data_path: PathBuf,

    /// Owns the canonical table between recomputations.
    cache: DatasetCache,

    /// Canonical table (None until a load succeeded).
    pub table: Option<Arc<HealthTable>>,

    /// Values offered by the dropdowns.
    pub options: FilterOptions,

    /// Current dropdown selections.
    pub selection: FilterSelection,

    /// Latest computed charts for the current selection.
    pub dashboard: Option<Dashboard>,

    /// Smallest and largest year among the visible records.
    pub year_span: Option<(f64, f64)>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            cache: DatasetCache::new(),
            table: None,
            options: FilterOptions::default(),
            selection: FilterSelection::all(),
            dashboard: None,
            year_span: None,
            status_message: None,
        }
    }

    /// Load `data_path` through the cache and compute the dashboard.
    pub fn load(&mut self) {
        let path = self.data_path.clone();
        let result = self.cache.get_or_load(&path);
        self.ingest(result);
    }

    /// Switch to another file; selections start over at "All".
    pub fn open(&mut self, path: &Path) {
        self.data_path = path.to_path_buf();
        self.selection = FilterSelection::all();
        self.load();
    }

    /// Re-read the current file, keeping selections that still exist.
    pub fn reload(&mut self) {
        let path = self.data_path.clone();
        let result = self.cache.reload(&path);
        self.ingest(result);
    }

    pub fn set_gender(&mut self, choice: Choice) {
        self.selection.gender = choice;
        self.refresh();
    }

    pub fn set_location(&mut self, choice: Choice) {
        self.selection.location = choice;
        self.refresh();
    }

    pub fn set_race(&mut self, choice: Choice) {
        self.selection.race = choice;
        self.refresh();
    }

    /// Number of records passing the current filters.
    pub fn visible(&self) -> usize {
        self.dashboard.as_ref().map_or(0, |d| d.records)
    }

    /// Recompute the filtered view and every chart summary.
    pub fn refresh(&mut self) {
        let Some(table) = &self.table else {
            self.dashboard = None;
            self.year_span = None;
            return;
        };
        let view = apply(&View::full(table), &self.selection);
        self.year_span = view.year_span();
        self.dashboard = Some(Dashboard::compute(&view));
    }

    fn ingest(&mut self, result: Result<Arc<HealthTable>, crate::LoadError>) {
        match result {
            Ok(table) => {
                self.options = FilterOptions::from_table(&table);
                self.selection = retain_known(&self.selection, &self.options);
                self.table = Some(table);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", self.data_path.display());
                self.table = None;
                self.options = FilterOptions::default();
                self.status_message = Some(format!("Error: {e}"));
            }
        }
        self.refresh();
    }
}

/// Reset any choice that the new options no longer offer.
fn retain_known(selection: &FilterSelection, options: &FilterOptions) -> FilterSelection {
    let keep = |choice: &Choice, offered: &dyn Fn(&str) -> bool| match choice.as_value() {
        Some(v) if !offered(v) => Choice::All,
        _ => choice.clone(),
    };
    FilterSelection {
        gender: keep(&selection.gender, &|v: &str| options.genders.iter().any(|g| g == v)),
        location: keep(&selection.location, &|v: &str| options.locations.iter().any(|l| l == v)),
        race: keep(&selection.race, &|v: &str| options.races.iter().any(|r| *r == v)),
    }
}
