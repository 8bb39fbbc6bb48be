use std::collections::BTreeSet;
use std::fmt;

use super::model::{HealthRecord, HealthTable, Schema};

// ---------------------------------------------------------------------------
// View – a row subset of the canonical table
// ---------------------------------------------------------------------------

/// Ordered row indices into a borrowed table.  Filtering builds a new view;
/// the table itself is never touched.
#[derive(Debug, Clone)]
pub struct View<'a> {
    table: &'a HealthTable,
    rows: Vec<usize>,
}

impl<'a> View<'a> {
    /// Every row of `table`.
    pub fn full(table: &'a HealthTable) -> Self {
        View {
            table,
            rows: (0..table.len()).collect(),
        }
    }

    pub fn schema(&self) -> &'a Schema {
        &self.table.schema
    }

    pub fn records(&self) -> impl Iterator<Item = &'a HealthRecord> + '_ {
        let table = self.table;
        self.rows.iter().map(move |&i| &table.records[i])
    }

    pub fn indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep the rows matching `keep`.
    pub fn retain<F>(&self, mut keep: F) -> View<'a>
    where
        F: FnMut(&HealthRecord) -> bool,
    {
        let table = self.table;
        View {
            table,
            rows: self
                .rows
                .iter()
                .copied()
                .filter(|&i| keep(&table.records[i]))
                .collect(),
        }
    }

    /// Copy the selected rows into an owned table with the same schema.
    pub fn materialize(&self) -> HealthTable {
        HealthTable {
            schema: self.table.schema.clone(),
            records: self.records().cloned().collect(),
        }
    }

    /// Smallest and largest non-missing `year`.
    pub fn year_span(&self) -> Option<(f64, f64)> {
        self.records().filter_map(|r| r.year).fold(None, |span, y| match span {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })
    }
}

// ---------------------------------------------------------------------------
// Filter selection
// ---------------------------------------------------------------------------

/// One dropdown value: everything, or a single value / column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Choice {
    #[default]
    All,
    Only(String),
}

impl Choice {
    pub fn only(value: impl Into<String>) -> Self {
        Choice::Only(value.into())
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            Choice::All => None,
            Choice::Only(v) => Some(v),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::All => f.write_str("All"),
            Choice::Only(v) => f.write_str(v),
        }
    }
}

/// The current restriction on gender, location and race flag column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterSelection {
    pub gender: Choice,
    pub location: Choice,
    pub race: Choice,
}

impl FilterSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_gender(mut self, gender: Choice) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_location(mut self, location: Choice) -> Self {
        self.location = location;
        self
    }

    pub fn with_race(mut self, race: Choice) -> Self {
        self.race = race;
        self
    }
}

// ---------------------------------------------------------------------------
// Selectable options
// ---------------------------------------------------------------------------

/// Values offered by the three dropdowns (besides "All").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub genders: Vec<String>,
    pub locations: Vec<String>,
    pub races: Vec<&'static str>,
}

impl FilterOptions {
    pub fn from_table(table: &HealthTable) -> Self {
        let distinct = |field: fn(&HealthRecord) -> Option<&String>| -> Vec<String> {
            table
                .records
                .iter()
                .filter_map(field)
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };

        FilterOptions {
            genders: distinct(|r| r.gender.as_ref()),
            locations: distinct(|r| r.location.as_ref()),
            races: table.schema.race_columns(),
        }
    }
}

// ---------------------------------------------------------------------------
// Applying a selection
// ---------------------------------------------------------------------------

/// Apply every active dimension of `selection` as an AND of exact-match
/// predicates.  A choice naming a column the schema lacks is ignored.
pub fn apply<'a>(view: &View<'a>, selection: &FilterSelection) -> View<'a> {
    let schema = view.schema();

    let gender = selection.gender.as_value().filter(|_| schema.gender);
    let location = selection.location.as_value().filter(|_| schema.location);
    let race = selection
        .race
        .as_value()
        .and_then(|col| schema.race_index(col).map(|_| col));

    if gender.is_none() && location.is_none() && race.is_none() {
        return view.clone();
    }

    view.retain(|r| {
        gender.map_or(true, |g| r.gender.as_deref() == Some(g))
            && location.map_or(true, |l| r.location.as_deref() == Some(l))
            && race.map_or(true, |col| r.race(col).is_yes())
    })
}
