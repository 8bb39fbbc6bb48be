//! Chart-ready summaries of a (filtered) view.
//!
//! Every aggregator checks the schema first and answers
//! [`Summary::Unavailable`] when a required column is absent, then
//! [`Summary::Empty`] when there is nothing to count.

use std::collections::BTreeMap;

use thiserror::Error;

use super::filter::View;
use super::model::{Condition, Flag};

/// Number of equal-width bins in the age histogram.
pub const AGE_BINS: usize = 20;

// ---------------------------------------------------------------------------
// Result wrapper
// ---------------------------------------------------------------------------

/// Why a chart cannot be drawn.  The message is shown in place of the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Unavailable {
    #[error("{0} data is not available.")]
    MissingColumn(&'static str),
    #[error("Race/Ethnicity data is not available.")]
    NoRaceColumns,
    #[error("No conditions available to plot vs gender.")]
    NoConditions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Summary<T> {
    Ready(T),
    /// Columns are present but no rows contribute.
    Empty,
    Unavailable(Unavailable),
}

impl<T> Summary<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Summary::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Summary::Unavailable(_))
    }
}

fn require(present: bool, column: &'static str) -> Result<(), Unavailable> {
    if present {
        Ok(())
    } else {
        Err(Unavailable::MissingColumn(column))
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Category → count, most frequent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counts {
    pub entries: Vec<(String, usize)>,
}

impl Counts {
    fn from_map(map: BTreeMap<String, usize>) -> Self {
        let mut entries: Vec<(String, usize)> = map.into_iter().collect();
        // Stable sort keeps ties in label order.
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Counts { entries }
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, n)| *n)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl Bin {
    pub fn center(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub bins: Vec<Bin>,
}

impl Histogram {
    /// Equal-width bins spanning the values; the last bin is closed.
    pub fn from_values(values: &[f64], n_bins: usize) -> Option<Self> {
        let n_bins = n_bins.max(1);
        let min = values.iter().copied().reduce(f64::min)?;
        let max = values.iter().copied().reduce(f64::max)?;
        let (lower, upper) = if (max - min).abs() < f64::EPSILON {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };
        let width = (upper - lower) / n_bins as f64;

        let mut bins: Vec<Bin> = (0..n_bins)
            .map(|i| Bin {
                lower: lower + width * i as f64,
                upper: lower + width * (i + 1) as f64,
                count: 0,
            })
            .collect();
        for &v in values {
            let idx = (((v - lower) / width).floor() as usize).min(n_bins - 1);
            bins[idx].count += 1;
        }
        Some(Histogram { bins })
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Yes/No counts of one health flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Prevalence {
    pub yes: usize,
    pub no: usize,
}

impl Prevalence {
    pub fn non_missing(&self) -> usize {
        self.yes + self.no
    }
}

/// Five-number summary for a box plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl BoxStats {
    /// Quartiles by linear interpolation between closest ranks.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        let quantile = |q: f64| {
            let pos = q * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        };
        Some(BoxStats {
            min: sorted[0],
            q1: quantile(0.25),
            median: quantile(0.5),
            q3: quantile(0.75),
            max: sorted[n - 1],
        })
    }
}

/// Ages split by one condition's Yes/No value.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeGroups {
    pub condition: Condition,
    pub yes: Vec<f64>,
    pub no: Vec<f64>,
}

impl AgeGroups {
    pub fn yes_stats(&self) -> Option<BoxStats> {
        BoxStats::from_values(&self.yes)
    }

    pub fn no_stats(&self) -> Option<BoxStats> {
        BoxStats::from_values(&self.no)
    }
}

/// Mean of one condition's 0/1 flag per gender.
#[derive(Debug, Clone, PartialEq)]
pub struct GenderMeans {
    pub condition: Condition,
    pub means: Vec<(String, f64)>,
}

// ---------------------------------------------------------------------------
// Aggregators
// ---------------------------------------------------------------------------

fn category_counts<'a>(values: impl Iterator<Item = Option<&'a String>>) -> Summary<Counts> {
    let mut map: BTreeMap<String, usize> = BTreeMap::new();
    for v in values.flatten() {
        *map.entry(v.clone()).or_default() += 1;
    }
    if map.is_empty() {
        Summary::Empty
    } else {
        Summary::Ready(Counts::from_map(map))
    }
}

pub fn gender_distribution(view: &View) -> Summary<Counts> {
    if let Err(why) = require(view.schema().gender, "Gender") {
        return Summary::Unavailable(why);
    }
    category_counts(view.records().map(|r| r.gender.as_ref()))
}

pub fn location_distribution(view: &View) -> Summary<Counts> {
    if let Err(why) = require(view.schema().location, "Location") {
        return Summary::Unavailable(why);
    }
    category_counts(view.records().map(|r| r.location.as_ref()))
}

pub fn age_distribution(view: &View) -> Summary<Histogram> {
    if let Err(why) = require(view.schema().age, "Age") {
        return Summary::Unavailable(why);
    }
    let ages: Vec<f64> = view.records().filter_map(|r| r.age).collect();
    match Histogram::from_values(&ages, AGE_BINS) {
        Some(h) => Summary::Ready(h),
        None => Summary::Empty,
    }
}

/// "Yes" count per present race column, in known-column order.
pub fn race_distribution(view: &View) -> Summary<Counts> {
    let columns = view.schema().race_columns();
    if columns.is_empty() {
        return Summary::Unavailable(Unavailable::NoRaceColumns);
    }
    if view.is_empty() {
        return Summary::Empty;
    }
    let entries = columns
        .into_iter()
        .map(|col| {
            let n = view.records().filter(|r| r.race(col).is_yes()).count();
            (col.to_string(), n)
        })
        .collect();
    Summary::Ready(Counts { entries })
}

pub fn condition_prevalence(view: &View, condition: Condition) -> Summary<Prevalence> {
    if let Err(why) = require(view.schema().has_condition(condition), condition.title()) {
        return Summary::Unavailable(why);
    }
    let mut p = Prevalence::default();
    for r in view.records() {
        match r.flag(condition) {
            Flag::Yes => p.yes += 1,
            Flag::No => p.no += 1,
            Flag::Missing => {}
        }
    }
    if p.non_missing() == 0 {
        Summary::Empty
    } else {
        Summary::Ready(p)
    }
}

pub fn age_vs_condition(view: &View, condition: Condition) -> Summary<AgeGroups> {
    let schema = view.schema();
    if let Err(why) = require(schema.has_condition(condition), condition.title())
        .and_then(|_| require(schema.age, "Age"))
    {
        return Summary::Unavailable(why);
    }
    let mut groups = AgeGroups {
        condition,
        yes: Vec::new(),
        no: Vec::new(),
    };
    for r in view.records() {
        let Some(age) = r.age else { continue };
        match r.flag(condition) {
            Flag::Yes => groups.yes.push(age),
            Flag::No => groups.no.push(age),
            Flag::Missing => {}
        }
    }
    if groups.yes.is_empty() && groups.no.is_empty() {
        Summary::Empty
    } else {
        Summary::Ready(groups)
    }
}

/// One table per present condition: gender → mean of the 0/1 flag.
pub fn gender_vs_conditions(view: &View, conditions: &[Condition]) -> Summary<Vec<GenderMeans>> {
    let schema = view.schema();
    if let Err(why) = require(schema.gender, "Gender") {
        return Summary::Unavailable(why);
    }
    let present: Vec<Condition> = conditions
        .iter()
        .copied()
        .filter(|c| schema.has_condition(*c))
        .collect();
    if present.is_empty() {
        return Summary::Unavailable(Unavailable::NoConditions);
    }
    if view.is_empty() {
        return Summary::Empty;
    }

    let tables = present
        .into_iter()
        .map(|condition| {
            let mut sums: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
            for r in view.records() {
                let gender = r.gender.as_deref();
                let (Some(gender), Some(v)) = (gender, r.flag(condition).as_indicator()) else {
                    continue;
                };
                let entry = sums.entry(gender).or_default();
                entry.0 += usize::from(v);
                entry.1 += 1;
            }
            GenderMeans {
                condition,
                means: sums
                    .into_iter()
                    .map(|(g, (yes, n))| (g.to_string(), yes as f64 / n as f64))
                    .collect(),
            }
        })
        .collect();
    Summary::Ready(tables)
}

// ---------------------------------------------------------------------------
// Dashboard – one full recomputation pass
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub records: usize,
    pub gender: Summary<Counts>,
    pub age: Summary<Histogram>,
    pub race: Summary<Counts>,
    pub prevalence: Vec<(Condition, Summary<Prevalence>)>,
    pub age_vs_condition: Vec<(Condition, Summary<AgeGroups>)>,
    pub gender_vs_conditions: Summary<Vec<GenderMeans>>,
    pub location: Summary<Counts>,
}

impl Dashboard {
    pub fn compute(view: &View) -> Self {
        log::debug!("Computing dashboard over {} records", view.len());
        Dashboard {
            records: view.len(),
            gender: gender_distribution(view),
            age: age_distribution(view),
            race: race_distribution(view),
            prevalence: Condition::ALL
                .into_iter()
                .map(|c| (c, condition_prevalence(view, c)))
                .collect(),
            age_vs_condition: Condition::ALL
                .into_iter()
                .map(|c| (c, age_vs_condition(view, c)))
                .collect(),
            gender_vs_conditions: gender_vs_conditions(view, &Condition::ALL),
            location: location_distribution(view),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply, Choice, FilterSelection};
    use crate::data::loader::read_delimited;
    use crate::data::model::HealthTable;

    fn table(csv: &str) -> HealthTable {
        read_delimited(csv.as_bytes(), b',').unwrap()
    }

    const PEOPLE: &str = "\
gender,age,diabetes,smoking,location,race_asian,race_other
Female,45,yes,no,Alabama,1,0
Male,30,no,,Alaska,0,0
Female,50,Yes,1,Alabama,1,0
";

    #[test]
    fn gender_and_prevalence_scenario() {
        let t = table(PEOPLE);
        let view = View::full(&t);

        let gender = gender_distribution(&view);
        let counts = gender.ready().unwrap();
        assert_eq!(counts.entries, vec![("Female".into(), 2), ("Male".into(), 1)]);
        assert_eq!(counts.total(), t.len());

        assert_eq!(
            condition_prevalence(&view, Condition::Diabetes),
            Summary::Ready(Prevalence { yes: 2, no: 1 })
        );
    }

    #[test]
    fn male_filter_scenario() {
        let t = table(PEOPLE);
        let sel = FilterSelection::all().with_gender(Choice::only("Male"));
        let view = apply(&View::full(&t), &sel);

        assert_eq!(view.len(), 1);
        assert_eq!(
            condition_prevalence(&view, Condition::Diabetes),
            Summary::Ready(Prevalence { yes: 0, no: 1 })
        );
    }

    #[test]
    fn prevalence_excludes_missing_flags() {
        let t = table(PEOPLE);
        let view = View::full(&t);
        let p = *condition_prevalence(&view, Condition::Smoking).ready().unwrap();
        assert_eq!(p, Prevalence { yes: 1, no: 1 });
        let missing = view
            .records()
            .filter(|r| r.flag(Condition::Smoking) == Flag::Missing)
            .count();
        assert_eq!(p.non_missing() + missing, view.len());
    }

    #[test]
    fn missing_columns_are_unavailable() {
        let t = table("gender,age\nMale,30\n");
        let view = View::full(&t);
        assert_eq!(
            location_distribution(&view),
            Summary::Unavailable(Unavailable::MissingColumn("Location"))
        );
        assert_eq!(
            race_distribution(&view),
            Summary::Unavailable(Unavailable::NoRaceColumns)
        );
        assert!(condition_prevalence(&view, Condition::Obesity).is_unavailable());
        assert!(age_vs_condition(&view, Condition::Obesity).is_unavailable());
        assert_eq!(
            gender_vs_conditions(&view, &Condition::ALL),
            Summary::Unavailable(Unavailable::NoConditions)
        );
        assert_eq!(
            Unavailable::MissingColumn("Location").to_string(),
            "Location data is not available."
        );
    }

    #[test]
    fn empty_view_yields_empty_summaries() {
        let t = table(PEOPLE);
        let sel = FilterSelection::all().with_location(Choice::only("Nowhere"));
        let view = apply(&View::full(&t), &sel);
        let dash = Dashboard::compute(&view);

        assert_eq!(dash.records, 0);
        assert_eq!(dash.gender, Summary::Empty);
        assert_eq!(dash.age, Summary::Empty);
        assert_eq!(dash.race, Summary::Empty);
        assert_eq!(dash.location, Summary::Empty);
        assert_eq!(dash.gender_vs_conditions, Summary::Empty);
        assert!(dash.prevalence.iter().all(|(c, s)| match c {
            Condition::Diabetes | Condition::Smoking => *s == Summary::Empty,
            _ => s.is_unavailable(),
        }));
    }

    #[test]
    fn race_distribution_keeps_zero_columns() {
        let t = table(PEOPLE);
        let race = race_distribution(&View::full(&t));
        assert_eq!(
            race.ready().unwrap().entries,
            vec![("race_asian".into(), 2), ("race_other".into(), 0)]
        );
    }

    #[test]
    fn age_histogram_has_twenty_bins() {
        let ages: String = (0..=80).map(|a| format!("{a}\n")).collect();
        let t = table(&format!("age\n{ages}n/a\n"));
        let hist = age_distribution(&View::full(&t));
        let hist = hist.ready().unwrap();

        assert_eq!(hist.bins.len(), AGE_BINS);
        assert_eq!(hist.total(), 81);
        assert_eq!(hist.bins[0].lower, 0.0);
        assert_eq!(hist.bins[AGE_BINS - 1].upper, 80.0);
        assert_eq!(hist.bins[AGE_BINS - 1].count, 5);
    }

    #[test]
    fn single_age_gets_a_unit_bin_range() {
        let h = Histogram::from_values(&[40.0, 40.0], AGE_BINS).unwrap();
        assert_eq!(h.total(), 2);
        assert_eq!(h.bins[0].lower, 39.5);
        assert!(Histogram::from_values(&[], AGE_BINS).is_none());
    }

    #[test]
    fn age_vs_condition_partitions_ages() {
        let t = table(PEOPLE);
        let groups = age_vs_condition(&View::full(&t), Condition::Diabetes);
        let groups = groups.ready().unwrap();
        assert_eq!(groups.yes, vec![45.0, 50.0]);
        assert_eq!(groups.no, vec![30.0]);
        assert_eq!(groups.yes_stats().unwrap().median, 47.5);
    }

    #[test]
    fn box_stats_interpolate_quartiles() {
        let stats = BoxStats::from_values(&[4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();
        assert_eq!(
            stats,
            BoxStats {
                min: 1.0,
                q1: 2.0,
                median: 3.0,
                q3: 4.0,
                max: 5.0
            }
        );
        let even = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(even.q1, 1.75);
        assert_eq!(even.median, 2.5);
    }

    #[test]
    fn gender_means_per_condition() {
        let t = table(PEOPLE);
        let result = gender_vs_conditions(
            &View::full(&t),
            &[Condition::Diabetes, Condition::Smoking, Condition::Obesity],
        );
        let tables = result.ready().unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].condition, Condition::Diabetes);
        assert_eq!(tables[0].means, vec![("Female".into(), 1.0), ("Male".into(), 0.0)]);
        // Male smoking flag is missing, so only Female appears.
        assert_eq!(tables[1].means, vec![("Female".into(), 0.5)]);
    }

    #[test]
    fn dashboard_covers_every_condition() {
        let t = table(PEOPLE);
        let dash = Dashboard::compute(&View::full(&t));
        assert_eq!(dash.prevalence.len(), Condition::COUNT);
        assert_eq!(dash.age_vs_condition.len(), Condition::COUNT);
        assert_eq!(dash.location.ready().unwrap().get("Alabama"), Some(2));
    }
}
