use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use health_dashboard::data::aggregate::{
    condition_prevalence, gender_distribution, location_distribution, Prevalence,
};
use health_dashboard::data::cache::DatasetCache;
use health_dashboard::data::filter::apply;
use health_dashboard::{
    load, Choice, Condition, Dashboard, FilterOptions, FilterSelection, Flag, LoadError, Summary,
    Unavailable, View,
};

fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

const SCENARIO: &str = "\
gender,age,diabetes
Female,45,yes
Male,30,no
Female,50,Yes
";

#[test]
fn concrete_scenario_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let table = load(&write(&dir, "scenario.csv", SCENARIO)).unwrap();

    let flags: Vec<Option<u8>> = table
        .records
        .iter()
        .map(|r| r.flag(Condition::Diabetes).as_indicator())
        .collect();
    assert_eq!(flags, vec![Some(1), Some(0), Some(1)]);

    let view = View::full(&table);
    assert_eq!(
        condition_prevalence(&view, Condition::Diabetes),
        Summary::Ready(Prevalence { yes: 2, no: 1 })
    );
    let gender = gender_distribution(&view);
    let gender = gender.ready().unwrap();
    assert_eq!(gender.get("Female"), Some(2));
    assert_eq!(gender.get("Male"), Some(1));
    assert_eq!(gender.total(), table.len());

    let male = apply(&view, &FilterSelection::all().with_gender(Choice::only("Male")));
    assert_eq!(male.len(), 1);
    assert_eq!(male.materialize().records[0].gender.as_deref(), Some("Male"));
    assert_eq!(
        condition_prevalence(&male, Condition::Diabetes),
        Summary::Ready(Prevalence { yes: 0, no: 1 })
    );

    // The canonical table is untouched by filtering.
    assert_eq!(table.len(), 3);
}

#[test]
fn missing_location_degrades_to_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let table = load(&write(&dir, "no_location.csv", SCENARIO)).unwrap();
    let view = View::full(&table);

    assert_eq!(
        location_distribution(&view),
        Summary::Unavailable(Unavailable::MissingColumn("Location"))
    );
    assert!(FilterOptions::from_table(&table).locations.is_empty());

    let dash = Dashboard::compute(&view);
    assert!(dash.location.is_unavailable());
    assert!(dash.race.is_unavailable());
    assert!(dash.gender_vs_conditions.ready().is_some());
}

#[test]
fn missing_file_is_fatal_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut cache = DatasetCache::new();
    let err = cache.get_or_load(&dir.path().join("diabetes_dataset.csv")).unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }));
}

#[test]
fn json_and_csv_sources_agree() {
    let dir = tempfile::tempdir().unwrap();
    let csv = load(&write(&dir, "people.csv", SCENARIO)).unwrap();
    let json = load(&write(
        &dir,
        "people.json",
        r#"[
            {"gender": "Female", "age": 45, "diabetes": "yes"},
            {"gender": "Male", "age": 30, "diabetes": 0},
            {"gender": "Female", "age": 50.0, "diabetes": "Yes"}
        ]"#,
    ))
    .unwrap();

    assert_eq!(csv.schema, json.schema);
    assert_eq!(csv.records, json.records);
}

#[test]
fn parquet_source_is_cleaned_like_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.parquet");

    let gender: ArrayRef = Arc::new(StringArray::from(vec![Some("Female"), Some("Male"), None]));
    let age: ArrayRef = Arc::new(Float64Array::from(vec![Some(45.0), None, Some(50.0)]));
    let diabetes: ArrayRef = Arc::new(Int32Array::from(vec![1, 0, 2]));
    let smoking: ArrayRef = Arc::new(StringArray::from(vec!["No", "yes", "?"]));
    let race_asian: ArrayRef = Arc::new(BooleanArray::from(vec![true, false, true]));
    let columns = vec![
        ("gender", gender),
        ("age", age),
        ("diabetes", diabetes),
        ("smoking", smoking),
        ("race_asian", race_asian),
    ];
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, a)| Field::new(*name, a.data_type().clone(), true))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, a)| a).collect(),
    )
    .unwrap();
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let table = load(&path).unwrap();
    assert!(table.schema.gender && table.schema.age);
    assert!(!table.schema.location);
    assert_eq!(table.schema.race_columns(), vec!["race_asian"]);

    let r = &table.records;
    assert_eq!(r[2].gender, None);
    assert_eq!(r[1].age, None);
    assert_eq!(
        r.iter().map(|r| r.flag(Condition::Diabetes)).collect::<Vec<_>>(),
        vec![Flag::Yes, Flag::No, Flag::Missing]
    );
    assert_eq!(
        r.iter().map(|r| r.flag(Condition::Smoking)).collect::<Vec<_>>(),
        vec![Flag::No, Flag::Yes, Flag::Missing]
    );

    let asian = apply(
        &View::full(&table),
        &FilterSelection::all().with_race(Choice::only("race_asian")),
    );
    assert_eq!(asian.indices(), &[0, 2]);
}

#[test]
fn filter_properties_hold_on_a_larger_table() {
    let mut csv = String::from("gender,location,age,hypertension,race_hispanic\n");
    let genders = ["Female", "Male", "Other"];
    let locations = ["Alabama", "Alaska", "Arizona", "Florida"];
    for i in 0..60 {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            genders[i % 3],
            locations[i % 4],
            20 + i,
            ["yes", "no", ""][i % 3],
            u8::from(i % 5 == 0)
        ));
    }
    let dir = tempfile::tempdir().unwrap();
    let table = load(&write(&dir, "many.csv", &csv)).unwrap();
    let full = View::full(&table);

    assert_eq!(apply(&full, &FilterSelection::all()).materialize(), table);

    let selections = [
        FilterSelection::all().with_gender(Choice::only("Other")),
        FilterSelection::all().with_location(Choice::only("Alaska")),
        FilterSelection::all()
            .with_gender(Choice::only("Female"))
            .with_location(Choice::only("Florida")),
    ];
    for sel in &selections {
        let once = apply(&full, sel);
        assert_eq!(apply(&once, sel).indices(), once.indices());

        let p = *condition_prevalence(&once, Condition::Hypertension)
            .ready()
            .unwrap_or(&Prevalence::default());
        let present = once
            .records()
            .filter(|r| r.flag(Condition::Hypertension) != Flag::Missing)
            .count();
        assert_eq!(p.non_missing(), present);
    }

    let g = FilterSelection::all().with_gender(Choice::only("Male"));
    let l = FilterSelection::all().with_location(Choice::only("Arizona"));
    assert_eq!(
        apply(&apply(&full, &g), &l).indices(),
        apply(&apply(&full, &l), &g).indices()
    );

    let counts = gender_distribution(&full);
    assert_eq!(counts.ready().unwrap().total(), table.len());
}
