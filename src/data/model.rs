use std::fmt;

// ---------------------------------------------------------------------------
// Cell – a single raw value before cleaning
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from the source file.
///
/// CSV sources only ever produce `Text` and `Null`; JSON and Parquet keep
/// their native types so numeric flags like `1.0` still normalize.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Null => write!(f, "<null>"),
        }
    }
}

impl Cell {
    /// Wrap a CSV field: empty fields are nulls.
    pub fn from_field(s: &str) -> Self {
        if s.is_empty() {
            Cell::Null
        } else {
            Cell::Text(s.to_string())
        }
    }

    /// Lenient numeric coercion. Anything that doesn't parse is missing.
    pub fn to_number(&self) -> Option<f64> {
        let v = match self {
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Integer(i) => *i as f64,
            Cell::Float(v) => *v,
            Cell::Bool(b) => f64::from(u8::from(*b)),
            Cell::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Categorical text value; empty text and nulls are missing.
    pub fn to_category(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Text(s) if s.is_empty() => None,
            Cell::Float(v) if !v.is_finite() => None,
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Flag – tri-state health / race flag
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flag {
    Yes,
    No,
    #[default]
    Missing,
}

impl Flag {
    /// The single normalization applied to every flag column at load time.
    ///
    /// Text is trimmed and matched case-insensitively against
    /// `yes`/`no`/`1`/`0`; numbers must be exactly 1 or 0.
    pub fn normalize(cell: &Cell) -> Flag {
        match cell {
            Cell::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "yes" | "1" => Flag::Yes,
                "no" | "0" => Flag::No,
                _ => Flag::Missing,
            },
            Cell::Integer(1) => Flag::Yes,
            Cell::Integer(0) => Flag::No,
            Cell::Float(v) if *v == 1.0 => Flag::Yes,
            Cell::Float(v) if *v == 0.0 => Flag::No,
            Cell::Bool(true) => Flag::Yes,
            Cell::Bool(false) => Flag::No,
            _ => Flag::Missing,
        }
    }

    /// 1 / 0 for present values.
    pub fn as_indicator(self) -> Option<u8> {
        match self {
            Flag::Yes => Some(1),
            Flag::No => Some(0),
            Flag::Missing => None,
        }
    }

    pub fn is_yes(self) -> bool {
        self == Flag::Yes
    }
}

// ---------------------------------------------------------------------------
// Condition – the known health-flag columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Condition {
    Hypertension,
    HeartDisease,
    Smoking,
    Obesity,
    HighCholesterol,
    HighBloodGlucose,
    Diabetes,
}

impl Condition {
    pub const COUNT: usize = 7;

    /// All conditions in dashboard order.
    pub const ALL: [Condition; Condition::COUNT] = [
        Condition::Hypertension,
        Condition::HeartDisease,
        Condition::Smoking,
        Condition::Obesity,
        Condition::HighCholesterol,
        Condition::HighBloodGlucose,
        Condition::Diabetes,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Condition::Hypertension => "hypertension",
            Condition::HeartDisease => "heart_disease",
            Condition::Smoking => "smoking",
            Condition::Obesity => "obesity",
            Condition::HighCholesterol => "high_cholesterol",
            Condition::HighBloodGlucose => "high_blood_glucose",
            Condition::Diabetes => "diabetes",
        }
    }

    /// Human-readable title used in chart headings.
    pub fn title(self) -> &'static str {
        match self {
            Condition::Hypertension => "Hypertension",
            Condition::HeartDisease => "Heart Disease",
            Condition::Smoking => "Smoking",
            Condition::Obesity => "Obesity",
            Condition::HighCholesterol => "High Cholesterol",
            Condition::HighBloodGlucose => "High Blood Glucose",
            Condition::Diabetes => "Diabetes",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Known race/ethnicity flag columns, each independently optional.
pub const RACE_COLUMNS: [&str; 6] = [
    "race",
    "race_ethic",
    "race_asian",
    "race_caucasian",
    "race_hispanic",
    "race_other",
];

pub const GENDER: &str = "gender";
pub const LOCATION: &str = "location";
pub const AGE: &str = "age";
pub const YEAR: &str = "year";

// ---------------------------------------------------------------------------
// Schema – which optional columns the source actually carried
// ---------------------------------------------------------------------------

/// Column capabilities of a loaded table, checked once after load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub gender: bool,
    pub location: bool,
    pub age: bool,
    pub year: bool,
    conditions: [bool; Condition::COUNT],
    races: [bool; RACE_COLUMNS.len()],
}

impl Schema {
    /// Build the schema from source header names.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let has = |name: &str| headers.iter().any(|h| h.as_ref() == name);
        Schema {
            gender: has(GENDER),
            location: has(LOCATION),
            age: has(AGE),
            year: has(YEAR),
            conditions: Condition::ALL.map(|c| has(c.column())),
            races: RACE_COLUMNS.map(has),
        }
    }

    pub fn has_condition(&self, condition: Condition) -> bool {
        self.conditions[condition.index()]
    }

    /// Index of a race column if it is known and present.
    pub fn race_index(&self, column: &str) -> Option<usize> {
        RACE_COLUMNS
            .iter()
            .position(|c| *c == column)
            .filter(|&i| self.races[i])
    }

    /// Present race columns in known-column order.
    pub fn race_columns(&self) -> Vec<&'static str> {
        RACE_COLUMNS
            .iter()
            .zip(self.races)
            .filter(|(_, present)| *present)
            .map(|(c, _)| *c)
            .collect()
    }

    /// Present condition columns in dashboard order.
    pub fn conditions(&self) -> Vec<Condition> {
        Condition::ALL
            .into_iter()
            .filter(|c| self.has_condition(*c))
            .collect()
    }

    /// Names of every recognised column that is present.
    pub fn present_columns(&self) -> Vec<&'static str> {
        let mut cols = Vec::new();
        for (name, present) in [
            (GENDER, self.gender),
            (LOCATION, self.location),
            (AGE, self.age),
            (YEAR, self.year),
        ] {
            if present {
                cols.push(name);
            }
        }
        cols.extend(self.conditions().into_iter().map(Condition::column));
        cols.extend(self.race_columns());
        cols
    }
}

// ---------------------------------------------------------------------------
// HealthRecord / HealthTable
// ---------------------------------------------------------------------------

/// One cleaned row of the dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthRecord {
    pub gender: Option<String>,
    pub location: Option<String>,
    pub age: Option<f64>,
    pub year: Option<f64>,
    pub conditions: [Flag; Condition::COUNT],
    pub races: [Flag; RACE_COLUMNS.len()],
}

impl HealthRecord {
    pub fn flag(&self, condition: Condition) -> Flag {
        self.conditions[condition.index()]
    }

    /// Race flag by column name; unknown columns read as missing.
    pub fn race(&self, column: &str) -> Flag {
        RACE_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| self.races[i])
            .unwrap_or_default()
    }
}

/// The canonical cleaned table: rows plus the schema describing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthTable {
    pub schema: Schema,
    pub records: Vec<HealthRecord>,
}

impl HealthTable {
    /// Clean raw rows in one pass: numeric coercion and flag normalization.
    ///
    /// Rows shorter than `headers` read the missing trailing cells as null.
    pub fn from_cells<S: AsRef<str>>(headers: &[S], rows: Vec<Vec<Cell>>) -> Self {
        let schema = Schema::from_headers(headers);
        let position = |name: &str| headers.iter().position(|h| h.as_ref() == name);

        let gender_idx = position(GENDER);
        let location_idx = position(LOCATION);
        let age_idx = position(AGE);
        let year_idx = position(YEAR);
        let condition_idx = Condition::ALL.map(|c| position(c.column()));
        let race_idx = RACE_COLUMNS.map(position);

        let records = rows
            .into_iter()
            .map(|row| {
                let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i));
                HealthRecord {
                    gender: cell(gender_idx).and_then(Cell::to_category),
                    location: cell(location_idx).and_then(Cell::to_category),
                    age: cell(age_idx).and_then(Cell::to_number),
                    year: cell(year_idx).and_then(Cell::to_number),
                    conditions: condition_idx
                        .map(|i| cell(i).map(Flag::normalize).unwrap_or_default()),
                    races: race_idx.map(|i| cell(i).map(Flag::normalize).unwrap_or_default()),
                }
            })
            .collect();

        HealthTable { schema, records }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
