use crate::labels::LabelTable;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A loggable habit. Unrecognized keys read back from storage are kept
/// verbatim in `Unknown` so they survive a load/save cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Beer,
    Wine,
    Liquor,
    Smoking,
    Unknown(String),
}

impl Category {
    pub const KNOWN: [Category; 4] = [
        Category::Beer,
        Category::Wine,
        Category::Liquor,
        Category::Smoking,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "beer" => Category::Beer,
            "wine" => Category::Wine,
            "liquor" => Category::Liquor,
            "smoking" => Category::Smoking,
            _ => Category::Unknown(raw.trim().to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Category::Beer => "beer",
            Category::Wine => "wine",
            Category::Liquor => "liquor",
            Category::Smoking => "smoking",
            Category::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Unknown(_))
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Category::parse(&raw)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.key().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub category: Category,
}

/// Everything persisted: the entries plus the backend's opaque revision token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Snapshot {
    #[serde(default)]
    pub entries: Vec<Event>,
    #[serde(default)]
    pub revision: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u32", into = "u32")]
pub enum Period {
    #[default]
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Week, Period::Month, Period::Quarter, Period::Year];

    pub fn days(self) -> i64 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Quarter => 90,
            Period::Year => 365,
        }
    }

    pub fn granularity(self) -> Granularity {
        if self.days() <= 30 {
            Granularity::Day
        } else {
            Granularity::Week
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPeriod(pub String);

impl fmt::Display for InvalidPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "period must be one of 7, 30, 90 or 365 days (got {})", self.0)
    }
}

impl std::error::Error for InvalidPeriod {}

impl TryFrom<u32> for Period {
    type Error = InvalidPeriod;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            7 => Ok(Period::Week),
            30 => Ok(Period::Month),
            90 => Ok(Period::Quarter),
            365 => Ok(Period::Year),
            other => Err(InvalidPeriod(other.to_string())),
        }
    }
}

impl From<Period> for u32 {
    fn from(period: Period) -> Self {
        period.days() as u32
    }
}

impl FromStr for Period {
    type Err = InvalidPeriod;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let days: u32 = raw
            .trim()
            .parse()
            .map_err(|_| InvalidPeriod(raw.to_string()))?;
        Period::try_from(days)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
}

impl Granularity {
    pub fn label(self) -> &'static str {
        match self {
            Granularity::Day => "Daily",
            Granularity::Week => "Weekly",
        }
    }
}

/// Cosmetic only; aggregation never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartStyle {
    #[default]
    Bar,
    Line,
}

impl FromStr for ChartStyle {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartStyle::Bar),
            "line" => Ok(ChartStyle::Line),
            other => Err(format!("chart style must be 'bar' or 'line' (got '{other}')")),
        }
    }
}

/// Inclusive reporting interval in local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }

    /// Calendar days touched by the window, first to last.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let first = self.start.date();
        let last = self.end.date();
        (0..)
            .map(move |offset| first + Duration::days(offset))
            .take_while(move |date| *date <= last)
    }

    pub fn day_count(&self) -> u64 {
        let span = (self.end.date() - self.start.date()).num_days();
        if span < 0 { 0 } else { span as u64 + 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct CategoryCounts {
    pub beer: u64,
    pub wine: u64,
    pub liquor: u64,
    pub smoking: u64,
}

impl CategoryCounts {
    /// Returns false for categories that have no slot.
    pub fn record(&mut self, category: &Category) -> bool {
        let slot = match category {
            Category::Beer => &mut self.beer,
            Category::Wine => &mut self.wine,
            Category::Liquor => &mut self.liquor,
            Category::Smoking => &mut self.smoking,
            Category::Unknown(_) => return false,
        };
        *slot = slot.saturating_add(1);
        true
    }

    pub fn merge(&mut self, other: &CategoryCounts) {
        self.beer = self.beer.saturating_add(other.beer);
        self.wine = self.wine.saturating_add(other.wine);
        self.liquor = self.liquor.saturating_add(other.liquor);
        self.smoking = self.smoking.saturating_add(other.smoking);
    }

    pub fn total(&self) -> u64 {
        self.beer + self.wine + self.liquor + self.smoking
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct CategoryAverages {
    pub beer: f64,
    pub wine: f64,
    pub liquor: f64,
    pub smoking: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub counts: CategoryCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRow {
    pub date: NaiveDate,
    pub label: String,
    pub counts: CategoryCounts,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DaySplit {
    pub total: u64,
    pub counts: CategoryCounts,
    pub day_count: u64,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub totals: CategoryCounts,
    pub grand_total: u64,
    pub days: u64,
    pub per_day_average: CategoryAverages,
    pub weekday: DaySplit,
    pub weekend: DaySplit,
}

/// Everything one render pass needs, computed from a single snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub period: Period,
    pub granularity: Granularity,
    pub granularity_label: &'static str,
    pub window: Window,
    pub buckets: Vec<Bucket>,
    pub table: Vec<DayRow>,
    pub statistics: Statistics,
}

#[derive(Debug, Deserialize)]
pub struct NewEventRequest {
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub entries: usize,
    pub revision: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub labels: LabelTable,
    pub default_period: Period,
    pub periods: [Period; 4],
    pub chart_style: ChartStyle,
    pub storage: &'static str,
}
