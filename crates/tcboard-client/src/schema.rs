use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Open payloads: overview & company overview
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

/// One value of an upstream payload whose shape is not guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<Field>),
    Map(Record),
}

pub type Record = BTreeMap<String, Field>;

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Null => f.write_str("null"),
            Field::Bool(b) => write!(f, "{b}"),
            Field::Number(n) => write!(f, "{n}"),
            Field::Text(s) => f.write_str(s),
            // nested values are shown as compact JSON
            Field::List(_) | Field::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<Value> for Field {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Field::Null,
            Value::Bool(b) => Field::Bool(b),
            Value::Number(n) => Field::Number(n),
            Value::String(s) => Field::Text(s),
            Value::Array(items) => Field::List(items.into_iter().map(Field::from).collect()),
            Value::Object(map) => Field::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

/// Whatever fields the upstream returned for a ticker (or its company).
///
/// ```json
/// {
///     "ticker": "VHM",
///     "lastPrice": 41500,
///     "change": -300,
///     "changePercent": -0.72,
///     ...
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Overview(pub Record);

pub type TickerOverview = Overview;
pub type CompanyOverview = Overview;

impl Overview {
    /// A field that exists and is not `null`.
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.0.get(key).filter(|field| **field != Field::Null)
    }

    pub fn last_price(&self) -> Option<&Field> {
        self.get("lastPrice")
    }

    pub fn change(&self) -> Option<&Field> {
        self.get("change")
    }

    pub fn change_percent(&self) -> Option<&Field> {
        self.get("changePercent")
    }

    /// Key/value rows for tabular display.
    pub fn rows(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(key, field)| (key.clone(), field.to_string()))
            .collect()
    }

    /// `null` is "no data". An object is taken as is, a list is keyed by
    /// position, and any other scalar has no fields.
    pub fn from_body(body: Value) -> Option<Self> {
        let record = match body {
            Value::Null => return None,
            Value::Object(map) => map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.into()))
                .collect(),
            _ => Record::new(),
        };
        Some(Self(record))
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Price history
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

// first truthy key wins
const DATE_KEYS: [&str; 3] = ["date", "tradingDate", "dt"];
const CLOSE_KEYS: [&str; 3] = ["close", "price", "c"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: String,
    pub close: f64,
}

impl HistoryPoint {
    /// Reads one upstream element, whichever spelling of date & close it uses.
    ///
    /// `{"tradingDate": "2024-01-01", "price": 10}` becomes `{"date": "2024-01-01", "close": 10}`.
    /// Empty strings, `0` and `null` count as absent and fall through to the next spelling.
    pub fn normalize(raw: &Value) -> Option<Self> {
        let date = DATE_KEYS
            .iter()
            .find_map(|key| raw.get(key).and_then(date_of))?;
        let close = CLOSE_KEYS
            .iter()
            .find_map(|key| raw.get(key).and_then(close_of))?;
        Some(Self { date, close })
    }
}

fn date_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn close_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|close| *close != 0.0),
        Value::String(s) if !s.is_empty() => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|close| close.is_finite()),
        _ => None,
    }
}

/// A non-sequence body means "no data". Elements missing a date or a close
/// are skipped; the rest keep the upstream order.
pub fn normalize_history(body: &Value) -> Vec<HistoryPoint> {
    match body {
        Value::Array(points) => points.iter().filter_map(HistoryPoint::normalize).collect(),
        _ => vec![],
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// History range codes
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Range {
    #[default]
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl Range {
    pub const ALL: [Range; 4] = [
        Range::OneMonth,
        Range::ThreeMonths,
        Range::SixMonths,
        Range::OneYear,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Range::OneMonth => "1m",
            Range::ThreeMonths => "3m",
            Range::SixMonths => "6m",
            Range::OneYear => "1y",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Range::OneMonth => "1 month",
            Range::ThreeMonths => "3 months",
            Range::SixMonths => "6 months",
            Range::OneYear => "1 year",
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Range {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Range::ALL
            .into_iter()
            .find(|range| range.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("unknown range {s:?}; expected one of 1m, 3m, 6m, 1y"))
    }
}
