//! YouTube Analytics API v2 report queries and result tables.

use eyre::Context;
use jiff::civil::Date;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Parameters of a `reports.query` call.
///
/// See: <https://developers.google.com/youtube/analytics/reference/reports/query>
#[derive(Debug, Clone, PartialEq)]
pub struct ReportQuery {
    /// The channel or content owner the report is for, e.g. `channel==UC...`.
    pub ids: String,
    /// Comma-separated list of metrics.
    pub metrics: String,
    pub start_date: Date,
    pub end_date: Date,
    pub dimensions: Option<String>,
    /// Sort keys; a `-` prefix sorts descending.
    pub sort: Option<String>,
    pub filters: Option<String>,
    /// ISO 4217 code that monetary metrics are reported in.
    pub currency: Option<String>,
    pub max_results: Option<u32>,
}

impl ReportQuery {
    /// Monthly estimated revenue of the given videos over one calendar year.
    ///
    /// The range ends on December 1st, not December 31st. Revenue booked after the first of
    /// December is therefore not part of the report.
    pub fn monthly_revenue(
        channel_id: &str,
        video_ids: &[String],
        year: i16,
        currency: &str,
    ) -> eyre::Result<Self> {
        let start_date =
            Date::new(year, 1, 1).with_context(|| format!("first day of year {year}"))?;
        let end_date =
            Date::new(year, 12, 1).with_context(|| format!("first of december {year}"))?;
        Ok(Self {
            ids: format!("channel=={channel_id}"),
            metrics: "estimatedRevenue".to_string(),
            start_date,
            end_date,
            dimensions: Some("month".to_string()),
            sort: Some("month".to_string()),
            filters: Some(format!("video=={}", video_ids.join(","))),
            currency: Some(currency.to_string()),
            max_results: None,
        })
    }

    /// The query string parameters for this query, leaving out unset ones.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("ids", self.ids.clone()),
            ("metrics", self.metrics.clone()),
            ("startDate", self.start_date.to_string()),
            ("endDate", self.end_date.to_string()),
        ];
        let optional = [
            ("dimensions", self.dimensions.clone()),
            ("sort", self.sort.clone()),
            ("filters", self.filters.clone()),
            ("currency", self.currency.clone()),
            ("maxResults", self.max_results.map(|n| n.to_string())),
        ];
        params.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| Some((key, value?))),
        );
        params
    }
}

/// Response body of a `reports.query` call.
///
/// See: <https://developers.google.com/youtube/analytics/reference/reports/query#response>
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(rename = "columnHeaders", default)]
    pub column_headers: Vec<ColumnHeader>,
    /// Absent when the query matched no data.
    #[serde(default)]
    pub rows: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnHeader {
    pub name: String,
    #[serde(rename = "dataType")]
    pub data_type: DataType,
}

/// How the values of a report column are encoded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum DataType {
    Integer,
    Float,
    String,
    /// Any other type the API reports, such as `CURRENCY`.
    Other(String),
}

impl From<String> for DataType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "INTEGER" => DataType::Integer,
            "FLOAT" => DataType::Float,
            "STRING" => DataType::String,
            _ => DataType::Other(s),
        }
    }
}

/// A single typed value in a [`Report`] row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Integer(i64),
    Float(f64),
    String(String),
    Null,
    /// A value whose column type we do not interpret, kept as JSON.
    Other(Value),
}

impl Cell {
    /// Interprets a raw JSON cell according to its column's data type.
    ///
    /// Fractional numbers in an integer column are truncated toward zero.
    pub fn from_json(value: Value, data_type: &DataType) -> Self {
        match (data_type, value) {
            (_, Value::Null) => Cell::Null,
            (DataType::Integer, Value::Number(n)) => match n.as_i64() {
                Some(i) => Cell::Integer(i),
                None => match n.as_f64() {
                    Some(f) => Cell::Integer(f.trunc() as i64),
                    None => Cell::Other(Value::Number(n)),
                },
            },
            (DataType::Float, Value::Number(n)) => match n.as_f64() {
                Some(f) => Cell::Float(f),
                None => Cell::Other(Value::Number(n)),
            },
            (DataType::String, Value::String(s)) => Cell::String(s),
            (_, other) => Cell::Other(other),
        }
    }
}

// Delegates so that width and alignment flags reach the inner value.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Integer(i) => fmt::Display::fmt(i, f),
            Cell::Float(x) => fmt::Display::fmt(x, f),
            Cell::String(s) => f.pad(s),
            Cell::Null => f.pad(""),
            Cell::Other(Value::String(s)) => f.pad(s),
            Cell::Other(v) => f.pad(&v.to_string()),
        }
    }
}

/// A typed column/row table produced by a report query.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub headers: Vec<ColumnHeader>,
    /// Each row has one cell per header, in header order.
    pub rows: Vec<Vec<Cell>>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<QueryResponse> for Report {
    fn from(response: QueryResponse) -> Self {
        let headers = response.column_headers;
        let unknown = DataType::Other(String::new());
        let rows = response
            .rows
            .unwrap_or_default()
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .map(|(i, value)| {
                        let data_type = headers.get(i).map_or(&unknown, |h| &h.data_type);
                        Cell::from_json(value, data_type)
                    })
                    .collect()
            })
            .collect();
        Self { headers, rows }
    }
}
