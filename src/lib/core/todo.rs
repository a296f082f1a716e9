use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub text: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "TodoDate::is_absent")]
    pub date: TodoDate,
    /// Fields the client does not interpret; re-sent untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Todo {
    pub fn new(id: i64, text: impl Into<String>, completed: bool, date: TodoDate) -> Self {
        Self {
            id,
            text: text.into(),
            completed,
            date,
            extra: Map::new(),
        }
    }
}

/// A todo date as the server sent it. Numbers are epoch milliseconds; any
/// other JSON value is kept as-is and renders as an invalid date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TodoDate {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
    Other(Value),
    /// The todo carried no `date` field at all.
    #[serde(skip)]
    #[default]
    Absent,
}

impl TodoDate {
    pub fn is_absent(&self) -> bool {
        matches!(self, TodoDate::Absent)
    }

    /// Interprets the date the way a browser `Date` constructor would for the
    /// forms we accept. Date-only strings are taken as UTC midnight.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            TodoDate::Millis(ms) => DateTime::from_timestamp_millis(*ms),
            TodoDate::FractionalMillis(ms) if ms.is_finite() => {
                DateTime::from_timestamp_millis(ms.trunc() as i64)
            }
            TodoDate::FractionalMillis(_) => None,
            TodoDate::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(text, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|naive| naive.and_utc())
                }),
            TodoDate::Other(_) | TodoDate::Absent => None,
        }
    }
}

impl From<DateTime<Utc>> for TodoDate {
    fn from(dt: DateTime<Utc>) -> Self {
        TodoDate::Millis(dt.timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use serde_json::json;

    #[test]
    fn millis_and_iso_dates_resolve_to_the_same_instant() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let millis = TodoDate::Millis(expected.timestamp_millis());
        let text = TodoDate::Text("2024-03-15T12:00:00Z".to_string());
        assert_eq!(millis.to_datetime(), Some(expected));
        assert_eq!(text.to_datetime(), Some(expected));
    }

    #[test]
    fn date_only_string_is_utc_midnight() {
        let dt = TodoDate::Text("2024-03-15".to_string()).to_datetime().unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 3, 15));
        assert_eq!(dt.timestamp() % 86_400, 0);
    }

    #[test]
    fn garbage_date_does_not_resolve() {
        assert!(TodoDate::Text("someday".to_string()).to_datetime().is_none());
    }

    #[test]
    fn unknown_fields_survive_a_pass_through_the_client() {
        let raw = json!({
            "id": 7,
            "text": "Water plants",
            "completed": false,
            "date": "2024-03-15",
            "priority": "high"
        });
        let todo: Todo = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(todo.extra.get("priority"), Some(&json!("high")));
        assert_eq!(serde_json::to_value(&todo).unwrap(), raw);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let result: Result<Todo, _> =
            serde_json::from_value(json!({"id": 1, "completed": false, "date": 0}));
        assert!(result.is_err());
    }

    #[test]
    fn fractional_millis_resolve_like_whole_millis() {
        let todo: Todo = serde_json::from_value(
            json!({"id": 1, "text": "A", "completed": false, "date": 1710504000000.0}),
        )
        .unwrap();
        assert_eq!(todo.date, TodoDate::FractionalMillis(1710504000000.0));
        assert_eq!(todo.date.to_datetime(), Utc.timestamp_millis_opt(1710504000000).single());
    }

    #[test]
    fn null_and_odd_dates_are_kept_but_do_not_resolve() {
        for date in [json!(null), json!(true), json!({"at": 5})] {
            let raw = json!({"id": 1, "text": "A", "completed": false, "date": date});
            let todo: Todo = serde_json::from_value(raw.clone()).unwrap();
            assert!(todo.date.to_datetime().is_none());
            assert_eq!(serde_json::to_value(&todo).unwrap(), raw);
        }
    }

    #[test]
    fn missing_date_is_accepted_and_stays_missing() {
        let raw = json!({"id": 1, "text": "A", "completed": false});
        let todo: Todo = serde_json::from_value(raw.clone()).unwrap();
        assert!(todo.date.is_absent());
        assert!(todo.date.to_datetime().is_none());
        assert_eq!(serde_json::to_value(&todo).unwrap(), raw);
    }
}
