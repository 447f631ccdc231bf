//! The user-visible run log and its value formatting

/// Append-only log of what a run did, in execution order
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    entries: Vec<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}

/// Render a float the way the log has always shown numbers: integral
/// values keep a trailing `.0` (`92.0`), others use the shortest form.
pub fn py_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else {
        format!("{}", value)
    }
}

/// `['a', 'b']`
pub fn py_list<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|item| format!("'{}'", item.as_ref().replace('\'', "\\'")))
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// Accuracy in `[0, 1]` as a percentage string rounded to 2 places: `"88.89%"`
pub fn accuracy_percent(accuracy: f64) -> String {
    format!("{}%", py_float(round_to(accuracy * 100.0, 2)))
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_py_float() {
        assert_eq!(py_float(92.0), "92.0");
        assert_eq!(py_float(88.89), "88.89");
        assert_eq!(py_float(0.25), "0.25");
        assert_eq!(py_float(0.0), "0.0");
    }

    #[test]
    fn test_py_list() {
        assert_eq!(py_list(&["a", "b"]), "['a', 'b']");
        assert_eq!(py_list::<&str>(&[]), "[]");
    }

    #[test]
    fn test_accuracy_percent() {
        assert_eq!(accuracy_percent(0.92), "92.0%");
        assert_eq!(accuracy_percent(8.0 / 9.0), "88.89%");
        assert_eq!(accuracy_percent(1.0), "100.0%");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(88.8888, 2), 88.89);
        assert_eq!(round_to(1.234, 0), 1.0);
    }

    #[test]
    fn test_run_log_keeps_order() {
        let mut log = RunLog::new();
        log.push("first");
        log.push(String::from("second"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.into_entries(), vec!["first", "second"]);
    }
}
