use serde::Serialize;

use crate::dim::Quantity;

#[derive(Debug, Serialize)]
pub struct QuantityView<'a> {
    pub value: f64,
    pub unit: Option<&'a str>,
    pub text: String,
}

impl<'a> From<&'a Quantity> for QuantityView<'a> {
    fn from(q: &'a Quantity) -> Self {
        Self {
            value: q.value(),
            unit: q.unit_name(),
            text: q.to_string(),
        }
    }
}

pub fn format_results(results: &[Quantity]) -> String {
    results
        .iter()
        .map(|q| q.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_results_json(results: &[Quantity]) -> String {
    let views: Vec<QuantityView> = results.iter().map(QuantityView::from).collect();
    serde_json::to_string_pretty(&views).unwrap_or_else(|_| format_results(results))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_comma_joined() {
        let results = vec![
            Quantity::parse("3 m").unwrap(),
            Quantity::parse("2").unwrap(),
        ];
        assert_eq!(format_results(&results), "3 m, 2");
    }

    #[test]
    fn test_json_output() {
        let results = vec![
            Quantity::parse("1.5 km").unwrap(),
            Quantity::parse("2").unwrap(),
        ];
        let json: serde_json::Value = serde_json::from_str(&format_results_json(&results)).unwrap();
        assert_eq!(json[0]["value"], 1.5);
        assert_eq!(json[0]["unit"], "km");
        assert_eq!(json[0]["text"], "1.5 km");
        assert!(json[1]["unit"].is_null());
    }
}
