// WebAssembly bindings for the calculator
use crate::calc;
use crate::dim::{registry, Quantity};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct UnitEntry<'a> {
    name: &'a str,
    spec: &'a str,
}

#[wasm_bindgen]
pub struct UnitCalcWasm {}

impl Default for UnitCalcWasm {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl UnitCalcWasm {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {}
    }

    /// Evaluate RPN tokens (JSON array of strings)
    /// units_json: optional JSON array of target units, top of stack first
    /// Returns JSON array of {value, unit, text}
    #[wasm_bindgen]
    pub fn evaluate(&self, tokens_json: &str, units_json: Option<String>) -> Result<String, JsValue> {
        let tokens: Vec<String> = serde_json::from_str(tokens_json)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse tokens JSON: {}", e)))?;
        let units: Vec<String> = match units_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| JsValue::from_str(&format!("Failed to parse units JSON: {}", e)))?,
            None => Vec::new(),
        };

        let tokens = calc::parse_tokens(&tokens).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let results = calc::evaluate(&tokens, &units).map_err(|e| JsValue::from_str(&e.to_string()))?;

        let views: Vec<calc::QuantityView> = results.iter().map(calc::QuantityView::from).collect();
        serde_json::to_string(&views)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize results: {}", e)))
    }

    /// Convert a value string such as "5 ft" into `unit`
    #[wasm_bindgen]
    pub fn convert(&self, value: &str, unit: &str) -> Result<String, JsValue> {
        let converted = Quantity::parse(value)
            .and_then(|q| q.convert_to(unit))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        serde_json::to_string(&calc::QuantityView::from(&converted))
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize result: {}", e)))
    }

    /// Returns JSON array of {name, spec} for every derived unit
    #[wasm_bindgen]
    pub fn list_units(&self) -> Result<String, JsValue> {
        let registry = registry::global();
        let entries: Vec<UnitEntry> = registry
            .definitions()
            .iter()
            .map(|(name, spec)| UnitEntry { name, spec })
            .collect();
        serde_json::to_string(&entries)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize units: {}", e)))
    }
}
