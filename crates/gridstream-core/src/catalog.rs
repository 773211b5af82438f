//! The simulator catalog: metadata, parameter schemas, and validation.
//!
//! The catalog maps a simulator identifier to display metadata, a
//! constructor parameter schema (name, type, bounds, default, step
//! granularity), an initial-condition schema, and a default color-scheme
//! name. It is the single source of truth for what a client may start
//! and with which parameters. Catalogs are TOML documents; a builtin
//! copy is embedded in the crate.

use crate::error::{GridStreamError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("simulators.toml");

/// Parameter value type, driving coercion and form input rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Int,
    Float,
}

/// Schema for one constructor parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    /// A parameter without a default is required in every start request.
    #[serde(default)]
    pub default: Option<f64>,
    /// Form input granularity hint.
    #[serde(default)]
    pub step: Option<f64>,
}

/// Schema for one initial-condition entry (informational, drives the
/// client's form; validation of the actual values happens against the
/// wire types).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSpec {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

/// Catalog entry for one simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub default_scheme: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default)]
    pub initial_conditions: Vec<ConditionSpec>,
}

/// Listing row for the selection surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// A resolved, type-coerced parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

/// Constructor parameters after validation: every schema entry present,
/// coerced to its declared type, bounds-checked, defaults filled in.
#[derive(Debug, Clone, Default)]
pub struct ResolvedParams(HashMap<String, ParamValue>);

impl ResolvedParams {
    /// Inserts a value; used by catalog resolution and by kernel tests.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.insert(name.into(), value);
    }

    /// Integer parameter as usize.
    ///
    /// # Errors
    ///
    /// Missing or negative values are internal errors: resolution
    /// guarantees schema parameters exist, so a miss here means the
    /// builder asked for a name the schema never declared.
    pub fn get_usize(&self, name: &str) -> Result<usize> {
        match self.0.get(name) {
            Some(ParamValue::Int(v)) if *v >= 0 => Ok(*v as usize),
            Some(other) => Err(GridStreamError::internal(format!(
                "parameter '{name}' is not a non-negative integer: {other:?}"
            ))),
            None => Err(GridStreamError::internal(format!(
                "parameter '{name}' missing from resolved set"
            ))),
        }
    }

    /// Float parameter (integer values widen).
    pub fn get_f64(&self, name: &str) -> Result<f64> {
        match self.0.get(name) {
            Some(ParamValue::Float(v)) => Ok(*v),
            Some(ParamValue::Int(v)) => Ok(*v as f64),
            None => Err(GridStreamError::internal(format!(
                "parameter '{name}' missing from resolved set"
            ))),
        }
    }
}

/// The full catalog, keyed by simulator identifier.
///
/// A `BTreeMap` keeps listings in a stable order.
#[derive(Debug, Clone, Default)]
pub struct SimulatorCatalog {
    simulators: BTreeMap<String, SimulatorConfig>,
}

impl SimulatorCatalog {
    /// Parses a catalog from a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let simulators: BTreeMap<String, SimulatorConfig> = toml::from_str(input)?;
        Ok(Self { simulators })
    }

    /// Loads a catalog from a TOML file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    /// The embedded builtin catalog.
    pub fn builtin() -> Self {
        // The embedded document is covered by tests; a parse failure here
        // is a build defect, not a runtime condition.
        Self::from_toml_str(BUILTIN_CATALOG).expect("builtin catalog parses")
    }

    /// Configuration for one simulator, if present.
    pub fn get(&self, sim_id: &str) -> Option<&SimulatorConfig> {
        self.simulators.get(sim_id)
    }

    /// Listing rows for the selection surface, in stable id order.
    pub fn list(&self) -> Vec<SimulatorSummary> {
        self.simulators
            .iter()
            .map(|(id, config)| SimulatorSummary {
                id: id.clone(),
                name: config.name.clone(),
                description: config.description.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.simulators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.simulators.is_empty()
    }

    /// Validates a raw parameter bag against a simulator's schema.
    ///
    /// Provided values are coerced to the declared type and
    /// bounds-checked; schema entries without a provided value fall back
    /// to their default. All failures are configuration errors: the
    /// caller must not register a session when this returns `Err`.
    ///
    /// # Errors
    ///
    /// `UnknownSimulator` for an id not in the catalog;
    /// `InvalidParameter` for a missing required value, a value of the
    /// wrong type, or a value outside the declared bounds.
    pub fn resolve(&self, sim_id: &str, params: &HashMap<String, Value>) -> Result<ResolvedParams> {
        let config = self
            .simulators
            .get(sim_id)
            .ok_or_else(|| GridStreamError::UnknownSimulator(sim_id.to_string()))?;

        let mut resolved = ResolvedParams::default();
        for spec in &config.parameters {
            let value = match params.get(&spec.name) {
                Some(raw) => coerce(spec, raw)?,
                None => match spec.default {
                    Some(default) => from_default(spec, default),
                    None => {
                        return Err(GridStreamError::invalid_parameter(
                            &spec.name,
                            "missing required parameter",
                        ));
                    }
                },
            };
            check_bounds(spec, value)?;
            resolved.insert(spec.name.clone(), value);
        }
        Ok(resolved)
    }
}

fn from_default(spec: &ParameterSpec, default: f64) -> ParamValue {
    match spec.kind {
        ParamKind::Int => ParamValue::Int(default as i64),
        ParamKind::Float => ParamValue::Float(default),
    }
}

/// Coerces a raw JSON value to the declared parameter type. Numeric
/// strings are accepted because HTML form payloads arrive as strings.
fn coerce(spec: &ParameterSpec, raw: &Value) -> Result<ParamValue> {
    match spec.kind {
        ParamKind::Int => {
            let parsed = match raw {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            parsed.map(ParamValue::Int).ok_or_else(|| {
                GridStreamError::invalid_parameter(
                    &spec.name,
                    format!("expected an integer, got {raw}"),
                )
            })
        }
        ParamKind::Float => {
            let parsed = match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            parsed
                .filter(|f| f.is_finite())
                .map(ParamValue::Float)
                .ok_or_else(|| {
                    GridStreamError::invalid_parameter(
                        &spec.name,
                        format!("expected a finite number, got {raw}"),
                    )
                })
        }
    }
}

fn check_bounds(spec: &ParameterSpec, value: ParamValue) -> Result<()> {
    let as_f64 = match value {
        ParamValue::Int(v) => v as f64,
        ParamValue::Float(v) => v,
    };
    if let Some(min) = spec.min {
        if as_f64 < min {
            return Err(GridStreamError::invalid_parameter(
                &spec.name,
                format!("{as_f64} is below the minimum {min}"),
            ));
        }
    }
    if let Some(max) = spec.max {
        if as_f64 > max {
            return Err(GridStreamError::invalid_parameter(
                &spec.name,
                format!("{as_f64} is above the maximum {max}"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = SimulatorCatalog::builtin();
        assert!(catalog.get("heat").is_some());
        assert!(catalog.get("ripples").is_some());
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_listing_is_stable() {
        let catalog = SimulatorCatalog::builtin();
        let ids: Vec<String> = catalog.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["heat".to_string(), "ripples".to_string()]);
    }

    #[test]
    fn test_resolve_defaults() {
        let catalog = SimulatorCatalog::builtin();
        let resolved = catalog.resolve("heat", &HashMap::new()).unwrap();
        assert_eq!(resolved.get_usize("width").unwrap(), 50);
        assert_eq!(resolved.get_f64("time_step").unwrap(), 0.1);
        assert_eq!(resolved.get_f64("thermal_diffusivity").unwrap(), 1.0);
    }

    #[test]
    fn test_resolve_coerces_form_strings() {
        let catalog = SimulatorCatalog::builtin();
        let mut params = HashMap::new();
        params.insert("width".to_string(), json!("64"));
        params.insert("time_step".to_string(), json!("0.05"));
        let resolved = catalog.resolve("heat", &params).unwrap();
        assert_eq!(resolved.get_usize("width").unwrap(), 64);
        assert_eq!(resolved.get_f64("time_step").unwrap(), 0.05);
    }

    #[test]
    fn test_resolve_unknown_simulator() {
        let catalog = SimulatorCatalog::builtin();
        let err = catalog.resolve("plasma", &HashMap::new()).unwrap_err();
        assert!(matches!(err, GridStreamError::UnknownSimulator(_)));
        assert!(err.is_config());
    }

    #[test]
    fn test_resolve_out_of_bounds() {
        let catalog = SimulatorCatalog::builtin();
        let mut params = HashMap::new();
        params.insert("width".to_string(), json!(100_000));
        let err = catalog.resolve("heat", &params).unwrap_err();
        assert!(matches!(err, GridStreamError::InvalidParameter { .. }));
    }

    #[test]
    fn test_resolve_wrong_type() {
        let catalog = SimulatorCatalog::builtin();
        let mut params = HashMap::new();
        params.insert("width".to_string(), json!("not a number"));
        let err = catalog.resolve("heat", &params).unwrap_err();
        assert!(matches!(err, GridStreamError::InvalidParameter { .. }));
    }

    #[test]
    fn test_missing_required_parameter() {
        let toml_doc = r#"
            [custom]
            name = "Custom"
            description = "No default on size"

            [[custom.parameters]]
            name = "size"
            kind = "int"
        "#;
        let catalog = SimulatorCatalog::from_toml_str(toml_doc).unwrap();
        let err = catalog.resolve("custom", &HashMap::new()).unwrap_err();
        match err {
            GridStreamError::InvalidParameter { name, .. } => assert_eq!(name, "size"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            r#"
                [waves]
                name = "Waves"
                description = "test catalog"
            "#,
        )
        .unwrap();

        let catalog = SimulatorCatalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("waves").is_some());
    }
}
