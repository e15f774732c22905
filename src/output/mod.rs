use crate::models::StateLayout;
use serde::{Deserialize, Serialize};

/// Drug quantity per compartment on the shared time grid. Serialises with
/// the keys the plotting side indexes by: `t`, `Central`, `Peripheries` and,
/// for the subcutaneous route only, `Dose`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub t: Vec<f64>,
    #[serde(rename = "Central")]
    pub central: Vec<f64>,
    #[serde(rename = "Peripheries")]
    pub peripheries: Vec<Vec<f64>>,
    #[serde(rename = "Dose", default, skip_serializing_if = "Option::is_none")]
    pub dose: Option<Vec<f64>>,
}

impl SimulationResult {
    /// Splits solver rows (one state vector per time point) into series.
    pub fn from_rows(t: Vec<f64>, rows: &[Vec<f64>], layout: &StateLayout) -> Self {
        let column = |index: usize| rows.iter().map(|row| row[index]).collect::<Vec<f64>>();

        Self {
            central: column(layout.central),
            peripheries: layout.peripheries.clone().map(column).collect(),
            dose: layout.dose.map(column),
            t,
        }
    }

    pub fn route_name(&self) -> &'static str {
        if self.dose.is_some() {
            "Subcutaneous"
        } else {
            "Intravenous"
        }
    }

    /// Every series with its legend label.
    pub fn series(&self) -> Vec<(String, &[f64])> {
        let mut out = vec![("Central".to_string(), self.central.as_slice())];
        for (i, series) in self.peripheries.iter().enumerate() {
            out.push((format!("Peripheral {}", i + 1), series.as_slice()));
        }
        if let Some(dose) = &self.dose {
            out.push(("Dose".to_string(), dose.as_slice()));
        }
        out
    }

    pub fn summaries(&self) -> Vec<SeriesSummary> {
        self.series()
            .into_iter()
            .map(|(label, values)| SeriesSummary::new(label, &self.t, values))
            .collect()
    }

    pub fn to_keyed_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub label: String,
    pub max_quantity: f64,
    pub time_to_max: Option<f64>,
    pub final_quantity: f64,
    pub auc: f64,
}

impl SeriesSummary {
    pub fn new(label: String, t: &[f64], values: &[f64]) -> Self {
        Self {
            label,
            max_quantity: max_quantity(values),
            time_to_max: time_to_max(t, values),
            final_quantity: values.last().copied().unwrap_or(0.0),
            auc: auc(t, values),
        }
    }
}

pub fn max_quantity(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}

pub fn time_to_max(t: &[f64], values: &[f64]) -> Option<f64> {
    t.iter()
        .zip(values)
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(time, _)| *time)
}

/// Trapezoidal area under a quantity-time curve.
pub fn auc(t: &[f64], values: &[f64]) -> f64 {
    let mut area = 0.0;

    for (tw, vw) in t.windows(2).zip(values.windows(2)) {
        let dt = tw[1] - tw[0];
        let avg = (vw[0] + vw[1]) / 2.0;
        area += dt * avg;
    }

    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> SimulationResult {
        let layout = StateLayout { dose: Some(0), central: 1, peripheries: 2..4 };
        let rows = vec![
            vec![0.0, 0.0, 0.0, 0.0],
            vec![1.0, 2.0, 3.0, 4.0],
            vec![0.5, 4.0, 1.0, 2.0],
        ];
        SimulationResult::from_rows(vec![0.0, 1.0, 2.0], &rows, &layout)
    }

    #[test]
    fn test_from_rows_splits_columns() {
        let result = sample();
        assert_eq!(result.dose, Some(vec![0.0, 1.0, 0.5]));
        assert_eq!(result.central, vec![0.0, 2.0, 4.0]);
        assert_eq!(result.peripheries, vec![vec![0.0, 3.0, 1.0], vec![0.0, 4.0, 2.0]]);
        assert_eq!(result.route_name(), "Subcutaneous");
    }

    #[test]
    fn test_keyed_json() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_keyed_json().unwrap()).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 4);
        for key in ["t", "Central", "Peripheries", "Dose"] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(json["Peripheries"].as_array().unwrap().len(), 2);

        let mut iv = sample();
        iv.dose = None;
        let json: serde_json::Value = serde_json::from_str(&iv.to_keyed_json().unwrap()).unwrap();
        assert!(json.get("Dose").is_none());
        assert_eq!(iv.route_name(), "Intravenous");
    }

    #[test]
    fn test_series_labels() {
        let labels: Vec<String> = sample().series().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Central", "Peripheral 1", "Peripheral 2", "Dose"]);
    }

    #[test]
    fn test_summary_endpoints() {
        let t = [0.0, 1.0, 2.0, 3.0];
        let values = [0.0, 4.0, 2.0, 1.0];
        let summary = SeriesSummary::new("Central".to_string(), &t, &values);

        assert_relative_eq!(summary.max_quantity, 4.0);
        assert_eq!(summary.time_to_max, Some(1.0));
        assert_relative_eq!(summary.final_quantity, 1.0);
        assert_relative_eq!(summary.auc, 2.0 + 3.0 + 1.5);
        assert_eq!(time_to_max(&[], &[]), None);
    }
}
