use crate::models::Route;

/// A reservoir holding drug. Every compartment has a strictly positive volume.
pub trait Compartment {
    fn volume(&self) -> f64;
}

/// Systemic blood/plasma.
#[derive(Debug, Clone, PartialEq)]
pub struct Central {
    pub volume: f64,
}

/// Peripheral tissue exchanging drug with the central compartment.
#[derive(Debug, Clone, PartialEq)]
pub struct Periphery {
    pub volume: f64,
    pub transition_rate: f64, // Q_p
}

/// Subcutaneous depot the drug is absorbed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Dose {
    pub volume: f64,
    pub absorption_rate: f64, // k_a
}

impl Compartment for Central {
    fn volume(&self) -> f64 {
        self.volume
    }
}

impl Compartment for Periphery {
    fn volume(&self) -> f64 {
        self.volume
    }
}

impl Compartment for Dose {
    fn volume(&self) -> f64 {
        self.volume
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Compartments {
    pub central: Central,
    pub peripheries: Vec<Periphery>,
    pub dose: Option<Dose>,
}

impl Compartments {
    pub fn len(&self) -> usize {
        1 + self.peripheries.len() + usize::from(self.dose.is_some())
    }

    /// Compartments keyed the way results are labelled.
    pub fn labelled(&self) -> Vec<(String, &dyn Compartment)> {
        let mut out: Vec<(String, &dyn Compartment)> = Vec::with_capacity(self.len());
        out.push(("Central".to_string(), &self.central));
        for (i, periphery) in self.peripheries.iter().enumerate() {
            out.push((format!("Periphery {}", i + 1), periphery));
        }
        if let Some(dose) = &self.dose {
            out.push(("Dose".to_string(), dose));
        }
        out
    }
}

/// Central plus one periphery per entry of the (already validated) lists.
pub fn build_base_compartments(v_c: f64, v_p_list: &[f64], q_p_list: &[f64]) -> Compartments {
    let peripheries = v_p_list
        .iter()
        .zip(q_p_list)
        .map(|(&volume, &transition_rate)| Periphery { volume, transition_rate })
        .collect();

    Compartments {
        central: Central { volume: v_c },
        peripheries,
        dose: None,
    }
}

/// Route-specific step run after the base set is built.
pub fn extend(mut compartments: Compartments, route: &Route) -> Compartments {
    match route {
        Route::Intravenous => {},
        Route::Subcutaneous { v_0, k_a } => {
            compartments.dose = Some(Dose {
                volume: *v_0,
                absorption_rate: *k_a,
            });
        },
    }
    compartments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_compartments_follow_list_order() {
        let compartments = build_base_compartments(2.0, &[1.0, 3.0], &[0.5, 0.25]);
        assert_eq!(compartments.central.volume(), 2.0);
        assert_eq!(compartments.peripheries.len(), 2);
        assert_eq!(compartments.peripheries[1].volume, 3.0);
        assert_eq!(compartments.peripheries[1].transition_rate, 0.25);
        assert!(compartments.dose.is_none());
    }

    #[test]
    fn test_subcutaneous_appends_dose() {
        let base = build_base_compartments(1.0, &[1.0], &[1.0]);
        let compartments = extend(base, &Route::Subcutaneous { v_0: 4.0, k_a: 0.7 });

        assert_eq!(compartments.len(), 3);
        let labels: Vec<String> = compartments.labelled().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Central", "Periphery 1", "Dose"]);

        let dose = compartments.dose.unwrap();
        assert_eq!(dose.volume(), 4.0);
        assert_eq!(dose.absorption_rate, 0.7);
    }

    #[test]
    fn test_intravenous_extends_nothing() {
        let base = build_base_compartments(1.0, &[], &[]);
        let compartments = extend(base.clone(), &Route::Intravenous);
        assert_eq!(compartments, base);
        assert_eq!(compartments.len(), 1);
    }
}
