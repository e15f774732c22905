use super::{Model, StateLayout};

/// State vector: `[q_0, q_c, q_p_1, ..., q_p_k]`.
pub fn state_layout(num_peripheries: usize) -> StateLayout {
    StateLayout {
        dose: Some(0),
        central: 1,
        peripheries: 2..2 + num_peripheries,
    }
}

/// Dose goes into the depot and is absorbed into the central compartment
/// at `k_a * q_0`. The depot quantity is not clamped at zero.
pub fn rhs(model: &Model, t: f64, y: &[f64], dy: &mut [f64]) {
    let k_a = model.absorption_rate();
    let q_0 = y[0];
    let q_c = y[1];
    let (dq_head, dq_p) = dy.split_at_mut(2);

    let absorption = k_a * q_0;
    let exchange = model.peripheral_exchange(q_c, &y[2..], dq_p);

    dq_head[0] = model.dose_rate(t) - absorption;
    dq_head[1] = absorption - model.clearance(q_c) - exchange;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelParameters, RouteConfig};
    use approx::assert_relative_eq;

    fn model(clearance_rate: f64, dose: f64, num_peripheries: i64) -> Model {
        Model::new(&ModelParameters {
            clearance_rate,
            dose,
            dose_on: 1.0,
            dose_off: 0.0,
            v_c: 2.0,
            num_peripheries,
            v_p_list: Some(vec![4.0; num_peripheries as usize]),
            q_p_list: Some(vec![0.5; num_peripheries as usize]),
            route: RouteConfig::Subcutaneous { v_0: 1.0, absorption_rate: 0.25 },
            ..Default::default()
        }).unwrap()
    }

    #[test]
    fn test_absorption_moves_mass_to_central() {
        let m = model(1.0, 2.0, 0);
        let mut dy = [0.0; 2];
        rhs(&m, 0.5, &[4.0, 6.0], &mut dy);

        assert_relative_eq!(dy[0], 2.0 - 1.0);
        // 1 - 6/2 * 1
        assert_relative_eq!(dy[1], 1.0 - 3.0);
    }

    #[test]
    fn test_peripheral_exchange() {
        let m = model(0.0, 0.0, 1);
        let mut dy = [0.0; 3];
        rhs(&m, 0.5, &[0.0, 6.0, 4.0], &mut dy);

        let transition = 0.5 * (3.0 - 1.0);
        assert_relative_eq!(dy[0], 0.0);
        assert_relative_eq!(dy[1], -transition);
        assert_relative_eq!(dy[2], transition);
    }

    #[test]
    fn test_dispatch_through_model() {
        let m = model(1.0, 2.0, 1);
        let y = [1.0, 2.0, 3.0];
        let mut direct = [0.0; 3];
        let mut dispatched = [0.0; 3];
        rhs(&m, 0.1, &y, &mut direct);
        m.rhs(0.1, &y, &mut dispatched);
        assert_eq!(direct, dispatched);
    }
}
