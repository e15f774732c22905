use super::{Model, StateLayout};

/// State vector: `[q_c, q_p_1, ..., q_p_k]`.
pub fn state_layout(num_peripheries: usize) -> StateLayout {
    StateLayout {
        dose: None,
        central: 0,
        peripheries: 1..1 + num_peripheries,
    }
}

/// Dose goes straight into the central compartment.
pub fn rhs(model: &Model, t: f64, y: &[f64], dy: &mut [f64]) {
    let q_c = y[0];
    let (dq_c, dq_p) = dy.split_at_mut(1);

    let exchange = model.peripheral_exchange(q_c, &y[1..], dq_p);
    dq_c[0] = model.dose_rate(t) - model.clearance(q_c) - exchange;
}
