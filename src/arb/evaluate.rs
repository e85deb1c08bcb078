use super::error::{Error, Result};

/// Revenue and profit of one principal traversing a cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    /// Amount coming back out of the cycle
    pub revenue: f64,
    /// Revenue minus the principal
    pub profit: f64,
}

/// Evaluate one principal against a cycle log-rate.
///
/// The revenue of principal `x` over a cycle of log-rate `r` is
/// `exp(ln x - r)`; a negative log-rate multiplies the principal up.
///
/// # Errors
///
/// `InvalidPrincipal` when the principal is not a positive finite number.
pub fn evaluate(principal: f64, lrate: f64) -> Result<Evaluation> {
    if !(principal > 0.0) || !principal.is_finite() {
        return Err(Error::InvalidPrincipal(principal));
    }
    let revenue = (principal.ln() - lrate).exp();
    Ok(Evaluation {
        revenue,
        profit: revenue - principal,
    })
}

/// Evaluate a batch of principals against one cycle log-rate.
///
/// # Errors
///
/// `InvalidPrincipal` on the first bad principal.
pub fn evaluate_all(principals: &[f64], lrate: f64) -> Result<Vec<Evaluation>> {
    principals.iter().map(|&x| evaluate(x, lrate)).collect()
}
