use std::fmt::{self, Display};

use serde::Deserialize;

use super::error::{Error, Result};

/// A bid/ask quote for one instrument.
///
/// An instrument `A_B` is the market for exchanging `A` into `B`: the ask
/// quotes the `A -> B` direction, the bid quotes `B -> A`. Well-formed
/// input satisfies `bid <= ask`, but nothing here assumes it.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Rate {
    /// Instrument name, e.g. `EUR_USD`
    pub instrument: String,
    /// Selling rate
    pub bid: f64,
    /// Asking rate
    pub ask: f64,
}

impl Rate {
    pub fn new(instrument: impl Into<String>, bid: f64, ask: f64) -> Self {
        Self {
            instrument: instrument.into(),
            bid,
            ask,
        }
    }

    /// Split the instrument name into its two currency codes.
    ///
    /// # Errors
    ///
    /// `InvalidInstrument` if the name is not of the `A_B` form.
    pub fn currencies(&self) -> Result<(&str, &str)> {
        split_instrument(&self.instrument)
    }

    /// Check that both quotes are positive finite numbers.
    ///
    /// # Errors
    ///
    /// `InvalidRate` otherwise.
    pub fn validate(&self) -> Result<()> {
        let ok = |x: f64| x > 0.0 && x.is_finite();
        if ok(self.bid) && ok(self.ask) {
            Ok(())
        } else {
            Err(Error::InvalidRate(
                self.instrument.clone(),
                self.bid,
                self.ask,
            ))
        }
    }
}

impl Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.instrument, self.bid, self.ask)
    }
}

/// Split an `A_B` instrument name into `(A, B)`.
///
/// The name must contain exactly one underscore with a non-empty code on
/// each side.
///
/// # Errors
///
/// `InvalidInstrument` otherwise.
pub fn split_instrument(name: &str) -> Result<(&str, &str)> {
    match name.split_once('_') {
        Some((u, v)) if !u.is_empty() && !v.is_empty() && !v.contains('_') => Ok((u, v)),
        _ => Err(Error::InvalidInstrument(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_instrument() {
        assert_eq!(split_instrument("EUR_USD").unwrap(), ("EUR", "USD"));
        assert_eq!(split_instrument("A_B").unwrap(), ("A", "B"));
        // Self-loops parse; whether they are meaningful is for the caller
        assert_eq!(split_instrument("A_A").unwrap(), ("A", "A"));

        for bad in &["", "EURUSD", "_USD", "EUR_", "_", "A_B_C", "A__B"] {
            assert_eq!(
                split_instrument(bad),
                Err(Error::InvalidInstrument((*bad).to_string())),
                "expected `{bad}` to be rejected"
            );
        }
    }

    #[test]
    fn test_validate() {
        assert!(Rate::new("A_B", 0.5, 0.6).validate().is_ok());

        for (bid, ask) in &[
            (0.0, 1.0),
            (1.0, 0.0),
            (-1.0, 1.0),
            (f64::NAN, 1.0),
            (1.0, f64::INFINITY),
        ] {
            let rate = Rate::new("A_B", *bid, *ask);
            assert!(rate.validate().is_err(), "expected {rate} to be rejected");
        }
    }

    #[test]
    fn test_display() {
        let rate = Rate::new("EUR_USD", 1.25, 1.5);
        assert_eq!(rate.to_string(), "(EUR_USD, 1.25, 1.5)");
    }
}
