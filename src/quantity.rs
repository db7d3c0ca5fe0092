use std::fmt::{Debug, Display, Formatter};

/// Energy as reported by the inverter archive.
#[derive(
    Copy,
    Clone,
    Default,
    PartialEq,
    PartialOrd,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::From,
    derive_more::Sum,
)]
pub struct WattHours(pub f64);

impl WattHours {
    /// Whole watt-hours, rounding half away from zero.
    #[must_use]
    pub fn round(self) -> f64 {
        self.0.round()
    }
}

impl Display for WattHours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0} Wh", self.round())
    }
}

impl Debug for WattHours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}Wh", self.round())
    }
}
