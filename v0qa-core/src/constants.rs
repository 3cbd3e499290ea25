//! Physics constants used by the K0-short analysis.

/// PDG code of the K0-short.
pub const PDG_K0_SHORT: i32 = 310;

/// PDG code of the positive pion (the negative pion is `-PDG_PION`).
pub const PDG_PION: i32 = 211;

/// Charged pion mass (GeV/c^2).
pub const MASS_PION_CHARGED: f64 = 0.139_570_39;

/// K0 mass used for rapidity and the lifetime cut (GeV/c^2).
pub const MASS_K0: f64 = 0.497_614;

/// K0-short c*tau (cm).
pub const CTAU_K0_SHORT: f64 = 2.684;
