//! Magnitude-frequency distributions.
//!
//! Source builders take an [`Mfd`] and materialize one rupture per magnitude
//! bin. Rates are annual.

/// A magnitude-frequency distribution.
#[derive(Debug, Clone)]
pub enum Mfd {
    /// Incremental Gutenberg-Richter: `log10 N(>=m) = a - b*m`, discretized
    /// into bins of `d_mag` centered on `m_min..=m_max`.
    GutenbergRichter {
        a: f64,
        b: f64,
        m_min: f64,
        m_max: f64,
        d_mag: f64,
    },
    /// A single characteristic event.
    Single { mag: f64, rate: f64 },
}

impl Mfd {
    /// Magnitude bins with their incremental annual rates, in ascending
    /// magnitude order.
    pub fn rates(&self) -> Vec<(f64, f64)> {
        match *self {
            Mfd::GutenbergRichter {
                a,
                b,
                m_min,
                m_max,
                d_mag,
            } => {
                let bins = ((m_max - m_min) / d_mag).round() as usize + 1;
                (0..bins)
                    .map(|i| {
                        let m = m_min + i as f64 * d_mag;
                        let lo = 10f64.powf(a - b * (m - d_mag / 2.0));
                        let hi = 10f64.powf(a - b * (m + d_mag / 2.0));
                        (m, lo - hi)
                    })
                    .collect()
            }
            Mfd::Single { mag, rate } => vec![(mag, rate)],
        }
    }

    /// Total annual rate over all bins.
    pub fn total_rate(&self) -> f64 {
        self.rates().iter().map(|(_, rate)| rate).sum()
    }
}
