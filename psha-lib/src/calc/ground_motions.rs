//! Stage 2: evaluate every (GMM, IMT) pair on every input.
//!
//! The output table is dense: every model of the set produces one
//! (mean, sigma) per input for every configured IMT, with the lists aligned
//! to the input order. Non-finite means or non-positive sigmas are fatal
//! configuration errors carrying the model, IMT and input index.

use std::collections::BTreeMap;

use crate::calc::input::InputList;
use crate::error::{HazardError, Result};
use crate::gmm::{Gmm, GmmInstanceTable, GmmSet};
use crate::imt::Imt;

/// Aligned means and sigmas for one (IMT, GMM) pair.
#[derive(Debug, Clone)]
pub struct GmVector {
    pub means: Vec<f64>,
    pub sigmas: Vec<f64>,
}

/// Ground motions for one source: the input list plus the dense
/// (IMT, GMM) table.
#[derive(Debug, Clone)]
pub struct GroundMotions {
    pub(crate) inputs: InputList,
    pub(crate) table: BTreeMap<Imt, BTreeMap<Gmm, GmVector>>,
}

impl GroundMotions {
    pub fn inputs(&self) -> &InputList {
        &self.inputs
    }

    pub fn get(&self, imt: Imt, gmm: Gmm) -> Option<&GmVector> {
        self.table.get(&imt).and_then(|row| row.get(&gmm))
    }
}

/// Evaluate `gmms` over `inputs` for every IMT.
pub fn inputs_to_ground_motions(
    inputs: InputList,
    gmms: &GmmSet,
    imts: &[Imt],
    instances: &GmmInstanceTable,
) -> Result<GroundMotions> {
    let mut table: BTreeMap<Imt, BTreeMap<Gmm, GmVector>> = BTreeMap::new();
    for &imt in imts {
        let mut row = BTreeMap::new();
        for gmm in gmms.gmms() {
            let model = instances.get(gmm, imt)?;
            let mut means = Vec::with_capacity(inputs.len());
            let mut sigmas = Vec::with_capacity(inputs.len());
            for (index, input) in inputs.inputs().iter().enumerate() {
                let gm = model.calc(input);
                if !gm.mean.is_finite() || !(gm.sigma.is_finite() && gm.sigma > 0.0) {
                    return Err(HazardError::NonFiniteGroundMotion { gmm, imt, index });
                }
                means.push(gm.mean);
                sigmas.push(gm.sigma);
            }
            row.insert(gmm, GmVector { means, sigmas });
        }
        table.insert(imt, row);
    }
    Ok(GroundMotions { inputs, table })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::input::source_to_inputs;
    use crate::mfd::Mfd;
    use crate::site::Site;
    use crate::source::{FaultSource, Source};

    fn fixture() -> (Source, Site) {
        let source = Source::Fault(
            FaultSource::builder()
                .name("f1")
                .trace((142.0, 50.0), (142.0, 50.5))
                .width(12.0)
                .mfd(Mfd::GutenbergRichter {
                    a: 4.0,
                    b: 1.0,
                    m_min: 5.0,
                    m_max: 7.0,
                    d_mag: 1.0,
                })
                .build()
                .unwrap(),
        );
        let site = Site::builder()
            .name("s1")
            .location(142.2, 50.25)
            .vs30(400.0)
            .build()
            .unwrap();
        (source, site)
    }

    #[test]
    fn test_dense_table_aligned_to_inputs() {
        let (source, site) = fixture();
        let gmms = GmmSet::builder()
            .weights([
                (Gmm::Mf2013Crustal, 0.5),
                (Gmm::Mf2013Interplate, 0.5),
            ])
            .build()
            .unwrap();
        let imts = [Imt::Pga, Imt::Sa1P0];
        let instances = GmmInstanceTable::build(gmms.gmms(), &imts).unwrap();
        let inputs = source_to_inputs(&source, &site).unwrap();
        let n = inputs.len();

        let gms = inputs_to_ground_motions(inputs, &gmms, &imts, &instances).unwrap();
        for imt in imts {
            for gmm in [Gmm::Mf2013Crustal, Gmm::Mf2013Interplate] {
                let vector = gms.get(imt, gmm).unwrap();
                assert_eq!(vector.means.len(), n);
                assert_eq!(vector.sigmas.len(), n);
                assert!(vector.sigmas.iter().all(|s| *s > 0.0));
                // Larger magnitudes produce larger medians on one surface.
                assert!(vector.means.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
