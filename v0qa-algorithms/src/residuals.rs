//! Reconstructed-minus-truth residuals of the daughter momenta.

use v0qa_core::candidate::V0Candidate;
use v0qa_core::kinematics::Momentum;

use crate::truth::TruthMatch;

/// Residual of one momentum component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentResidual {
    /// Truth value.
    pub truth: f64,
    /// `reco - truth`.
    pub absolute: f64,
    /// `(reco - truth) / truth`, `None` when the truth value is zero or the
    /// ratio is not finite.
    pub relative: Option<f64>,
}

impl ComponentResidual {
    /// Computes the residual of `reco` against `truth`.
    #[must_use]
    pub fn new(reco: f64, truth: f64) -> Self {
        let absolute = reco - truth;
        let relative = (truth != 0.0)
            .then(|| absolute / truth)
            .filter(|r| r.is_finite());
        Self {
            truth,
            absolute,
            relative,
        }
    }
}

/// Residuals of one daughter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaughterResiduals {
    /// Transverse momentum.
    pub pt: ComponentResidual,
    /// x component.
    pub px: ComponentResidual,
    /// y component.
    pub py: ComponentResidual,
    /// z component.
    pub pz: ComponentResidual,
    /// `1/pt(reco) - 1/pt(truth)`, `None` if either pt is zero.
    pub inverse_pt: Option<f64>,
}

impl DaughterResiduals {
    /// Computes the residuals of a reconstructed momentum against truth.
    #[must_use]
    pub fn compute(reco: Momentum, truth: Momentum) -> Self {
        let (reco_pt, truth_pt) = (reco.pt(), truth.pt());
        let inverse_pt = (reco_pt != 0.0 && truth_pt != 0.0)
            .then(|| 1.0 / reco_pt - 1.0 / truth_pt)
            .filter(|r| r.is_finite());
        Self {
            pt: ComponentResidual::new(reco_pt, truth_pt),
            px: ComponentResidual::new(reco.px, truth.px),
            py: ComponentResidual::new(reco.py, truth.py),
            pz: ComponentResidual::new(reco.pz, truth.pz),
            inverse_pt,
        }
    }
}

/// Residuals of both daughters of a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Residuals {
    /// Positive daughter.
    pub positive: DaughterResiduals,
    /// Negative daughter.
    pub negative: DaughterResiduals,
}

impl Residuals {
    /// Compares the candidate's daughter momenta at the decay vertex with
    /// the matched truth.
    #[must_use]
    pub fn compute(v0: &V0Candidate, truth: &TruthMatch<'_>) -> Self {
        Self {
            positive: DaughterResiduals::compute(v0.pos_momentum, truth.positive.momentum),
            negative: DaughterResiduals::compute(v0.neg_momentum, truth.negative.momentum),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use v0qa_core::event::TruthParticle;

    #[test]
    fn test_component_residual() {
        let r = ComponentResidual::new(1.1, 1.0);
        assert_relative_eq!(r.absolute, 0.1, epsilon = 1e-12);
        assert_relative_eq!(r.relative.unwrap(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(r.truth, 1.0);
    }

    #[test]
    fn test_zero_truth_has_no_relative_residual() {
        let r = ComponentResidual::new(0.2, 0.0);
        assert_relative_eq!(r.absolute, 0.2);
        assert!(r.relative.is_none());
    }

    #[test]
    fn test_daughter_residuals() {
        let reco = Momentum::new(0.6, 0.8, 0.5);
        let truth = Momentum::new(0.6, 0.0, 0.4);
        let r = DaughterResiduals::compute(reco, truth);
        assert_relative_eq!(r.pt.absolute, 0.4, epsilon = 1e-12);
        assert_relative_eq!(r.pt.relative.unwrap(), 0.4 / 0.6, epsilon = 1e-12);
        assert_relative_eq!(r.px.absolute, 0.0);
        assert!(r.py.relative.is_none());
        assert_relative_eq!(r.pz.relative.unwrap(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(r.inverse_pt.unwrap(), 1.0 - 1.0 / 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_pt_undefined_for_zero_pt() {
        let r = DaughterResiduals::compute(Momentum::new(0.0, 0.0, 1.0), Momentum::new(1.0, 0.0, 0.0));
        assert!(r.inverse_pt.is_none());
    }

    #[test]
    fn test_candidate_uses_decay_vertex_momenta() {
        let pos = TruthParticle::new(211, Momentum::new(1.0, 0.0, 0.0));
        let neg = TruthParticle::new(-211, Momentum::new(-2.0, 0.0, 0.0));
        let truth = TruthMatch {
            positive: &pos,
            negative: &neg,
            candidate: None,
        };
        let v0 = V0Candidate {
            pos_momentum: Momentum::new(1.1, 0.0, 0.0),
            neg_momentum: Momentum::new(-1.8, 0.0, 0.0),
            ..V0Candidate::default()
        };
        let r = Residuals::compute(&v0, &truth);
        assert_relative_eq!(r.positive.pt.relative.unwrap(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(r.negative.pt.absolute, -0.2, epsilon = 1e-12);
        assert_relative_eq!(r.negative.px.relative.unwrap(), -0.1, epsilon = 1e-12);
    }
}
