//! Candidate selection cascade.
//!
//! Predicates run in a fixed order and the first failure rejects the
//! candidate. All switches were validated when the [`SelectionCuts`] were
//! built, so evaluation itself cannot fail.

use std::fmt;

use v0qa_core::candidate::V0Candidate;
use v0qa_core::config::SelectionCuts;
use v0qa_core::constants::{CTAU_K0_SHORT, MASS_K0};
use v0qa_core::event::Collision;
use v0qa_core::track::Track;

/// One stage of the cascade, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// |y(K0S)| within the rapidity window.
    Rapidity,
    /// Decay radius above the minimum.
    Radius,
    /// Proper decay length below the lifetime limit.
    Lifetime,
    /// ITS inner-barrel requirement per daughter.
    ItsInnerBarrel,
    /// Both daughters have TPC information.
    TpcPresence,
    /// TPC pion n-sigma within the window for both daughters.
    TpcPid,
    /// Enough crossed TPC rows on both daughters.
    TpcCrossedRows,
    /// TOF requirement per daughter.
    Tof,
    /// TRD requirement per daughter.
    Trd,
    /// Tracking PID hypothesis per daughter.
    PidHypothesis,
}

impl Predicate {
    /// All predicates in evaluation order.
    pub const ORDER: [Predicate; 10] = [
        Predicate::Rapidity,
        Predicate::Radius,
        Predicate::Lifetime,
        Predicate::ItsInnerBarrel,
        Predicate::TpcPresence,
        Predicate::TpcPid,
        Predicate::TpcCrossedRows,
        Predicate::Tof,
        Predicate::Trd,
        Predicate::PidHypothesis,
    ];

    /// Short name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rapidity => "rapidity",
            Self::Radius => "radius",
            Self::Lifetime => "lifetime",
            Self::ItsInnerBarrel => "its-inner-barrel",
            Self::TpcPresence => "tpc-presence",
            Self::TpcPid => "tpc-pid",
            Self::TpcCrossedRows => "tpc-crossed-rows",
            Self::Tof => "tof",
            Self::Trd => "trd",
            Self::PidHypothesis => "pid-hypothesis",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, short-circuiting conjunction of candidate predicates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionCascade {
    cuts: SelectionCuts,
}

impl SelectionCascade {
    /// Creates a cascade from validated cuts.
    #[must_use]
    pub fn new(cuts: SelectionCuts) -> Self {
        Self { cuts }
    }

    /// Returns the cuts.
    #[must_use]
    pub fn cuts(&self) -> &SelectionCuts {
        &self.cuts
    }

    /// Returns true if the candidate passes every predicate.
    #[inline]
    #[must_use]
    pub fn accept(
        &self,
        v0: &V0Candidate,
        pos: &Track,
        neg: &Track,
        collision: &Collision,
    ) -> bool {
        self.first_failure(v0, pos, neg, collision).is_none()
    }

    /// Returns the first predicate the candidate fails, if any.
    #[must_use]
    pub fn first_failure(
        &self,
        v0: &V0Candidate,
        pos: &Track,
        neg: &Track,
        collision: &Collision,
    ) -> Option<Predicate> {
        Predicate::ORDER
            .into_iter()
            .find(|&predicate| !self.passes(predicate, v0, pos, neg, collision))
    }

    /// Evaluates a single predicate.
    ///
    /// Comparisons against NaN attributes fail.
    #[must_use]
    pub fn passes(
        &self,
        predicate: Predicate,
        v0: &V0Candidate,
        pos: &Track,
        neg: &Track,
        collision: &Collision,
    ) -> bool {
        let c = &self.cuts;
        match predicate {
            Predicate::Rapidity => v0.rapidity_k0_short().abs() <= c.rapidity,
            Predicate::Radius => v0.radius() >= c.radius,
            Predicate::Lifetime => {
                v0.dist_over_total_momentum(&collision.vertex) * MASS_K0
                    <= c.lifetime * CTAU_K0_SHORT
            }
            Predicate::ItsInnerBarrel => {
                c.its_ib_pos.passes(pos.has_its_inner_barrel())
                    && c.its_ib_neg.passes(neg.has_its_inner_barrel())
            }
            Predicate::TpcPresence => pos.has_tpc && neg.has_tpc,
            Predicate::TpcPid => {
                let within = |track: &Track| {
                    track
                        .pid
                        .is_some_and(|pid| pid.tpc_nsigma_pi.abs() <= c.max_tpc_nsigma)
                };
                within(pos) && within(neg)
            }
            Predicate::TpcCrossedRows => {
                f64::from(pos.tpc_crossed_rows) >= c.min_tpc_crossed_rows
                    && f64::from(neg.tpc_crossed_rows) >= c.min_tpc_crossed_rows
            }
            Predicate::Tof => c.tof_pos.passes(pos.has_tof) && c.tof_neg.passes(neg.has_tof),
            Predicate::Trd => c.trd_pos.passes(pos.has_trd) && c.trd_neg.passes(neg.has_trd),
            Predicate::PidHypothesis => {
                c.pid_pos.passes(pos.pid_for_tracking) && c.pid_neg.passes(neg.pid_for_tracking)
            }
        }
    }
}
