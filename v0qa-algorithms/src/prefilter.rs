//! Coarse event and candidate filters applied ahead of the cascade.

use v0qa_core::candidate::V0Candidate;
use v0qa_core::config::PrefilterCuts;
use v0qa_core::event::Collision;

/// Returns true if the collision passes the event selection.
///
/// The event-selection toggle and the sel8 flag must both be set, so
/// turning the toggle off rejects every event.
#[must_use]
pub fn event_passes(cuts: &PrefilterCuts, collision: &Collision) -> bool {
    cuts.event_selection && collision.sel8 && collision.vertex.z.abs() < cuts.z_vertex_cut
}

/// Returns true if the candidate passes the topological pre-selection.
#[must_use]
pub fn candidate_passes(cuts: &PrefilterCuts, v0: &V0Candidate) -> bool {
    v0.dca_pos_to_pv.abs() > cuts.dca_pos_to_pv
        && v0.dca_neg_to_pv.abs() > cuts.dca_neg_to_pv
        && v0.dca_v0_daughters < cuts.dca_v0_daughters
        && v0.cos_pa > cuts.cos_pa
}

#[cfg(test)]
mod tests {
    use super::*;
    use v0qa_core::kinematics::Position;

    #[test]
    fn test_event_filter() {
        let cuts = PrefilterCuts::default();
        let mut collision = Collision {
            vertex: Position::new(0.0, 0.0, 5.0),
            sel8: true,
        };
        assert!(event_passes(&cuts, &collision));

        collision.vertex.z = -10.0;
        assert!(!event_passes(&cuts, &collision));

        collision.vertex.z = 0.0;
        collision.sel8 = false;
        assert!(!event_passes(&cuts, &collision));

    }

    #[test]
    fn test_event_selection_toggle_off_rejects_all() {
        let off = PrefilterCuts {
            event_selection: false,
            ..PrefilterCuts::default()
        };
        let mut collision = Collision {
            vertex: Position::new(0.0, 0.0, 1.0),
            sel8: false,
        };
        assert!(!event_passes(&off, &collision));

        collision.sel8 = true;
        assert!(!event_passes(&off, &collision));
    }

    #[test]
    fn test_candidate_filter() {
        let cuts = PrefilterCuts::default();
        let mut v0 = V0Candidate {
            cos_pa: 0.999,
            dca_v0_daughters: 0.5,
            dca_pos_to_pv: 0.2,
            dca_neg_to_pv: -0.3,
            ..V0Candidate::default()
        };
        assert!(candidate_passes(&cuts, &v0));

        v0.cos_pa = 0.99;
        assert!(!candidate_passes(&cuts, &v0));

        v0.cos_pa = 0.999;
        v0.dca_neg_to_pv = -0.05;
        assert!(!candidate_passes(&cuts, &v0));
    }
}
