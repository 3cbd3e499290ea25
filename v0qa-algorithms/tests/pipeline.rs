use std::sync::Mutex;

use approx::assert_relative_eq;
use v0qa_algorithms::{Predicate, SelectionCascade, V0Analysis};
use v0qa_core::{
    AnalysisConfig, AnalysisMode, Collision, DetectorRequirement, Event, HistogramId,
    HistogramRegistry, HistogramSink, Momentum, PidHypothesis, PidHypothesisCut, Position,
    SelectionCuts, Track, TrackPid, TruthParticle, V0Candidate,
};

#[derive(Default)]
struct RecordingSink {
    fills: Mutex<Vec<(HistogramId, Vec<f64>)>>,
}

impl RecordingSink {
    fn fills_of(&self, id: HistogramId) -> Vec<Vec<f64>> {
        self.fills
            .lock()
            .unwrap()
            .iter()
            .filter(|(i, _)| *i == id)
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.fills.lock().unwrap().len()
    }
}

impl HistogramSink for RecordingSink {
    fn fill(&self, id: HistogramId, values: &[f64]) {
        self.fills.lock().unwrap().push((id, values.to_vec()));
    }
}

fn daughter(px: f64, py: f64, mc: usize) -> Track {
    Track {
        has_tpc: true,
        its_inner_barrel_clusters: 2,
        tpc_crossed_rows: 110,
        pid_for_tracking: PidHypothesis::Pion.tag(),
        pid: Some(TrackPid {
            tpc_nsigma_pi: 0.5,
            tpc_signal: 55.0,
            tpc_inner_param: 0.45,
            ..TrackPid::default()
        }),
        mc_particle: Some(mc),
        ..Track::new(Momentum::new(px, py, 0.1))
    }
}

/// One event with a single candidate that passes the default cascade.
fn mc_event(v0_pdg: i32) -> Event {
    let mut event = Event::new(Collision {
        vertex: Position::new(0.0, 0.0, 1.0),
        sel8: true,
    });
    event.tracks = vec![daughter(0.4, 0.3, 0), daughter(0.5, -0.3, 1)];
    event.mc_particles = vec![
        TruthParticle::new(211, Momentum::new(0.4, 0.25, 0.1)),
        TruthParticle::new(-211, Momentum::new(0.5, -0.25, 0.1)),
        TruthParticle::new(v0_pdg, Momentum::new(0.9, 0.0, 0.2)),
    ];
    event.v0s = vec![V0Candidate {
        pos_track: 0,
        neg_track: 1,
        mass_k0_short: 0.498,
        momentum: Momentum::new(0.9, 0.0, 0.2),
        decay_vertex: Position::new(2.0, 0.5, 1.3),
        pos_momentum: Momentum::new(0.42, 0.28, 0.1),
        neg_momentum: Momentum::new(0.48, -0.28, 0.1),
        cos_pa: 0.999,
        dca_v0_daughters: 0.2,
        dca_pos_to_pv: 0.3,
        dca_neg_to_pv: -0.3,
        mc_particle: Some(2),
    }];
    event
}

fn analysis(mode: AnalysisMode, multidim: bool) -> V0Analysis {
    let config = AnalysisConfig::default()
        .with_multidim_histogram(multidim)
        .with_modes(true, true)
        .validate()
        .unwrap();
    V0Analysis::new(&config, mode)
}

#[test]
fn test_each_single_failure_rejects() {
    let event = mc_event(310);
    let v0 = &event.v0s[0];
    let (pos, neg) = event.daughters(v0).unwrap();
    let cascade = SelectionCascade::default();
    assert!(cascade.accept(v0, pos, neg, &event.collision));

    let mut bad_v0 = v0.clone();
    bad_v0.decay_vertex = Position::new(0.1, 0.1, 1.0);
    assert_eq!(
        cascade.first_failure(&bad_v0, pos, neg, &event.collision),
        Some(Predicate::Radius)
    );

    let mut no_tpc = neg.clone();
    no_tpc.has_tpc = false;
    assert_eq!(
        cascade.first_failure(v0, pos, &no_tpc, &event.collision),
        Some(Predicate::TpcPresence)
    );

    let mut wide = pos.clone();
    wide.pid = Some(TrackPid {
        tpc_nsigma_pi: -11.0,
        ..TrackPid::default()
    });
    assert_eq!(
        cascade.first_failure(v0, &wide, neg, &event.collision),
        Some(Predicate::TpcPid)
    );

    let strict = SelectionCascade::new(SelectionCuts::default().with_min_tpc_crossed_rows(120.0));
    assert_eq!(
        strict.first_failure(v0, pos, neg, &event.collision),
        Some(Predicate::TpcCrossedRows)
    );

    let trd = SelectionCascade::new(
        SelectionCuts::default().with_trd(DetectorRequirement::Require, DetectorRequirement::NoConstraint),
    );
    assert_eq!(
        trd.first_failure(v0, pos, neg, &event.collision),
        Some(Predicate::Trd)
    );
}

#[test]
fn test_its_inner_barrel_require() {
    let event = mc_event(310);
    let v0 = &event.v0s[0];
    let (pos, neg) = event.daughters(v0).unwrap();
    let cascade = SelectionCascade::new(
        SelectionCuts::default()
            .with_its_inner_barrel(DetectorRequirement::Require, DetectorRequirement::Require),
    );

    let mut without = pos.clone();
    without.its_inner_barrel_clusters = 0;
    assert!(!cascade.accept(v0, &without, neg, &event.collision));

    let mut one = pos.clone();
    one.its_inner_barrel_clusters = 1;
    assert!(cascade.accept(v0, &one, neg, &event.collision));
}

#[test]
fn test_kaon_hypothesis_rejects_pion_tag() {
    let event = mc_event(310);
    let v0 = &event.v0s[0];
    let (pos, neg) = event.daughters(v0).unwrap();
    let cascade = SelectionCascade::new(SelectionCuts::default().with_pid_hypothesis(
        PidHypothesisCut::Any,
        PidHypothesisCut::Exactly(PidHypothesis::Kaon),
    ));
    assert!(!cascade.accept(v0, pos, neg, &event.collision));
}

#[test]
fn test_data_mode_fills() {
    let event = mc_event(310);
    let sink = RecordingSink::default();
    let summary = analysis(AnalysisMode::Data, true).process_event(&event, &sink);

    assert_eq!(summary.accumulated, 1);
    assert_eq!(sink.fills_of(HistogramId::Events), vec![vec![0.5], vec![1.5]]);
    let mass_pt = sink.fills_of(HistogramId::MassPt);
    assert_eq!(mass_pt.len(), 1);
    assert_relative_eq!(mass_pt[0][0], 0.498);
    assert_relative_eq!(mass_pt[0][1], 0.9, epsilon = 1e-12);

    let thn = sink.fills_of(HistogramId::MassMultidim);
    assert_eq!(thn.len(), 1);
    assert_eq!(thn[0].len(), 6);
    assert!(sink.fills_of(HistogramId::GenPtPosPtRes).is_empty());
    assert!(sink.fills_of(HistogramId::TpcVsPidHypothesis).is_empty());
}

#[test]
fn test_mc_genuine_signal_flag() {
    let sink = RecordingSink::default();
    analysis(AnalysisMode::Mc, true).process_event(&mc_event(310), &sink);
    let thn = sink.fills_of(HistogramId::MassMultidim);
    assert_eq!(thn.len(), 1);
    assert_eq!(thn[0].len(), 9);
    assert_relative_eq!(thn[0][8], 1.0);

    let sink = RecordingSink::default();
    analysis(AnalysisMode::Mc, true).process_event(&mc_event(3122), &sink);
    let thn = sink.fills_of(HistogramId::MassMultidim);
    assert_eq!(thn.len(), 1);
    assert_relative_eq!(thn[0][8], 0.0);
}

#[test]
fn test_mc_residual_fills() {
    let sink = RecordingSink::default();
    analysis(AnalysisMode::Mc, false).process_event(&mc_event(310), &sink);

    let gen_px = sink.fills_of(HistogramId::GenPxPosPxRes);
    assert_eq!(gen_px.len(), 1);
    assert_relative_eq!(gen_px[0][0], (0.42 - 0.4) / 0.4, epsilon = 1e-12);
    assert_relative_eq!(gen_px[0][1], 0.4);

    let mass_neg = sink.fills_of(HistogramId::MassNegPtRes);
    assert_eq!(mass_neg.len(), 1);
    let reco_pt = 0.48f64.hypot(-0.28);
    let truth_pt = 0.5f64.hypot(-0.25);
    assert_relative_eq!(mass_neg[0][1], reco_pt - truth_pt, epsilon = 1e-12);

    for id in [
        HistogramId::GenPtPosPtRes,
        HistogramId::GenPyPosPyRes,
        HistogramId::GenPzPosPzRes,
        HistogramId::GenPtNegPtRes,
        HistogramId::GenPxNegPxRes,
        HistogramId::GenPyNegPyRes,
        HistogramId::GenPzNegPzRes,
        HistogramId::MassPosPtRes,
    ] {
        assert_eq!(sink.fills_of(id).len(), 1, "{}", id.name());
    }
}

#[test]
fn test_zero_truth_component_skips_only_that_fill() {
    let mut event = mc_event(310);
    event.mc_particles[0].momentum.pz = 0.0;
    let sink = RecordingSink::default();
    let summary = analysis(AnalysisMode::Mc, false).process_event(&event, &sink);
    assert_eq!(summary.accumulated, 1);
    assert!(sink.fills_of(HistogramId::GenPzPosPzRes).is_empty());
    assert_eq!(sink.fills_of(HistogramId::GenPxPosPxRes).len(), 1);
    assert_eq!(sink.fills_of(HistogramId::GenPzNegPzRes).len(), 1);
}

#[test]
fn test_mc_species_mismatch_skips_candidate() {
    let mut event = mc_event(310);
    event.mc_particles[1].pdg_code = -321;
    let sink = RecordingSink::default();
    let summary = analysis(AnalysisMode::Mc, true).process_event(&event, &sink);
    assert_eq!(summary.unmatched, 1);
    assert_eq!(sink.fills_of(HistogramId::Events), vec![vec![0.5], vec![1.5]]);
    assert_eq!(sink.len(), 2);

    // the data variant does not look at truth
    let sink = RecordingSink::default();
    let summary = analysis(AnalysisMode::Data, false).process_event(&event, &sink);
    assert_eq!(summary.accumulated, 1);
}

#[test]
fn test_missing_truth_skips_candidate() {
    let mut event = mc_event(310);
    event.tracks[0].mc_particle = None;
    let sink = RecordingSink::default();
    let summary = analysis(AnalysisMode::Mc, false).process_event(&event, &sink);
    assert_eq!(summary.unmatched, 1);
    assert!(sink.fills_of(HistogramId::MassPt).is_empty());
}

#[test]
fn test_tpc_plot_mirrors_negative_daughter() {
    let config = AnalysisConfig::default().with_tpc_plot(true).validate().unwrap();
    let analysis = V0Analysis::new(&config, AnalysisMode::Data);
    let sink = RecordingSink::default();
    analysis.process_event(&mc_event(310), &sink);
    let fills = sink.fills_of(HistogramId::TpcVsPidHypothesis);
    assert_eq!(fills, vec![vec![0.45, 55.0, 2.0], vec![-0.45, 55.0, 2.0]]);
}

#[test]
fn test_recomputed_mass_reaches_histograms() {
    let config = AnalysisConfig::default()
        .with_mass_from_daughters(true)
        .validate()
        .unwrap();
    let analysis = V0Analysis::new(&config, AnalysisMode::Data);
    let sink = RecordingSink::default();
    let event = mc_event(310);
    analysis.process_event(&event, &sink);
    let expected = v0qa_algorithms::candidate_mass(
        config.mass_mode,
        &event.v0s[0],
        &event.tracks[0],
        &event.tracks[1],
    );
    let fills = sink.fills_of(HistogramId::MassEta);
    assert_relative_eq!(fills[0][0], expected);
    assert!((fills[0][0] - 0.498).abs() > 1e-6);
}

#[test]
fn test_parallel_processing_into_registry() {
    let config = AnalysisConfig::default()
        .with_multidim_histogram(true)
        .with_modes(false, true)
        .validate()
        .unwrap();
    let analysis = V0Analysis::new(&config, AnalysisMode::Mc);
    let registry = HistogramRegistry::book(&config, AnalysisMode::Mc);

    let mut events: Vec<Event> = (0..500).map(|_| mc_event(310)).collect();
    events.push(Event::new(Collision::default()));
    let summary = analysis.process_events(&events, &registry);

    assert_eq!(summary.events, 501);
    assert_eq!(summary.candidates, 500);
    assert_eq!(summary.accumulated, 500);
    assert_eq!(registry.bin_content(HistogramId::Events, &[0.5]), 501);
    assert_eq!(registry.bin_content(HistogramId::Events, &[1.5]), 500);
    assert_eq!(registry.bin_content(HistogramId::Events, &[2.5]), 0);
    assert_eq!(registry.entries(HistogramId::MassPt), 500);
    assert_eq!(registry.entries(HistogramId::MassMultidim), 500);
    assert_eq!(registry.entries(HistogramId::GenPtNegPtRes), 500);
}

#[test]
fn test_undefined_daughter_eta_skips_only_multidim() {
    let mut event = mc_event(310);
    event.tracks[0].momentum = Momentum::new(0.0, 0.0, 0.0);
    let sink = RecordingSink::default();
    let summary = analysis(AnalysisMode::Data, true).process_event(&event, &sink);

    assert_eq!(summary.accumulated, 1);
    assert_eq!(sink.fills_of(HistogramId::MassPt).len(), 1);
    assert_eq!(sink.fills_of(HistogramId::MassEta).len(), 1);
    assert!(sink.fills_of(HistogramId::MassMultidim).is_empty());
}
