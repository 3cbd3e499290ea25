use tempfile::tempdir;
use v0qa_core::{
    AnalysisConfig, AnalysisMode, Collision, Event, HistogramId, Momentum, PidHypothesis,
    Position, Track, TrackPid, TruthParticle, V0Candidate,
};
use v0qa_io::{write_events, write_output, AnalysisDriver, HistogramSet};

fn pion(px: f64, py: f64, mc: usize) -> Track {
    Track {
        has_tpc: true,
        its_inner_barrel_clusters: 1,
        tpc_crossed_rows: 100,
        pid_for_tracking: PidHypothesis::Pion.tag(),
        pid: Some(TrackPid {
            tpc_nsigma_pi: 1.0,
            tpc_signal: 60.0,
            tpc_inner_param: 0.5,
            ..TrackPid::default()
        }),
        mc_particle: Some(mc),
        ..Track::new(Momentum::new(px, py, 0.0))
    }
}

fn event(z: f64, cos_pa: f64) -> Event {
    let mut event = Event::new(Collision {
        vertex: Position::new(0.0, 0.0, z),
        sel8: true,
    });
    event.tracks = vec![pion(0.5, 0.3, 0), pion(0.5, -0.3, 1)];
    event.mc_particles = vec![
        TruthParticle::new(211, Momentum::new(0.5, 0.3, 0.0)),
        TruthParticle::new(-211, Momentum::new(0.5, -0.3, 0.0)),
        TruthParticle::new(310, Momentum::new(1.0, 0.0, 0.0)),
    ];
    event.v0s = vec![V0Candidate {
        pos_track: 0,
        neg_track: 1,
        mass_k0_short: 0.497,
        momentum: Momentum::new(1.0, 0.0, 0.0),
        decay_vertex: Position::new(3.0, 0.0, z),
        pos_momentum: Momentum::new(0.51, 0.3, 0.0),
        neg_momentum: Momentum::new(0.49, -0.3, 0.0),
        cos_pa,
        dca_v0_daughters: 0.3,
        dca_pos_to_pv: 0.2,
        dca_neg_to_pv: -0.2,
        mc_particle: Some(2),
    }];
    event
}

#[test]
fn test_file_to_json_both_modes() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("events.jsonl");
    let mut events: Vec<Event> = (0..20).map(|_| event(1.0, 0.999)).collect();
    events.push(event(25.0, 0.999)); // outside the vertex window
    events.push(event(1.0, 0.5)); // candidate fails the pointing angle
    write_events(&input, &events).unwrap();

    let config = AnalysisConfig::default()
        .with_modes(true, true)
        .with_multidim_histogram(true)
        .validate()
        .unwrap();
    let mut driver = AnalysisDriver::new(config).with_batch_size(4);
    driver.process_file(&input).unwrap();
    let output = driver.finish();

    assert_eq!(output.prefilter.events_read, 22);
    assert_eq!(output.prefilter.events_selected, 21);
    assert_eq!(output.prefilter.candidates_selected, 20);

    let data = output.mode(AnalysisMode::Data).unwrap();
    assert_eq!(data.summary.events, 21);
    assert_eq!(data.summary.accumulated, 20);
    assert_eq!(data.registry.bin_content(HistogramId::Events, &[0.5]), 21);
    assert_eq!(data.registry.entries(HistogramId::MassPt), 20);
    assert!(!data.registry.contains(HistogramId::GenPtPosPtRes));

    let mc = output.mode(AnalysisMode::Mc).unwrap();
    assert_eq!(mc.summary.accumulated, 20);
    assert_eq!(mc.registry.entries(HistogramId::GenPtPosPtRes), 20);
    assert_eq!(mc.registry.entries(HistogramId::MassMultidim), 20);

    let out = dir.path().join("hist.json");
    write_output(&out, &output).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    let sets: Vec<HistogramSet> = serde_json::from_str(&text).unwrap();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].mode, "data");
    assert_eq!(sets[1].prefix, "mc");
    let thn = sets[1]
        .histograms
        .iter()
        .find(|h| h.name == "thn_mass")
        .unwrap();
    assert!(thn.sparse);
    assert_eq!(thn.axes.len(), 9);
    assert_eq!(thn.entries, 20);
}

#[test]
fn test_csv_output_prefixes_mc() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("events.jsonl");
    write_events(&input, &[event(0.0, 0.999)]).unwrap();

    let config = AnalysisConfig::default().with_modes(true, true).validate().unwrap();
    let mut driver = AnalysisDriver::new(config);
    driver.process_file(&input).unwrap();

    let out = dir.path().join("hist.csv");
    write_output(&out, &driver.finish()).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.lines().any(|l| l.starts_with("h1_events,1,0.5,1")));
    assert!(text.lines().any(|l| l.starts_with("mc/h2_genPtPosPtRes,")));
    assert!(!text.lines().any(|l| l.starts_with("h2_genPtPosPtRes,")));
}

#[test]
fn test_malformed_file_stops_processing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("events.jsonl");
    std::fs::write(&input, "{\"collision\": 3}\n").unwrap();

    let config = AnalysisConfig::default().validate().unwrap();
    let mut driver = AnalysisDriver::new(config);
    assert!(driver.process_file(&input).is_err());
}

#[cfg(not(feature = "hdf5"))]
#[test]
fn test_hdf5_output_requires_feature() {
    let dir = tempdir().unwrap();
    let config = AnalysisConfig::default().validate().unwrap();
    let output = AnalysisDriver::new(config).finish();
    assert!(write_output(dir.path().join("hist.h5"), &output).is_err());
}
