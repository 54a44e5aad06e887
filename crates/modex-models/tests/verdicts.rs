//! End-to-end verdicts for the shipped models.

use modex_engine::{CheckConfig, Explorer, FailureKind, Model, RunReport};
use modex_models::{AlternatingBit, Banking, RiverCrossing};

fn run<M: Model>(model: M, config: CheckConfig) -> RunReport {
    let mut explorer = Explorer::new(model, config);
    explorer.run()
}

#[test]
fn wgc_minimal_solution_is_seven_crossings() {
    let config = CheckConfig::from_features(RiverCrossing::new().features());
    let report = run(RiverCrossing::new(), config);
    let failure = report.verdict.failure().expect("the puzzle has a solution");
    assert_eq!(failure.kind, FailureKind::Safety);
    assert_eq!(failure.message, "All on the right bank!");
    // Seven crossings, two firings each (onto the boat, onto the bank),
    // plus the initial state.
    assert_eq!(failure.trace.states.len(), 15);
    assert_eq!(
        failure.trace.states.first().unwrap(),
        "MWSC |        |     "
    );
    assert_eq!(
        failure.trace.states.last().unwrap(),
        "     |        | MWSC"
    );
}

#[test]
fn wgc_forward_order_finds_an_equally_short_solution() {
    let config = CheckConfig {
        try_forward: true,
        ..CheckConfig::from_features(RiverCrossing::new().features())
    };
    let report = run(RiverCrossing::new(), config);
    let failure = report.verdict.failure().unwrap();
    assert_eq!(failure.trace.states.len(), 15);
}

#[test]
fn abp_capacity_four_with_delivery_checking_is_clean() {
    let model = AlternatingBit::new(4).check_out(true);
    let config = CheckConfig {
        check_may_progress: true,
        hash_bits: 18,
        ..CheckConfig::from_features(model.features())
    };
    let report = run(model, config);
    assert!(report.verdict.is_pass(), "got {:?}", report.verdict);
    assert!(report.states > 100);
}

#[test]
fn abp_stubborn_reduction_same_verdict_fewer_states() {
    let full = {
        let model = AlternatingBit::new(4).check_out(true);
        let config = CheckConfig {
            check_may_progress: true,
            stubborn: false,
            hash_bits: 18,
            ..CheckConfig::from_features(model.features())
        };
        run(model, config)
    };
    let reduced = {
        let model = AlternatingBit::new(4).check_out(true);
        let config = CheckConfig {
            check_may_progress: true,
            stubborn: true,
            hash_bits: 18,
            ..CheckConfig::from_features(model.features())
        };
        run(model, config)
    };
    assert!(full.verdict.is_pass(), "full: {:?}", full.verdict);
    assert!(reduced.verdict.is_pass(), "reduced: {:?}", reduced.verdict);
    assert!(
        reduced.states < full.states,
        "no reduction: {} vs {}",
        reduced.states,
        full.states
    );
}

#[test]
fn abp_without_terminate_cannot_reach_termination_under_reduction() {
    let model = AlternatingBit::new(1).terminate(false);
    let config = CheckConfig {
        stubborn: true,
        ..CheckConfig::from_features(model.features())
    };
    let report = run(model, config);
    let failure = report.verdict.failure().expect("expected a failure");
    assert_eq!(failure.kind, FailureKind::TerminationUnreachable);
    // The continuation demonstrates an execution trapped outside
    // termination: it must end in a cycle.
    let tail = failure.trace.tail.as_ref().unwrap();
    assert!(!tail.cycle.is_empty());
}

#[test]
fn banking_default_checks_pass() {
    let config = CheckConfig::from_features(Banking::new().features());
    let report = run(Banking::new(), config);
    assert!(report.verdict.is_pass(), "got {:?}", report.verdict);
    assert!(report.states > 10);
    assert!(report.edges > report.states);
}

#[test]
fn typical_execution_reports_state_count() {
    let config = CheckConfig {
        only_typical: true,
        ..Default::default()
    };
    let report = run(RiverCrossing::new(), config);
    assert!(report.verdict.is_pass());
    assert!(report.states > 0);
    let rendered = report.render();
    assert!(rendered.contains("----------"));
    assert!(rendered.trim_end().ends_with(&format!("{} states", report.states)));
    let tail = report.typical.expect("typical tail");
    assert!(!tail.cycle.is_empty());
}
