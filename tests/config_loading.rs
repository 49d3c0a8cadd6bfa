use std::path::PathBuf;

use logistic_lab::{
    evaluator::HeadlessEvaluator,
    model::{ParameterId, ReferenceLine},
    LabConfig, Parameters, Session, UiAction,
};

fn scenario(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

#[test]
fn shipped_scenario_matches_classroom_defaults() {
    let config = LabConfig::load(scenario("classroom.yaml")).expect("scenario loads");
    let classroom = LabConfig::classroom();

    assert_eq!(config.name, classroom.name);
    assert_eq!(config.seed, classroom.seed);
    assert_eq!(config.parameters, Parameters::default());
    assert_eq!(config.particles.max_markers, classroom.particles.max_markers);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn sparse_config_fills_in_defaults() {
    let config = LabConfig::from_yaml_str(
        "name: tiny\nparameters:\n  initialPopulation: 5\n  rate: 0.2\n  capacity: 50\n  minPopulation: 0\n  maxPopulation: 60\n  minRate: 0\n  maxRate: 1\n  minCapacity: 0\n  maxCapacity: 60\n  maxTime: 30\n",
    )
    .unwrap();

    assert_eq!(config.parameters.max_time, 30.0);
    assert_eq!(config.canvas.width, 400.0);
    assert_eq!(config.slider.track_length_px, 150.0);
    assert_eq!(config.animation.frames_per_second, 60);
}

#[test]
fn action_script_replays_against_session() {
    let script = r#"
- action: drag
  parameter: capacity
  value: 600
- action: edit_bound
  parameter: rate
  bound: max
  raw: "4"
- action: toggle_line
  line: slope
- action: edit_rate_input
  field: births
  raw: "3"
"#;
    let actions: Vec<UiAction> = serde_yaml::from_str(script).unwrap();
    assert_eq!(actions.len(), 4);
    assert_eq!(
        actions[2],
        UiAction::ToggleLine {
            line: ReferenceLine::Slope
        }
    );

    let mut session = Session::new(&LabConfig::classroom(), HeadlessEvaluator::new());
    for action in actions {
        session.apply(action);
        session.pump();
    }

    assert_eq!(session.model().capacity(), 600.0);
    assert_eq!(session.model().rate(), 3.0);
    assert_eq!(session.slider(ParameterId::Rate).max(), 4.0);
    assert!(session.panel().show_slope);
}
