use logistic_lab::{
    animation::PlaybackState,
    evaluator::{HeadlessEvaluator, EXPR_CAPACITY_LINE, EXPR_SLOPE_LINE, SYMBOL_TIME},
    model::{Bound, ParameterId, ParameterRecord, Parameters, ReferenceLine},
    particles::MAX_MARKERS,
    rate::RateField,
    LabConfig, Session, UiAction,
};

fn start_session() -> Session<HeadlessEvaluator> {
    let mut session = Session::new(&LabConfig::classroom(), HeadlessEvaluator::new());
    session.pump();
    session
}

fn edit_rate(session: &mut Session<HeadlessEvaluator>, field: RateField, raw: &str) {
    session.apply(UiAction::EditRateInput {
        field,
        raw: raw.to_string(),
    });
}

#[test]
fn scrub_start_stops_animation_before_next_tick() {
    let mut session = start_session();
    let token = session
        .apply(UiAction::TogglePlay)
        .expect("starting playback hands out a token");
    assert!(session.animation_tick().is_some());
    assert!(session.animation_tick().is_some());

    session.apply(UiAction::ScrubStart {
        parameter: ParameterId::Time,
    });

    assert_eq!(session.playback(), PlaybackState::Stopped);
    assert_eq!(session.panel().play_button, "Play");
    assert!(token.is_cancelled());
    assert!(session.animation_tick().is_none());
}

#[test]
fn scrubbing_other_sliders_keeps_playing() {
    let mut session = start_session();
    session.apply(UiAction::TogglePlay);
    session.apply(UiAction::ScrubStart {
        parameter: ParameterId::Capacity,
    });
    assert_eq!(session.playback(), PlaybackState::Playing);
}

#[test]
fn animation_drives_time_slider_and_population() {
    let mut session = start_session();
    session.apply(UiAction::TogglePlay);
    for _ in 0..30 {
        session.animation_tick();
    }
    session.pump();

    let time = session.model().time();
    assert!((time - 30.0 * 10.0 / 150.0).abs() < 1e-9);
    assert_eq!(session.slider(ParameterId::Time).value(), time);
    assert_eq!(session.evaluator().numeric_value(SYMBOL_TIME), Some(time));
    let label: usize = session.panel().population_label.parse().unwrap();
    assert_eq!(session.particles().len(), label);
    assert!(label > 100);
}

#[test]
fn rate_calculator_writes_model_rate() {
    let mut session = start_session();
    edit_rate(&mut session, RateField::Births, "10");
    edit_rate(&mut session, RateField::Deaths, "3");
    edit_rate(&mut session, RateField::Immigration, "2");
    edit_rate(&mut session, RateField::Emigration, "1");

    assert_eq!(session.model().rate(), 8.0);
    assert_eq!(session.slider(ParameterId::Rate).value(), 8.0);
    assert_eq!(session.panel().inputs.rate, "8");

    session.apply(UiAction::ClearRateInputs);
    assert_eq!(session.model().rate(), 0.0);
    assert_eq!(session.panel().rate_inputs.births, 0.0);
}

#[test]
fn non_numeric_rate_inputs_give_zero() {
    let mut session = start_session();
    for field in [
        RateField::Births,
        RateField::Deaths,
        RateField::Immigration,
        RateField::Emigration,
    ] {
        edit_rate(&mut session, field, "n/a");
    }
    assert_eq!(session.model().rate(), 0.0);
}

#[test]
fn text_inputs_are_sanitized_and_clamped() {
    let mut session = start_session();
    session.apply(UiAction::EditInput {
        parameter: ParameterId::Population,
        raw: "plenty".into(),
    });
    assert_eq!(session.model().initial_population(), 0.0);

    session.apply(UiAction::EditInput {
        parameter: ParameterId::Capacity,
        raw: "99999".into(),
    });
    assert_eq!(session.model().capacity(), 1500.0);
    assert_eq!(session.panel().inputs.capacity, "1500");
}

#[test]
fn bound_edits_clamp_slider_and_model() {
    let mut session = start_session();
    session.apply(UiAction::EditBound {
        parameter: ParameterId::Population,
        bound: Bound::Min,
        raw: "250".into(),
    });
    assert_eq!(session.slider(ParameterId::Population).min(), 250.0);
    assert_eq!(session.slider(ParameterId::Population).value(), 250.0);
    assert_eq!(session.model().initial_population(), 250.0);
    assert_eq!(session.panel().bounds.population.min, "250");

    session.apply(UiAction::EditBound {
        parameter: ParameterId::Capacity,
        bound: Bound::Max,
        raw: "3000".into(),
    });
    let viewport = session.evaluator().viewport().unwrap();
    assert!((viewport.top - 3300.0).abs() < 1e-9);
    assert_eq!(session.slider(ParameterId::Population).max(), 1500.0);
    assert!((session.slider(ParameterId::Capacity).step() - 20.0).abs() < 1e-9);
}

#[test]
fn reference_line_toggles_flip_visibility() {
    let mut session = start_session();
    assert!(session.evaluator().is_hidden(EXPR_CAPACITY_LINE));

    session.apply(UiAction::ToggleLine {
        line: ReferenceLine::Capacity,
    });
    assert!(!session.evaluator().is_hidden(EXPR_CAPACITY_LINE));
    assert_eq!(session.panel().capacity_toggle, "Hide");

    session.apply(UiAction::ToggleLine {
        line: ReferenceLine::Slope,
    });
    session.apply(UiAction::ToggleLine {
        line: ReferenceLine::Slope,
    });
    assert!(session.evaluator().is_hidden(EXPR_SLOPE_LINE));
    assert_eq!(session.panel().slope_toggle, "Show");
}

#[test]
fn particle_field_is_capped() {
    let mut session = start_session();
    let mut parameters = Parameters {
        max_population: 20_000.0,
        max_capacity: 20_000.0,
        ..Parameters::default()
    };
    parameters.initial_population = 12_000.0;
    parameters.capacity = 15_000.0;
    session
        .set_parameters(ParameterRecord::from(parameters))
        .unwrap();
    session.pump();

    assert_eq!(session.particles().len(), MAX_MARKERS);
    assert_eq!(session.panel().population_label, "12000");
    assert_eq!(session.slider(ParameterId::Population).value(), 12_000.0);
}

#[test]
fn configured_marker_limit_cannot_raise_ceiling() {
    let mut config = LabConfig::classroom();
    config.particles.max_markers = 9000;
    config.parameters.max_population = 20_000.0;
    config.parameters.initial_population = 12_000.0;
    let mut session = Session::new(&config, HeadlessEvaluator::new());
    session.pump();

    assert_eq!(session.panel().population_label, "12000");
    assert_eq!(session.particles().len(), MAX_MARKERS);
}

#[test]
fn negative_time_bound_edit_keeps_axis_at_zero() {
    let mut session = start_session();
    session.apply(UiAction::EditBound {
        parameter: ParameterId::Time,
        bound: Bound::Max,
        raw: "-5".into(),
    });

    assert_eq!(session.slider(ParameterId::Time).min(), 0.0);
    assert_eq!(session.slider(ParameterId::Time).max(), 0.0);
    assert_eq!(session.panel().bounds.time.min, "0");

    let exported = session.get_parameters();
    assert_eq!(exported.max_time, 0.0);
    session
        .set_parameters(ParameterRecord::from(exported))
        .unwrap();
    assert_eq!(session.get_parameters(), exported);
}
