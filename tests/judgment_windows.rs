use chart_timing::{judgment::MAX_BOUNDARY_MS, prelude::*};
use pretty_assertions::assert_eq;

fn window(id: &str, boundary_ms: f64, points: f64) -> JudgmentWindow {
    JudgmentWindow::new(id, id, WindowKind::Standard, boundary_ms).with_dance_points(points)
}

fn two_window_profile() -> JudgmentWindowCollection {
    JudgmentWindowCollection::new(
        "custom",
        vec![window("Excellent", 45.0, 2.0), window("Fantastic", 16.5, 3.0)],
        JudgmentWindow::new("Miss", "Miss", WindowKind::Miss, 0.0).with_combo_break(true),
        vec![],
        None,
    )
    .expect("windows are well formed")
}

#[test]
fn errors_fall_into_the_narrowest_window() {
    let windows = two_window_profile();
    let names: Vec<&str> = [10.0, 30.0, 16.5, -16.5, 45.0, 45.01, 100.0]
        .into_iter()
        .map(|error| windows.classify(error).name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "Fantastic",
            "Excellent",
            "Fantastic",
            "Fantastic",
            "Excellent",
            "Miss",
            "Miss",
        ]
    );
    let ids: Vec<&str> = windows
        .standard_windows()
        .iter()
        .map(|window| window.id.as_str())
        .collect();
    assert_eq!(ids, vec!["Fantastic", "Excellent"]);
    assert_eq!(windows.best_tap_points(), 3.0);
    assert_eq!(windows.max_window_ms(), 45.0);
}

#[test]
fn handles_identify_windows() {
    let windows = two_window_profile();
    let fantastic = windows.classify(1.0);
    assert_eq!(fantastic.handle(), WindowHandle::Standard(0));
    assert_eq!(windows.window(fantastic.handle()), Some(fantastic));
    assert_eq!(windows.classify(500.0).handle(), WindowHandle::Miss);
    assert_eq!(windows.window(WindowHandle::Standard(2)), None);
    assert_eq!(windows.window(WindowHandle::Mine), None);
    assert_eq!(windows.windows().count(), 3);
}

#[test]
fn malformed_profiles_are_rejected() {
    let miss = || JudgmentWindow::new("miss", "Miss", WindowKind::Miss, 0.0);
    assert!(matches!(
        JudgmentWindowCollection::new("empty", vec![], miss(), vec![], None),
        Err(ConfigError::EmptyProfile)
    ));
    assert!(matches!(
        JudgmentWindowCollection::new(
            "negative",
            vec![window("w1", -3.0, 1.0)],
            miss(),
            vec![],
            None
        ),
        Err(ConfigError::InvalidWindow { id, .. }) if id == "w1"
    ));
    assert!(matches!(
        JudgmentWindowCollection::new(
            "swapped",
            vec![window("w1", 20.0, 1.0)],
            window("w2", 40.0, 0.0),
            vec![],
            None
        ),
        Err(ConfigError::InvalidWindow { id, .. }) if id == "w2"
    ));
    let widest = |boundary_ms| {
        let standard = vec![window("w1", boundary_ms, 1.0)];
        JudgmentWindowCollection::new("wide", standard, miss(), vec![], None)
    };
    assert!(widest(MAX_BOUNDARY_MS).is_ok());
    assert!(widest(MAX_BOUNDARY_MS + 1.0).is_err());
    assert!(widest(f64::INFINITY).is_err());
}

#[test]
fn builtin_profiles() {
    assert_eq!(PROFILE_NAMES, &["ITG", "FA+"]);
    assert!(JudgmentWindowCollection::builtin("DDR").is_none());

    let itg = JudgmentWindowCollection::builtin(ITG_PROFILE).unwrap();
    assert_eq!(itg.name(), "ITG");
    assert_eq!(itg.classify(-23.0).name, "Fantastic");
    assert_eq!(itg.classify(44.0).name, "Excellent");
    assert_eq!(itg.classify(100.0).name, "Great");
    assert_eq!(itg.classify(136.0).name, "Decent");
    assert_eq!(itg.classify(-181.0).name, "Way Off");
    assert_eq!(itg.classify(182.0).name, "Miss");
    assert_eq!(itg.classify(0.0).color_hex(), "#21CCE8");
    assert!(itg.classify(140.0).breaks_combo);
    assert!(!itg.classify(100.0).breaks_combo);

    let fa = JudgmentWindowCollection::builtin(FA_PLUS_PROFILE).unwrap();
    assert_eq!(fa.classify(15.0).name, "Fantastic");
    assert_eq!(fa.classify(16.0).name, "White Fantastic");
    assert_eq!(fa.max_window_ms(), itg.max_window_ms());
}

#[test]
fn profiles_come_from_the_config() {
    let config = EngineConfig {
        judgment_profile: FA_PLUS_PROFILE.to_owned(),
        ..EngineConfig::default()
    };
    let windows = JudgmentWindowCollection::from_config(&config).unwrap();
    assert_eq!(windows.standard_windows().len(), 6);

    let unknown = EngineConfig {
        judgment_profile: "Tournament".to_owned(),
        ..EngineConfig::default()
    };
    assert!(matches!(
        JudgmentWindowCollection::from_config(&unknown),
        Err(ConfigError::UnknownProfile(name)) if name == "Tournament"
    ));
}

#[test]
fn holds_and_mines_use_their_own_windows() {
    let itg = JudgmentWindowCollection::builtin(ITG_PROFILE).unwrap();
    let held = itg
        .classify_hold(HoldType::Hold, HoldRelease::Completed)
        .unwrap();
    assert_eq!(held.handle(), WindowHandle::Hold(HoldType::Hold));
    assert_eq!(
        itg.classify_hold(HoldType::Roll, HoldRelease::ReleasedEarly)
            .map(JudgmentWindow::handle),
        Some(WindowHandle::HoldDropped(HoldType::Roll))
    );
    assert!(!itg.is_hold_dropped(HoldType::Hold, 320.0));
    assert!(itg.is_hold_dropped(HoldType::Hold, 320.1));
    assert_eq!(
        itg.classify_mine(true).map(JudgmentWindow::handle),
        Some(WindowHandle::Mine)
    );
    assert_eq!(itg.classify_mine(false), None);
}
