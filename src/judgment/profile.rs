//! Built-in judgment profiles.

use super::{
    collection::JudgmentWindowCollection,
    window::{HoldType, JudgmentWindow, WindowKind},
};

/// Name of the standard ITG profile.
pub const ITG_PROFILE: &str = "ITG";
/// Name of the FA+ profile, which splits the Fantastic window.
pub const FA_PLUS_PROFILE: &str = "FA+";
/// Names accepted by [`JudgmentWindowCollection::builtin`].
pub const PROFILE_NAMES: &[&str] = &[ITG_PROFILE, FA_PLUS_PROFILE];

/// Added to every tap and mine window.
const PADDING_MS: f64 = 1.5;

const FANTASTIC_MS: f64 = 21.5;
const FA_PLUS_MS: f64 = 13.5;
const EXCELLENT_MS: f64 = 43.0;
const GREAT_MS: f64 = 102.0;
const DECENT_MS: f64 = 135.0;
const WAY_OFF_MS: f64 = 180.0;
const MINE_MS: f64 = 70.0;
const HOLD_MS: f64 = 320.0;
const ROLL_MS: f64 = 350.0;

fn tap(id: &str, name: &str, boundary_ms: f64, color: u32, points: f64) -> JudgmentWindow {
    JudgmentWindow::new(id, name, WindowKind::Standard, boundary_ms + PADDING_MS)
        .with_color(color)
        .with_dance_points(points)
}

fn itg_taps_after_fantastic() -> [JudgmentWindow; 4] {
    [
        tap("w2", "Excellent", EXCELLENT_MS, 0xE29C18, 4.0),
        tap("w3", "Great", GREAT_MS, 0x66C955, 2.0),
        tap("w4", "Decent", DECENT_MS, 0xB45CFF, 0.0).with_combo_break(true),
        tap("w5", "Way Off", WAY_OFF_MS, 0xC9855E, -6.0).with_combo_break(true),
    ]
}

fn miss() -> JudgmentWindow {
    JudgmentWindow::new("miss", "Miss", WindowKind::Miss, 0.0)
        .with_color(0xFF3030)
        .with_dance_points(-12.0)
        .with_combo_break(true)
}

fn holds() -> Vec<JudgmentWindow> {
    vec![
        JudgmentWindow::new("held", "Held", WindowKind::Hold(HoldType::Hold), HOLD_MS)
            .with_dance_points(5.0),
        JudgmentWindow::new("rolled", "Held", WindowKind::Hold(HoldType::Roll), ROLL_MS)
            .with_dance_points(5.0),
        JudgmentWindow::new(
            "let_go",
            "Let Go",
            WindowKind::HoldDropped(HoldType::Hold),
            HOLD_MS,
        ),
        JudgmentWindow::new(
            "roll_let_go",
            "Let Go",
            WindowKind::HoldDropped(HoldType::Roll),
            ROLL_MS,
        ),
    ]
}

fn mine() -> JudgmentWindow {
    JudgmentWindow::new("mine", "Hit Mine", WindowKind::Mine, MINE_MS + PADDING_MS)
        .with_color(0xFF3030)
        .with_dance_points(-6.0)
}

/// The ITG profile: Fantastic, Excellent, Great, Decent and Way Off.
#[must_use]
pub fn itg() -> JudgmentWindowCollection {
    let mut standard = vec![tap("w1", "Fantastic", FANTASTIC_MS, 0x21CCE8, 5.0)];
    standard.extend(itg_taps_after_fantastic());
    JudgmentWindowCollection::assemble(ITG_PROFILE.to_owned(), standard, miss(), holds(), Some(mine()))
}

/// The FA+ profile: the ITG windows with a narrower blue Fantastic inside a white one.
#[must_use]
pub fn fa_plus() -> JudgmentWindowCollection {
    let mut standard = vec![
        tap("w0", "Fantastic", FA_PLUS_MS, 0x21CCE8, 5.0),
        tap("w1", "White Fantastic", FANTASTIC_MS, 0xFFFFFF, 5.0),
    ];
    standard.extend(itg_taps_after_fantastic());
    JudgmentWindowCollection::assemble(
        FA_PLUS_PROFILE.to_owned(),
        standard,
        miss(),
        holds(),
        Some(mine()),
    )
}
