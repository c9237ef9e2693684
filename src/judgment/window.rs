//! A single judgment window and the tags identifying it.

/// The kind of a held note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HoldType {
    /// Kept down until the end.
    Hold,
    /// Tapped repeatedly until the end.
    Roll,
}

/// How a held note ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoldRelease {
    /// Held through its end.
    Completed,
    /// Let go for longer than the hold window before its end.
    ReleasedEarly,
    /// Its head was never hit.
    NeverHit,
}

/// What a window judges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WindowKind {
    /// A tap hit within the boundary.
    Standard,
    /// A tap outside every standard window.
    Miss,
    /// A completed hold or roll.
    Hold(HoldType),
    /// A dropped hold or roll.
    HoldDropped(HoldType),
    /// A mine that went off.
    Mine,
}

/// A copyable reference to a window of a [`super::JudgmentWindowCollection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WindowHandle {
    /// Standard window by strictness rank, 0 being the narrowest.
    Standard(usize),
    /// The miss window.
    Miss,
    /// The completed-hold window of the type.
    Hold(HoldType),
    /// The dropped-hold window of the type.
    HoldDropped(HoldType),
    /// The mine window.
    Mine,
}

impl From<WindowKind> for WindowHandle {
    fn from(kind: WindowKind) -> Self {
        match kind {
            WindowKind::Standard => Self::Standard(0),
            WindowKind::Miss => Self::Miss,
            WindowKind::Hold(hold) => Self::Hold(hold),
            WindowKind::HoldDropped(hold) => Self::HoldDropped(hold),
            WindowKind::Mine => Self::Mine,
        }
    }
}

/// A named timing window.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JudgmentWindow {
    /// Stable identifier, such as `w1`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display color as `0xRRGGBB`.
    pub color: u32,
    /// Largest absolute error in milliseconds still judged by this window.
    pub boundary_ms: f64,
    /// Points earned when judged.
    pub dance_points: f64,
    /// Whether the judgment resets the combo.
    pub breaks_combo: bool,
    /// What the window judges.
    pub kind: WindowKind,
    pub(crate) handle: WindowHandle,
}

impl JudgmentWindow {
    /// Creates a white window worth no points that keeps the combo.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: WindowKind,
        boundary_ms: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: 0xFFFFFF,
            boundary_ms,
            dance_points: 0.0,
            breaks_combo: false,
            kind,
            handle: kind.into(),
        }
    }

    /// Sets the display color.
    #[must_use]
    pub const fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    /// Sets the points earned.
    #[must_use]
    pub const fn with_dance_points(mut self, dance_points: f64) -> Self {
        self.dance_points = dance_points;
        self
    }

    /// Sets whether the judgment resets the combo.
    #[must_use]
    pub const fn with_combo_break(mut self, breaks_combo: bool) -> Self {
        self.breaks_combo = breaks_combo;
        self
    }

    /// The handle of the window within its collection.
    #[must_use]
    pub const fn handle(&self) -> WindowHandle {
        self.handle
    }

    /// The boundary in seconds.
    #[must_use]
    pub fn boundary_seconds(&self) -> f64 {
        self.boundary_ms / 1000.0
    }

    /// Whether an error in milliseconds falls inside the boundary, which is inclusive.
    #[must_use]
    pub fn contains(&self, error_ms: f64) -> bool {
        error_ms.abs() <= self.boundary_ms
    }

    /// The color as `#RRGGBB`.
    #[must_use]
    pub fn color_hex(&self) -> String {
        format!("#{:06X}", self.color & 0xFFFFFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let window = JudgmentWindow::new("w4", "Decent", WindowKind::Standard, 136.5)
            .with_color(0xB45CFF)
            .with_dance_points(0.0)
            .with_combo_break(true);
        assert!(window.breaks_combo);
        assert_eq!(window.color_hex(), "#B45CFF");
        assert_eq!(window.handle(), WindowHandle::Standard(0));
        assert!(window.contains(-136.5));
        assert!(!window.contains(136.6));
        assert!((window.boundary_seconds() - 0.1365).abs() < 1e-12);
    }
}
