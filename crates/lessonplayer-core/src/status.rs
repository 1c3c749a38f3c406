use lessonplayer_ports::media::BackendKind;

pub const PRESET_ON: &str = "Preset on";
pub const PRESET_CLEARED: &str = "Preset cleared";
pub const PRESET_RESET: &str = "Preset reset";

/// Prefixes status text with the active backend, e.g. `[Decoupled+EQ] Play`.
pub fn compose_status(kind: BackendKind, eq_profile_active: bool, text: &str) -> String {
    let suffix = if kind == BackendKind::PitchDecoupled && eq_profile_active {
        "+EQ"
    } else {
        ""
    };
    format!("[{}{}] {}", kind.label(), suffix, text)
}

pub fn transpose_label(steps: i32) -> String {
    if steps > 0 {
        format!("+{steps}")
    } else {
        steps.to_string()
    }
}

pub fn speed_label(speed: f64) -> String {
    format!("{speed:.1}x")
}
