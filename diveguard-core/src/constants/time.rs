//! Time-Related Constants
//!
//! Debounce windows and integration windows. All values are milliseconds
//! of the platform tick unless the name says otherwise.

/// Minimum time the buzzer must stay in a state before it may change (ms).
///
/// Keeps a flickering warning from turning the buzzer into a rattle.
pub const BUZZER_MIN_STABLE_MS: u32 = 500;

/// Maximum continuous buzzer on-time (ms).
///
/// After this the buzzer is forced off regardless of pending warnings.
pub const BUZZER_MAX_ON_MS: u32 = 2000;

/// Idle window after a forced off before the buzzer may re-arm (ms).
///
/// Also the mute window: a muted buzzer gives a short reminder once this
/// much time has passed since the mute began.
pub const BUZZER_REARM_IDLE_MS: u32 = 2000;

/// Time without a usable O2 sensor before fallback becomes sticky (ms).
pub const FALLBACK_DEBOUNCE_MS: u32 = 5000;

/// VPM crushing pressure integration window (s).
///
/// Must match the window the decompression model assumes.
pub const VPM_CRUSH_WINDOW_S: u32 = 4;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: u32 = 60;
