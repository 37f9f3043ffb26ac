//! Status page rendering.
//!
//! Pure formatting: everything on the page is derived from the run state
//! and the current streak duration.  The LED pill mirrors the indicator,
//! which always follows the state.

use core::time::Duration;

use crate::fsm::RunState;

/// Badge colours (green / red).
pub const BADGE_RUNNING: &str = "#16a34a";
pub const BADGE_IDLE: &str = "#dc2626";

/// Seconds between browser reloads.
pub const AUTO_REFRESH_SECS: u32 = 5;

const STYLE: &str = "\
  * { box-sizing: border-box; }
  body {
    margin: 0; padding: 24px;
    font-family: -apple-system, system-ui, Segoe UI, Roboto, Arial, sans-serif;
    background: #f6f7fb; color: #111827;
    display: grid; place-items: center; min-height: 100vh;
  }
  .card {
    width: 100%; max-width: 520px;
    background: #fff; border: 1px solid #e5e7eb; border-radius: 16px;
    padding: 20px 20px 24px; box-shadow: 0 4px 24px rgba(0,0,0,0.06);
    text-align: center;
  }
  h1 { margin: 6px 0 8px; font-size: 22px; }
  .sub { margin: 0 0 16px; color: #6b7280; font-size: 14px; }
  .badge {
    display: inline-block; padding: 10px 18px; border-radius: 999px;
    font-weight: 700; letter-spacing: .4px; margin: 8px 0 16px; color: #ffffff;
  }
  .row {
    display: flex; justify-content: center; gap: 12px; flex-wrap: wrap;
    margin-top: 8px; font-size: 14px; color: #374151;
  }
  .pill { border: 1px solid #e5e7eb; border-radius: 999px; padding: 6px 12px; background: #fafafa; }
  .foot { margin-top: 16px; color: #9ca3af; font-size: 12px; }
";

/// Badge colour and label for a state.
pub fn badge(state: RunState) -> (&'static str, &'static str) {
    match state {
        RunState::Running => (BADGE_RUNNING, state.label()),
        RunState::Idle => (BADGE_IDLE, state.label()),
    }
}

/// "running for 42s" / "running for 3 min"; empty when there is no streak.
///
/// Both units truncate.
pub fn duration_text(duration: Option<Duration>) -> String {
    match duration {
        None => String::new(),
        Some(d) => {
            let secs = d.as_secs();
            if secs < 60 {
                format!("running for {}s", secs)
            } else {
                format!("running for {} min", secs / 60)
            }
        }
    }
}

fn note(state: RunState) -> &'static str {
    match state {
        RunState::Running => "Detecting vibration from the dryer drum.",
        RunState::Idle => "No vibration detected recently.",
    }
}

/// Render the full HTML document.
///
/// An Idle state never shows a duration, whatever `duration` carries.
pub fn render(state: RunState, duration: Option<Duration>) -> String {
    let (badge_bg, status) = badge(state);
    let time_text = if state.is_running() {
        duration_text(duration)
    } else {
        String::new()
    };
    let led = if state.is_running() { "ON" } else { "OFF" };

    format!(
        "<!doctype html>
<html lang=\"en\">
<head>
<meta charset=\"utf-8\">
<meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">
<title>Dryer Monitor</title>
<meta http-equiv=\"refresh\" content=\"{refresh}\">
<style>
{STYLE}  .badge {{ background: {badge_bg}; }}
</style>
</head>
<body>
  <div class=\"card\">
    <h1>Dryer Monitor</h1>
    <p class=\"sub\">{note}</p>
    <div class=\"badge\">{status}</div>
    <div class=\"sub\">{time_text}</div>
    <div class=\"row\">
      <div class=\"pill\">Auto-refresh: {refresh}s</div>
      <div class=\"pill\">Sensor: SW-420</div>
      <div class=\"pill\">LED: {led}</div>
    </div>
    <div class=\"foot\">dryermon v{version} &middot; ESP32</div>
  </div>
</body>
</html>",
        refresh = AUTO_REFRESH_SECS,
        note = note(state),
        version = env!("CARGO_PKG_VERSION"),
    )
}
