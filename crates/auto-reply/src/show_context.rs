use std::fmt::Write as _;

use threadsage_sessions::DebugSnapshot;

/// Reply to the control command before any question has been asked.
pub const NO_SNAPSHOT_NOTICE: &str = "⚠️ No recent question to show context for.";

/// Longest rendered body sent back, in characters, before fencing.
pub const MAX_RENDERED_CHARS: usize = 1950;

/// Render the last retrieval decision, truncated and wrapped in a code fence.
pub fn render(snapshot: &DebugSnapshot, generator: &str) -> String {
    let body = render_body(snapshot, generator);
    format!("```{}```", truncate_chars(&body, MAX_RENDERED_CHARS))
}

fn render_body(snapshot: &DebugSnapshot, generator: &str) -> String {
    let mut out = String::from("Auto Z-Score Threshold Based on Dropoff\n\n");
    // Writing to a String cannot fail.
    let _ = writeln!(out, "Largest gap = {:.2}", snapshot.gap);
    let _ = writeln!(out, "Keeping top {} threads\n", snapshot.candidates.len());
    for c in &snapshot.candidates {
        let _ = writeln!(out, "• {} | z={:.2} | cos_sim={:.3}", c.id, c.z_score, c.score);
    }
    let _ = write!(out, "\n\nFormatted Context Sent to {generator}:\n\n");
    out.push_str(&snapshot.formatted_context);
    out
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
