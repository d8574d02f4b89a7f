/// Telegram rejects messages longer than this many characters.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// Split `text` into messages of at most `max_chars` characters, breaking on
/// line boundaries where possible. Blank chunks are dropped.
pub fn split_reply(text: &str, max_chars: usize) -> Vec<String> {
    let max = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > max {
            flush(&mut current, &mut chunks);
            current_len = 0;
        }
        if line_len <= max {
            current.push_str(line);
            current_len += line_len;
            continue;
        }
        // A single line over the limit is cut on character boundaries.
        for ch in line.chars() {
            if current_len == max {
                flush(&mut current, &mut chunks);
                current_len = 0;
            }
            current.push(ch);
            current_len += 1;
        }
    }
    flush(&mut current, &mut chunks);
    chunks
}

fn flush(buf: &mut String, chunks: &mut Vec<String>) {
    let piece = buf.trim_end_matches('\n');
    if !piece.trim().is_empty() {
        chunks.push(piece.to_string());
    }
    buf.clear();
}
