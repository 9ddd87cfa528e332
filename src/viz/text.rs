//! Text measurement, truncation, and wrapping for labels and legends.

/// Heuristic: estimate pixel width of text (Plotters has no built-in text measuring).
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Truncate to fit `max_px`, ending with a single ellipsis when cut.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        out.push(ch);
        let with_ellipsis = format!("{out}…");
        if estimate_text_width_px(&with_ellipsis, font_px) > max_px {
            out.pop();
            break;
        }
    }
    if out.is_empty() {
        return "…".to_string();
    }
    out.push('…');
    out
}

/// Wrap on word boundaries to fit `max_px`; words longer than a line are truncated.
pub fn wrap_text_to_width(text: &str, font_px: u32, max_px: u32) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let candidate = if cur.is_empty() {
            word.to_string()
        } else {
            format!("{cur} {word}")
        };
        if estimate_text_width_px(&candidate, font_px) <= max_px {
            cur = candidate;
            continue;
        }
        if !cur.is_empty() {
            lines.push(std::mem::take(&mut cur));
        }
        cur = truncate_to_width(word, font_px, max_px);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}
