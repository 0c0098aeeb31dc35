//! Text helpers for node rendering: label wrapping, age formatting,
//! zoom-inverse interpolation.

use std::collections::VecDeque;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Wrap a node label into at most `rows` lines of roughly `width`
/// characters.
///
/// Labels ending in an IPv4 address split before the address instead of
/// mid-octet. Over-length labels keep their head and tail joined by
/// `..`; anything else wraps at word boundaries.
#[must_use]
pub fn wrapped_label(label: &str, width: usize, rows: usize) -> String {
    let chars: Vec<char> = label.chars().collect();
    if width == 0 || rows == 0 {
        return label.to_string();
    }

    if let Some(ip_start) = trailing_ip_start(&chars) {
        let head: String = chars[..ip_start].iter().collect();
        let ip: String = chars[ip_start..].iter().collect();
        return format!("{head}\n{ip}");
    }

    if chars.len() > width * rows {
        let tail: String = chars[chars.len() - width..].iter().collect();
        if rows == 2 {
            let head: String = chars[..width].iter().collect();
            return format!("{head}..\n{tail}");
        }
        let head: String = chars[..(width * 2).min(chars.len())].iter().collect();
        return format!("{}..\n{tail}", split_label(&head, width, rows - 1));
    }

    split_label(label, width, rows)
}

/// Index where a trailing dotted-quad address starts, if one ends the label.
fn trailing_ip_start(chars: &[char]) -> Option<usize> {
    let mut idx = chars.len();
    let mut octets = 0;
    while octets < 4 {
        let end = idx;
        while idx > 0 && chars[idx - 1].is_ascii_digit() {
            idx -= 1;
        }
        let digits = end - idx;
        if digits == 0 || digits > 3 {
            return None;
        }
        octets += 1;
        if octets < 4 {
            if idx == 0 || chars[idx - 1] != '.' {
                return None;
            }
            idx -= 1;
        }
    }
    Some(idx)
}

/// Word-boundary wrap into at most `rows` lines.
fn split_label(label: &str, width: usize, rows: usize) -> String {
    let mut parts = tokenize(label);
    let mut rows = rows;
    let mut remaining = label.chars().count();
    let mut line = String::new();
    let mut lines: Vec<String> = Vec::new();

    loop {
        if let Some(part) = parts.pop_front() {
            line.push_str(&part);
        }
        if let Some(sep) = parts.pop_front() {
            line.push_str(&sep);
        }
        match parts.front() {
            Some(next) => {
                let line_len = line.chars().count();
                if line_len + next.chars().count() > width {
                    remaining = remaining.saturating_sub(line_len);
                    if remaining > width && rows == 2 {
                        // Penultimate row: hard-break the next word.
                        let split: Vec<char> = next.chars().collect();
                        let idx = width.saturating_sub(line_len).min(split.len());
                        line.extend(&split[..idx]);
                        let rest: String = split[idx..].iter().collect();
                        if let Some(front) = parts.front_mut() {
                            *front = rest;
                        }
                    }
                    lines.push(std::mem::take(&mut line));
                    rows = rows.saturating_sub(1);
                }
            }
            None => {
                lines.push(std::mem::take(&mut line));
                break;
            }
        }
    }

    // Pull a too-short last line into the previous one.
    if lines.len() > 1
        && let Some(last) = lines.pop()
    {
        if last.chars().count() <= 2 {
            let merged = format!("{}{last}", lines.pop().unwrap_or_default());
            lines.push(merged);
        } else {
            lines.push(last);
        }
    }
    lines.join("\n")
}

/// Alternating word / separator tokens; a separator run collapses to its
/// last character.
fn tokenize(label: &str) -> VecDeque<String> {
    let mut tokens = VecDeque::new();
    let mut word = String::new();
    let mut sep = None;
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            if let Some(s) = sep.take() {
                tokens.push_back(s);
            }
            word.push(ch);
        } else {
            if !word.is_empty() || tokens.is_empty() {
                tokens.push_back(std::mem::take(&mut word));
            }
            sep = Some(ch.to_string());
        }
    }
    if let Some(s) = sep {
        tokens.push_back(s);
        tokens.push_back(String::new());
    } else {
        tokens.push_back(word);
    }
    tokens
}

/// As scale decreases from `scale_max` to `scale_min`, interpolate a
/// counter-zoomed value from `value_min` up to `value_max`.
#[must_use]
pub fn counter_zoom(scale: f64, scale_min: f64, scale_max: f64, value_min: f64, value_max: f64) -> f64 {
    if scale >= scale_max {
        return value_min;
    }
    if scale <= scale_min {
        return value_max;
    }
    value_min + (1.0 - (scale - scale_min) / (scale_max - scale_min)) * (value_max - value_min)
}

/// Human-readable age of a timestamp relative to `now`.
///
/// Accepts RFC 3339 (`2020-01-01T10:00:00Z`) or `YYYY-MM-DD HH:MM:SS`;
/// anything else, or no timestamp at all, renders as `-`.
#[must_use]
pub fn age(value: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(value) = value else {
        return "-".to_string();
    };
    let parsed = if value.contains('T') {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    } else {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
            .map(|dt| dt.and_utc())
            .ok()
    };
    let Some(then) = parsed else {
        return "-".to_string();
    };

    let seconds = (now - then).num_seconds().max(0);
    match seconds {
        0..=59 => "seconds ago".to_string(),
        60..=119 => "a minute ago".to_string(),
        120..=3599 => format!("{} minutes ago", seconds / 60),
        3600..=7199 => "an hour ago".to_string(),
        7200..=86_399 => format!("{} hours ago", seconds / 3600),
        86_400..=172_799 => "a day ago".to_string(),
        _ => format!("{} days ago", seconds / 86_400),
    }
}
