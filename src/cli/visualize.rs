use colored::*;

fn shade(bar: String, percentage: f64) -> String {
    match percentage as u32 {
        0..=25 => bar.red().to_string(),
        26..=50 => bar.yellow().to_string(),
        51..=75 => bar.blue().to_string(),
        _ => bar.green().to_string(),
    }
}

/// Horizontal ASCII histogram, one row per label, scaled to the largest value
pub fn ascii_histogram(data: &[(String, usize)], width: usize, use_color: bool) -> String {
    let mut output = String::new();

    if data.is_empty() {
        return output;
    }

    let max_value = data.iter().map(|(_, v)| *v).max().unwrap_or(0).max(1);
    let max_label_len = data.iter().map(|(s, _)| s.len()).max().unwrap_or(0);

    for (label, value) in data {
        let percentage = (*value as f64 / max_value as f64) * 100.0;
        let bar_width = (((percentage / 100.0) * width as f64) as usize).min(width);

        let bar = "█".repeat(bar_width);
        let bar = if use_color { shade(bar, percentage) } else { bar };

        output.push_str(&format!(
            "{:>label_width$} {}{} {:>6}\n",
            label,
            bar,
            "░".repeat(width - bar_width),
            value,
            label_width = max_label_len
        ));
    }

    output
}

/// Single labelled bar showing `value` as a share of `max`
pub fn progress_bar(value: f64, max: f64, width: usize, label: &str, use_color: bool) -> String {
    let percentage = if max > 0.0 {
        (value / max * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    let filled = (((percentage / 100.0) * width as f64) as usize).min(width);
    let bar = "█".repeat(filled);
    let bar = if use_color { shade(bar, percentage) } else { bar };

    format!("{:<15} {}{} {:5.1}%", label, bar, "░".repeat(width - filled), percentage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_scales_to_max() {
        let data = vec![("a".to_string(), 10), ("bb".to_string(), 5), ("c".to_string(), 0)];
        let out = ascii_histogram(&data, 10, false);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(" a ██████████"));
        assert!(lines[1].starts_with("bb █████░░░░░"));
        assert!(lines[2].contains("░░░░░░░░░░"));
    }

    #[test]
    fn test_histogram_empty() {
        assert!(ascii_histogram(&[], 10, false).is_empty());
    }

    #[test]
    fn test_progress_bar() {
        let bar = progress_bar(50.0, 100.0, 10, "GC", false);
        assert!(bar.contains("█████░░░░░"));
        assert!(bar.ends_with(" 50.0%"));
        assert!(progress_bar(1.0, 0.0, 4, "x", false).contains("░░░░"));
    }
}
