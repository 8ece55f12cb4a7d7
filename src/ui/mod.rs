use once_cell::sync::Lazy;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use time::format_description::FormatItem;
use time::{format_description, OffsetDateTime};

/// Centers a percentage-sized rectangle inside `area`, used for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}

/// Binary-unit size, one decimal above bytes: `512 B`, `1.5 KB`, `2.0 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0usize;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let units = ["KB", "MB", "GB", "TB", "PB", "EB"];
    format!("{:.1} {}", bytes as f64 / div as f64, units[exp])
}

static TIMESTAMP_FORMAT: Lazy<Vec<FormatItem<'static>>> = Lazy::new(|| {
    format_description::parse("[year]-[month]-[day] [hour]:[minute]")
        .expect("valid timestamp format description")
});

pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| "----------".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_formatting_scales_with_magnitude() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(2 * 1024 * 1024), "2.0 MB");
    }

    #[test]
    fn timestamps_render_to_the_minute() {
        let at = OffsetDateTime::UNIX_EPOCH + time::Duration::hours(25);
        assert_eq!(format_timestamp(at), "1970-01-02 01:00");
    }

    #[test]
    fn centered_rect_is_contained_in_its_parent() {
        let parent = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(60, 30, parent);
        assert!(inner.x >= parent.x && inner.y >= parent.y);
        assert!(inner.right() <= parent.right() && inner.bottom() <= parent.bottom());
    }
}
