use std::time::Duration;

/// How long flash alerts stay up before being closed.
pub const ALERT_DISMISS_AFTER: Duration = Duration::from_secs(5);

/// Whether a navigation link should carry the `active` class.
pub fn nav_link_is_active(current_path: &str, href: &str) -> bool {
    !href.is_empty() && href != "/" && current_path.contains(href)
}

/// Row visibility for a table search box. Row 0 is the header and always
/// stays visible.
pub fn filter_table_rows<R, C>(filter: &str, rows: &[R]) -> Vec<bool>
where
    R: AsRef<[C]>,
    C: AsRef<str>,
{
    let filter = filter.to_lowercase();
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            index == 0
                || row
                    .as_ref()
                    .iter()
                    .any(|cell| cell.as_ref().to_lowercase().contains(&filter))
        })
        .collect()
}
