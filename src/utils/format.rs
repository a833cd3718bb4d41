//! Display formatting for timer values

/// Format seconds as "MM:SS". Minutes keep counting past 99.
pub fn format_clock(total_secs: u64) -> String {
    let m = total_secs / 60;
    let s = total_secs % 60;
    format!("{:02}:{:02}", m, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(60), "01:00");
        assert_eq!(format_clock(20 * 60 + 5), "20:05");
        assert_eq!(format_clock(125 * 60), "125:00");
    }
}
