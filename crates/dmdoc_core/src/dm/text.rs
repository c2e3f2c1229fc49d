/// Significant characters in a field name.
pub const MAX_NAME_LEN: usize = 8;

/// Decode fixed-width ASCII, stopping at the first NUL and dropping trailing blanks.
pub fn trim_text(raw: &[u8]) -> String {
	let end = raw.iter().position(|byte| *byte == 0).unwrap_or(raw.len());
	String::from_utf8_lossy(&raw[..end]).trim_end().to_owned()
}

/// Keep at most `max` characters of `name`, after trimming surrounding blanks.
pub fn truncate_name(name: &str, max: usize) -> String {
	name.trim().chars().take(max).collect()
}

/// Compare field names the way DataMine does: trimmed, truncated, ASCII case-insensitive.
pub fn names_match(left: &str, right: &str) -> bool {
	let left = truncate_name(left, MAX_NAME_LEN);
	let right = truncate_name(right, MAX_NAME_LEN);
	left.eq_ignore_ascii_case(&right)
}

#[cfg(test)]
mod tests {
	use super::{names_match, trim_text, truncate_name};

	#[test]
	fn trim_stops_at_nul() {
		assert_eq!(trim_text(b"XP  \0junk"), "XP");
		assert_eq!(trim_text(b"  LEAD "), "  LEAD");
		assert_eq!(trim_text(b""), "");
	}

	#[test]
	fn truncate_keeps_leading_chars() {
		assert_eq!(truncate_name("  DENSITYVAL ", 8), "DENSITYV");
		assert_eq!(truncate_name("AU", 8), "AU");
	}

	#[test]
	fn names_match_ignores_case_and_overflow() {
		assert!(names_match("pid1", "PID1"));
		assert!(names_match("TONNAGE_TOTAL", "tonnage_"));
		assert!(!names_match("PID1", "PID2"));
	}
}
