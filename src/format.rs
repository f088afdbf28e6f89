use crate::stats::{StatEntry, StatsTable};

/// Rounds up toward positive infinity at one decimal: `ceil(v * 10) / 10`.
///
/// Not round-half-even and not truncation: `2.449999` becomes `2.5` and
/// `-2.05` becomes `-2.0`. Results that ceil to zero are always positive zero,
/// so `-0.04` renders as `0.0`. Values of magnitude 2^52 and up are already
/// whole numbers and come back unchanged, which also keeps `v * 10` from
/// overflowing near `f64::MAX`.
pub fn round_up(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= WHOLE_FROM {
        return value;
    }
    let tenths = (value * 10.0).ceil();
    if tenths == 0.0 {
        0.0
    } else {
        tenths / 10.0
    }
}

// 2^52: every f64 at or above this magnitude is an integer.
const WHOLE_FROM: f64 = 4_503_599_627_370_496.0;

/// Renders one `key=MIN/MEAN/MAX` line without a terminator.
pub fn format_entry(key: &[u8], e: &StatEntry) -> String {
    format!(
        "{}={:.1}/{:.1}/{:.1}",
        String::from_utf8_lossy(key),
        round_up(e.min),
        round_up(e.mean()),
        round_up(e.max)
    )
}

/// One line per key, ordered by the key's bytes.
pub fn format_table(table: &StatsTable) -> Vec<String> {
    table
        .sorted()
        .into_iter()
        .map(|(k, e)| format_entry(k, e))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_contract() {
        assert_eq!(round_up(2.449999), 2.5);
        assert_eq!(round_up(2.0), 2.0);
        assert_eq!(round_up(-2.05), -2.0);
        assert_eq!(round_up(0.0), 0.0);
        assert_eq!(round_up(1.01), 1.1);
        assert_eq!(round_up(-1.01), -1.0);
    }

    #[test]
    fn one_fractional_digit() {
        let e = StatEntry::from(5.0);
        assert_eq!(format_entry(b"Oslo", &e), "Oslo=5.0/5.0/5.0");

        let mut e = StatEntry::from(-12.3);
        e.add(40.0);
        assert_eq!(format_entry(b"A", &e), "A=-12.3/13.9/40.0");
    }

    #[test]
    fn small_negatives_round_to_plain_zero() {
        let e = StatEntry::from(-0.04);
        assert_eq!(format_entry(b"k", &e), "k=0.0/0.0/0.0");
        assert!(round_up(-0.0).is_sign_positive());
    }

    #[test]
    fn large_values_have_no_separators() {
        let e = StatEntry::from(1234567.8);
        assert_eq!(format_entry(b"k", &e), "k=1234567.8/1234567.8/1234567.8");
    }

    #[test]
    fn values_near_f64_max_stay_finite() {
        assert_eq!(round_up(1.7e308), 1.7e308);
        assert_eq!(round_up(-1.7e308), -1.7e308);
        assert_eq!(round_up(f64::MAX), f64::MAX);
        assert_eq!(round_up(9007199254740993.0), 9007199254740993.0);

        let big = format!("{:.1}", 1.7e308);
        let e = StatEntry::from(1.7e308);
        assert_eq!(format_entry(b"k", &e), format!("k={big}/{big}/{big}"));
        assert!(!format_entry(b"k", &e).contains("inf"));
    }

    #[test]
    fn overflowing_sum_still_formats() {
        let mut e = StatEntry::from(1e308);
        e.add(1e308);
        let big = format!("{:.1}", 1e308);
        assert_eq!(format_entry(b"k", &e), format!("k={big}/{big}/{big}"));
    }

    #[test]
    fn lines_sorted_by_key() {
        let t: StatsTable = [
            (&b"Tokyo"[..], 35.6),
            (&b"Amsterdam"[..], 10.2),
            (&b"Zurich"[..], 9.1),
        ]
        .into_iter()
        .collect();
        let keys: Vec<String> = format_table(&t)
            .into_iter()
            .map(|l| l.split('=').next().unwrap().to_string())
            .collect();
        assert_eq!(keys, ["Amsterdam", "Tokyo", "Zurich"]);
    }

    #[test]
    fn formatting_is_idempotent() {
        let t: StatsTable = [(&b"b"[..], 1.25), (&b"a"[..], -7.75), (&b"b"[..], 3.5)]
            .into_iter()
            .collect();
        assert_eq!(format_table(&t), format_table(&t));
    }

    #[test]
    fn empty_table_formats_to_nothing() {
        assert!(format_table(&StatsTable::new()).is_empty());
    }
}
