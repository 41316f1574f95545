//! Property-based tests for rda_log using proptest

use proptest::prelude::*;
use rda_log::prelude::*;
use rda_log::BufferPool;
use std::collections::HashSet;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Always),
        Just(LogLevel::Error),
        Just(LogLevel::Warn),
        Just(LogLevel::Info),
        Just(LogLevel::Verbose),
    ]
}

// ============================================================================
// LogLevel and LevelGate Tests
// ============================================================================

proptest! {
    /// Level names parse back regardless of case
    #[test]
    fn test_log_level_case_insensitive(level in any_level(), upper in any::<bool>()) {
        let name = if upper {
            level.to_str().to_uppercase()
        } else {
            level.to_str().to_lowercase()
        };
        let parsed: LogLevel = name.parse().unwrap();
        prop_assert_eq!(parsed, level);
    }

    /// A message passes exactly when it is at or above the threshold's priority
    #[test]
    fn test_gate_allows_at_or_below_threshold(threshold in any_level(), level in any_level()) {
        let gate = LevelGate::new(threshold);
        prop_assert_eq!(gate.allows(level), level <= threshold);
        prop_assert!(gate.allows(LogLevel::Always));
    }

    /// The last threshold set is the one observed
    #[test]
    fn test_gate_set_then_get(levels in prop::collection::vec(any_level(), 1..16)) {
        let gate = LevelGate::default();
        for level in &levels {
            gate.set(*level);
        }
        prop_assert_eq!(gate.get(), *levels.last().unwrap());
    }

    #[test]
    fn test_log_level_invalid_parse(invalid in "[0-9_ ]{1,12}") {
        prop_assert!(invalid.parse::<LogLevel>().is_err());
    }
}

// ============================================================================
// BufferPool Tests
// ============================================================================

proptest! {
    /// Any interleaving of acquire and release conserves every buffer
    #[test]
    fn test_pool_conserves_buffers(
        capacity in 1usize..8,
        ops in prop::collection::vec(any::<bool>(), 0..64)
    ) {
        let pool = BufferPool::new(16, capacity);
        pool.ensure_populated();
        let mut held = Vec::new();

        for acquire in ops {
            if acquire {
                match pool.acquire() {
                    Some(buffer) => held.push(buffer),
                    None => prop_assert_eq!(held.len(), capacity),
                }
            } else if let Some(buffer) = held.pop() {
                pool.release(buffer);
            }
            prop_assert_eq!(pool.free_count() + held.len(), capacity);
        }

        for buffer in held.drain(..) {
            pool.release(buffer);
        }
        let snapshot = pool.snapshot();
        let unique: HashSet<_> = snapshot.free.iter().collect();
        prop_assert_eq!(unique.len(), capacity);
        prop_assert_eq!(snapshot.in_use(), 0);
    }
}

// ============================================================================
// Truncation Tests
// ============================================================================

const HEADER: &str = "T Info [m>f>1] ";

/// The longest prefix of `message` that fits in `room` bytes.
fn fitting_prefix(message: &str, room: usize) -> &str {
    if message.len() <= room {
        return message;
    }
    let mut cut = room;
    while !message.is_char_boundary(cut) {
        cut -= 1;
    }
    &message[..cut]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Every line fits its buffer, is valid UTF-8, ends in one newline and
    /// is a prefix of what was asked for
    #[test]
    fn test_lines_are_bounded_prefixes(
        buffer_size in 24usize..96,
        message in "[^\n]{0,120}"
    ) {
        let sink = MemorySink::new();
        let core = LoggingCore::builder()
            .buffer_size(buffer_size)
            .timestamp_format(TimestampFormat::Custom("T".to_string()))
            .sink(sink.clone())
            .build();

        core.write(LogLevel::Info, &CallSite::new("m", "f", 1), format_args!("{}", message));
        core.shutdown();

        let raw = sink.raw_lines();
        prop_assert_eq!(raw.len(), 1);
        let line = String::from_utf8(raw[0].clone()).unwrap();
        prop_assert!(line.len() <= buffer_size);
        prop_assert!(line.ends_with('\n'));
        prop_assert_eq!(line.matches('\n').count(), 1);

        let room = buffer_size - 1 - HEADER.len();
        let expected = format!("{}{}\n", HEADER, fitting_prefix(&message, room));
        prop_assert_eq!(&line, &expected);

        let truncated = message.len() > room;
        prop_assert_eq!(core.metrics().truncated_count(), u64::from(truncated));
    }
}

// ============================================================================
// Configuration Tests
// ============================================================================

proptest! {
    #[test]
    fn test_config_rejects_tiny_buffers(buffer_size in 0usize..2) {
        let json = format!(r#"{{ "buffer_size": {} }}"#, buffer_size);
        let result = LoggerConfig::from_json(&json);
        prop_assert!(matches!(result, Err(LoggerError::InvalidConfiguration { .. })), "expected rejection");
    }

    #[test]
    fn test_config_accepts_any_sane_sizes(
        buffer_size in 2usize..4096,
        buffer_count in 1usize..1024,
        level in any_level()
    ) {
        let config = LoggerConfig {
            buffer_size,
            buffer_count,
            level,
            ..LoggerConfig::default()
        };
        prop_assert!(config.validate().is_ok());
        prop_assert_eq!(config.payload_capacity(), buffer_size - 1);
    }
}
