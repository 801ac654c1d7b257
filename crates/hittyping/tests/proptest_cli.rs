//! Property-based tests for the command-line surface.
//!
//! 1. Compound durations parse to the sum of their parts.
//! 2. Explicit threshold flags always beat the environment.
//! 3. At most one protocol flag is accepted.
//! 4. Host normalization is idempotent.

use std::time::Duration;

use clap::Parser;
use hittyping::cli::{Cli, parse_duration};
use hp_core::config::normalize_host;
use hp_core::error::ConfigError;
use proptest::prelude::*;

fn cli(args: &[String]) -> Cli {
    let mut argv = vec!["hp".to_string()];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

proptest! {
    #[test]
    fn compound_durations_sum(h in 0u64..24, m in 0u64..60, s in 0u64..60, ms in 0u64..1_000) {
        let text = format!("{h}h{m}m{s}s{ms}ms");
        let expected = Duration::from_secs(h * 3_600 + m * 60 + s) + Duration::from_millis(ms);
        prop_assert_eq!(parse_duration(&text), Some(expected));
    }

    #[test]
    fn fractional_seconds_are_exact(whole in 0u64..10_000, millis in 0u64..1_000) {
        let text = format!("{whole}.{millis:03}s");
        let expected = Duration::from_secs(whole) + Duration::from_millis(millis);
        prop_assert_eq!(parse_duration(&text), Some(expected));
    }

    #[test]
    fn flags_beat_env(green in 1i64..1_000, env_green in 1i64..1_000) {
        let yellow = 2_000;
        let args = vec![
            "-g".to_string(),
            green.to_string(),
            "-y".to_string(),
            yellow.to_string(),
        ];
        let env_value = env_green.to_string();
        let cfg = cli(&args)
            .into_config(|key| (key == "HP_GREEN").then(|| env_value.clone()))
            .unwrap();
        prop_assert_eq!(cfg.thresholds.green_ms, green);
        prop_assert_eq!(cfg.thresholds.yellow_ms, yellow);
    }

    #[test]
    fn protocol_flags_exclusive(one in any::<bool>(), two in any::<bool>(), three in any::<bool>()) {
        let args: Vec<String> = [(one, "-1"), (two, "-2"), (three, "-3")]
            .into_iter()
            .filter(|(set, _)| *set)
            .map(|(_, flag)| flag.to_string())
            .collect();
        let result = cli(&args).into_config(|_| None);
        if args.len() > 1 {
            prop_assert_eq!(result, Err(ConfigError::ConflictingProtocols));
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn normalize_is_idempotent(host in "[a-z]{1,12}(\\.[a-z]{2,6}){0,2}(:[0-9]{1,5})?(/[a-z]{0,8})?") {
        let once = normalize_host(&host);
        prop_assert_eq!(normalize_host(&once), once.clone());
        prop_assert!(!once.contains('/'));
    }
}
