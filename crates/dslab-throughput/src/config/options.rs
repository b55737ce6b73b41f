//! Option strings of the form `name[key=value,...]`.

use std::collections::HashMap;

/// Splits an option string into its name and the raw options inside the brackets.
/// Example: for `slurm[user=alice]` the name is `slurm` and the options string is `user=alice`.
pub fn parse_config_value(config_str: &str) -> (String, Option<String>) {
    match config_str.trim().split_once('[') {
        Some((name, rest)) => (
            name.trim().to_string(),
            Some(rest.trim_end().trim_end_matches(']').to_string()),
        ),
        None => (config_str.trim().to_string(), None),
    }
}

/// Parses `key=value` pairs separated by commas. Pairs without `=` are ignored.
pub fn parse_options(options_str: &str) -> HashMap<String, String> {
    options_str
        .split(',')
        .filter_map(|option| option.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_without_options() {
        assert_eq!(parse_config_value("slurm"), ("slurm".to_string(), None));
        assert_eq!(parse_config_value(" simulated "), ("simulated".to_string(), None));
    }

    #[test]
    fn test_name_with_options() {
        let (name, options) = parse_config_value("slurm[user=alice, partition = big]");
        assert_eq!(name, "slurm");
        let options = parse_options(&options.unwrap());
        assert_eq!(options.len(), 2);
        assert_eq!(options["user"], "alice");
        assert_eq!(options["partition"], "big");
    }

    #[test]
    fn test_malformed_pairs_are_skipped() {
        let options = parse_options("a=1,,flag,=2");
        assert_eq!(options.len(), 1);
        assert_eq!(options["a"], "1");
    }
}
