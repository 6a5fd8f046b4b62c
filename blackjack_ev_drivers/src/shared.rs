use blackjack_ev::{HouseRules, PeekPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unknown value in config: {0}")]
    UnknownValue(#[from] serde::de::value::Error),
    #[error(transparent)]
    Rule(#[from] blackjack_ev::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub rule: ConfigRule,
    pub calculator: ConfigCalculator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigRule {
    pub shoe_size: u8,
    pub s17: bool,
    pub blackjack_payout: f64,
    pub max_hands: u8,
    pub double_down: bool,
    pub double_after_split: bool,
    pub resplit_aces: bool,
    pub max_split_count: Option<u8>,
    pub insurance: bool,
    pub late_surrender: bool,
    pub peek_policy: String,
    pub split_aces_one_card: bool,
}

impl Default for ConfigRule {
    fn default() -> Self {
        let rules = HouseRules::default();
        ConfigRule {
            shoe_size: rules.shoe_size(),
            s17: rules.s17(),
            blackjack_payout: rules.blackjack_payout(),
            max_hands: rules.max_hands(),
            double_down: rules.double_down(),
            double_after_split: rules.double_after_split(),
            resplit_aces: rules.resplit_aces(),
            max_split_count: rules.max_split_count(),
            insurance: rules.insurance(),
            late_surrender: rules.late_surrender(),
            peek_policy: rules.peek_policy().to_string(),
            split_aces_one_card: rules.split_aces_one_card(),
        }
    }
}

impl TryFrom<ConfigRule> for HouseRules {
    type Error = ConfigError;

    fn try_from(config: ConfigRule) -> Result<Self, Self::Error> {
        let peek_policy: PeekPolicy = config.peek_policy.parse()?;
        let rules = HouseRules::builder()
            .shoe_size(config.shoe_size)
            .s17(config.s17)
            .blackjack_payout(config.blackjack_payout)
            .max_hands(config.max_hands)
            .double_down(config.double_down)
            .double_after_split(config.double_after_split)
            .resplit_aces(config.resplit_aces)
            .max_split_count(config.max_split_count)
            .insurance(config.insurance)
            .late_surrender(config.late_surrender)
            .peek_policy(peek_policy)
            .split_aces_one_card(config.split_aces_one_card)
            .build()?;

        Ok(rules)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigCalculator {
    pub recursion_depth: i32,
    /// 0 means one thread per available core.
    pub number_of_threads: usize,
    pub log_level: String,
}

impl Default for ConfigCalculator {
    fn default() -> Self {
        ConfigCalculator {
            recursion_depth: 1,
            number_of_threads: 0,
            log_level: String::from("info"),
        }
    }
}

/// Reads the content of a given config file and parses it to a Config.
pub fn parse_config_from_file(filename: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let file_content = fs::read_to_string(filename)?;
    parse_config(&file_content)
}

pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}
