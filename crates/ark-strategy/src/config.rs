use ark_config::{
    read_f64, read_opt_str, read_opt_u64, read_str, read_str_list, read_u64, require_keys,
    ConfigError,
};
use ark_execution::ExecStyle;
use serde::Serialize;
use serde_json::Value;

use crate::construction::{ConstructionMethod, MonteCarloOptions, DEFAULT_MC_SAMPLES};
use crate::schedule::RebalancePeriod;

pub const REQUIRED_KEYS: &[&str] = &["/init_balance", "/period", "/days_delay", "/position_ratio"];

/// Strategy settings resolved once at init.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StrategyConfig {
    pub init_balance: f64,
    pub period: RebalancePeriod,
    /// Index of the rebalance date inside each period bucket.
    pub days_delay: u32,
    /// Fraction of available cash put to work each rebalance, in [0, 1].
    pub position_ratio: f64,
    pub universe: Vec<String>,
    pub benchmark: Option<String>,
    pub method: ConstructionMethod,
    pub exec_style: ExecStyle,
}

impl StrategyConfig {
    /// Read from a merged config document (see `ark_config::load_layered_yaml`).
    pub fn from_config_json(config: &Value) -> Result<Self, ConfigError> {
        require_keys(config, REQUIRED_KEYS)?;

        let init_balance = read_f64(config, "/init_balance")?;
        if init_balance < 0.0 {
            return Err(ConfigError::invalid("/init_balance", "must be >= 0"));
        }

        let period = read_str(config, "/period")?
            .parse::<RebalancePeriod>()
            .map_err(|e| ConfigError::invalid("/period", e))?;

        let days_delay = u32::try_from(read_u64(config, "/days_delay")?)
            .map_err(|_| ConfigError::invalid("/days_delay", "out of range"))?;

        let position_ratio = read_f64(config, "/position_ratio")?;
        if !(0.0..=1.0).contains(&position_ratio) {
            return Err(ConfigError::invalid("/position_ratio", "must be within [0, 1]"));
        }

        let universe = read_str_list(config, "/universe")?;
        let benchmark = read_opt_str(config, "/benchmark")?.map(str::to_string);

        let method = match read_opt_str(config, "/pc_method")?.unwrap_or("equal_weight") {
            "equal_weight" => ConstructionMethod::EqualWeight,
            "factor_value_weight" => ConstructionMethod::FactorValueWeight,
            "mc" => {
                let n_samples = read_opt_u64(config, "/mc/n_samples")?
                    .map(|n| n as usize)
                    .unwrap_or(DEFAULT_MC_SAMPLES);
                if n_samples == 0 {
                    return Err(ConfigError::invalid("/mc/n_samples", "must be > 0"));
                }
                ConstructionMethod::MonteCarlo(MonteCarloOptions {
                    n_samples,
                    seed: read_opt_u64(config, "/mc/seed")?,
                    initial_value: None,
                })
            }
            other => {
                return Err(ConfigError::invalid(
                    "/pc_method",
                    format!("unknown method '{other}' (expected equal_weight|factor_value_weight|mc)"),
                ))
            }
        };

        let exec_style = match read_opt_str(config, "/exec_style")? {
            None => ExecStyle::Close,
            Some(s) => s
                .parse::<ExecStyle>()
                .map_err(|e| ConfigError::invalid("/exec_style", e))?,
        };

        Ok(Self {
            init_balance,
            period,
            days_delay,
            position_ratio,
            universe,
            benchmark,
            method,
            exec_style,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Value {
        json!({
            "init_balance": 1e6,
            "period": "week",
            "days_delay": 1,
            "position_ratio": 0.9,
            "universe": ["600030.SH", "000333.SZ"],
        })
    }

    #[test]
    fn defaults_fill_optional_keys() {
        let c = StrategyConfig::from_config_json(&base()).unwrap();
        assert_eq!(c.period, RebalancePeriod::Week);
        assert_eq!(c.days_delay, 1);
        assert_eq!(c.universe.len(), 2);
        assert_eq!(c.method, ConstructionMethod::EqualWeight);
        assert_eq!(c.exec_style, ExecStyle::Close);
        assert!(c.benchmark.is_none());
    }

    #[test]
    fn each_required_key_is_enforced() {
        for key in ["init_balance", "period", "days_delay", "position_ratio"] {
            let mut v = base();
            v.as_object_mut().unwrap().remove(key);
            let err = StrategyConfig::from_config_json(&v).unwrap_err();
            assert_eq!(err, ConfigError::MissingKey { pointer: format!("/{key}") });
        }
    }

    #[test]
    fn mc_options_are_typed() {
        let mut v = base();
        v["pc_method"] = json!("mc");
        v["mc"] = json!({"n_samples": 12, "seed": 42});
        let c = StrategyConfig::from_config_json(&v).unwrap();
        assert_eq!(
            c.method,
            ConstructionMethod::MonteCarlo(MonteCarloOptions {
                n_samples: 12,
                seed: Some(42),
                initial_value: None
            })
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            ("position_ratio", json!(1.5), "/position_ratio"),
            ("period", json!("quarter"), "/period"),
            ("days_delay", json!(-1), "/days_delay"),
            ("pc_method", json!("black_litterman"), "/pc_method"),
            ("exec_style", json!("twap"), "/exec_style"),
        ];
        for (key, value, pointer) in cases {
            let mut v = base();
            v[key] = value;
            let err = StrategyConfig::from_config_json(&v).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue { pointer: p, .. } if p == pointer),
                "{key}: {err}"
            );
        }
    }
}
