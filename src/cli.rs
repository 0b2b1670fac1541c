use crate::config::AppConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    config: Option<PathBuf>,
    width: Option<u32>,
    height: Option<u32>,
    alpha_cutoff: Option<f32>,
    clicks: Option<usize>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Flags take the form --name <value>.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config = Some(PathBuf::from(value)),
                "width" => {
                    overrides.width =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid width '{value}'"))?);
                }
                "height" => {
                    overrides.height =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid height '{value}'"))?);
                }
                "alpha-cutoff" => {
                    let cutoff =
                        value.parse::<f32>().with_context(|| format!("Invalid alpha cutoff '{value}'"))?;
                    if !(0.0..=1.0).contains(&cutoff) {
                        bail!("Alpha cutoff must lie in [0, 1], got {cutoff}");
                    }
                    overrides.alpha_cutoff = Some(cutoff);
                }
                "clicks" => {
                    overrides.clicks =
                        Some(value.parse::<usize>().with_context(|| format!("Invalid click count '{value}'"))?);
                }
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --config, --width, --height, --alpha-cutoff, --clicks."
                ),
            }
        }
        Ok(overrides)
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config.as_ref()
    }

    pub fn into_config_overrides(self) -> AppConfigOverrides {
        AppConfigOverrides {
            width: self.width,
            height: self.height,
            alpha_cutoff: self.alpha_cutoff,
            clicks: self.clicks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_viewport_cutoff_and_clicks() {
        let args = ["probe", "--width", "1600", "--height", "900", "--alpha-cutoff", "0.5", "--clicks", "3"];
        let overrides = CliOverrides::parse(args).expect("parse overrides").into_config_overrides();
        assert_eq!((overrides.width, overrides.height, overrides.clicks), (Some(1600), Some(900), Some(3)));
        assert_eq!(overrides.alpha_cutoff, Some(0.5));
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["probe", "--width", "800", "--width", "1920", "--config", "a.json", "--config", "b.json"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(overrides.config_path(), Some(&PathBuf::from("b.json")));
        assert_eq!(overrides.into_config_overrides().width, Some(1920));
    }

    #[test]
    fn missing_value_errors() {
        let err = CliOverrides::parse(["probe", "--width"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_unknown_flags_and_bad_cutoffs() {
        let err = CliOverrides::parse(["probe", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
        let err = CliOverrides::parse(["probe", "--alpha-cutoff", "1.5"]).unwrap_err();
        assert!(err.to_string().contains("[0, 1]"), "out of range cutoff should error");
    }
}
