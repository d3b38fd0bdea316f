use crate::Arrive;
use std::path::PathBuf;
use std::time::Duration;

/// The `Settings` struct holds the knobs a viewer can turn in `Tweetle.toml`.
///
/// I chose the [`config`] crate for the same reason as ever: it reads `toml` so I don't have to.
/// Values are layered.  The built-in defaults go in first, then `Tweetle.toml` from the working
/// directory if there is one, then any `TWEETLE_*` environment variables, so
/// `TWEETLE_INTERVAL_MS=100` speeds up the feed without touching the file.  The result is
/// deserialized with [`serde`].
///
/// * `interval_ms` - Milliseconds between ticks of the main view.
/// * `overlay_interval_ms` - Milliseconds between ticks of the overlay.
/// * `visitor` - Handle used for the viewer's own posts.
/// * `chatterboxes` - How many simulated authors to spawn.
/// * `seed` - How many messages the chatterboxes post before the feed opens.
/// * `max_pause_ms` - Longest a chatterbox waits between posts.
/// * `quips` - CSV file of phrases for the chatterboxes, if any.
#[derive(
    Debug, Clone, PartialEq, Eq, derive_getters::Getters, serde::Serialize, serde::Deserialize,
)]
pub struct Settings {
    interval_ms: u64,
    overlay_interval_ms: u64,
    visitor: String,
    chatterboxes: usize,
    seed: usize,
    max_pause_ms: u64,
    quips: Option<PathBuf>,
}

impl Settings {
    /// Reads `Tweetle.toml` and the environment over the defaults.  A missing file is fine, a
    /// broken one will [`crate::Blame::Config`].
    #[tracing::instrument]
    pub fn load() -> Arrive<Self> {
        let settings = Self::layered(
            config::File::with_name("Tweetle").required(false),
            Some(config::Environment::with_prefix("TWEETLE")),
        )?;
        tracing::trace!("{settings:#?}");
        Ok(settings)
    }

    /// Reads settings from a `toml` string over the defaults, skipping the environment.
    pub fn from_toml(toml: &str) -> Arrive<Self> {
        Self::layered(config::File::from_str(toml, config::FileFormat::Toml), None)
    }

    /// Stacks the defaults, then `file`, then `env` when given, and checks the result.
    fn layered<S>(file: S, env: Option<config::Environment>) -> Arrive<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let mut builder = Self::defaults()?.add_source(file);
        if let Some(env) = env {
            builder = builder.add_source(env.try_parsing(true));
        }
        let settings = builder.build()?.try_deserialize::<Self>()?;
        settings.validate()?;
        Ok(settings)
    }

    /// A timer cannot tick every zero milliseconds.
    /// Will [`crate::Blame::Config`] naming the offending key.
    fn validate(&self) -> Arrive<()> {
        for (key, value) in [
            ("interval_ms", self.interval_ms),
            ("overlay_interval_ms", self.overlay_interval_ms),
        ] {
            if value == 0 {
                return Err(config::ConfigError::Message(format!(
                    "{key} must be at least 1"
                ))
                .into());
            }
        }
        Ok(())
    }

    fn defaults() -> Arrive<config::ConfigBuilder<config::builder::DefaultState>> {
        let builder = config::Config::builder()
            .set_default("interval_ms", 500_i64)?
            .set_default("overlay_interval_ms", 500_i64)?
            .set_default("visitor", "you")?
            .set_default("chatterboxes", 4_i64)?
            .set_default("seed", 10_i64)?
            .set_default("max_pause_ms", 1500_i64)?
            .set_default("quips", "data/quips.csv")?;
        Ok(builder)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn overlay_interval(&self) -> Duration {
        Duration::from_millis(self.overlay_interval_ms)
    }

    pub fn max_pause(&self) -> Duration {
        Duration::from_millis(self.max_pause_ms)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            overlay_interval_ms: 500,
            visitor: "you".to_string(),
            chatterboxes: 4,
            seed: 10,
            max_pause_ms: 1500,
            quips: Some(PathBuf::from("data/quips.csv")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn toml_overrides_defaults() {
        let settings = Settings::from_toml(
            r#"
            interval_ms = 100
            visitor = "erik"
            "#,
        )
        .unwrap();
        assert_eq!(settings.interval(), Duration::from_millis(100));
        assert_eq!(settings.visitor(), "erik");
        assert_eq!(*settings.seed(), 10);
    }

    #[test]
    fn zero_intervals_are_blamed() {
        for toml in ["interval_ms = 0", "overlay_interval_ms = 0"] {
            let result = Settings::from_toml(toml);
            assert!(matches!(result, Err(crate::Blame::Config(_))), "{toml}");
        }
    }

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        config::Environment::with_prefix("TWEETLE").source(Some(map))
    }

    #[test]
    fn environment_beats_file_beats_defaults() {
        let path = std::env::temp_dir().join(format!("tweetle-{}.toml", std::process::id()));
        std::fs::write(&path, "interval_ms = 250\nvisitor = \"erik\"\n").unwrap();

        let from_file = Settings::layered(config::File::from(path.clone()), None).unwrap();
        assert_eq!(*from_file.interval_ms(), 250);
        assert_eq!(from_file.visitor(), "erik");

        let env = environment(&[("TWEETLE_INTERVAL_MS", "100"), ("TWEETLE_SEED", "3")]);
        let layered = Settings::layered(config::File::from(path.clone()), Some(env)).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(*layered.interval_ms(), 100);
        assert_eq!(*layered.seed(), 3);
        assert_eq!(layered.visitor(), "erik");
        assert_eq!(*layered.overlay_interval_ms(), 500);
    }

    #[test]
    fn missing_file_falls_back_to_environment_and_defaults() {
        let env = environment(&[("TWEETLE_INTERVAL_MS", "100")]);
        let settings = Settings::layered(
            config::File::with_name("/definitely/not/Tweetle").required(false),
            Some(env),
        )
        .unwrap();
        assert_eq!(settings.interval(), Duration::from_millis(100));
        assert_eq!(settings.visitor(), "you");
    }

    #[test]
    fn zero_interval_from_the_environment_is_blamed() {
        let env = environment(&[("TWEETLE_OVERLAY_INTERVAL_MS", "0")]);
        let empty = config::File::from_str("", config::FileFormat::Toml);
        let result = Settings::layered(empty, Some(env));
        assert!(matches!(result, Err(crate::Blame::Config(_))));
    }

    #[test]
    fn bad_values_are_blamed() {
        let result = Settings::from_toml("interval_ms = \"soon\"");
        assert!(matches!(result, Err(crate::Blame::Config(_))));
    }
}
