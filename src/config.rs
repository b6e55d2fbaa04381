use std::collections::HashMap;
use std::path::Path;

use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;

/// Build settings for the exercise pipeline.
///
/// Loaded from a user-level settings file and an optional per-project
/// `.myst-exercise` file at the project root; project values win.
#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// Suppress all solution directives from the build output.
    pub hide_solutions: bool,
    /// Authoring-style selector. The only recognised value is
    /// `"solution_follow_exercise"`, which turns on ordering validation and
    /// strips hyperlinks from solution titles. Empty string means default
    /// behavior.
    pub exercise_style: String,
    /// Display format per numbering category, `%s` is the ordinal.
    pub numfig_format: HashMap<String, String>,
}

impl Settings {
    pub fn new(root_dir: &Path) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/myst-exercise/settings");
        let settings = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.myst-exercise",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .set_default("hide_solutions", false)?
            .set_default("exercise_style", "")?
            .set_default("numfig_format", HashMap::<String, String>::new())?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let mut settings = settings.try_deserialize::<Settings>()?;

        // The exercise category always has a format; user entries override.
        settings
            .numfig_format
            .entry("exercise".to_string())
            .or_insert_with(|| "Exercise %s".to_string());

        anyhow::Ok(settings)
    }

    /// True when the `solution_follow_exercise` authoring style is active.
    pub fn solution_follows_exercise(&self) -> bool {
        self.exercise_style == "solution_follow_exercise"
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            hide_solutions: false,
            exercise_style: "".to_string(),
            numfig_format: HashMap::from([("exercise".to_string(), "Exercise %s".to_string())]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_numfig_format_has_exercise_category() {
        let settings = Settings::default();
        assert_eq!(
            settings.numfig_format.get("exercise").map(String::as_str),
            Some("Exercise %s")
        );
    }

    #[test]
    fn test_default_style_is_empty() {
        let settings = Settings::default();
        assert!(!settings.solution_follows_exercise());
        assert!(!settings.hide_solutions);
    }

    #[test]
    fn test_style_selector_matches_exact_string() {
        let settings = Settings {
            exercise_style: "solution_follow_exercise".to_string(),
            ..Settings::default()
        };
        assert!(settings.solution_follows_exercise());

        let settings = Settings {
            exercise_style: "something_else".to_string(),
            ..Settings::default()
        };
        assert!(!settings.solution_follows_exercise());
    }
}
