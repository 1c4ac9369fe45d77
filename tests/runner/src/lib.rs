use anyhow::{Context as _, Result};
use libtest_mimic::{Arguments, Trial};
use spirv_untyped_cts::{CaseBundle, CaseRegistry, GeneratorConfig, generate};
use std::convert::Infallible;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::FmtSubscriber;

pub mod replay;
pub mod verify;
pub mod writer;

/// Path to a JSON [`GeneratorConfig`]; defaults are used when unset.
pub const CONFIG_ENV: &str = "UNTYPED_CTS_CONFIG";

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("inconsistent case: {0}")]
    Verify(#[from] verify::VerifyError),
    #[error("failed to write case to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Checks a case and, when an output directory is configured, writes it there.
pub fn run_case(bundle: &CaseBundle, case_dir: Option<&Path>) -> Result<(), RunnerError> {
    let outputs = verify::verify(bundle)?;
    if let Some(dir) = case_dir {
        writer::write_case(dir, bundle, &outputs).map_err(|source| RunnerError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Collects one trial per registered case.
#[derive(Default)]
pub struct TrialRegistry {
    output_dir: Option<Arc<Path>>,
    trials: Vec<Trial>,
}

impl TrialRegistry {
    pub fn new(output_dir: Option<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.map(Arc::from),
            trials: Vec::new(),
        }
    }

    pub fn into_trials(self) -> Vec<Trial> {
        self.trials
    }
}

/// `untyped_pointers::basic::load::uniform::uint8` for a case `uint8` in that group.
pub fn trial_name(path: &[&str], case: &str) -> String {
    let mut name = path.join("::");
    name.push_str("::");
    name.push_str(case);
    name
}

impl CaseRegistry for TrialRegistry {
    type Error = Infallible;

    fn register(&mut self, path: &[&str], bundle: CaseBundle) -> Result<(), Infallible> {
        let name = trial_name(path, &bundle.name);
        let case_dir = self.output_dir.as_ref().map(|dir| {
            path.iter()
                .fold(dir.to_path_buf(), |dir, group| dir.join(group))
                .join(&bundle.name)
        });
        self.trials.push(Trial::test(name, move || {
            Ok(run_case(&bundle, case_dir.as_deref())?)
        }));
        Ok(())
    }
}

fn load_config() -> Result<GeneratorConfig> {
    match env::var_os(CONFIG_ENV) {
        Some(path) => GeneratorConfig::from_path(&path)
            .with_context(|| format!("loading config from {CONFIG_ENV}={}", Path::new(&path).display())),
        None => Ok(GeneratorConfig::default()),
    }
}

pub fn collect_trials(config: &GeneratorConfig) -> Result<Vec<Trial>> {
    if let Some(dir) = &config.output_dir {
        tracing::debug!("Writing cases to {}", dir.display());
    }
    let mut registry = TrialRegistry::new(config.output_dir.clone());
    let count = generate(&mut registry, config).context("failed to generate cases")?;
    tracing::debug!("Registered {count} trials");
    Ok(registry.into_trials())
}

pub fn run() -> Result<ExitCode> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set global subscriber")?;

    let mut args = Arguments::from_args();

    // Filters that look like group paths (`basic/load`) are matched against trial names.
    if let Some(filter) = &mut args.filter {
        *filter = filter.replace('/', "::");
    }

    let config = load_config()?;
    let trials = collect_trials(&config)?;
    Ok(libtest_mimic::run(&args, trials).exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use spirv_untyped_cts::MemoryModelKind;
    use tempfile::tempdir;

    #[test]
    fn test_trial_names() {
        assert_eq!(
            trial_name(&["untyped_pointers", "basic", "load", "uniform"], "uint8"),
            "untyped_pointers::basic::load::uniform::uint8"
        );
    }

    #[test]
    fn test_every_case_verifies() {
        let config = GeneratorConfig {
            element_count: 4,
            ..GeneratorConfig::default()
        };
        let mut cases: Vec<(String, CaseBundle)> = Vec::new();
        generate(&mut cases, &config).unwrap();
        for (path, bundle) in &cases {
            if let Err(err) = run_case(bundle, None) {
                panic!("{path}.{}: {err}", bundle.name);
            }
        }
    }

    #[test]
    fn test_trials_write_bundles() {
        let dir = tempdir().unwrap();
        let config = GeneratorConfig {
            output_dir: Some(dir.path().to_path_buf()),
            memory_models: vec![MemoryModelKind::Glsl450],
            element_count: 2,
        };
        let trials = collect_trials(&config).unwrap();
        assert!(trials.iter().any(|trial| {
            trial.name() == "untyped_pointers::type_punning::load::uniform::uint32_to_vec4_int8"
        }));

        let args = Arguments {
            filter: Some("untyped_pointers::array_length::storage_buffer::int64".into()),
            exact: true,
            test_threads: Some(1),
            quiet: true,
            ..Arguments::default()
        };
        let conclusion = libtest_mimic::run(&args, trials);
        assert_eq!(conclusion.num_passed, 1);
        assert_eq!(conclusion.num_failed, 0);

        let case = dir
            .path()
            .join("untyped_pointers/array_length/storage_buffer/int64");
        assert!(case.join(writer::MANIFEST_FILE).is_file());
        assert_eq!(
            std::fs::read(case.join("expected0.bin")).unwrap(),
            2u32.to_ne_bytes()
        );
    }
}
