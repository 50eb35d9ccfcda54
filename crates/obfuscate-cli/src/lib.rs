//! Pipeline driver for the obfuscate CLI
//!
//! Runs the stages in order, Resolve, Classify, Render, Write, Format, and
//! stops at the first error. Nothing here terminates the process; the binary
//! decides the exit status from the returned error.

use std::fmt;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use obfuscate_codegen::rustfmt::DEFAULT_FORMATTER;
use obfuscate_codegen::{Artifact, Codegen, OutputWriter, RedactCodegen, RustFormatter, TemplateVars};
use obfuscate_core::{classify, CargoUnitLoader, CompilationUnit, ResolveError, UnitLoader};
use tokio::time::Instant;
use tracing::instrument::WithSubscriber;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info, info_span, Dispatch, Instrument};
use tracing_subscriber::EnvFilter;

/// Upper bound on a whole run, starting before the unit is loaded
pub const RUN_DEADLINE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ObfuscateConfig {
    /// Type to obfuscate, bare or module-qualified
    pub type_name: String,
    /// Directory holding the crate and receiving the generated file
    pub working_dir: PathBuf,
    /// Formatter binary looked up on `PATH`
    pub formatter: String,
    pub deadline: Duration,
}

impl ObfuscateConfig {
    pub fn new(type_name: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            type_name: type_name.into(),
            working_dir: working_dir.into(),
            formatter: DEFAULT_FORMATTER.to_string(),
            deadline: RUN_DEADLINE,
        }
    }

    pub fn with_formatter(mut self, formatter: impl Into<String>) -> Self {
        self.formatter = formatter.into();
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Classify,
    Render,
    Write,
    Format,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resolve => write!(f, "resolve"),
            Stage::Classify => write!(f, "classify"),
            Stage::Render => write!(f, "render"),
            Stage::Write => write!(f, "write"),
            Stage::Format => write!(f, "format"),
        }
    }
}

/// Build the logging capability handed to the pipeline
///
/// Events go to stderr. The level comes from the flags unless `RUST_LOG`
/// says otherwise.
pub fn logging_dispatch(verbose: bool, debug: bool) -> Dispatch {
    let level = if debug {
        LevelFilter::TRACE
    } else if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .finish();

    Dispatch::new(subscriber)
}

pub struct Obfuscator {
    config: ObfuscateConfig,
    dispatch: Dispatch,
    loader: Arc<dyn UnitLoader>,
}

impl Obfuscator {
    pub fn new(config: ObfuscateConfig, dispatch: Dispatch) -> Self {
        let loader = Arc::new(CargoUnitLoader::new(config.working_dir.clone()));
        Self {
            config,
            dispatch,
            loader,
        }
    }

    /// Replace the source of the compilation unit
    pub fn with_loader(mut self, loader: Arc<dyn UnitLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Run on a dedicated runtime and return once the run is over
    ///
    /// Blocking work still in flight when the run ends, such as a loader
    /// abandoned at the deadline, is left behind instead of being waited for.
    pub fn run_blocking(&self) -> Result<Artifact> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("could not start the async runtime")?;
        let result = runtime.block_on(self.run());
        runtime.shutdown_background();
        result
    }

    /// Run every stage and return the formatted artifact
    pub async fn run(&self) -> Result<Artifact> {
        self.run_stages()
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn run_stages(&self) -> Result<Artifact> {
        let deadline = Instant::now() + self.config.deadline;
        let type_name = self.config.type_name.as_str();

        let unit = self
            .load_unit(deadline)
            .instrument(info_span!("stage", stage = %Stage::Resolve))
            .await
            .context("could not load the compilation unit")?;
        debug!(
            "looking into crate `{}` for type `{}`",
            unit.name(),
            type_name
        );
        let symbol = info_span!("stage", stage = %Stage::Resolve)
            .in_scope(|| unit.resolve(type_name))
            .with_context(|| format!("could not resolve `{}`", type_name))?;

        let shape = info_span!("stage", stage = %Stage::Classify).in_scope(|| {
            let shape = classify(symbol);
            debug!("`{}` classified as {:?}", symbol.path(), shape);
            shape
        });

        let code = info_span!("stage", stage = %Stage::Render)
            .in_scope(|| {
                let vars = TemplateVars::new(unit.name(), symbol);
                RedactCodegen::new().generate(shape, &vars)
            })
            .with_context(|| format!("could not generate code for `{}`", symbol.path()))?;

        let artifact = info_span!("stage", stage = %Stage::Write)
            .in_scope(|| OutputWriter::new(&self.config.working_dir).write(&symbol.name, &code))
            .with_context(|| format!("could not write code for `{}`", symbol.path()))?;

        RustFormatter::new(self.config.formatter.clone())
            .with_edition(unit.target.edition.clone())
            .format(artifact.path(), deadline)
            .instrument(info_span!("stage", stage = %Stage::Format))
            .await
            .with_context(|| format!("could not format {}", artifact.path().display()))?;

        info!(
            "generated {} for `{}`",
            artifact.path().display(),
            symbol.path()
        );
        Ok(artifact)
    }

    /// Load the unit on a blocking task, bounded by the run deadline
    async fn load_unit(&self, deadline: Instant) -> Result<CompilationUnit, ResolveError> {
        let loader = Arc::clone(&self.loader);
        let dispatch = self.dispatch.clone();
        let task = tokio::task::spawn_blocking(move || {
            tracing::dispatcher::with_default(&dispatch, || loader.load())
        });

        match tokio::time::timeout_at(deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(ResolveError::Internal(join_error.to_string())),
            Err(_) => Err(ResolveError::Timeout(self.config.deadline)),
        }
    }
}
