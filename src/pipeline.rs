//! Build steps for the instrumentation artifacts.
//!
//! ## Stages
//!
//! 1. The javac plugin (`compile_plugin`)
//! 2. The injected-code generator (`compile_generator`, `run_generator`)
//! 3. The generated support code (`compile_support`, which runs the generator first)
//!
//! `ensure_instrumentation` runs every stage an instrumented compile depends on. Under
//! [`RebuildPolicy::OnChange`] a stage is skipped when its source trees fingerprint the same as right after its last
//! successful build in this process.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{AutomationConfig, RebuildPolicy};
use crate::console;
use crate::error::AutomationError;
use crate::fingerprint::{Fingerprint, fingerprint_trees};
use crate::process::ProcessRunner;
use crate::steps::{StepOutput, run_checked};
use crate::toolchain::{GeneratorMode, Toolchain};

pub const STEP_COMPILE_PLUGIN: &str = "compiling javac plugin";
pub const STEP_COMPILE_GENERATOR: &str = "compiling injectedgen";
pub const STEP_RUN_GENERATOR: &str = "running injectedgen";
pub const STEP_COMPILE_SUPPORT: &str = "compiling injected code";

/// Package root of the generated support classes.
const SUPPORT_PACKAGE_DIR: &str = "com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Stage {
    Plugin,
    Support(GeneratorMode),
}

/// Orchestrates the plugin, generator and support-code builds.
pub struct ArtifactPipeline<'a> {
    config: &'a AutomationConfig,
    toolchain: Toolchain,
    runner: &'a dyn ProcessRunner,
    built: RefCell<HashMap<Stage, Fingerprint>>,
}

impl<'a> ArtifactPipeline<'a> {
    pub fn new(config: &'a AutomationConfig, runner: &'a dyn ProcessRunner) -> Self {
        Self {
            config,
            toolchain: Toolchain::from_config(config),
            runner,
            built: RefCell::new(HashMap::new()),
        }
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Compiled plugin classes, put on the classpath of instrumented compiles.
    pub fn plugin_classes(&self) -> PathBuf {
        self.config.plugin_root().join("target").join("classes")
    }

    /// Compiled support classes produced by `compile_support`.
    pub fn support_classes(&self) -> PathBuf {
        self.config.injected_root().join("target").join("classes")
    }

    pub fn compile_plugin(&self, output: &StepOutput) -> Result<(), AutomationError> {
        let inv = self.toolchain.maven_compile(&self.config.plugin_root(), true);
        run_checked(self.runner, STEP_COMPILE_PLUGIN, &inv, output)?;
        Ok(())
    }

    pub fn compile_generator(&self, output: &StepOutput) -> Result<(), AutomationError> {
        let inv = self.toolchain.maven_compile(&self.config.injectedgen_root(), false);
        run_checked(self.runner, STEP_COMPILE_GENERATOR, &inv, output)?;
        Ok(())
    }

    /// Build the generator, then execute it.
    pub fn run_generator(&self, mode: GeneratorMode, output: &StepOutput) -> Result<(), AutomationError> {
        self.compile_generator(output)?;
        let inv = self.toolchain.maven_exec(&self.config.injectedgen_root(), mode);
        run_checked(self.runner, STEP_RUN_GENERATOR, &inv, output)?;
        Ok(())
    }

    /// Regenerate and build the support code.
    pub fn compile_support(&self, mode: GeneratorMode, output: &StepOutput) -> Result<(), AutomationError> {
        self.run_generator(mode, output)?;
        let inv = self.toolchain.maven_compile(&self.config.injected_root(), false);
        run_checked(self.runner, STEP_COMPILE_SUPPORT, &inv, output)?;
        Ok(())
    }

    /// Make sure the plugin and the support code for `mode` are built.
    #[tracing::instrument(skip_all, fields(mode = ?mode))]
    pub fn ensure_instrumentation(&self, mode: GeneratorMode, output: &StepOutput) -> Result<(), AutomationError> {
        let plugin_root = self.config.plugin_root();
        self.build_stage(Stage::Plugin, &[plugin_root.as_path()], || self.compile_plugin(output))?;

        let gen_root = self.config.injectedgen_root();
        let injected_root = self.config.injected_root();
        self.build_stage(Stage::Support(mode), &[gen_root.as_path(), injected_root.as_path()], || {
            self.compile_support(mode, output)
        })
    }

    fn build_stage(
        &self,
        stage: Stage,
        inputs: &[&Path],
        build: impl FnOnce() -> Result<(), AutomationError>,
    ) -> Result<(), AutomationError> {
        if self.config.rebuild == RebuildPolicy::OnChange {
            let current = fingerprint_trees(inputs)?;
            if self.built.borrow().get(&stage) == Some(&current) {
                tracing::debug!(?stage, fingerprint = %current.to_hex(), "stage up to date, skipping");
                return Ok(());
            }
        }

        // Forget the stage while it rebuilds so a failed build is retried next time.
        self.built.borrow_mut().remove(&stage);
        build()?;

        if self.config.rebuild == RebuildPolicy::OnChange {
            let after = fingerprint_trees(inputs)?;
            self.built.borrow_mut().insert(stage, after);
        }
        Ok(())
    }

    /// Merge-copy the compiled support classes into `<dest>/com`, overwriting existing files.
    pub fn install_support(&self, dest: &Path) -> Result<(), AutomationError> {
        let src = self.support_classes().join(SUPPORT_PACKAGE_DIR);
        let dst = dest.join(SUPPORT_PACKAGE_DIR);
        console::info(&format!("copying {} -> {}", src.display(), dst.display()));
        copy_tree(&src, &dst)
    }
}

/// Recursive copy that merges into an existing destination.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<(), AutomationError> {
    if !src.is_dir() {
        return Err(AutomationError::io(
            src,
            std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
        ));
    }
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| AutomationError::io(src, e.into()))?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| AutomationError::io(&target, e))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).map_err(|e| AutomationError::io(&target, e))?;
        }
    }
    Ok(())
}
