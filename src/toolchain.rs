//! Structured Maven, javac and java invocations.
//!
//! Everything here only builds [`Invocation`]s; nothing is executed. Values such as program arguments are kept as
//! single list elements so a multi-word value is never re-split by a shell.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::{ArgsMode, AutomationConfig};
use crate::process::Invocation;

/// Platform classpath separator.
pub const CLASSPATH_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// How the injected-code generator is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeneratorMode {
    #[default]
    Normal,
    /// Generated support code behaves for regression runs (passes the configured test flag).
    Test,
}

/// Invocation factory for the external tools.
#[derive(Debug, Clone)]
pub struct Toolchain {
    mvn: String,
    javac: String,
    java: String,
    plugin_name: String,
    generator_test_flag: String,
    args_mode: ArgsMode,
}

impl Toolchain {
    pub fn from_config(config: &AutomationConfig) -> Self {
        Self {
            mvn: config.tools.mvn.clone(),
            javac: config.tools.javac.clone(),
            java: config.tools.java.clone(),
            plugin_name: config.plugin_name.clone(),
            generator_test_flag: config.generator_test_flag.clone(),
            args_mode: config.args_mode,
        }
    }

    /// `mvn -f <dir>/pom.xml clean:clean compiler:compile [resources:copy-resources]`
    pub fn maven_compile(&self, project_dir: &Path, copy_resources: bool) -> Invocation {
        let inv = Invocation::new(&self.mvn)
            .arg("-f")
            .arg(project_dir.join("pom.xml"))
            .args(["clean:clean", "compiler:compile"]);
        if copy_resources {
            inv.arg("resources:copy-resources")
        } else {
            inv
        }
    }

    /// `mvn -f <dir> exec:java`, plus the test flag in [`GeneratorMode::Test`].
    pub fn maven_exec(&self, project_dir: &Path, mode: GeneratorMode) -> Invocation {
        let inv = Invocation::new(&self.mvn).arg("-f").arg(project_dir).arg("exec:java");
        match mode {
            GeneratorMode::Normal => inv,
            GeneratorMode::Test => inv.arg(&self.generator_test_flag),
        }
    }

    /// `javac -g -d <out> <sources>`
    pub fn javac_raw(&self, out_dir: &Path, sources: &[PathBuf]) -> Invocation {
        Invocation::new(&self.javac)
            .arg("-g")
            .arg("-d")
            .arg(out_dir)
            .args(sources.iter().map(|s| s.as_os_str().to_owned()))
    }

    /// `javac -g -cp <plugin><sep><out> -Xplugin:<name> -d <out> <sources>`
    ///
    /// The output directory is on the classpath because the support classes are installed there beforehand.
    pub fn javac_instrumented(&self, plugin_classes: &Path, out_dir: &Path, sources: &[PathBuf]) -> Invocation {
        Invocation::new(&self.javac)
            .arg("-g")
            .arg("-cp")
            .arg(join_classpath(&[plugin_classes, out_dir]))
            .arg(format!("-Xplugin:{}", self.plugin_name))
            .arg("-d")
            .arg(out_dir)
            .args(sources.iter().map(|s| s.as_os_str().to_owned()))
    }

    /// `java -cp <classpath> <main> [args]`
    ///
    /// With [`ArgsMode::Single`] a present argument string is always passed as exactly one argument, even when
    /// empty.
    pub fn java(&self, classpath: &Path, main_class: &str, args: Option<&str>) -> Invocation {
        let inv = Invocation::new(&self.java).arg("-cp").arg(classpath).arg(main_class);
        match (args, self.args_mode) {
            (None, _) => inv,
            (Some(args), ArgsMode::Single) => inv.arg(args),
            (Some(args), ArgsMode::Whitespace) => inv.args(args.split_whitespace()),
        }
    }
}

pub fn join_classpath(entries: &[&Path]) -> OsString {
    let mut out = OsString::new();
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push(CLASSPATH_SEPARATOR);
        }
        out.push(entry.as_os_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolchain() -> Toolchain {
        Toolchain::from_config(&AutomationConfig::default())
    }

    fn args_of(inv: &Invocation) -> Vec<String> {
        inv.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_plugin_build_copies_resources() {
        let inv = toolchain().maven_compile(Path::new("jumbotrace-plugin"), true);
        assert_eq!(inv.program_name(), "mvn");
        let pom = Path::new("jumbotrace-plugin").join("pom.xml").to_string_lossy().into_owned();
        assert_eq!(
            args_of(&inv),
            vec!["-f", pom.as_str(), "clean:clean", "compiler:compile", "resources:copy-resources"]
        );
    }

    #[test]
    fn test_generator_test_mode_adds_flag() {
        let tc = toolchain();
        let normal = tc.maven_exec(Path::new("gen"), GeneratorMode::Normal);
        let test = tc.maven_exec(Path::new("gen"), GeneratorMode::Test);
        assert!(!normal.has_arg("-Djumbotrace.testmode=true"));
        assert!(test.has_arg("-Djumbotrace.testmode=true"));
        assert_eq!(args_of(&normal), vec!["-f", "gen", "exec:java"]);
    }

    #[test]
    fn test_raw_compile_has_no_plugin() {
        let inv = toolchain().javac_raw(Path::new("out"), &[PathBuf::from("Main.java")]);
        assert_eq!(args_of(&inv), vec!["-g", "-d", "out", "Main.java"]);
        assert!(!inv.args.iter().any(|a| a.to_string_lossy().starts_with("-Xplugin")));
    }

    #[test]
    fn test_instrumented_compile_enables_plugin() {
        let inv = toolchain().javac_instrumented(
            Path::new("plugin/classes"),
            Path::new("out"),
            &[PathBuf::from("A.java"), PathBuf::from("B.java")],
        );
        let cp = format!("plugin/classes{}out", CLASSPATH_SEPARATOR);
        assert_eq!(
            args_of(&inv),
            vec!["-g", "-cp", cp.as_str(), "-Xplugin:JumboTrace", "-d", "out", "A.java", "B.java"]
        );
    }

    #[test]
    fn test_single_args_mode_keeps_one_token() {
        let inv = toolchain().java(Path::new("out"), "com.x.Main", Some("a b  c"));
        assert_eq!(args_of(&inv), vec!["-cp", "out", "com.x.Main", "a b  c"]);
    }

    #[test]
    fn test_single_args_mode_passes_empty_token() {
        let inv = toolchain().java(Path::new("out"), "Main", Some(""));
        assert_eq!(args_of(&inv), vec!["-cp", "out", "Main", ""]);
    }

    #[test]
    fn test_whitespace_args_mode_splits() {
        let config = AutomationConfig::default().with_args_mode(ArgsMode::Whitespace);
        let inv = Toolchain::from_config(&config).java(Path::new("out"), "Main", Some("a b  c"));
        assert_eq!(args_of(&inv), vec!["-cp", "out", "Main", "a", "b", "c"]);
    }

    #[test]
    fn test_no_args_adds_nothing_after_main() {
        let inv = toolchain().java(Path::new("out"), "Main", None);
        assert_eq!(args_of(&inv), vec!["-cp", "out", "Main"]);
    }
}
