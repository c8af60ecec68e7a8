use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

// Not every test binary uses every helper
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub cache_dir: PathBuf,
    pub path_file: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cache_dir = temp_dir.path().join("tool-cache");
        let path_file = temp_dir.path().join("github_path");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_setup-fargate"));

        Self {
            _temp_dir: temp_dir,
            cache_dir,
            path_file,
            bin_path,
        }
    }

    /// Command with an isolated environment: no inherited runner
    /// variables, config file or cache.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        for var in [
            "GITHUB_ACTIONS",
            "GITHUB_PATH",
            "RUNNER_TOOL_CACHE",
            "RUNNER_TEMP",
            "INPUT_CLI-VERSION",
            "RUST_LOG",
        ] {
            cmd.env_remove(var);
        }
        cmd.env(
            "SETUP_FARGATE_CONFIG",
            self._temp_dir.path().join("config.json"),
        );
        cmd.env("SETUP_FARGATE_CACHE_DIR", &self.cache_dir);
        cmd.env("SETUP_FARGATE_TEMP_DIR", self._temp_dir.path().join("tmp"));
        cmd.env("SETUP_FARGATE_PROGRESS", "false");
        cmd.env("GITHUB_PATH", &self.path_file);
        cmd
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert_eq!(
            self.status.code(),
            Some(1),
            "Expected exit code 1\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
