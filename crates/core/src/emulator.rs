//! Launch boundary towards the external emulator process.

use std::{
    fs::File,
    future::Future,
    io,
    path::{Path, PathBuf},
    process::Stdio,
};

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::{config::AppConfig, rom::Game};

/// Outcome of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status; `-1` when the process was killed by a signal.
    pub exit_code: i32,
    /// Everything written to standard output.
    pub stdout: String,
}

/// Runs external programs to completion.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and wait for it to exit.
    fn run(
        &self,
        program: &str,
        args: &[String],
    ) -> impl Future<Output = io::Result<CommandOutput>> + Send;
}

/// Spawns real processes through tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRunner;

impl CommandRunner for TokioRunner {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Reasons a game could not be played.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The ROM is not a regular file.
    #[error("rom file {0} not found")]
    RomFileNotFound(PathBuf),
    /// The ROM exists but cannot be opened.
    #[error("rom file {path} is not readable: {source}")]
    RomFileNotReadable {
        /// ROM location.
        path: PathBuf,
        /// Underlying failure.
        source: io::Error,
    },
    /// The ROM path lacks a stem or a parent directory.
    #[error("rom path {0} is not valid")]
    RomPathInvalid(PathBuf),
    /// The emulator ran and reported a failure.
    #[error("emulator exited with code {exit_code}")]
    EmulatorError {
        /// Exit status of the emulator.
        exit_code: i32,
    },
    /// The emulator could not be started.
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// Program that failed to start.
        program: String,
        /// Underlying failure.
        source: io::Error,
    },
}

/// Name and version reported by the emulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorInfo {
    /// Program name.
    pub name: String,
    /// Version string.
    pub version: String,
}

impl EmulatorInfo {
    /// Parse `"<name> <version>"` from the first line of `--version` output.
    pub fn parse(output: &str) -> Option<Self> {
        let (first_line, _) = output.split_once('\n')?;
        let (name, version) = first_line.trim_end_matches('\r').split_once(' ')?;
        Some(Self {
            name: name.to_string(),
            version: version.to_string(),
        })
    }
}

/// The emulator program and its fixed arguments.
#[derive(Debug, Clone)]
pub struct Emulator<R = TokioRunner> {
    program: String,
    base_args: Vec<String>,
    runner: R,
}

impl Emulator<TokioRunner> {
    /// Emulator configured by `config`, running real processes.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.emulator, &config.emulator_args, TokioRunner)
    }
}

impl<R: CommandRunner> Emulator<R> {
    /// Emulator `program` always invoked with the whitespace separated
    /// `base_args`.
    pub fn new(program: impl Into<String>, base_args: &str, runner: R) -> Self {
        Self {
            program: program.into(),
            base_args: base_args.split_whitespace().map(str::to_string).collect(),
            runner,
        }
    }

    /// Program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for playing `game`:
    /// `<base args> <control string> -dir_rom <parent> <stem>`.
    pub fn arguments(&self, game: &Game, control_string: &str) -> Result<Vec<String>, LaunchError> {
        let path = game.path();
        validate_rom(path)?;

        let (Some(parent), Some(stem)) = (
            path.parent().filter(|parent| !parent.as_os_str().is_empty()),
            path.file_stem(),
        ) else {
            return Err(LaunchError::RomPathInvalid(path.to_path_buf()));
        };

        let mut args = self.base_args.clone();
        args.extend(control_string.split_whitespace().map(str::to_string));
        args.push("-dir_rom".to_string());
        args.push(parent.to_string_lossy().into_owned());
        args.push(stem.to_string_lossy().into_owned());
        Ok(args)
    }

    /// Play `game` with the given input bindings and wait for the emulator
    /// to exit.
    pub async fn run(&self, game: &Game, control_string: &str) -> Result<CommandOutput, LaunchError> {
        let args = self.arguments(game, control_string)?;
        info!(r#"Launching "{game}": {} {}"#, self.program, args.join(" "));

        let output = self
            .runner
            .run(&self.program, &args)
            .await
            .map_err(|source| LaunchError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if output.exit_code != 0 {
            warn!(r#"Emulator exited with code {} while running "{game}""#, output.exit_code);
            return Err(LaunchError::EmulatorError {
                exit_code: output.exit_code,
            });
        }
        debug!(r#"Emulator session for "{game}" ended"#);
        Ok(output)
    }

    /// Query the emulator for its name and version; `None` when it is not
    /// available.
    pub async fn info(&self) -> Option<EmulatorInfo> {
        let output = match self.runner.run(&self.program, &["--version".to_string()]).await {
            Ok(output) => output,
            Err(err) => {
                debug!("Emulator {} could not be started: {err}", self.program);
                return None;
            }
        };
        if output.exit_code != 0 {
            return None;
        }
        EmulatorInfo::parse(&output.stdout)
    }
}

fn validate_rom(path: &Path) -> Result<(), LaunchError> {
    if !path.is_file() {
        return Err(LaunchError::RomFileNotFound(path.to_path_buf()));
    }
    File::open(path).map_err(|source| LaunchError::RomFileNotReadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::{RomInfo, RomMedia};
    use parking_lot::Mutex;
    use std::{fs, sync::Arc};
    use tempfile::tempdir;

    #[derive(Clone)]
    struct FakeRunner {
        output: Result<CommandOutput, io::ErrorKind>,
        calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    }

    impl FakeRunner {
        fn exiting(exit_code: i32, stdout: &str) -> Self {
            Self {
                output: Ok(CommandOutput {
                    exit_code,
                    stdout: stdout.to_string(),
                }),
                calls: Arc::default(),
            }
        }
    }

    impl CommandRunner for FakeRunner {
        async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
            self.calls.lock().push((program.to_string(), args.to_vec()));
            self.output.clone().map_err(io::Error::from)
        }
    }

    fn game(path: &Path) -> Game {
        Game::new(path, RomInfo::default(), RomMedia::default())
    }

    #[tokio::test]
    async fn run_builds_the_command_line() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let rom = dir.path().join("sf2.zip");
        fs::write(&rom, b"rom")?;

        let runner = FakeRunner::exiting(0, "");
        let emulator = Emulator::new("advmame", "-misc_quiet -nomisc_safequit", runner.clone());
        emulator
            .run(&game(&rom), "-input_map[p1_up] keyboard[0,w]")
            .await?;

        let calls = runner.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "advmame");
        assert_eq!(
            calls[0].1,
            vec![
                "-misc_quiet".to_string(),
                "-nomisc_safequit".to_string(),
                "-input_map[p1_up]".to_string(),
                "keyboard[0,w]".to_string(),
                "-dir_rom".to_string(),
                dir.path().display().to_string(),
                "sf2".to_string(),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_rom_is_not_launched() {
        let runner = FakeRunner::exiting(0, "");
        let emulator = Emulator::new("advmame", "", runner.clone());
        let result = emulator
            .run(&game(Path::new("/nonexistent/enea/sf2.zip")), "")
            .await;

        assert!(matches!(result, Err(LaunchError::RomFileNotFound(_))));
        assert!(runner.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn directories_are_not_roms() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let emulator = Emulator::new("advmame", "", FakeRunner::exiting(0, ""));
        assert!(matches!(
            emulator.arguments(&game(dir.path()), ""),
            Err(LaunchError::RomFileNotFound(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn non_zero_exit_is_an_emulator_error() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let rom = dir.path().join("mslug.zip");
        fs::write(&rom, b"rom")?;

        let emulator = Emulator::new("advmame", "", FakeRunner::exiting(2, ""));
        assert!(matches!(
            emulator.run(&game(&rom), "").await,
            Err(LaunchError::EmulatorError { exit_code: 2 })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn spawn_failures_are_launch_errors() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let rom = dir.path().join("mslug.zip");
        fs::write(&rom, b"rom")?;

        let runner = FakeRunner {
            output: Err(io::ErrorKind::NotFound),
            calls: Arc::default(),
        };
        let emulator = Emulator::new("advmame", "", runner);
        assert!(matches!(
            emulator.run(&game(&rom), "").await,
            Err(LaunchError::Launch { .. })
        ));
        assert!(emulator.info().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn info_parses_the_first_line() {
        let emulator = Emulator::new(
            "advmame",
            "",
            FakeRunner::exiting(0, "AdvanceMAME 3.9\nCompiled Jan 1 2020\n"),
        );
        assert_eq!(
            emulator.info().await,
            Some(EmulatorInfo {
                name: "AdvanceMAME".to_string(),
                version: "3.9".to_string()
            })
        );

        let failing = Emulator::new("advmame", "", FakeRunner::exiting(1, "AdvanceMAME 3.9\n"));
        assert!(failing.info().await.is_none());
    }

    #[test]
    fn version_output_needs_a_full_line_and_a_space() {
        assert!(EmulatorInfo::parse("AdvanceMAME 3.9").is_none());
        assert!(EmulatorInfo::parse("AdvanceMAME\n").is_none());
        assert_eq!(
            EmulatorInfo::parse("advmame v1.4 beta\r\n"),
            Some(EmulatorInfo {
                name: "advmame".to_string(),
                version: "v1.4 beta".to_string()
            })
        );
    }
}
