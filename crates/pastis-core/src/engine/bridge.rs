use super::error::EngineError;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Value of the `-w` flag passed to every native solver.
pub const WORKER_COUNT: u32 = 8;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Flags that differ between the two native command grammars.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandHyperparameters {
    /// `-d <adjacent> -c <chromosomes> -y 1`, values passed through verbatim.
    Mds {
        adjacent_beads: String,
        chromosomes: String,
    },
    /// `-d <adjacent> -c <chromosomes> -y 1 -a <alpha> -b <beta>`, reals with six decimals.
    Pm {
        adjacent_beads: f64,
        chromosomes: String,
        alpha: f64,
        beta: f64,
    },
}

/// Everything needed to run the native solver for one round.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverInvocation {
    pub binary: PathBuf,
    /// Output prefix; the solver writes `<output>.txt`.
    pub output: PathBuf,
    pub resolution: u64,
    pub organism_structure: PathBuf,
    pub wish_distances: PathBuf,
    pub hyperparameters: CommandHyperparameters,
    pub log: PathBuf,
    pub script: PathBuf,
}

impl SolverInvocation {
    /// Renders the shell command. The flag order is part of the native
    /// binaries' interface and must not change.
    pub fn command_line(&self) -> String {
        let head = format!(
            "{} -o {} -w {} -r {} -k {} -i {} ",
            self.binary.display(),
            self.output.display(),
            WORKER_COUNT,
            self.resolution,
            self.organism_structure.display(),
            self.wish_distances.display(),
        );
        match &self.hyperparameters {
            CommandHyperparameters::Mds {
                adjacent_beads,
                chromosomes,
            } => format!(
                "{}-d {} -c {} -y 1 > {}",
                head,
                adjacent_beads,
                chromosomes,
                self.log.display()
            ),
            CommandHyperparameters::Pm {
                adjacent_beads,
                chromosomes,
                alpha,
                beta,
            } => format!(
                "{}-d {:.6} -c {} -y 1 -a {:.6} -b {:.6} > {}",
                head,
                adjacent_beads,
                chromosomes,
                alpha,
                beta,
                self.log.display()
            ),
        }
    }
}

/// Writes the command line to `invocation.script` and marks it executable.
pub fn write_script(invocation: &SolverInvocation) -> Result<(), EngineError> {
    let io_error = |source| EngineError::Io {
        path: invocation.script.clone(),
        source,
    };
    fs::write(&invocation.script, invocation.command_line()).map_err(io_error)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = fs::metadata(&invocation.script)
            .map_err(io_error)?
            .permissions();
        permissions.set_mode(permissions.mode() | 0o100);
        fs::set_permissions(&invocation.script, permissions).map_err(io_error)?;
    }
    Ok(())
}

/// Result of one native solver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub log: PathBuf,
}

impl SolverOutcome {
    pub fn success(log: impl Into<PathBuf>) -> Self {
        Self {
            exit_code: Some(0),
            log: log.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs the native solver for a prepared invocation.
pub trait SolverLauncher {
    fn launch(&self, invocation: &SolverInvocation) -> Result<SolverOutcome, EngineError>;
}

impl<F> SolverLauncher for F
where
    F: Fn(&SolverInvocation) -> Result<SolverOutcome, EngineError>,
{
    fn launch(&self, invocation: &SolverInvocation) -> Result<SolverOutcome, EngineError> {
        self(invocation)
    }
}

/// Executes the generated script with `sh`, blocking until it exits.
///
/// The script redirects the solver's stdout to the log; stderr of the whole
/// run is appended to the same file. With a timeout the script runs in its
/// own process group, and the whole group is killed when the limit expires.
#[derive(Debug, Clone, Default)]
pub struct ScriptLauncher {
    timeout: Option<Duration>,
}

impl ScriptLauncher {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn wait(&self, child: &mut Child, log: &Path) -> Result<ExitStatus, EngineError> {
        let io_error = |source| EngineError::Io {
            path: log.to_path_buf(),
            source,
        };
        let Some(limit) = self.timeout else {
            return child.wait().map_err(io_error);
        };

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(io_error)? {
                return Ok(status);
            }
            if started.elapsed() >= limit {
                kill_process_group(child);
                return Err(EngineError::SolverTimeout {
                    timeout: limit,
                    log: log.to_path_buf(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Kills the script together with every process it started.
fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: `kill` has no memory-safety preconditions. The child was
        // spawned as the leader of its own group, so `-pgid` names only it
        // and its descendants.
        let result = unsafe { libc::kill(-pgid, libc::SIGKILL) };
        if result != 0 {
            warn!(
                error = %std::io::Error::last_os_error(),
                "Failed to signal the solver process group."
            );
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

impl SolverLauncher for ScriptLauncher {
    #[instrument(skip_all, name = "native_solver", fields(script = %invocation.script.display()))]
    fn launch(&self, invocation: &SolverInvocation) -> Result<SolverOutcome, EngineError> {
        let io_error = |source| EngineError::Io {
            path: invocation.log.clone(),
            source,
        };
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&invocation.log)
            .map_err(io_error)?;
        let log_for_stdout = log.try_clone().map_err(io_error)?;

        info!("Launching native solver.");
        debug!(command = %invocation.command_line());
        let mut command = Command::new("sh");
        command
            .arg(&invocation.script)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_for_stdout))
            .stderr(Stdio::from(log));
        #[cfg(unix)]
        if self.timeout.is_some() {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut child = command
            .spawn()
            .map_err(|source| EngineError::Io {
                path: invocation.script.clone(),
                source,
            })?;

        let status = self.wait(&mut child, &invocation.log)?;
        debug!(?status, "Native solver exited.");
        Ok(SolverOutcome {
            exit_code: status.code(),
            log: invocation.log.clone(),
        })
    }
}
