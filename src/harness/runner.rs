//! The execution oracle: compile and run an emitted program, observe the
//! path it reports.
//!
//! The core never invokes toolchains itself; it goes through
//! [`ProgramRunner`]. [`CommandRunner`] is the child-process implementation
//! (wat2wasm + a Node host for WebAssembly, a Node WebGPU host for WGSL,
//! shadertrap for GLSL), each invocation bounded by a timeout. Timeout,
//! non-zero exit, and path mismatch are distinct failure kinds.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::emit::SourceProgram;
use crate::error::RunFailure;
use crate::lang::{CodeType, Language};

/// One execution request: the persisted program plus the directions driving
/// this run.
#[derive(Debug)]
pub struct RunRequest<'a> {
    /// The emitted program.
    pub program: &'a SourceProgram,
    /// Where the program (or its shader test) was persisted.
    pub source_path: &'a Path,
    /// The directions vector for this run. Empty for header-guard programs.
    pub directions: &'a [u32],
}

/// What a runner observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The program ran and reported this block sequence.
    ObservedPath(Vec<u32>),
    /// The runner asserted path equality itself (shadertrap).
    Verified,
    /// Compilation, execution, or comparison failed.
    Failed(RunFailure),
}

/// Compile-and-execute oracle for emitted programs.
pub trait ProgramRunner {
    /// Run the program and observe its reported path.
    fn run(&self, request: &RunRequest<'_>) -> RunOutcome;
}

/// Child-process runner configuration.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    /// Per-invocation timeout.
    pub timeout: Duration,
    /// Node script hosting WebAssembly modules.
    pub wasm_host: PathBuf,
    /// Node script hosting WGSL compute shaders.
    pub wgsl_host: PathBuf,
    /// The shadertrap binary for GLSL shader tests.
    pub shadertrap: PathBuf,
    /// Optional `wasm-opt` level (WebAssembly only).
    pub opt_level: Option<String>,
}

impl CommandRunner {
    /// A runner with conventional tool names resolved through `PATH`.
    #[must_use]
    pub fn new(timeout: Duration, opt_level: Option<String>) -> Self {
        CommandRunner {
            timeout,
            wasm_host: PathBuf::from("run-wasm.js"),
            wgsl_host: PathBuf::from("run-wgsl.js"),
            shadertrap: PathBuf::from("shadertrap"),
            opt_level,
        }
    }
}

impl ProgramRunner for CommandRunner {
    fn run(&self, request: &RunRequest<'_>) -> RunOutcome {
        match request.program.language {
            Language::Wasm => self.run_wasm(request),
            Language::Wgsl => self.run_wgsl(request),
            Language::Glsl => self.run_glsl(request),
        }
    }
}

impl CommandRunner {
    fn run_wasm(&self, request: &RunRequest<'_>) -> RunOutcome {
        let wasm_path = request.source_path.with_extension("wasm");

        let mut compile = Command::new("wat2wasm");
        compile
            .arg("--enable-multi-memory")
            .arg(request.source_path)
            .arg("-o")
            .arg(&wasm_path);
        match self.invoke(compile) {
            Ok(output) if !output.success => {
                return RunOutcome::Failed(RunFailure::Compile {
                    detail: output.stderr,
                })
            }
            Ok(_) => {}
            Err(failure) => return RunOutcome::Failed(failure),
        }

        if let Some(level) = &self.opt_level {
            let mut optimise = Command::new("wasm-opt");
            optimise
                .arg("--enable-multimemory")
                .arg(&wasm_path)
                .arg(format!("-{level}"))
                .arg("-o")
                .arg(&wasm_path);
            match self.invoke(optimise) {
                Ok(output) if !output.success => {
                    return RunOutcome::Failed(RunFailure::Compile {
                        detail: output.stderr,
                    })
                }
                Ok(_) => {}
                Err(failure) => return RunOutcome::Failed(failure),
            }
        }

        let directions_arg = render_directions(request.directions);
        let mut host = Command::new("node");
        host.arg(&self.wasm_host).arg(&wasm_path).arg(directions_arg);
        match self.invoke(host) {
            Ok(output) if output.success => {
                RunOutcome::ObservedPath(parse_path_output(&output.stdout))
            }
            Ok(output) => RunOutcome::Failed(RunFailure::Runtime {
                detail: output.stderr,
            }),
            Err(failure) => RunOutcome::Failed(failure),
        }
    }

    fn run_wgsl(&self, request: &RunRequest<'_>) -> RunOutcome {
        let mut host = Command::new("node");
        host.arg(&self.wgsl_host).arg(request.source_path);
        if request.program.code_type == CodeType::GlobalArray {
            host.arg(render_directions(request.directions));
        }
        match self.invoke(host) {
            Ok(output) if output.success => {
                RunOutcome::ObservedPath(parse_path_output(&output.stdout))
            }
            Ok(output) => RunOutcome::Failed(RunFailure::Runtime {
                detail: output.stderr,
            }),
            Err(failure) => RunOutcome::Failed(failure),
        }
    }

    fn run_glsl(&self, request: &RunRequest<'_>) -> RunOutcome {
        // The shadertrap script embeds the buffers and asserts equality.
        let mut command = Command::new(&self.shadertrap);
        command.arg(request.source_path);
        match self.invoke(command) {
            Ok(output) if output.success => RunOutcome::Verified,
            Ok(output) => RunOutcome::Failed(RunFailure::Runtime {
                detail: output.stderr,
            }),
            Err(failure) => RunOutcome::Failed(failure),
        }
    }

    fn invoke(&self, mut command: Command) -> Result<InvocationOutput, RunFailure> {
        let description = format!("{command:?}");
        command.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|error| RunFailure::Compile {
            detail: format!("failed to spawn {description}: {error}"),
        })?;

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let mut stdout = String::new();
                    let mut stderr = String::new();
                    if let Some(mut pipe) = child.stdout.take() {
                        let _ = pipe.read_to_string(&mut stdout);
                    }
                    if let Some(mut pipe) = child.stderr.take() {
                        let _ = pipe.read_to_string(&mut stderr);
                    }
                    return Ok(InvocationOutput {
                        success: status.success(),
                        stdout,
                        stderr,
                    });
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(RunFailure::Timeout {
                            command: description,
                            timeout_secs: self.timeout.as_secs(),
                        });
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(error) => {
                    return Err(RunFailure::Runtime {
                        detail: format!("failed to wait on {description}: {error}"),
                    })
                }
            }
        }
    }
}

#[derive(Debug)]
struct InvocationOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

/// Directions rendered the way the host scripts expect them: `[1, 0, 2]`.
fn render_directions(directions: &[u32]) -> String {
    let rendered: Vec<String> = directions.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(", "))
}

/// Extract the reported path from host output: every integer in order,
/// ignoring any other text.
fn parse_path_output(output: &str) -> Vec<u32> {
    let mut path = Vec::new();
    let mut current = String::new();
    for character in output.chars() {
        if character.is_ascii_digit() {
            current.push(character);
        } else if !current.is_empty() {
            if let Ok(value) = current.parse() {
                path.push(value);
            }
            current.clear();
        }
    }
    if !current.is_empty() {
        if let Ok(value) = current.parse() {
            path.push(value);
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_output_parsing_ignores_noise() {
        assert_eq!(parse_path_output("1,2,3"), vec![1, 2, 3]);
        assert_eq!(parse_path_output("path: [1, 12, 4]\n"), vec![1, 12, 4]);
        assert_eq!(parse_path_output("no numbers"), Vec::<u32>::new());
    }

    #[test]
    fn directions_render_as_a_bracketed_list() {
        assert_eq!(render_directions(&[1, 0, 2]), "[1, 0, 2]");
        assert_eq!(render_directions(&[]), "[]");
    }

    #[test]
    fn timeouts_kill_the_child() {
        let runner = CommandRunner {
            timeout: Duration::from_millis(50),
            ..CommandRunner::new(Duration::from_millis(50), None)
        };
        let mut command = Command::new("sleep");
        command.arg("5");
        let failure = runner.invoke(command).unwrap_err();
        assert!(matches!(failure, RunFailure::Timeout { .. }));
    }

    #[test]
    fn missing_binaries_surface_as_compile_failures() {
        let runner = CommandRunner::new(Duration::from_secs(1), None);
        let command = Command::new("definitely-not-a-real-binary-name");
        let failure = runner.invoke(command).unwrap_err();
        assert!(matches!(failure, RunFailure::Compile { .. }));
    }
}
