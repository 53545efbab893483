/// Shell command resolved at accept time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub command: String,
}

impl LaunchRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaunchError {
    #[error("empty command")]
    EmptyCommand,
    #[error("failed to spawn launcher process for '{command}': {message}")]
    Spawn { command: String, message: String },
    #[error("launcher process for '{command}' exited with {status}")]
    IntermediateFailed { command: String, status: String },
}

/// Picks what to run: typed text first, then the first match, else nothing.
pub fn resolve_launch(input: &str, matches: &[&str]) -> Option<LaunchRequest> {
    if !input.is_empty() {
        return Some(LaunchRequest::new(input));
    }

    matches
        .first()
        .filter(|name| !name.is_empty())
        .map(|name| LaunchRequest::new(*name))
}

/// Seam between the session controller and process creation.
pub trait CommandLauncher {
    fn spawn_detached(&mut self, command: &str) -> Result<(), LaunchError>;
}

/// Runs commands through the system shell, detached from this process.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedLauncher;

impl CommandLauncher for DetachedLauncher {
    fn spawn_detached(&mut self, command: &str) -> Result<(), LaunchError> {
        spawn_detached(command)
    }
}

/// Starts `command` under the shell so that it outlives the launcher.
///
/// On unix this is a double fork: the intermediate child forks the
/// grandchild and exits at once, the grandchild starts a new session and
/// execs `/bin/sh -c command`. Only the intermediate is waited on, so the
/// call returns as soon as the command has been started and no child of ours
/// is left unreaped. The command itself is re-parented to init.
pub fn spawn_detached(command: &str) -> Result<(), LaunchError> {
    if command.is_empty() {
        return Err(LaunchError::EmptyCommand);
    }

    platform::spawn_detached(command)
}

#[cfg(unix)]
mod platform {
    use super::*;
    use std::ffi::{CStr, CString};
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    const SHELL: &CStr = c"/bin/sh";
    const SHELL_FLAG: &CStr = c"-c";
    const DEV_NULL: &CStr = c"/dev/null";

    pub(super) fn spawn_detached(command: &str) -> Result<(), LaunchError> {
        run_intermediate(command).map(|_| ())
    }

    /// Returns the pid of the intermediate process, which has been reaped by
    /// the time this returns.
    pub(super) fn run_intermediate(command: &str) -> Result<libc::pid_t, LaunchError> {
        let script = CString::new(command).map_err(|_| LaunchError::Spawn {
            command: command.to_string(),
            message: "command contains a NUL byte".to_string(),
        })?;
        // Everything the forked children touch is prepared before fork.
        let argv = [
            SHELL.as_ptr(),
            SHELL_FLAG.as_ptr(),
            script.as_ptr(),
            std::ptr::null(),
        ];
        let mut empty_mask = std::mem::MaybeUninit::<libc::sigset_t>::uninit();
        // SAFETY: sigemptyset initialises the set it is given.
        let empty_mask = unsafe {
            libc::sigemptyset(empty_mask.as_mut_ptr());
            empty_mask.assume_init()
        };

        // SAFETY: the child branch only makes async-signal-safe calls and
        // never returns.
        match unsafe { libc::fork() } {
            -1 => Err(LaunchError::Spawn {
                command: command.to_string(),
                message: std::io::Error::last_os_error().to_string(),
            }),
            0 => unsafe { intermediate(&argv, &empty_mask) },
            pid => reap(command, pid).map(|()| pid),
        }
    }

    /// Body of the intermediate child. Forks the command's process and exits.
    unsafe fn intermediate(argv: &[*const libc::c_char; 4], empty_mask: &libc::sigset_t) -> ! {
        match libc::fork() {
            -1 => libc::_exit(1),
            0 => {}
            _ => libc::_exit(0),
        }

        libc::setsid();

        let devnull = libc::open(DEV_NULL.as_ptr(), libc::O_RDWR);
        if devnull != -1 {
            libc::dup2(devnull, libc::STDIN_FILENO);
            libc::dup2(devnull, libc::STDOUT_FILENO);
            libc::dup2(devnull, libc::STDERR_FILENO);
            if devnull > libc::STDERR_FILENO {
                libc::close(devnull);
            }
        }

        // The Rust runtime ignores SIGPIPE; the command starts with defaults.
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        libc::sigprocmask(libc::SIG_SETMASK, empty_mask, std::ptr::null_mut());

        libc::execv(SHELL.as_ptr(), argv.as_ptr());
        libc::_exit(127)
    }

    fn reap(command: &str, pid: libc::pid_t) -> Result<(), LaunchError> {
        let mut raw_status = 0;
        loop {
            // SAFETY: pid is our own child and raw_status outlives the call.
            if unsafe { libc::waitpid(pid, &mut raw_status, 0) } == pid {
                break;
            }
            let error = std::io::Error::last_os_error();
            if error.kind() != std::io::ErrorKind::Interrupted {
                return Err(LaunchError::Spawn {
                    command: command.to_string(),
                    message: format!("wait failed: {error}"),
                });
            }
        }

        let status = ExitStatus::from_raw(raw_status);
        if !status.success() {
            return Err(LaunchError::IntermediateFailed {
                command: command.to_string(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(windows)]
mod platform {
    use super::*;
    use std::os::windows::process::CommandExt;
    use std::process::{Command, Stdio};
    use windows_sys::Win32::System::Threading::{CREATE_NEW_PROCESS_GROUP, DETACHED_PROCESS};

    pub(super) fn spawn_detached(command: &str) -> Result<(), LaunchError> {
        // Dropping the child closes its handle; Windows keeps no zombie entry.
        Command::new("cmd")
            .arg("/C")
            .raw_arg(command)
            .creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
            .map_err(|error| LaunchError::Spawn {
                command: command.to_string(),
                message: error.to_string(),
            })
    }
}
