//! Process creation. Only Windows has a real implementation; elsewhere the
//! spawner reports the platform as unsupported.

use std::io;

use crate::command::LaunchPlan;

/// Starts a planned process and returns its pid. Implementations must not
/// wait for the child or capture its output.
pub trait ProcessSpawner: Send + Sync {
    fn spawn(&self, plan: &LaunchPlan) -> io::Result<u32>;
}

/// Spawner backed by the operating system.
pub struct OsSpawner {
    #[cfg(windows)]
    job: Option<job::KillOnCloseJob>,
}

impl OsSpawner {
    #[cfg(windows)]
    pub fn new() -> Self {
        let job = match job::KillOnCloseJob::create() {
            Ok(job) => Some(job),
            Err(err) => {
                tracing::warn!(error = %err, "attached children will outlive the server");
                None
            }
        };
        Self { job }
    }

    #[cfg(not(windows))]
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for OsSpawner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(windows)]
impl ProcessSpawner for OsSpawner {
    fn spawn(&self, plan: &LaunchPlan) -> io::Result<u32> {
        use std::os::windows::process::CommandExt;
        use std::process::{Command, Stdio};

        const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;

        let mut cmd = Command::new(&plan.program);
        if plan.via_interpreter {
            for arg in &plan.args {
                cmd.raw_arg(arg);
            }
        } else {
            cmd.args(&plan.args);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if plan.detached {
            cmd.creation_flags(CREATE_NEW_CONSOLE | CREATE_NEW_PROCESS_GROUP);
        } else {
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let child = cmd.spawn()?;
        let pid = child.id();
        if !plan.detached {
            if let Some(job) = &self.job {
                if let Err(err) = job.assign(&child) {
                    tracing::warn!(pid, error = %err, "could not tie child to server lifetime");
                }
            }
        }
        Ok(pid)
    }
}

#[cfg(not(windows))]
impl ProcessSpawner for OsSpawner {
    fn spawn(&self, _plan: &LaunchPlan) -> io::Result<u32> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "process launch is only implemented for Windows",
        ))
    }
}

#[cfg(windows)]
mod job {
    use std::io;
    use std::os::windows::io::AsRawHandle;
    use std::process::Child;

    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::System::JobObjects::{
        AssignProcessToJobObject, CreateJobObjectW, JobObjectExtendedLimitInformation,
        SetInformationJobObject, JOBOBJECT_EXTENDED_LIMIT_INFORMATION,
        JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE,
    };

    /// Job object whose members die when the last handle closes, which
    /// happens when the server process exits.
    pub(super) struct KillOnCloseJob(HANDLE);

    // The handle is only passed to thread-safe kernel calls.
    unsafe impl Send for KillOnCloseJob {}
    unsafe impl Sync for KillOnCloseJob {}

    impl KillOnCloseJob {
        pub(super) fn create() -> io::Result<Self> {
            unsafe {
                let handle = CreateJobObjectW(None, PCWSTR::null()).map_err(to_io)?;
                let job = Self(handle);
                let mut info = JOBOBJECT_EXTENDED_LIMIT_INFORMATION::default();
                info.BasicLimitInformation.LimitFlags = JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE;
                SetInformationJobObject(
                    job.0,
                    JobObjectExtendedLimitInformation,
                    &info as *const _ as *const core::ffi::c_void,
                    std::mem::size_of::<JOBOBJECT_EXTENDED_LIMIT_INFORMATION>() as u32,
                )
                .map_err(to_io)?;
                Ok(job)
            }
        }

        pub(super) fn assign(&self, child: &Child) -> io::Result<()> {
            let process = HANDLE(child.as_raw_handle());
            unsafe { AssignProcessToJobObject(self.0, process).map_err(to_io) }
        }
    }

    impl Drop for KillOnCloseJob {
        fn drop(&mut self) {
            unsafe {
                let _ = CloseHandle(self.0);
            }
        }
    }

    fn to_io(err: windows::core::Error) -> io::Error {
        io::Error::other(err.message())
    }
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn os_spawner_is_unsupported_off_windows() {
        let plan = LaunchPlan {
            program: PathBuf::from("/bin/true"),
            args: Vec::new(),
            via_interpreter: false,
            detached: true,
        };
        let err = OsSpawner::new().spawn(&plan).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
