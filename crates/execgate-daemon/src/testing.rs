//! Shared fixtures for the daemon's unit tests.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use execgate_core::identity::hash_token;
use execgate_core::{AccountConfig, AccountDirectory, PolicySettings, SettingsProvider, Snapshot};
use runner::command::LaunchPlan;
use runner::resolve::canonical_root;
use runner::spawn::ProcessSpawner;
use runner::Runner;
use tracing_subscriber::EnvFilter;

use crate::service::ExecService;

pub const ADMIN_TOKEN: &str = "admin-secret";
pub const OPERATOR_TOKEN: &str = "operator-secret";
pub const GUEST_TOKEN: &str = "guest-secret";

#[derive(Clone, Default)]
pub struct RecordingSpawner {
    plans: Arc<Mutex<Vec<LaunchPlan>>>,
    fail: bool,
}

impl ProcessSpawner for RecordingSpawner {
    fn spawn(&self, plan: &LaunchPlan) -> io::Result<u32> {
        self.plans.lock().unwrap().push(plan.clone());
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "access is denied"));
        }
        Ok(4242)
    }
}

/// Settings that tests can change between calls. Counts snapshots taken.
#[derive(Clone)]
pub struct SharedSettings {
    policy: Arc<Mutex<PolicySettings>>,
    reads: Arc<AtomicUsize>,
}

impl SettingsProvider for SharedSettings {
    fn snapshot(&self) -> anyhow::Result<Snapshot> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(Snapshot {
            policy: self.policy.lock().unwrap().clone(),
            oracle: Arc::new(Fixture::directory()),
        })
    }
}

struct BrokenSettings;

impl SettingsProvider for BrokenSettings {
    fn snapshot(&self) -> anyhow::Result<Snapshot> {
        Err(anyhow::anyhow!("config file is missing"))
    }
}

/// In-memory log sink for asserting on audit events.
#[derive(Clone, Default)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with only `execgate::audit` events recorded, as plain text.
pub fn capture_audit<T>(f: impl FnOnce() -> T) -> (T, String) {
    let sink = CaptureWriter::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("execgate::audit=info"))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8_lossy(&sink.0.lock().unwrap()).into_owned();
    (result, text)
}

pub struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    settings: SharedSettings,
    spawner: RecordingSpawner,
}

impl Fixture {
    pub fn new() -> Self {
        Self::build(false)
    }

    pub fn failing() -> Self {
        Self::build(true)
    }

    fn build(fail: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let base = canonical_root(dir.path());
        let root = base.join("scripts");
        fs::create_dir_all(&root).unwrap();
        for name in ["run.exe", "My Tool.exe", "nightly.bat", "a&b.bat"] {
            File::create(root.join(name)).unwrap();
        }
        File::create(base.join("secret.exe")).unwrap();

        let policy = PolicySettings {
            allowed_extensions: "exe|bat".to_string(),
            allowed_vfs_paths: "/scripts".to_string(),
            physical_path: root.clone(),
            ..PolicySettings::default()
        };
        Self {
            _dir: dir,
            root,
            settings: SharedSettings {
                policy: Arc::new(Mutex::new(policy)),
                reads: Arc::new(AtomicUsize::new(0)),
            },
            spawner: RecordingSpawner {
                fail,
                ..RecordingSpawner::default()
            },
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn directory() -> AccountDirectory {
        let account = |name: &str, admin: bool, belongs: &[&str], token: Option<&str>| AccountConfig {
            username: name.to_string(),
            admin,
            belongs: belongs.iter().map(|b| b.to_string()).collect(),
            token_sha256: token.map(hash_token),
        };
        AccountDirectory::new(vec![
            account("admin", true, &[], Some(ADMIN_TOKEN)),
            account("operator", false, &["ops"], Some(OPERATOR_TOKEN)),
            account("guest", false, &[], Some(GUEST_TOKEN)),
            account("ops", false, &[], None),
        ])
    }

    pub fn service(&self) -> ExecService {
        let runner = Runner::new(Box::new(self.spawner.clone()));
        ExecService::with_runner(Arc::new(self.settings.clone()), Some(runner))
    }

    pub fn service_with_broken_settings(&self) -> ExecService {
        let runner = Runner::new(Box::new(self.spawner.clone()));
        ExecService::with_runner(Arc::new(BrokenSettings), Some(runner))
    }

    pub fn disabled_service(&self) -> ExecService {
        ExecService::with_runner(Arc::new(self.settings.clone()), None)
    }

    pub fn update(&self, edit: impl FnOnce(&mut PolicySettings)) {
        edit(&mut self.settings.policy.lock().unwrap());
    }

    pub fn snapshots_taken(&self) -> usize {
        self.settings.reads.load(Ordering::SeqCst)
    }

    pub fn plans(&self) -> Vec<LaunchPlan> {
        self.spawner.plans.lock().unwrap().clone()
    }
}
