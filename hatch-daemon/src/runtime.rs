use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::time::{Instant, MissedTickBehavior};

use hatch_core::config::HatchConfig;
use hatch_core::event::DispatchEvent;
use hatch_pipeline::{Dispatcher, Publisher};

use crate::error::{io_err, DaemonError};
use crate::ledger::{self, Ledger};
use crate::paths::{
    dispatch_dir, failed_dir, inbox_dir, processed_dir, socket_path, DEBOUNCE_WINDOW,
};
use crate::protocol::{reports_failed_run, DaemonRequest, DaemonResponse};

/// Handlers driven by the processor task. Owned by exactly one writer.
pub struct Services {
    pub dispatcher: Dispatcher,
    pub publisher: Publisher,
    pub state_dir: PathBuf,
}

impl Services {
    pub fn from_config(config: &HatchConfig, state_dir: &Path) -> Result<Self, DaemonError> {
        Ok(Self {
            dispatcher: Dispatcher::from_config(config, state_dir)?,
            publisher: Publisher::from_config(config, state_dir)?,
            state_dir: state_dir.to_path_buf(),
        })
    }
}

enum JobKind {
    Dispatch(DispatchEvent),
    Release { force: bool },
}

impl JobKind {
    fn label(&self) -> &'static str {
        match self {
            JobKind::Dispatch(_) => "dispatch",
            JobKind::Release { .. } => "release",
        }
    }
}

struct Job {
    kind: JobKind,
    source: &'static str,
    respond_to: oneshot::Sender<Result<Value, String>>,
}

/// Result of one processed job.
struct Processed {
    data: Value,
    duplicate: bool,
}

#[derive(Debug, Clone, Default)]
struct DaemonStats {
    jobs_processed: u64,
    duplicates: u64,
    failures: u64,
    ledger_entries: usize,
    last_job_at: Option<DateTime<Utc>>,
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(config: HatchConfig, state_dir: &Path) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config, state_dir.to_path_buf()))
}

/// Run the daemon runtime with collaborators built from `config`.
pub async fn run(config: HatchConfig, state_dir: PathBuf) -> Result<(), DaemonError> {
    ensure_runtime_dirs(&state_dir)?;
    let services = Services::from_config(&config, &state_dir)?;
    run_with(Arc::new(services), config.release.interval_secs).await
}

/// Run the daemon around prebuilt services. `release_interval_secs == 0`
/// disables the release scheduler.
pub async fn run_with(
    services: Arc<Services>,
    release_interval_secs: u64,
) -> Result<(), DaemonError> {
    let state_dir = services.state_dir.clone();
    ensure_runtime_dirs(&state_dir)?;

    let ledger = ledger::load_at(&state_dir)?;
    let stats = Arc::new(RwLock::new(DaemonStats {
        ledger_entries: ledger.len(),
        ..DaemonStats::default()
    }));
    let started_at = Utc::now();

    let (job_tx, job_rx) = mpsc::channel::<Job>(64);
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let processor_handle = {
        let shutdown = shutdown_tx.clone();
        let shutdown_rx = shutdown_tx.subscribe();
        let services = services.clone();
        let stats = stats.clone();
        tokio::spawn(async move {
            let result = processor_task(services, ledger, stats, job_rx, shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let shutdown_rx = shutdown_tx.subscribe();
        let services = services.clone();
        let stats = stats.clone();
        let job_tx = job_tx.clone();
        tokio::spawn(async move {
            let result = socket_server_task(
                services,
                stats,
                job_tx,
                shutdown.clone(),
                shutdown_rx,
                started_at,
            )
            .await;
            let _ = shutdown.send(());
            result
        })
    };

    let inbox_handle = {
        let shutdown = shutdown_tx.clone();
        let shutdown_rx = shutdown_tx.subscribe();
        let state_dir = state_dir.clone();
        let job_tx = job_tx.clone();
        tokio::spawn(async move {
            let result = inbox_task(state_dir, job_tx, shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let scheduler_handle = {
        let shutdown = shutdown_tx.clone();
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            let result = scheduler_task(job_tx, release_interval_secs, shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    tracing::info!(
        state_dir = %state_dir.display(),
        socket = %socket_path(&state_dir).display(),
        release_interval_secs,
        "dispatch daemon started"
    );

    let (processor_result, socket_result, inbox_result, scheduler_result, signal_result) = tokio::join!(
        processor_handle,
        socket_handle,
        inbox_handle,
        scheduler_handle,
        signal_handle
    );

    handle_join("processor", processor_result)?;
    handle_join("socket_server", socket_result)?;
    handle_join("inbox_watcher", inbox_result)?;
    handle_join("release_scheduler", scheduler_result)?;
    handle_join("signal_handler", signal_result)?;
    tracing::info!("dispatch daemon stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Processor (single writer)
// ---------------------------------------------------------------------------

async fn processor_task(
    services: Arc<Services>,
    mut ledger: Ledger,
    stats: Arc<RwLock<DaemonStats>>,
    mut job_rx: mpsc::Receiver<Job>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_job = job_rx.recv() => {
                let Some(job) = maybe_job else { break };
                let started = Instant::now();
                let label = job.kind.label();
                let source = job.source;

                let services = services.clone();
                let kind = job.kind;
                let (returned, result) = tokio::task::spawn_blocking(move || {
                    let result = process_job(&services, &mut ledger, kind);
                    (ledger, result)
                })
                .await
                .map_err(|err| DaemonError::Protocol(format!("job task join error: {err}")))?;
                ledger = returned;

                {
                    let mut stats = stats.write().await;
                    stats.last_job_at = Some(Utc::now());
                    stats.ledger_entries = ledger.len();
                    match &result {
                        Ok(processed) => {
                            stats.jobs_processed += 1;
                            if processed.duplicate {
                                stats.duplicates += 1;
                            }
                        }
                        Err(_) => stats.failures += 1,
                    }
                }

                let duration_ms = started.elapsed().as_millis() as u64;
                let outcome = match result {
                    Ok(processed) => {
                        tracing::info!(job = label, source, duration_ms, duplicate = processed.duplicate, "job finished");
                        Ok(processed.data)
                    }
                    Err(err) => {
                        tracing::error!(job = label, source, duration_ms, error = %err, "job failed");
                        Err(err.to_string())
                    }
                };
                let _ = job.respond_to.send(outcome);
            }
        }
    }

    Ok(())
}

fn process_job(
    services: &Services,
    ledger: &mut Ledger,
    kind: JobKind,
) -> Result<Processed, DaemonError> {
    match kind {
        JobKind::Dispatch(event) => dispatch_once(services, ledger, event),
        JobKind::Release { force } => {
            let outcome = services.publisher.maybe_release(force)?;
            Ok(Processed {
                data: serde_json::to_value(outcome)?,
                duplicate: false,
            })
        }
    }
}

/// Dispatch unless the event's idempotency key is already in the ledger.
fn dispatch_once(
    services: &Services,
    ledger: &mut Ledger,
    event: DispatchEvent,
) -> Result<Processed, DaemonError> {
    let inbound = event.into_inbound()?;
    let key = inbound.idempotency_key();

    if let Some(entry) = ledger.get(&key) {
        tracing::info!(%key, recorded_at = %entry.recorded_at, "duplicate dispatch acknowledged");
        return Ok(Processed {
            data: json!({
                "key": key,
                "duplicate": true,
                "status": entry.status,
                "recorded_at": entry.recorded_at,
            }),
            duplicate: true,
        });
    }

    let outcome = services.dispatcher.dispatch(&inbound)?;
    let status = outcome.status();
    ledger.record(key.clone(), status, Utc::now());
    if let Err(err) = ledger::save_at(&services.state_dir, ledger) {
        tracing::error!(%key, error = %err, "ledger save failed");
    }

    Ok(Processed {
        data: json!({
            "key": key,
            "duplicate": false,
            "status": status,
            "outcome": outcome,
        }),
        duplicate: false,
    })
}

async fn enqueue(
    job_tx: &mpsc::Sender<Job>,
    kind: JobKind,
    source: &'static str,
) -> Result<Value, DaemonError> {
    let (tx, rx) = oneshot::channel();
    job_tx
        .send(Job {
            kind,
            source,
            respond_to: tx,
        })
        .await
        .map_err(|_| DaemonError::ChannelClosed("job queue"))?;

    let outcome = rx
        .await
        .map_err(|_| DaemonError::ChannelClosed("job response"))?;
    outcome.map_err(DaemonError::Protocol)
}

// ---------------------------------------------------------------------------
// Socket server
// ---------------------------------------------------------------------------

async fn socket_server_task(
    services: Arc<Services>,
    stats: Arc<RwLock<DaemonStats>>,
    job_tx: mpsc::Sender<Job>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
    started_at: DateTime<Utc>,
) -> Result<(), DaemonError> {
    let socket = socket_path(&services.state_dir);
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let services = services.clone();
                let stats = stats.clone();
                let job_tx = job_tx.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_socket_client(
                        stream,
                        services,
                        stats,
                        job_tx,
                        shutdown_tx,
                        started_at,
                    ).await {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

async fn handle_socket_client(
    stream: UnixStream,
    services: Arc<Services>,
    stats: Arc<RwLock<DaemonStats>>,
    job_tx: mpsc::Sender<Job>,
    shutdown_tx: broadcast::Sender<()>,
    started_at: DateTime<Utc>,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_err("daemon socket read", e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request: DaemonRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &mut writer,
                    &DaemonResponse::error(format!("invalid request JSON: {err}")),
                )
                .await?;
                continue;
            }
        };

        let stopping = request.cmd == "stop";
        let response = match request.cmd.as_str() {
            "status" => {
                let payload = build_status_payload(services.clone(), stats.clone(), started_at).await;
                DaemonResponse::ok(payload)
            }
            "submit" => match request.event.map(serde_json::from_value::<DispatchEvent>) {
                None => DaemonResponse::error("submit requires an 'event' object"),
                Some(Err(err)) => DaemonResponse::error(format!("invalid dispatch event: {err}")),
                Some(Ok(event)) => {
                    match enqueue(&job_tx, JobKind::Dispatch(event), "socket").await {
                        Ok(data) => DaemonResponse::ok(data),
                        Err(err) => DaemonResponse::error(err.to_string()),
                    }
                }
            },
            "release" => {
                let force = request.force.unwrap_or(false);
                match enqueue(&job_tx, JobKind::Release { force }, "socket").await {
                    Ok(data) => DaemonResponse::ok(data),
                    Err(err) => DaemonResponse::error(err.to_string()),
                }
            }
            "stop" => {
                let _ = shutdown_tx.send(());
                DaemonResponse::ok(json!({ "stopping": true }))
            }
            other => DaemonResponse::error(format!("unknown command '{other}'")),
        };

        write_response(&mut writer, &response).await?;
        if stopping {
            break;
        }
    }

    Ok(())
}

async fn build_status_payload(
    services: Arc<Services>,
    stats: Arc<RwLock<DaemonStats>>,
    started_at: DateTime<Utc>,
) -> Value {
    let stats = stats.read().await.clone();

    let state_dir = services.state_dir.clone();
    let release = match tokio::task::spawn_blocking(move || services.publisher.status()).await {
        Ok(Ok(status)) => json!(status),
        Ok(Err(err)) => json!({ "error": err.to_string() }),
        Err(err) => json!({ "error": format!("status task join error: {err}") }),
    };

    json!({
        "running": true,
        "pid": std::process::id(),
        "started_at": started_at,
        "jobs_processed": stats.jobs_processed,
        "duplicates": stats.duplicates,
        "failures": stats.failures,
        "ledger_entries": stats.ledger_entries,
        "last_job_at": stats.last_job_at,
        "socket": socket_path(&state_dir).display().to_string(),
        "inbox": inbox_dir(&state_dir).display().to_string(),
        "release": release,
    })
}

// ---------------------------------------------------------------------------
// Inbox watcher
// ---------------------------------------------------------------------------

/// Submits `*.json` files dropped into the inbox. Producers should write a
/// dotfile or `.tmp` first and rename it into place.
async fn inbox_task(
    state_dir: PathBuf,
    job_tx: mpsc::Sender<Job>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let inbox = inbox_dir(&state_dir);
    if !inbox.exists() {
        fs::create_dir_all(&inbox).map_err(|e| io_err(&inbox, e))?;
    }
    let inbox = fs::canonicalize(&inbox).unwrap_or(inbox);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher: RecommendedWatcher = recommended_watcher(move |event| {
        let _ = event_tx.send(event);
    })?;
    watcher.watch(&inbox, RecursiveMode::NonRecursive)?;

    // Files dropped while the daemon was down.
    for path in pending_inbox_files(&inbox)? {
        submit_inbox_file(&state_dir, &job_tx, &path).await;
    }

    let mut debounce = HashMap::<PathBuf, Instant>::new();

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(error = %err, "inbox watcher event error");
                        continue;
                    }
                };
                if !is_relevant_event_kind(&event.kind) {
                    continue;
                }

                for path in event.paths {
                    // Renames out of the inbox report the old path too.
                    if !is_inbox_event_file(&path, &inbox) || !path.exists() {
                        continue;
                    }
                    if !should_process_event(&mut debounce, &path, Instant::now()) {
                        continue;
                    }
                    submit_inbox_file(&state_dir, &job_tx, &path).await;
                }
            }
        }
    }

    Ok(())
}

/// Submit one inbox file, then move it to `processed/` or `failed/`.
/// A failed file gets a sibling `<name>.err` holding the error text.
async fn submit_inbox_file(state_dir: &Path, job_tx: &mpsc::Sender<Job>, path: &Path) {
    let result = match DispatchEvent::from_path(path) {
        Ok(event) => enqueue(job_tx, JobKind::Dispatch(event), "inbox").await,
        Err(err) => Err(DaemonError::from(err)),
    };

    let filed = match &result {
        // Shutting down; leave the file for the next start.
        Err(DaemonError::ChannelClosed(_)) => return,
        Ok(data) if reports_failed_run(data) => {
            let key = data["key"].as_str().unwrap_or_default();
            tracing::warn!(path = %path.display(), %key, "inbox event run failed");
            let note = format!("run {key} finished with status failed\n{data:#}");
            file_away(path, &failed_dir(state_dir), Some(&note))
        }
        Ok(data) => {
            tracing::info!(path = %path.display(), key = %data["key"], "inbox event processed");
            file_away(path, &processed_dir(state_dir), None)
        }
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "inbox event failed");
            file_away(path, &failed_dir(state_dir), Some(&err.to_string()))
        }
    };
    if let Err(err) = filed {
        tracing::error!(path = %path.display(), error = %err, "could not move inbox file");
    }
}

fn file_away(path: &Path, dir: &Path, error: Option<&str>) -> Result<PathBuf, DaemonError> {
    fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    let name = path.file_name().ok_or_else(|| {
        DaemonError::Protocol(format!("inbox path has no file name: {}", path.display()))
    })?;
    let dest = dir.join(name);
    fs::rename(path, &dest).map_err(|e| io_err(&dest, e))?;

    if let Some(error) = error {
        let mut note = dest.clone().into_os_string();
        note.push(".err");
        let note = PathBuf::from(note);
        fs::write(&note, format!("{error}\n")).map_err(|e| io_err(&note, e))?;
    }
    Ok(dest)
}

fn pending_inbox_files(inbox: &Path) -> Result<Vec<PathBuf>, DaemonError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(inbox).map_err(|e| io_err(inbox, e))? {
        let entry = entry.map_err(|e| io_err(inbox, e))?;
        let path = entry.path();
        if path.is_file() && is_inbox_event_file(&path, inbox) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_relevant_event_kind(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

fn is_inbox_event_file(path: &Path, inbox: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(true);
    path.parent() == Some(inbox)
        && !hidden
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
}

fn should_process_event(
    debounce: &mut HashMap<PathBuf, Instant>,
    path: &Path,
    now: Instant,
) -> bool {
    should_process_event_with_threshold(debounce, path, now, DEBOUNCE_WINDOW)
}

fn should_process_event_with_threshold(
    debounce: &mut HashMap<PathBuf, Instant>,
    path: &Path,
    now: Instant,
    threshold: Duration,
) -> bool {
    debounce.retain(|_, seen_at| now.duration_since(*seen_at) <= Duration::from_secs(30));
    match debounce.get(path) {
        Some(last_seen) if now.duration_since(*last_seen) < threshold => false,
        _ => {
            debounce.insert(path.to_path_buf(), now);
            true
        }
    }
}

// ---------------------------------------------------------------------------
// Release scheduler
// ---------------------------------------------------------------------------

async fn scheduler_task(
    job_tx: mpsc::Sender<Job>,
    interval_secs: u64,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    if interval_secs == 0 {
        tracing::info!("release scheduler disabled");
        let _ = shutdown_rx.recv().await;
        return Ok(());
    }

    let period = Duration::from_secs(interval_secs);
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                match enqueue(&job_tx, JobKind::Release { force: false }, "scheduler").await {
                    Ok(data) => {
                        tracing::info!(outcome = %data["outcome"], "scheduled release check finished");
                    }
                    Err(DaemonError::ChannelClosed(_)) => break,
                    Err(err) => {
                        tracing::warn!(error = %err, "scheduled release check failed");
                    }
                }
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Plumbing
// ---------------------------------------------------------------------------

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon socket already in use: {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

fn ensure_runtime_dirs(state_dir: &Path) -> Result<(), DaemonError> {
    for dir in [
        state_dir.to_path_buf(),
        inbox_dir(state_dir),
        processed_dir(state_dir),
        failed_dir(state_dir),
        dispatch_dir(state_dir),
    ] {
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        }
    }
    Ok(())
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    let payload = serde_json::to_string(response)?;
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))?;
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}
