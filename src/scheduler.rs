// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Runs the poller and both renderers as independent tasks.
//!
//! Single-threaded async design using tokio:
//! - Poller, text renderer and map renderer each loop on their own interval
//! - They share nothing but the job-state store
//! - The supervisor ends the run when any task stops or Ctrl-C arrives

use std::future::Future;
use std::io;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{DisplaySpec, MonitorConfig};
use crate::job::{FileSource, JobStateStore, Poller, SnapshotSource};
use crate::render::{
    DisplaySurface, FileDisplay, MapRenderer, PlainSurface, TerminalSurface, TextRenderer,
};

/// Run the monitor until interrupted
pub fn run_monitor(config: MonitorConfig) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(run_monitor_async(config))
}

async fn run_monitor_async(config: MonitorConfig) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let poller = Poller::new(FileSource::new(&config.state_path), JobStateStore::new());
    let reader = poller.reader();

    let map = MapRenderer::new(
        build_displays(&config.displays),
        reader.clone(),
        config.surface_pause,
    );

    let terminal = TerminalSurface::new().context("Failed to set up terminal")?;
    let text = TextRenderer::new(terminal, reader, clock);

    info!(
        state = %config.state_path.display(),
        displays = config.displays.len(),
        "monitor starting"
    );

    supervise(
        poller.run(config.poll_interval),
        text.run(config.text_interval),
        map.run(config.map_interval),
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        },
    )
    .await
}

/// Render a single frame of everything from one fetch, then return
pub fn run_once(config: &MonitorConfig) -> Result<()> {
    let mut source = FileSource::new(&config.state_path);
    let snapshot = source
        .fetch()
        .with_context(|| format!("Failed to read job state from {}", config.state_path.display()))?
        .ok_or_else(|| anyhow!("No job state available at {}", config.state_path.display()))?;

    let store = JobStateStore::new();
    store.install(snapshot);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut text = TextRenderer::new(PlainSurface::new(io::stdout().lock()), store.reader(), clock);
    text.render_once()?;

    let mut map = MapRenderer::new(
        build_displays(&config.displays),
        store.reader(),
        config.surface_pause,
    );
    let drawn = map.render_all_once();
    if drawn < config.displays.len() {
        bail!("Only {} of {} displays could be drawn", drawn, config.displays.len());
    }

    Ok(())
}

fn build_displays(specs: &[DisplaySpec]) -> Vec<Box<dyn DisplaySurface + Send>> {
    specs
        .iter()
        .map(|spec| {
            Box::new(FileDisplay::new(&spec.path, spec.width, spec.height))
                as Box<dyn DisplaySurface + Send>
        })
        .collect()
}

/// Spawn the three loops and wait for the first of them, or `shutdown`, to finish.
///
/// The loops never return on their own, so any task ending (including by
/// panic) is reported as an error. The remaining tasks are aborted and
/// awaited so their surfaces are released before we return.
pub async fn supervise<P, T, M, S>(poller: P, text: T, map: M, shutdown: S) -> Result<()>
where
    P: Future<Output = ()> + Send + 'static,
    T: Future<Output = ()> + Send + 'static,
    M: Future<Output = ()> + Send + 'static,
    S: Future<Output = ()>,
{
    let mut tasks: [(&str, JoinHandle<()>); 3] = [
        ("poller", tokio::spawn(poller)),
        ("text renderer", tokio::spawn(text)),
        ("map renderer", tokio::spawn(map)),
    ];

    let stopped = {
        let [(_, poller), (_, text), (_, map)] = &mut tasks;
        tokio::select! {
            res = poller => Some((0, res)),
            res = text => Some((1, res)),
            res = map => Some((2, res)),
            _ = shutdown => None,
        }
    };

    let finished = stopped.as_ref().map(|(i, _)| *i);
    for (i, (_, handle)) in tasks.iter_mut().enumerate() {
        // A completed handle must not be polled again
        if Some(i) != finished {
            handle.abort();
            let _ = handle.await;
        }
    }

    match stopped {
        None => {
            info!("interrupted, shutting down");
            Ok(())
        }
        Some((i, Ok(()))) => bail!("{} task exited unexpectedly", tasks[i].0),
        Some((i, Err(e))) => bail!("{} task failed: {}", tasks[i].0, e),
    }
}
