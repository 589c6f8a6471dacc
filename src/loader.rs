use std::path::Path;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::dashboard::{Dashboard, LeagueContext};
use crate::export;
use crate::state::{Delta, LoaderCommand};

/// Run loads and exports off the UI thread. Exits when the command channel closes.
pub fn spawn_loader(
    ctx: LeagueContext,
    tx: Sender<Delta>,
    cmd_rx: Receiver<LoaderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut current = load(&ctx, &tx);

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                LoaderCommand::Reload => {
                    current = load(&ctx, &tx);
                }
                LoaderCommand::Export { path } => {
                    let Some(dashboard) = current.as_ref() else {
                        let _ = tx.send(Delta::ExportFailed(
                            "nothing loaded to export".to_string(),
                        ));
                        continue;
                    };
                    match export::export_dashboard(Path::new(&path), dashboard) {
                        Ok(report) => {
                            let _ = tx.send(Delta::ExportFinished {
                                path,
                                games: report.games,
                            });
                        }
                        Err(err) => {
                            warn!("export failed: {err:#}");
                            let _ = tx.send(Delta::ExportFailed(format!("{err:#}")));
                        }
                    }
                }
            }
        }
        info!("loader stopped");
    })
}

fn load(ctx: &LeagueContext, tx: &Sender<Delta>) -> Option<Dashboard> {
    let _ = tx.send(Delta::LoadStarted);
    match ctx.load() {
        Ok(dashboard) => {
            for warning in dashboard.report.warnings.iter().filter(|w| w.is_rejection()) {
                let _ = tx.send(Delta::Log(format!("[WARN] {warning}")));
            }
            let _ = tx.send(Delta::SetDashboard(Box::new(dashboard.clone())));
            Some(dashboard)
        }
        Err(err) => {
            warn!("load failed: {err}");
            let _ = tx.send(Delta::LoadFailed(err.to_string()));
            None
        }
    }
}
