//! Berth Deployment Server

mod args;
mod connection;
mod constants;
mod deploy;
mod files;
mod handlers;
mod monitor;
mod tls;

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

use args::Args;
use connection::ConnectionParams;
use constants::*;
use monitor::{CommandLauncher, ProcessSupervisor};
use tls::CertPaths;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    println!("{}{}", MSG_BANNER, env!("CARGO_PKG_VERSION"));

    let workspace_root: &'static Path =
        Box::leak(setup_workspace(args.workspace_root).into_boxed_path());

    let (listener, tls_acceptor) = setup_network(args.bind, args.port, workspace_root).await;

    if args.debug {
        eprintln!("{}{}", MSG_MONITOR_COMMAND, args.monitor_command);
    }
    let supervisor = Arc::new(ProcessSupervisor::new(
        Box::new(CommandLauncher::new(args.monitor_command)),
        args.monitor_port,
        args.debug,
    ));

    tokio::select! {
        _ = shutdown_signal() => {
            println!("{}", MSG_SHUTDOWN_RECEIVED);

            // Monitor processes are child processes; take them down with us
            let supervisor = supervisor.clone();
            let _ = tokio::task::spawn_blocking(move || supervisor.shutdown_all()).await;
        }
        _ = serve(listener, tls_acceptor, workspace_root, supervisor.clone(), args.debug) => {}
    }
}

/// Accept connections forever, spawning a task per client
async fn serve(
    listener: TcpListener,
    tls_acceptor: TlsAcceptor,
    workspace_root: &'static Path,
    supervisor: Arc<ProcessSupervisor>,
    debug: bool,
) {
    loop {
        let (socket, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                eprintln!("{}{}", ERR_ACCEPT, e);
                continue;
            }
        };

        let params = ConnectionParams {
            peer_addr,
            workspace_root,
            supervisor: supervisor.clone(),
            debug,
        };
        let acceptor = tls_acceptor.clone();

        tokio::spawn(async move {
            if let Err(e) = connection::handle_connection(socket, acceptor, params).await {
                log_connection_error(&e, peer_addr, debug);
            }
        });
    }
}

/// Resolve, create, and canonicalize the workspace root
///
/// Canonicalization matters: `resolve_path()` compares canonical prefixes, so
/// the root it checks against must itself be canonical. Exits on failure;
/// the server cannot run without a workspace.
fn setup_workspace(override_root: Option<PathBuf>) -> PathBuf {
    let root = override_root
        .map(Ok)
        .unwrap_or_else(files::default_workspace_root)
        .unwrap_or_else(|e| {
            eprintln!("{}{}", ERR_GENERIC, e);
            exit(1);
        });

    if let Err(e) = files::init_workspace(&root) {
        eprintln!("{}{}", ERR_GENERIC, e);
        exit(1);
    }

    let canonical = root.canonicalize().unwrap_or_else(|e| {
        eprintln!("{}{}{}", ERR_GENERIC, ERR_WORKSPACE_CANONICALIZE, e);
        exit(1);
    });
    println!("{}{}", MSG_WORKSPACE_ROOT, canonical.display());
    canonical
}

/// Bind the listener and prepare the TLS acceptor; exits on failure
async fn setup_network(
    bind: std::net::IpAddr,
    port: u16,
    workspace_root: &Path,
) -> (TcpListener, TlsAcceptor) {
    // Certificates live next to the workspace, under the data dir
    let cert_dir = workspace_root
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| workspace_root.to_path_buf());

    let tls_acceptor = tls::build_acceptor(&CertPaths::in_dir(&cert_dir)).unwrap_or_else(|e| {
        eprintln!("{}{}", ERR_TLS_INIT, e);
        exit(1);
    });
    println!("{}{}", MSG_CERTIFICATES, cert_dir.display());

    let addr = SocketAddr::new(bind, port);
    let listener = TcpListener::bind(addr).await.unwrap_or_else(|e| {
        eprintln!("{}{}: {}", ERR_BIND_FAILED, addr, e);
        exit(1);
    });
    println!("{}{}", MSG_LISTENING, addr);

    (listener, tls_acceptor)
}

/// Log connection errors, filtering out benign TLS noise
fn log_connection_error(error: &io::Error, peer_addr: SocketAddr, debug: bool) {
    let text = error.to_string();

    // close_notify warnings just mean the client disconnected abruptly;
    // handshake failures are scanners and incompatible clients, debug-only
    if text.contains(TLS_CLOSE_NOTIFY_MSG) {
        return;
    }
    if text.contains(TLS_HANDSHAKE_FAILED_PREFIX) && !debug {
        return;
    }

    eprintln!("{}{}: {}", ERR_CONNECTION, peer_addr, error);
}

/// Resolve when a shutdown signal arrives (SIGTERM/SIGINT, or Ctrl+C)
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate()).expect(ERR_SIGNAL_SIGTERM);
        let mut sigint = signal(SignalKind::interrupt()).expect(ERR_SIGNAL_SIGINT);
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.expect(ERR_SIGNAL_CTRLC);
}
