//! kubeup binary. Linux only: provisions a one-node Kubernetes cluster on the
//! local host by driving the bootstrap sequence in the `cluster` crate.

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!("kubeup provisions Linux hosts only.");
    std::process::exit(1);
}

#[cfg(target_os = "linux")]
fn main() {
    use clap::Parser;
    use cluster::{
        build_stages, BootstrapError, BootstrapProgress, BootstrapReport, ChannelProgressReporter,
        ClusterBootstrapper, ClusterConfig, InvokingUser, LocalHost, OsFamily, StageStatus,
        TemplateRenderer,
    };
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tracing::info;

    #[derive(Parser, Debug)]
    #[command(
        name = "kubeup",
        version,
        about = "Provision a one-node Kubernetes cluster on this host"
    )]
    struct Args {
        /// Config file (default: ./kubeup.toml, then /etc/kubeup/kubeup.toml)
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,

        /// Override the pod network CIDR
        #[arg(long = "pod-cidr")]
        pod_cidr: Option<String>,

        /// Override the Kubernetes minor version (e.g. 1.30)
        #[arg(long = "kubernetes-version")]
        kubernetes_version: Option<String>,

        /// Write the final stage report as JSON to this path
        #[arg(long = "report")]
        report: Option<PathBuf>,
    }

    fn print_summary(report: &BootstrapReport) {
        eprintln!("──────────────────────────────────────────────────────────────────");
        for outcome in &report.outcomes {
            let mark = match outcome.status {
                StageStatus::Succeeded => "ok  ",
                StageStatus::Skipped => "skip",
                StageStatus::TimedOut => "warn",
                StageStatus::Failed => "FAIL",
            };
            match &outcome.detail {
                Some(detail) => eprintln!("  [{}] {} - {}", mark, outcome.name, detail),
                None => eprintln!("  [{}] {}", mark, outcome.name),
            }
        }
        eprintln!("──────────────────────────────────────────────────────────────────");
    }

    fn write_report(path: &std::path::Path, report: &BootstrapReport) {
        match serde_json::to_string_pretty(report) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    tracing::warn!("Failed to write report to {}: {}", path.display(), e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize report: {}", e),
        }
    }

    // Default to info level if RUST_LOG not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .init();

    let args = Args::parse();

    eprintln!("╔════════════════════════════════════════════════════════════════╗");
    eprintln!("║  kubeup - one-node Kubernetes bootstrap                        ║");
    eprintln!("╚════════════════════════════════════════════════════════════════╝");

    if !nix::unistd::Uid::effective().is_root() {
        eprintln!("kubeup must run as root (it installs packages and writes /etc). Re-run with sudo.");
        std::process::exit(1);
    }

    let os = match OsFamily::detect() {
        Ok(os) => os,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Supported families: debian (apt), rhel (dnf/yum).");
            std::process::exit(1);
        }
    };

    let mut config = match ClusterConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    if let Some(pod_cidr) = args.pod_cidr {
        config.pod_network_cidr = pod_cidr;
    }
    if let Some(version) = args.kubernetes_version {
        config.kubernetes_version = version;
    }

    eprintln!("  OS family:          {}", os);
    eprintln!("  Kubernetes version: {}", config.kubernetes_version);
    eprintln!("  Pod network CIDR:   {}", config.pod_network_cidr);

    info!("kubeup starting");

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let exit_code = rt.block_on(async {
        let renderer = match TemplateRenderer::from_embedded() {
            Ok(renderer) => renderer,
            Err(e) => {
                eprintln!("{}", e);
                return 1;
            }
        };

        let user = InvokingUser::detect();
        let stages = match build_stages(&config, os, &user, &renderer) {
            Ok(stages) => stages,
            Err(e) => {
                eprintln!("{}", e);
                return 1;
            }
        };

        let (progress_tx, mut progress_rx) = mpsc::channel::<BootstrapProgress>(32);
        tokio::spawn(async move {
            while let Some(progress) = progress_rx.recv().await {
                eprintln!("[{:>3}%] {}", progress.percentage, progress.message);
            }
        });

        let bootstrapper = ClusterBootstrapper::new(
            Arc::new(LocalHost),
            Arc::new(ChannelProgressReporter::new(progress_tx)),
        );

        match bootstrapper.run(&stages).await {
            Ok(report) => {
                print_summary(&report);
                let warnings = report.warnings();
                if warnings.is_empty() {
                    eprintln!("Cluster bootstrap complete.");
                } else {
                    eprintln!(
                        "Cluster bootstrap complete with {} incomplete component(s):",
                        warnings.len()
                    );
                    for outcome in warnings {
                        eprintln!("  - {}", outcome.name);
                    }
                }
                if let Some(path) = &args.report {
                    write_report(path, &report);
                }
                0
            }
            Err(BootstrapError::Stage {
                stage,
                message,
                report,
            }) => {
                print_summary(&report);
                tracing::error!("Stage '{}' failed: {}", stage, message);
                if let Some(path) = &args.report {
                    write_report(path, &report);
                }
                1
            }
            Err(e) => {
                tracing::error!("Bootstrap failed: {}", e);
                1
            }
        }
    });

    std::process::exit(exit_code);
}
