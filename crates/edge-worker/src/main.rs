//! 티커 워커 CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use edge_core::{init_logging, AppConfig, JobKind, JobPayload, LogConfig, Ticker};
use edge_worker::{create_router, Services};

#[derive(Parser)]
#[command(name = "edge-worker")]
#[command(about = "Ticker data worker: job queue, scrapers, cache", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로
    #[arg(long, default_value = "config/default.toml")]
    config: String,

    /// 로그 레벨 (trace, debug, info, warn, error). 지정하면 설정 파일보다 우선
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 워커 풀과 HTTP 서버 실행 (Ctrl-C까지)
    Serve,

    /// 작업 하나 등록
    Enqueue {
        /// 티커 심볼
        #[arg(long)]
        ticker: String,

        /// 표시 이름
        #[arg(long)]
        name: Option<String>,

        /// 알림 없는 프리웜 작업으로 등록
        #[arg(long)]
        prewarm: bool,
    },

    /// 설정된 프리웜 목록 등록
    Prewarm,

    /// 캐시 확인
    CheckCache {
        /// 티커 심볼
        #[arg(long)]
        ticker: String,
    },

    /// 캐시 항목 삭제 (다음 요청에서 다시 수집)
    Invalidate {
        /// 티커 심볼
        #[arg(long)]
        ticker: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config).context("failed to load configuration")?;

    let mut log_config = LogConfig::from_settings(&config.logging);
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    init_logging(log_config).context("failed to initialize logging")?;

    let services = Services::connect(config).await?;

    match cli.command {
        Commands::Serve => serve(services).await?,
        Commands::Enqueue {
            ticker,
            name,
            prewarm,
        } => {
            let kind = if prewarm { JobKind::Prewarm } else { JobKind::User };
            let payload = JobPayload::new(Ticker::parse(&ticker)?, name);
            let enqueued = services.dispatcher.enqueue(kind, payload).await?;

            if enqueued.duplicate {
                println!("skipped (already queued today): {}", enqueued.job_id);
            } else {
                println!("{}", enqueued.job_id);
            }
        }
        Commands::Prewarm => {
            let summary = services
                .dispatcher
                .enqueue_prewarm(&services.config.prewarm.tickers)
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::CheckCache { ticker } => {
            let ticker = Ticker::parse(&ticker)?;
            match services.cache.get(&ticker).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("not cached: {}", ticker),
            }
        }
        Commands::Invalidate { ticker } => {
            let ticker = Ticker::parse(&ticker)?;
            if services.cache.invalidate(&ticker).await? {
                println!("invalidated: {}", ticker);
            } else {
                println!("not cached: {}", ticker);
            }
        }
    }

    Ok(())
}

/// 워커 풀과 HTTP 서버를 함께 실행합니다.
async fn serve(services: Services) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", services.config.server.host, services.config.server.port)
        .parse()
        .context("invalid server address")?;

    let shutdown = CancellationToken::new();
    let pool = tokio::spawn(services.worker_pool().run(shutdown.clone()));

    let app = create_router(services.app_state());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    // 서버가 다른 이유로 끝난 경우에도 풀 종료
    shutdown.cancel();
    match pool.await {
        Ok(result) => result?,
        Err(e) => warn!(error = %e, "Worker pool task ended abnormally"),
    }

    info!("Worker stopped gracefully");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM을 기다린 뒤 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => warn!("Received SIGTERM, initiating graceful shutdown..."),
        _ = shutdown.cancelled() => {}
    }

    shutdown.cancel();
}
