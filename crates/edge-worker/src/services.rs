//! 서비스 구성.
//!
//! 저장소 연결은 시작 시 한 번 만들고 모든 컴포넌트에 주입합니다.
//! 프로세스 종료 시 `Services`를 drop하면 연결이 닫힙니다.

use std::sync::Arc;
use tracing::{info, warn};

use edge_core::{AppConfig, StoreBackend};
use edge_data::{
    Aggregator, CacheStore, DistributedLock, KeyValueStore, LlmTextParser, MemoryStore,
    PageScraper, ParserInsightGenerator, RateLimiter, RecordAggregator, RedisStore,
    RemoteFetchClient, RetryPolicy,
};
use edge_notification::{BroadcastPublisher, Notifier, RedisPublisher};

use crate::dispatcher::Dispatcher;
use crate::error::{Result, WorkerError};
use crate::http::AppState;
use crate::pipeline::TickerPipeline;
use crate::pool::WorkerPool;
use crate::queue::{JobQueue, MemoryJobQueue, RedisJobQueue};
use crate::registry::JobRegistry;
use crate::stats::WorkerStats;

/// 프로세스 전역 서비스 묶음.
pub struct Services {
    pub config: AppConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub cache: Arc<CacheStore>,
    pub dispatcher: Dispatcher,
    pub pipeline: Arc<TickerPipeline>,
    pub stats: Arc<WorkerStats>,
}

impl Services {
    /// 설정된 저장소에 연결하고 전체 파이프라인을 구성합니다.
    pub async fn connect(config: AppConfig) -> Result<Self> {
        let notifier = Notifier::from_config(&config.notification);

        let (store, queue, notifier): (Arc<dyn KeyValueStore>, Arc<dyn JobQueue>, Notifier) =
            match config.store.backend {
                StoreBackend::Redis => {
                    let redis = RedisStore::connect(&config.store.url).await?;
                    let queue = RedisJobQueue::new(
                        &config.worker.queue_name,
                        redis.connection(),
                        redis.dedicated_connection().await?,
                    );
                    let notifier =
                        notifier.with_publisher(Arc::new(RedisPublisher::new(redis.connection())));
                    let store: Arc<dyn KeyValueStore> = Arc::new(redis);
                    let queue: Arc<dyn JobQueue> = Arc::new(queue);
                    (store, queue, notifier)
                }
                StoreBackend::Memory => {
                    warn!("Using in-memory store: cache, locks and queue are process-local");
                    let notifier = notifier.with_publisher(Arc::new(BroadcastPublisher::default()));
                    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
                    let queue: Arc<dyn JobQueue> = Arc::new(MemoryJobQueue::new());
                    (store, queue, notifier)
                }
            };

        let aggregator = build_aggregator(&config)?;
        info!(backend = ?config.store.backend, "Services connected");

        Ok(Self::assemble(config, store, queue, aggregator, notifier))
    }

    /// 이미 만든 구성 요소로 조립합니다.
    pub fn assemble(
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        queue: Arc<dyn JobQueue>,
        aggregator: Arc<dyn RecordAggregator>,
        notifier: Notifier,
    ) -> Self {
        let cache = Arc::new(CacheStore::new(store.clone()));
        let lock = DistributedLock::new(store.clone());
        let registry = Arc::new(JobRegistry::new());
        let dispatcher = Dispatcher::new(queue, registry);

        let pipeline = Arc::new(
            TickerPipeline::new(cache.clone(), lock, aggregator, notifier).with_config(&config),
        );

        Self {
            config,
            store,
            cache,
            dispatcher,
            pipeline,
            stats: Arc::new(WorkerStats::new()),
        }
    }

    pub fn worker_pool(&self) -> WorkerPool {
        WorkerPool::new(
            self.dispatcher.queue().clone(),
            self.pipeline.clone(),
            self.dispatcher.registry().clone(),
            self.stats.clone(),
            &self.config.worker,
        )
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(
            self.cache.clone(),
            self.dispatcher.clone(),
            self.store.clone(),
            self.stats.clone(),
            self.config.prewarm.tickers.clone(),
        )
    }
}

/// 스크래퍼 네 개와 인사이트 생성기를 묶은 집계기를 만듭니다.
pub fn build_aggregator(config: &AppConfig) -> Result<Arc<dyn RecordAggregator>> {
    let rate_limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
    let fetcher = Arc::new(
        RemoteFetchClient::from_config(&config.fetch)
            .map_err(|e| WorkerError::Init(format!("fetch client: {}", e)))?,
    );
    let parser = Arc::new(
        LlmTextParser::from_config(&config.parser)
            .map_err(|e| WorkerError::Init(format!("parser client: {}", e)))?,
    );

    if config.parser.api_key.as_deref().map_or(true, str::is_empty) {
        warn!("Parser API key not set: every source will fail and records will be synthetic");
    }

    let scrapers = PageScraper::all(config, rate_limiter, fetcher, parser.clone());
    let mut aggregator = Aggregator::new(scrapers);

    if config.insights.enabled {
        let retry = RetryPolicy::from_millis(config.insights.attempts, config.insights.retry_delay_ms);
        aggregator = aggregator.with_insights(Arc::new(ParserInsightGenerator::new(parser, retry)));
    }

    Ok(Arc::new(aggregator))
}
