use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::task::JoinHandle;
use tower::Service;
use tracing::{error, info};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::models::{JobStatus, ProgressState};
use crate::olx::OlxScraper;
use crate::progress::{self, CancelFlag, ProgressReporter, ProgressWriter};
use crate::traits::SessionLauncher;

/// スクレイピングリクエスト
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub location: String,
    pub num_pages: u32,
}

impl ScrapeRequest {
    pub fn new(location: impl Into<String>, num_pages: u32) -> Self {
        Self {
            location: location.into(),
            num_pages,
        }
    }

    pub fn validate(&self) -> Result<(), ScraperError> {
        if self.location.trim().is_empty() {
            return Err(ScraperError::InvalidRequest("location is empty".into()));
        }
        if self.num_pages == 0 {
            return Err(ScraperError::InvalidRequest(
                "page count must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// 開始したジョブへのハンドル
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: u64,
    progress: ProgressReporter,
    cancel: CancelFlag,
}

impl JobHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn progress(&self) -> &ProgressReporter {
        &self.progress
    }

    pub fn snapshot(&self) -> ProgressState {
        self.progress.snapshot()
    }

    /// 次のページ・リスティングの境目で停止する
    pub fn cancel(&self) {
        info!("Cancel requested: job={}", self.id);
        self.cancel.cancel();
    }
}

/// ジョブの結果
#[derive(Debug)]
pub enum JobResult {
    Ready { file_name: String, bytes: Vec<u8> },
    InProgress,
    /// 完了したがリスティングが0件で、ファイルは作られなかった
    NoData,
    /// エラーまたはキャンセルで終了（終了時のステータス）
    Failed(String),
    /// このサービスが発行していないハンドル
    UnknownJob,
}

struct ActiveJob {
    handle: JobHandle,
    task: Option<JoinHandle<Option<PathBuf>>>,
}

impl ActiveJob {
    fn is_running(&self) -> bool {
        let worker_alive = self.task.as_ref().map_or(false, |task| !task.is_finished());
        worker_alive && self.handle.snapshot().status.is_running()
    }
}

/// ジョブの開始・進捗取得・結果取得を受け付けるサービス
///
/// 同時に実行できるジョブは1つだけ。
pub struct ScraperService<L: SessionLauncher> {
    launcher: Arc<L>,
    config: ScraperConfig,
    active: Arc<Mutex<Option<ActiveJob>>>,
    next_id: Arc<AtomicU64>,
}

impl<L: SessionLauncher> Clone for ScraperService<L> {
    fn clone(&self) -> Self {
        Self {
            launcher: self.launcher.clone(),
            config: self.config.clone(),
            active: self.active.clone(),
            next_id: self.next_id.clone(),
        }
    }
}

impl<L: SessionLauncher> ScraperService<L> {
    pub fn new(launcher: L, config: ScraperConfig) -> Self {
        Self {
            launcher: Arc::new(launcher),
            config,
            active: Arc::new(Mutex::new(None)),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveJob>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// バックグラウンドでジョブを開始（tokioランタイム内で呼ぶこと）
    pub fn start(&self, location: &str, num_pages: u32) -> Result<JobHandle, ScraperError> {
        let request = ScrapeRequest::new(location, num_pages);
        request.validate()?;

        let mut active = self.lock_active();
        if let Some(job) = active.as_ref() {
            if job.is_running() {
                return Err(ScraperError::JobInProgress(format!("job {}", job.handle.id)));
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (writer, reporter) = progress::channel();
        let handle = JobHandle {
            id,
            progress: reporter,
            cancel: CancelFlag::new(),
        };

        info!(
            "Scrape request received: job={}, location={}, pages={}",
            id, request.location, request.num_pages
        );

        let task = tokio::spawn(run_job(
            self.launcher.clone(),
            self.config.clone(),
            writer,
            handle.cancel.clone(),
            request,
        ));

        *active = Some(ActiveJob {
            handle: handle.clone(),
            task: Some(task),
        });

        Ok(handle)
    }

    fn issued(&self, handle: &JobHandle) -> bool {
        handle.id > 0 && handle.id <= self.next_id.load(Ordering::SeqCst)
    }

    /// 現在（または直前）のジョブの進捗。未開始なら `No scraping in progress`
    pub fn snapshot(&self) -> ProgressState {
        self.lock_active()
            .as_ref()
            .map(|job| job.handle.snapshot())
            .unwrap_or_else(ProgressState::no_job)
    }

    /// 終了済みジョブの出力ファイルを読み込む
    pub async fn result(&self, handle: &JobHandle) -> Result<JobResult, ScraperError> {
        if !self.issued(handle) {
            return Ok(JobResult::UnknownJob);
        }

        let state = handle.snapshot();

        match state.status {
            JobStatus::Completed => match state.result_file_name {
                Some(file_name) => {
                    let bytes = tokio::fs::read(self.config.output_dir.join(&file_name)).await?;
                    Ok(JobResult::Ready { file_name, bytes })
                }
                None => Ok(JobResult::NoData),
            },
            status @ (JobStatus::Error(_) | JobStatus::Cancelled) => {
                Ok(JobResult::Failed(status.to_string()))
            }
            _ => Ok(JobResult::InProgress),
        }
    }

    /// ワーカーの終了を待ち、出力ファイルのパスを返す
    pub async fn join(&self, handle: &JobHandle) -> Option<PathBuf> {
        let task = {
            let mut active = self.lock_active();
            match active.as_mut() {
                Some(job) if job.handle.id == handle.id => job.task.take(),
                _ => None,
            }
        };

        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("Scrape worker aborted: job={}, {}", handle.id, e);
            }
        }

        handle
            .progress
            .wait_until_finished()
            .await
            .result_file_name
            .map(|name| self.config.output_dir.join(name))
    }
}

async fn run_job<L: SessionLauncher>(
    launcher: Arc<L>,
    config: ScraperConfig,
    progress: ProgressWriter,
    cancel: CancelFlag,
    request: ScrapeRequest,
) -> Option<PathBuf> {
    progress.update(|state| {
        state.total_pages = request.num_pages;
        state.status = JobStatus::Initializing;
    });

    let session = match launcher.launch(&config).await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to launch browser: {}", e);
            progress.fail(&e);
            return None;
        }
    };

    OlxScraper::new(session, config, progress)
        .with_cancel_flag(cancel)
        .run(&request.location, request.num_pages)
        .await
}

/// tower::Service としてジョブを開始する
impl<L: SessionLauncher> Service<ScrapeRequest> for ScraperService<L> {
    type Response = JobHandle;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        let started = self.start(&req.location, req.num_pages);
        Box::pin(async move { started })
    }
}
