//! 進捗の共有
//!
//! 書き込みはジョブのワーカーだけが行い、読み取り側は watch チャネル越しに
//! スナップショットを取得する。

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::ScraperError;
use crate::models::{JobStatus, ProgressState};

/// 書き込み側と読み取り側を作成
pub fn channel() -> (ProgressWriter, ProgressReporter) {
    let (tx, rx) = watch::channel(ProgressState::new());
    (ProgressWriter { tx }, ProgressReporter { rx })
}

/// 進捗の書き込み側（ワーカー専用）
#[derive(Debug)]
pub struct ProgressWriter {
    tx: watch::Sender<ProgressState>,
}

impl ProgressWriter {
    pub fn update(&self, f: impl FnOnce(&mut ProgressState)) {
        self.tx.send_modify(f);
    }

    /// 状態を更新。前のフェーズへ戻る更新は無視する
    pub fn set_status(&self, status: JobStatus) {
        self.tx.send_modify(|state| {
            if status.phase() < state.status.phase() {
                warn!("Ignoring status regression: {} -> {}", state.status, status);
                return;
            }
            state.status = status;
        });
    }

    /// 致命的エラーを終端状態として記録
    pub fn fail(&self, err: &ScraperError) {
        let status = match err {
            ScraperError::Cancelled => JobStatus::Cancelled,
            other => JobStatus::Error(other.to_string()),
        };
        self.set_status(status);
    }

    pub fn snapshot(&self) -> ProgressState {
        self.tx.borrow().clone()
    }

    pub fn reporter(&self) -> ProgressReporter {
        ProgressReporter {
            rx: self.tx.subscribe(),
        }
    }
}

/// 進捗の読み取り側
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    rx: watch::Receiver<ProgressState>,
}

impl ProgressReporter {
    pub fn snapshot(&self) -> ProgressState {
        self.rx.borrow().clone()
    }

    /// 終端状態になるまで待機して、その時点のスナップショットを返す
    pub async fn wait_until_finished(&self) -> ProgressState {
        let mut rx = self.rx.clone();
        let result = rx
            .wait_for(|state| state.status.is_terminal())
            .await
            .map(|state| state.clone());

        match result {
            Ok(state) => state,
            // ワーカーが終端状態を書かずに終了した
            Err(_) => self.snapshot(),
        }
    }
}

/// 協調的キャンセルのフラグ
///
/// ページ間・リスティング間でのみ確認する。ブラウザ待機中の中断はしない。
#[derive(Debug, Clone)]
pub struct CancelFlag(CancellationToken);

impl Default for CancelFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelFlag {
    pub fn new() -> Self {
        Self(CancellationToken::new())
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// キャンセルされるまで待機
    pub async fn cancelled(&self) {
        self.0.cancelled().await;
    }

    pub fn check(&self) -> Result<(), ScraperError> {
        if self.is_cancelled() {
            Err(ScraperError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_never_regresses() {
        let (writer, reporter) = channel();
        writer.set_status(JobStatus::ScrapingListings);
        writer.set_status(JobStatus::ScrapingPage(2));
        assert_eq!(reporter.snapshot().status, JobStatus::ScrapingListings);

        writer.set_status(JobStatus::Exporting);
        assert_eq!(reporter.snapshot().status, JobStatus::Exporting);
    }

    #[test]
    fn test_fail_records_error_message() {
        let (writer, reporter) = channel();
        writer.fail(&ScraperError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()));

        let status = reporter.snapshot().status;
        assert!(status.to_string().starts_with("Error: "));
        assert!(status.to_string().contains("net::ERR_NAME_NOT_RESOLVED"));
    }

    #[test]
    fn test_cancel_flag() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(flag.check().is_ok());
        clone.cancel();
        assert!(matches!(flag.check(), Err(ScraperError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let flag = CancelFlag::new();
        let waiter = {
            let flag = flag.clone();
            tokio::spawn(async move { flag.cancelled().await })
        };

        flag.cancel();
        waiter.await.unwrap();
        assert!(flag.is_cancelled());
    }

    #[tokio::test]
    async fn test_wait_until_finished() {
        let (writer, reporter) = channel();
        let waiter = tokio::spawn(async move { reporter.wait_until_finished().await });

        writer.set_status(JobStatus::Initializing);
        writer.set_status(JobStatus::Completed);

        let state = waiter.await.unwrap();
        assert_eq!(state.status, JobStatus::Completed);
    }
}
