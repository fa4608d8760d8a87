use std::time::Duration;

use olx_scraper::{ChromeLauncher, JobResult, ScraperConfig, ScraperService};

#[tokio::main]
async fn main() {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter("info,olx_scraper=debug")
        .init();

    // 引数: <location> <pages>
    let mut args = std::env::args().skip(1);
    let location = args.next().unwrap_or_else(|| "Jakarta Selatan".to_string());
    let num_pages: u32 = args
        .next()
        .map(|s| s.parse().expect("pages must be a positive integer"))
        .unwrap_or(2);

    let config = ScraperConfig::from_env();
    let service = ScraperService::new(ChromeLauncher, config);

    println!("=== OLX Scraper ===");

    let handle = match service.start(&location, num_pages) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("エラー: {}", e);
            return;
        }
    };

    // 進捗をポーリング
    loop {
        let state = service.snapshot();
        println!("{}", serde_json::to_string(&state).unwrap_or_default());
        if state.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    service.join(&handle).await;

    match service.result(&handle).await {
        Ok(JobResult::Ready { file_name, bytes }) => {
            println!("成功! CSV保存先: {} ({} bytes)", file_name, bytes.len());
        }
        Ok(JobResult::NoData) => println!("リスティングが見つかりませんでした"),
        Ok(other) => eprintln!("失敗: {:?}", other),
        Err(e) => eprintln!("エラー: {}", e),
    }
}
