use anyhow::Result;
use doc_scan_client::utils::logging;
use doc_scan_client::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
