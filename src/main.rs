use clap::Parser;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use triad_mvp::adapters::executor::{ExecutorMode, InlineExecutor, TokioExecutor, WorkerExecutor};
use triad_mvp::app::console::Flow;
use triad_mvp::domain::ports::Executor;
use triad_mvp::utils::{logger, validation::Validate};
use triad_mvp::{CliConfig, ConsoleShell, XmlRpcClient};

// 阻塞式 reqwest client 不能在 async context 內建立，所以 main 保持同步
fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.logging.json {
        logger::init_json_logger(config.logging.verbose);
    } else {
        logger::init_cli_logger(config.logging.verbose);
    }
    tracing::info!("Starting triad-mvp shell");
    tracing::debug!("Resolved config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let client = XmlRpcClient::with_options(config.xmlrpc_options())?;
    tracing::info!("Remote endpoint: {} ({})", client.endpoint(), client.method());

    // runtime 要比 shell 活得久，先宣告
    let mut runtime: Option<tokio::runtime::Runtime> = None;
    let executor: Arc<dyn Executor> = match config.executor.mode {
        ExecutorMode::Inline => Arc::new(InlineExecutor),
        ExecutorMode::Worker => Arc::new(WorkerExecutor::new("rpc-worker")?),
        ExecutorMode::Tokio => {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("rpc-tokio")
                .enable_all()
                .build()?;
            let executor = TokioExecutor::new(rt.handle().clone());
            runtime = Some(rt);
            Arc::new(executor)
        }
    };
    tracing::debug!("Executor mode: {:?}, runtime: {}", config.executor.mode, runtime.is_some());

    let rpc_budget_ms = config.rpc.connect_timeout_ms + config.rpc.reply_timeout_ms;
    let send_wait = Duration::from_millis(rpc_budget_ms) + Duration::from_secs(1);
    let mut shell = ConsoleShell::new(
        std::io::stdout(),
        config.triad.total,
        config.initial_values(),
        Arc::new(client),
        executor,
    )?
    .with_send_wait(send_wait);

    println!("{}", ConsoleShell::<std::io::Stdout>::help());

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        // 顯示背景送出的晚到結果
        shell.pump()?;
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        match shell.handle_line(&line?) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => {
                tracing::error!("Command failed: {}", e);
                eprintln!("❌ {}", e.user_friendly_message());
            }
        }
    }

    tracing::info!("Shutting down");
    drop(shell);
    drop(runtime);
    Ok(())
}
