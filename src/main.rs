use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
pub mod mappings;
mod services;
mod utils;

use config::Config;
use services::{
    create_event_tap_factory,
    create_key_sender,
    create_window_manager,
    ClientLauncher,
    Duplicator,
    LayoutPlan,
    ScreenInfo,
    Session,
};

#[derive(Parser, Debug)]
#[command(name = "brawler")]
#[command(about = "Простой мультибоксер для Linux/X.org")]
struct Args {
    /// Количество toon-клиентов
    #[arg(short, long)]
    toons: Option<usize>,

    /// Режим двух мониторов
    #[arg(short, long)]
    dual_monitor: bool,

    /// Путь к файлу конфигурации (YAML или TOML)
    #[arg(short, long, default_value = "config.yml")]
    config: String,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,

    /// Не ждать подтверждения входа в игру
    #[arg(short, long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let mut config = Config::load(&args.config)?;
    config.apply_overrides(args.toons, args.dual_monitor)?;

    // Инициализация системы логирования
    init_tracing(args.log_level.as_deref().unwrap_or(&config.logging.level))?;

    info!("Запуск brawler v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    } else {
        utils::environment::check_environment(&config.game.wine_bin)?;
    }

    // Раскладка окон по основному монитору
    let screen = ScreenInfo::detect(args.dry_run)?;
    let plan = LayoutPlan::compute(&screen, &config.layout);

    // Инициализация компонентов
    let duplicator = Duplicator::new(
        create_event_tap_factory(args.dry_run),
        create_key_sender(args.dry_run),
    );
    let mut session = Session::new(
        &config,
        create_window_manager(args.dry_run),
        ClientLauncher::new(config.game.clone(), args.dry_run),
        duplicator,
    );

    session.launch(&plan).await?;
    info!("Запущено клиентов: {}", session.registry().len());

    if !args.yes {
        info!("Ожидание входа в игру. Нажмите Enter, чтобы начать дублирование клавиш");
        tokio::select! {
            _ = wait_for_enter() => {}
            _ = signal::ctrl_c() => {
                info!("Получен сигнал завершения (Ctrl+C)");
                session.shutdown().await;
                return Ok(());
            }
        }
    }

    if let Err(e) = session.listen() {
        error!("Не удалось запустить дублирование клавиш: {}", e);
        session.shutdown().await;
        return Err(e.into());
    }

    info!("Дублирование запущено, Ctrl+C для выхода");

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");
    session.shutdown().await;

    info!("brawler завершил работу");
    Ok(())
}

/// Ждать Enter в stdin, чтение идёт в отдельном потоке
async fn wait_for_enter() {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        if let Err(e) = std::io::stdin().read_line(&mut line) {
            warn!("Не удалось прочитать stdin: {}", e);
        }
        let _ = tx.send(());
    });
    let _ = rx.await;
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
