use crate::config::{Config, WindowConfig};
use crate::error::{BrawlerError, Result};
use crate::events::{WindowGeometry, WindowHandle, WindowId};
use crate::services::allow_list::AllowList;
use crate::services::client_launcher::ClientLauncher;
use crate::services::client_registry::ClientRegistry;
use crate::services::duplicator::Duplicator;
use crate::services::layout::LayoutPlan;
use crate::services::window_manager::WindowManager;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Опрашивать `probe`, пока он не вернёт значение или не выйдет время
async fn wait_for<T, F, Fut>(interval: Duration, timeout: Duration, mut probe: F) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = probe().await? {
            return Ok(Some(value));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        sleep(interval).await;
    }
}

/// Находит игровые окна клиентов, которые ещё не найдены
///
/// Игровое окно - IME-окно внутри виртуального рабочего стола клиента.
pub struct WindowResolver {
    registry: Arc<ClientRegistry>,
    windows: Arc<dyn WindowManager>,
    desktops: Mutex<HashMap<usize, WindowId>>,
    pattern: String,
}

impl WindowResolver {
    pub fn new(registry: Arc<ClientRegistry>, windows: Arc<dyn WindowManager>, pattern: String) -> Self {
        Self {
            registry,
            windows,
            desktops: Mutex::new(HashMap::new()),
            pattern,
        }
    }

    pub fn set_desktop(&self, index: usize, desktop: WindowId) {
        self.desktops.lock().insert(index, desktop);
    }

    pub fn desktop(&self, index: usize) -> Option<WindowId> {
        self.desktops.lock().get(&index).copied()
    }

    /// Один проход по ненайденным клиентам; возвращает, сколько осталось
    pub async fn resolve_pending(&self) -> usize {
        let mut remaining = 0;

        for index in self.registry.unresolved() {
            let Some(desktop) = self.desktop(index) else {
                remaining += 1;
                continue;
            };

            match self.windows.find_child(desktop, &self.pattern).await {
                Ok(Some(window)) => {
                    if !self.registry.resolve(index, window) {
                        debug!("Клиент {} уже завершён, окно {} не привязано", index, window);
                    }
                }
                Ok(None) => remaining += 1,
                Err(e) => {
                    debug!("Клиент {}: поиск игрового окна не удался: {}", index, e);
                    remaining += 1;
                }
            }
        }

        remaining
    }

    /// Ждать, пока найдутся все окна, но не дольше `timeout`
    pub async fn wait_all(&self, interval: Duration, timeout: Duration) -> usize {
        let result = wait_for(interval, timeout, || async {
            match self.resolve_pending().await {
                0 => Ok(Some(())),
                _ => Ok(None),
            }
        })
        .await;

        match result {
            Ok(Some(())) => 0,
            _ => self.registry.unresolved().len(),
        }
    }

    /// Фоновый дозапрос окон до сигнала завершения
    pub fn spawn(self: Arc<Self>, interval: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            debug!("WindowResolver запущен, интервал {:?}", interval);
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = sleep(interval) => {
                        if self.registry.unresolved().is_empty() {
                            continue;
                        }
                        let remaining = self.resolve_pending().await;
                        debug!("WindowResolver: без окна осталось {}", remaining);
                    }
                }
            }
            debug!("WindowResolver остановлен");
        })
    }
}

/// Сессия мультибоксинга: запуск клиентов, дублирование, завершение
pub struct Session {
    window_config: WindowConfig,
    registry: Arc<ClientRegistry>,
    allow_list: Arc<AllowList>,
    windows: Arc<dyn WindowManager>,
    launcher: ClientLauncher,
    resolver: Arc<WindowResolver>,
    /// None только пока остановка идёт в пуле блокирующих задач
    duplicator: Option<Duplicator>,
    resolver_task: Option<(watch::Sender<bool>, JoinHandle<()>)>,
}

impl Session {
    pub fn new(
        config: &Config,
        windows: Arc<dyn WindowManager>,
        launcher: ClientLauncher,
        duplicator: Duplicator,
    ) -> Self {
        let registry = Arc::new(ClientRegistry::new());
        let allow_list = Arc::new(config.allow_list());
        for name in allow_list.unknown_names() {
            warn!("Клавиша '{}' из keys_allowed не похожа на имя keysym и никогда не совпадёт", name);
        }

        let resolver = Arc::new(WindowResolver::new(
            Arc::clone(&registry),
            Arc::clone(&windows),
            launcher.ime_window_pattern(),
        ));

        Self {
            window_config: config.window.clone(),
            registry,
            allow_list,
            windows,
            launcher,
            resolver,
            duplicator: Some(duplicator),
            resolver_task: None,
        }
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    pub fn is_listening(&self) -> bool {
        self.duplicator.as_ref().is_some_and(Duplicator::is_listening)
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.window_config.poll_interval_ms)
    }

    fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.window_config.poll_timeout_ms)
    }

    /// Запустить master и все toon-клиенты по раскладке, затем найти игровые окна.
    /// Ошибка запуска фатальна: уже запущенные клиенты завершаются.
    pub async fn launch(&mut self, plan: &LayoutPlan) -> Result<()> {
        info!("Запуск {} клиентов", plan.client_count());

        for index in 0..plan.client_count() {
            let Some(geometry) = plan.placement(index) else {
                break;
            };
            if let Err(e) = self.launch_client(geometry).await {
                error!("Не удалось запустить клиента {}: {}", index, e);
                self.shutdown().await;
                return Err(e);
            }
        }

        let unresolved = self.resolver.wait_all(self.poll_interval(), self.poll_timeout()).await;
        if unresolved > 0 {
            warn!(
                "Игровое окно не найдено у {} клиентов, поиск продолжится в фоне",
                unresolved
            );
        } else {
            info!("Все игровые окна найдены");
        }

        Ok(())
    }

    async fn launch_client(&self, geometry: WindowGeometry) -> Result<()> {
        let index = self.registry.push();
        let name = self
            .registry
            .name(index)
            .ok_or_else(|| BrawlerError::Internal(format!("клиент {} не зарегистрирован", index)))?;

        self.launcher.open(&name, geometry.width, geometry.height)?;

        let windows = &self.windows;
        let desktop = wait_for(self.poll_interval(), self.poll_timeout(), || windows.search_by_name(&name))
            .await?
            .ok_or_else(|| BrawlerError::WindowNotFound(format!("виртуальный рабочий стол {}", name)))?;
        info!("{}: виртуальный рабочий стол {}", name, desktop);
        self.resolver.set_desktop(index, desktop);

        self.windows.undecorate(desktop).await?;
        // Wine перерисовывает окно после снятия рамки
        sleep(Duration::from_millis(self.window_config.settle_delay_ms)).await;
        self.windows.resize(desktop, geometry.width, geometry.height).await?;
        self.windows.move_to(desktop, geometry.x, geometry.y).await?;
        info!("{}: размещён как {}", name, geometry);

        Ok(())
    }

    /// Начать дублирование клавиш и фоновый поиск недостающих окон
    pub fn listen(&mut self) -> Result<()> {
        self.duplicator
            .as_mut()
            .ok_or_else(|| BrawlerError::Internal("дублятор недоступен".to_string()))?
            .start(Arc::clone(&self.registry), Arc::clone(&self.allow_list))?;

        if self.resolver_task.is_none() {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let handle = Arc::clone(&self.resolver).spawn(self.poll_interval(), shutdown_rx);
            self.resolver_task = Some((shutdown_tx, handle));
        }

        Ok(())
    }

    /// Остановить дублирование и завершить процессы всех клиентов.
    /// Повторный вызов безопасен: завершённые клиенты пропускаются.
    pub async fn shutdown(&mut self) {
        info!("Завершение сессии");
        self.stop_duplicator().await;

        if let Some((shutdown_tx, handle)) = self.resolver_task.take() {
            let _ = shutdown_tx.send(true);
            if let Err(e) = handle.await {
                warn!("WindowResolver завершился с ошибкой: {}", e);
            }
        }

        for client in self.registry.snapshot() {
            let target = match client.handle {
                WindowHandle::Dead => continue,
                WindowHandle::Resolved(window) => Some(window),
                WindowHandle::Unresolved => self.resolver.desktop(client.index),
            };

            if let Some(window) = target {
                if let Err(e) = self.terminate(&client.name, window).await {
                    warn!("{}: не удалось завершить процесс: {}", client.name, e);
                }
            } else {
                warn!("{}: окно неизвестно, процесс не завершён", client.name);
            }

            self.registry.mark_dead(client.index);
        }
    }

    /// stop() ждёт поток перехватчика, поэтому выполняется вне потоков runtime
    async fn stop_duplicator(&mut self) {
        let Some(mut duplicator) = self.duplicator.take() else {
            return;
        };

        let stopped = tokio::task::spawn_blocking(move || {
            duplicator.stop();
            duplicator
        })
        .await;

        match stopped {
            Ok(duplicator) => self.duplicator = Some(duplicator),
            Err(e) => error!("Остановка дублятора завершилась с ошибкой: {}", e),
        }
    }

    async fn terminate(&self, name: &str, window: WindowId) -> Result<()> {
        match self.windows.window_pid(window).await? {
            Some(pid) => self.launcher.terminate(name, pid).await,
            None => BrawlerError::window_not_found(format!("_NET_WM_PID у окна {}", window)),
        }
    }
}
