use crate::error::Result;
use crate::events::WindowId;
use std::sync::Arc;

/// Операции над окнами X11
#[async_trait::async_trait]
pub trait WindowManager: Send + Sync {
    /// Первое окно с заданным именем
    async fn search_by_name(&self, name: &str) -> Result<Option<WindowId>>;

    /// Первое дочернее окно, в описании которого встречается `pattern`
    async fn find_child(&self, parent: WindowId, pattern: &str) -> Result<Option<WindowId>>;

    async fn resize(&self, window: WindowId, width: u32, height: u32) -> Result<()>;

    async fn move_to(&self, window: WindowId, x: i32, y: i32) -> Result<()>;

    /// Убрать рамку и заголовок через _MOTIF_WM_HINTS
    async fn undecorate(&self, window: WindowId) -> Result<()>;

    /// PID процесса-владельца окна (_NET_WM_PID)
    async fn window_pid(&self, window: WindowId) -> Result<Option<u32>>;
}

/// Factory function to create an appropriate window manager based on the dry_run flag
pub fn create_window_manager(dry_run: bool) -> Arc<dyn WindowManager> {
    if dry_run {
        Arc::new(super::dry_run::DryRunWindowManager::new())
    } else {
        Arc::new(super::xdotool::XdotoolWindowManager::new())
    }
}
