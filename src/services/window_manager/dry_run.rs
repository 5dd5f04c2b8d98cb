use crate::error::Result;
use crate::events::WindowId;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::info;

use super::r#trait::WindowManager;

/// Первый id, который выдаёт сухой режим
const FIRST_FAKE_WINDOW: u32 = 0x0100_0000;
/// PID, который сухой режим сообщает для любого окна
const FAKE_PID: u32 = 4242;

/// Ничего не трогает, только логирует и выдаёт стабильные фиктивные id
pub struct DryRunWindowManager {
    windows: Mutex<HashMap<String, WindowId>>,
}

impl DryRunWindowManager {
    pub fn new() -> Self {
        info!("Инициализация DryRunWindowManager");
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn fake_window(&self, key: String) -> WindowId {
        let mut windows = self.windows.lock();
        let next = WindowId(FIRST_FAKE_WINDOW + windows.len() as u32);
        *windows.entry(key).or_insert(next)
    }
}

#[async_trait::async_trait]
impl WindowManager for DryRunWindowManager {
    async fn search_by_name(&self, name: &str) -> Result<Option<WindowId>> {
        let window = self.fake_window(name.to_string());
        info!("[DRY RUN] Окно {} -> {}", name, window);
        Ok(Some(window))
    }

    async fn find_child(&self, parent: WindowId, pattern: &str) -> Result<Option<WindowId>> {
        let window = self.fake_window(format!("{}/{}", parent, pattern));
        info!("[DRY RUN] Дочернее окно {} у {} -> {}", pattern, parent, window);
        Ok(Some(window))
    }

    async fn resize(&self, window: WindowId, width: u32, height: u32) -> Result<()> {
        info!("[DRY RUN] Размер окна {}: {}x{}", window, width, height);
        Ok(())
    }

    async fn move_to(&self, window: WindowId, x: i32, y: i32) -> Result<()> {
        info!("[DRY RUN] Перемещение окна {} в {},{}", window, x, y);
        Ok(())
    }

    async fn undecorate(&self, window: WindowId) -> Result<()> {
        info!("[DRY RUN] Снятие декораций с окна {}", window);
        Ok(())
    }

    async fn window_pid(&self, window: WindowId) -> Result<Option<u32>> {
        info!("[DRY RUN] PID окна {} -> {}", window, FAKE_PID);
        Ok(Some(FAKE_PID))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_windows_are_stable_and_distinct() {
        let manager = DryRunWindowManager::new();

        let first = manager.search_by_name("client_0").await.unwrap();
        let second = manager.search_by_name("client_1").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(manager.search_by_name("client_0").await.unwrap(), first);

        let child = manager.find_child(first.unwrap(), "ime").await.unwrap();
        assert!(child.is_some());
        assert_ne!(child, first);
    }
}
