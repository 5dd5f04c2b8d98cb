use crate::debug_if_enabled;
use crate::events::{LogicalKey, WindowHandle};
use crate::services::client_registry::ClientRegistry;
use crate::services::key_sender::KeySender;
use std::sync::Arc;
use tracing::warn;

/// Итог одной рассылки
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Рассылает клавишу всем toon-клиентам по порядку реестра
pub struct Dispatcher {
    registry: Arc<ClientRegistry>,
    sender: Arc<dyn KeySender>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ClientRegistry>, sender: Arc<dyn KeySender>) -> Self {
        Self { registry, sender }
    }

    /// Последовательная доставка клиентам с индексом >= 1.
    /// Ошибка доставки одному клиенту не мешает остальным, повторов нет.
    pub fn dispatch(&self, key: &LogicalKey) -> DispatchReport {
        let mut report = DispatchReport::default();

        // Один снимок на всю рассылку
        for client in self.registry.snapshot().iter().skip(1) {
            let window = match client.handle {
                WindowHandle::Resolved(window) => window,
                WindowHandle::Unresolved | WindowHandle::Dead => {
                    debug_if_enabled!("{}: окно недоступно ({}), пропускаем {}", client.name, client.handle, key);
                    report.skipped += 1;
                    continue;
                }
            };

            match self.sender.send_key(window, key) {
                Ok(()) => {
                    debug_if_enabled!("{}: клавиша {} отправлена в окно {}", client.name, key, window);
                    report.delivered += 1;
                }
                Err(e) => {
                    warn!("{}: не удалось отправить клавишу {}: {}", client.name, key, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{BrawlerError, Result};
    use crate::events::WindowId;
    use parking_lot::Mutex;

    /// Запоминает все отправки; окна из `failing` возвращают ошибку
    #[derive(Default)]
    pub(crate) struct RecordingSender {
        pub calls: Mutex<Vec<(WindowId, String)>>,
        pub failing: Vec<WindowId>,
    }

    impl RecordingSender {
        pub fn failing(windows: Vec<WindowId>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failing: windows,
            }
        }

        pub fn calls(&self) -> Vec<(WindowId, String)> {
            self.calls.lock().clone()
        }
    }

    impl KeySender for RecordingSender {
        fn send_key(&self, window: WindowId, key: &LogicalKey) -> Result<()> {
            self.calls.lock().push((window, key.to_string()));
            if self.failing.contains(&window) {
                return Err(BrawlerError::Internal(format!("окно {} закрыто", window)));
            }
            Ok(())
        }
    }

    /// Реестр из `count` клиентов, клиент i получает окно 100 + i
    pub(crate) fn resolved_registry(count: usize) -> Arc<ClientRegistry> {
        let registry = Arc::new(ClientRegistry::new());
        for _ in 0..count {
            let index = registry.push();
            registry.resolve(index, WindowId(100 + index as u32));
        }
        registry
    }

    #[test]
    fn test_dispatch_in_registry_order_excluding_primary() {
        let sender = Arc::new(RecordingSender::default());
        let dispatcher = Dispatcher::new(resolved_registry(4), sender.clone());

        let report = dispatcher.dispatch(&LogicalKey::from("a"));

        assert_eq!(report, DispatchReport { delivered: 3, skipped: 0, failed: 0 });
        assert_eq!(
            sender.calls(),
            vec![
                (WindowId(101), "a".to_string()),
                (WindowId(102), "a".to_string()),
                (WindowId(103), "a".to_string()),
            ]
        );
    }

    #[test]
    fn test_unresolved_and_dead_clients_are_skipped() {
        let registry = Arc::new(ClientRegistry::new());
        for _ in 0..4 {
            registry.push();
        }
        registry.resolve(0, WindowId(100));
        registry.resolve(2, WindowId(102));
        registry.resolve(3, WindowId(103));
        registry.mark_dead(3);

        let sender = Arc::new(RecordingSender::default());
        let report = Dispatcher::new(registry, sender.clone()).dispatch(&LogicalKey::from("Enter"));

        assert_eq!(report, DispatchReport { delivered: 1, skipped: 2, failed: 0 });
        assert_eq!(sender.calls(), vec![(WindowId(102), "Enter".to_string())]);
    }

    #[test]
    fn test_failed_delivery_does_not_stop_fanout() {
        let sender = Arc::new(RecordingSender::failing(vec![WindowId(101)]));
        let dispatcher = Dispatcher::new(resolved_registry(3), sender.clone());

        let report = dispatcher.dispatch(&LogicalKey::from("1"));

        assert_eq!(report, DispatchReport { delivered: 1, skipped: 0, failed: 1 });
        assert_eq!(sender.calls().len(), 2);
        assert_eq!(sender.calls()[1].0, WindowId(102));
    }

    #[test]
    fn test_primary_only_registry() {
        let sender = Arc::new(RecordingSender::default());
        let report = Dispatcher::new(resolved_registry(1), sender.clone()).dispatch(&LogicalKey::from("a"));

        assert_eq!(report, DispatchReport::default());
        assert!(sender.calls().is_empty());
    }
}
