use crate::events::{WindowHandle, WindowId};
use parking_lot::RwLock;
use std::fmt;
use tracing::{debug, info};

/// Клиент: один запущенный экземпляр игры
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub index: usize,
    pub name: String,
    pub handle: WindowHandle,
}

impl Client {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            name: Self::name_for(index),
            handle: WindowHandle::Unresolved,
        }
    }

    /// Имя клиента, оно же имя виртуального рабочего стола Wine
    pub fn name_for(index: usize) -> String {
        format!("client_{}", index)
    }

    /// Первый клиент - источник клавиш, остальные их получают
    pub fn is_primary(&self) -> bool {
        self.index == 0
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = if self.is_primary() { "master" } else { "toon" };
        write!(f, "{} ({}, {})", self.name, role, self.handle)
    }
}

/// Упорядоченный реестр клиентов
///
/// Только добавление: порядок вставки = порядок запуска = порядок рассылки.
/// Меняться во время сессии может лишь состояние окна клиента.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<Vec<Client>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавить клиента, вернуть его индекс
    pub fn push(&self) -> usize {
        let mut clients = self.clients.write();
        let index = clients.len();
        let client = Client::new(index);
        debug!("Регистрация клиента {}", client);
        clients.push(client);
        index
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }

    pub fn handle(&self, index: usize) -> Option<WindowHandle> {
        self.clients.read().get(index).map(|c| c.handle)
    }

    pub fn name(&self, index: usize) -> Option<String> {
        self.clients.read().get(index).map(|c| c.name.clone())
    }

    /// Привязать окно; мёртвый клиент не воскрешается
    pub fn resolve(&self, index: usize, window: WindowId) -> bool {
        let mut clients = self.clients.write();
        match clients.get_mut(index) {
            Some(client) if client.handle != WindowHandle::Dead => {
                info!("{}: окно игры найдено: {}", client.name, window);
                client.handle = WindowHandle::Resolved(window);
                true
            }
            _ => false,
        }
    }

    pub fn mark_dead(&self, index: usize) {
        if let Some(client) = self.clients.write().get_mut(index) {
            debug!("{}: помечен как завершённый", client.name);
            client.handle = WindowHandle::Dead;
        }
    }

    /// Согласованный снимок реестра
    pub fn snapshot(&self) -> Vec<Client> {
        self.clients.read().clone()
    }

    /// Индексы клиентов, окно которых ещё не найдено
    pub fn unresolved(&self) -> Vec<usize> {
        self.clients
            .read()
            .iter()
            .filter(|c| c.handle == WindowHandle::Unresolved)
            .map(|c| c.index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_ordinals_and_roles() {
        let registry = ClientRegistry::new();
        assert_eq!(registry.push(), 0);
        assert_eq!(registry.push(), 1);
        assert_eq!(registry.push(), 2);

        let clients = registry.snapshot();
        assert!(clients[0].is_primary());
        assert!(!clients[1].is_primary());
        assert_eq!(clients[2].name, "client_2");
        assert_eq!(registry.unresolved(), vec![0, 1, 2]);
    }

    #[test]
    fn test_handle_state_machine() {
        let registry = ClientRegistry::new();
        registry.push();
        registry.push();

        assert!(registry.resolve(1, WindowId(100)));
        assert_eq!(registry.handle(1), Some(WindowHandle::Resolved(WindowId(100))));
        assert_eq!(registry.unresolved(), vec![0]);

        registry.mark_dead(1);
        assert_eq!(registry.handle(1), Some(WindowHandle::Dead));
        assert!(!registry.resolve(1, WindowId(101)));
        assert_eq!(registry.handle(1), Some(WindowHandle::Dead));
        assert!(!registry.resolve(5, WindowId(1)));
    }

    #[test]
    fn test_client_display() {
        let mut client = Client::new(1);
        client.handle = WindowHandle::Resolved(WindowId(42));
        assert_eq!(client.to_string(), "client_1 (toon, window 42)");
    }
}
