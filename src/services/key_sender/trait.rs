use crate::error::Result;
use crate::events::{LogicalKey, WindowId};
use std::sync::Arc;

/// Отправка синтетической клавиши в конкретное окно
pub trait KeySender: Send + Sync {
    /// Fire-and-forget: подтверждения от окна нет
    fn send_key(&self, window: WindowId, key: &LogicalKey) -> Result<()>;
}

/// Factory function to create an appropriate key sender based on the dry_run flag
pub fn create_key_sender(dry_run: bool) -> Arc<dyn KeySender> {
    if dry_run {
        Arc::new(super::dry_run::DryRunKeySender::new())
    } else {
        Arc::new(super::xdotool::XdotoolKeySender::new())
    }
}
