use crate::error::Result;
use crate::events::{LogicalKey, WindowId};
use tracing::info;

use super::r#trait::KeySender;

pub struct DryRunKeySender;

impl DryRunKeySender {
    pub fn new() -> Self {
        info!("Инициализация DryRunKeySender");
        Self
    }
}

impl KeySender for DryRunKeySender {
    fn send_key(&self, window: WindowId, key: &LogicalKey) -> Result<()> {
        info!("[DRY RUN] Клавиша {} -> окно {}", key, window);
        Ok(())
    }
}
