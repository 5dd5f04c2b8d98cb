use crate::debug_if_enabled;
use crate::error::{BrawlerError, Result};
use crate::events::{LogicalKey, WindowId};
use std::process::Command;

use super::r#trait::KeySender;

/// Синтетические клавиши через `xdotool key --window`
pub struct XdotoolKeySender;

impl XdotoolKeySender {
    pub fn new() -> Self {
        Self
    }

    fn command_args(window: WindowId, key: &LogicalKey) -> [String; 4] {
        [
            "key".to_string(),
            "--window".to_string(),
            window.to_string(),
            key.to_string(),
        ]
    }
}

impl KeySender for XdotoolKeySender {
    fn send_key(&self, window: WindowId, key: &LogicalKey) -> Result<()> {
        let args = Self::command_args(window, key);
        debug_if_enabled!("xdotool {}", args.join(" "));

        // Вызывается из потока перехватчика, поэтому синхронно
        let output = Command::new("xdotool").args(&args).output()?;
        if !output.status.success() {
            return Err(BrawlerError::command_failed(
                format!("xdotool {}", args.join(" ")),
                &output.stderr,
            ));
        }

        Ok(())
    }
}
