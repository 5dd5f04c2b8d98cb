use crate::error::{BrawlerError, Result};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::randr::{self, ConnectionExt as _};

/// Разрешение в сухом режиме
const DRY_RUN_SIZE: (u32, u32) = (1920, 1080);

/// Монитор в том виде, в каком его описывает RandR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monitor {
    pub x: i32,
    pub width: u32,
    pub height: u32,
    pub primary: bool,
}

impl From<&randr::MonitorInfo> for Monitor {
    fn from(info: &randr::MonitorInfo) -> Self {
        Self {
            x: i32::from(info.x),
            width: u32::from(info.width),
            height: u32::from(info.height),
            primary: info.primary,
        }
    }
}

/// Геометрия основного монитора
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenInfo {
    pub width: u32,
    pub height: u32,
    /// Сдвиг по X, если основной монитор стоит не первым
    pub offset: i32,
}

impl ScreenInfo {
    pub fn detect(dry_run: bool) -> Result<Self> {
        if dry_run {
            let (width, height) = DRY_RUN_SIZE;
            info!("[DRY RUN] Экран {}x{}", width, height);
            return Ok(Self { width, height, offset: 0 });
        }

        let (conn, screen_num) = x11rb::connect(None)?;
        let root = conn.setup().roots[screen_num].root;
        let reply = conn.randr_get_monitors(root, true)?.reply()?;
        let monitors: Vec<Monitor> = reply.monitors.iter().map(Monitor::from).collect();
        debug!("Мониторы RandR: {:?}", monitors);

        let screen = Self::from_monitors(&monitors)?;
        info!("Экран {}x{}, сдвиг {}", screen.width, screen.height, screen.offset);
        Ok(screen)
    }

    /// Основной монитор; если он не отмечен, берётся первый
    pub fn from_monitors(monitors: &[Monitor]) -> Result<Self> {
        let primary = monitors
            .iter()
            .find(|m| m.primary)
            .or_else(|| monitors.first())
            .ok_or_else(|| BrawlerError::Environment("RandR не сообщил ни одного монитора".to_string()))?;

        let offset = if monitors.len() > 1 && primary.x > 0 {
            primary.x
        } else {
            0
        };

        Ok(Self {
            width: primary.width,
            height: primary.height,
            offset,
        })
    }
}
