use crate::error::Result;
use crate::events::RawKeyEvent;
use crate::services::key_decoder::KeyboardMapping;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

/// Обработчик одной пачки событий; Break завершает цикл приёма
pub type PayloadHandler<'a> = dyn FnMut(Vec<RawKeyEvent>) -> ControlFlow<()> + 'a;

/// Будит заблокированный цикл приёма, чтобы тот завершился
pub trait TapWaker: Send + Sync {
    fn wake(&self);
}

/// Подписка на поток низкоуровневых событий клавиатуры
pub trait EventTap: Send {
    /// Снимок раскладки, на которой будут декодироваться keycode'ы
    fn keyboard_mapping(&self) -> Result<KeyboardMapping>;

    fn waker(&self) -> Arc<dyn TapWaker>;

    /// Блокирующий цикл приёма. Возвращается, когда поток событий закончился
    /// (после wake()) или обработчик вернул Break.
    ///
    /// Как только поток событий пошёл, обработчик один раз вызывается с пустой
    /// пачкой: wake(), отправленный раньше, мог не дойти, и Break здесь его заменяет.
    fn run(&mut self, handler: &mut PayloadHandler<'_>) -> Result<()>;
}

pub type EventTapFactory = Box<dyn Fn() -> Result<Box<dyn EventTap>> + Send + Sync>;

/// Интервал эмуляции нажатий в dry-run режиме
const DRY_RUN_HEARTBEAT: Duration = Duration::from_secs(5);

/// Factory function to create an appropriate event tap based on the dry_run flag
pub fn create_event_tap_factory(dry_run: bool) -> EventTapFactory {
    if dry_run {
        Box::new(|| {
            let (tap, _injector) = super::channel_tap::ChannelEventTap::new(KeyboardMapping::default());
            Ok(Box::new(tap.with_heartbeat(DRY_RUN_HEARTBEAT)) as Box<dyn EventTap>)
        })
    } else {
        Box::new(|| Ok(Box::new(super::x11_record::X11RecordTap::connect()?) as Box<dyn EventTap>))
    }
}
