//! Перехват клавиатуры на уровне X-сервера
//!
//! Модуль отвечает ТОЛЬКО за получение сырых событий клавиатуры и снимок
//! раскладки. Декодирование, фильтрация и рассылка живут в Duplicator.

mod channel_tap;
mod x11_record;
mod r#trait;

#[cfg(test)]
pub use self::channel_tap::{ChannelEventTap, PayloadInjector};
pub use self::r#trait::{create_event_tap_factory, EventTap, EventTapFactory, TapWaker};
