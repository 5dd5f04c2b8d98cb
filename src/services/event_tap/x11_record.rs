use crate::debug_if_enabled;
use crate::error::{BrawlerError, Result};
use crate::events::{KeyState, Modifiers, RawKeyEvent};
use crate::services::key_decoder::KeyboardMapping;
use std::sync::Arc;
use tracing::{debug, info, warn};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::record::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{self, ConnectionExt as _};
use x11rb::rust_connection::RustConnection;
use x11rb::x11_utils::TryParse;

use super::r#trait::{EventTap, PayloadHandler, TapWaker};

/// Размер core-события X11 на проводе
const EVENT_SIZE: usize = 32;
/// Бит "событие отправлено через SendEvent"
const SEND_EVENT_BIT: u8 = 0x80;

// Категории ответов RecordEnableContext
const CATEGORY_FROM_SERVER: u8 = 0;
const CATEGORY_START_OF_DATA: u8 = 4;
const CATEGORY_END_OF_DATA: u8 = 5;

/// Перехватчик клавиатуры через расширение RECORD
///
/// Две отдельные связи с сервером: на `data` включается контекст записи и
/// блокирующе читаются ответы, через `ctrl` контекст создаётся и выключается.
pub struct X11RecordTap {
    ctrl: Arc<RustConnection>,
    data: RustConnection,
    context: record::Context,
    mapping: KeyboardMapping,
}

impl X11RecordTap {
    pub fn connect() -> Result<Self> {
        info!("Инициализация X11RecordTap");

        let (ctrl, _) = x11rb::connect(None)?;
        let (data, _) = x11rb::connect(None)?;

        if ctrl.extension_information(record::X11_EXTENSION_NAME)?.is_none() {
            return Err(BrawlerError::ExtensionMissing(
                "RECORD не поддерживается X-сервером (нужен модуль record в xorg.conf)".to_string(),
            ));
        }

        let version = ctrl.record_query_version(1, 13)?.reply()?;
        info!("RECORD версии {}.{}", version.major_version, version.minor_version);

        let mapping = Self::fetch_keyboard_mapping(&ctrl)?;

        let context = ctrl.generate_id()?;
        ctrl.record_create_context(
            context,
            0,
            &[u32::from(record::CS::ALL_CLIENTS)],
            &[Self::key_range()],
        )?
        .check()?;
        debug!("Создан контекст записи {:#x}", context);

        Ok(Self {
            ctrl: Arc::new(ctrl),
            data,
            context,
            mapping,
        })
    }

    /// Только KeyPress..KeyRelease от устройств, остальное не записываем
    fn key_range() -> record::Range {
        let empty = record::Range8 { first: 0, last: 0 };
        let empty_ext = record::ExtRange {
            major: empty,
            minor: record::Range16 { first: 0, last: 0 },
        };

        record::Range {
            core_requests: empty,
            core_replies: empty,
            ext_requests: empty_ext,
            ext_replies: empty_ext,
            delivered_events: empty,
            device_events: record::Range8 {
                first: xproto::KEY_PRESS_EVENT,
                last: xproto::KEY_RELEASE_EVENT,
            },
            errors: empty,
            client_started: false,
            client_died: false,
        }
    }

    fn fetch_keyboard_mapping(conn: &RustConnection) -> Result<KeyboardMapping> {
        let setup = conn.setup();
        let (min_keycode, max_keycode) = (setup.min_keycode, setup.max_keycode);

        let reply = conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()?;
        debug!(
            "Раскладка: keycode {}..={}, {} keysym на keycode",
            min_keycode, max_keycode, reply.keysyms_per_keycode
        );

        Ok(KeyboardMapping::new(
            min_keycode,
            reply.keysyms_per_keycode,
            reply.keysyms,
        ))
    }

    fn disable_context(ctrl: &RustConnection, context: record::Context) -> Result<()> {
        ctrl.record_disable_context(context)?;
        ctrl.flush()?;
        Ok(())
    }
}

struct X11RecordWaker {
    ctrl: Arc<RustConnection>,
    context: record::Context,
}

impl TapWaker for X11RecordWaker {
    fn wake(&self) {
        // Сервер ответит EndOfData, и цикл приёма завершится
        if let Err(e) = X11RecordTap::disable_context(&self.ctrl, self.context) {
            warn!("Не удалось выключить контекст записи: {}", e);
        }
    }
}

impl EventTap for X11RecordTap {
    fn keyboard_mapping(&self) -> Result<KeyboardMapping> {
        Ok(self.mapping.clone())
    }

    fn waker(&self) -> Arc<dyn TapWaker> {
        Arc::new(X11RecordWaker {
            ctrl: Arc::clone(&self.ctrl),
            context: self.context,
        })
    }

    fn run(&mut self, handler: &mut PayloadHandler<'_>) -> Result<()> {
        info!("X11RecordTap: включаем контекст записи {:#x}", self.context);

        let mut draining = false;
        for reply in self.data.record_enable_context(self.context)? {
            let reply = reply?;

            match reply.category {
                CATEGORY_START_OF_DATA => {
                    debug!("Запись клавиатуры началась");
                    // Контекст уже включён: выключение после этой точки не потеряется
                    if !draining && handler(Vec::new()).is_break() {
                        draining = true;
                        Self::disable_context(&self.ctrl, self.context)?;
                    }
                }
                CATEGORY_END_OF_DATA => break,
                CATEGORY_FROM_SERVER if !draining => {
                    if reply.client_swapped {
                        warn!("Пропускаем ответ с обратным порядком байт");
                        continue;
                    }

                    if handler(parse_record_payload(&reply.data)).is_break() {
                        // Дочитываем поток до EndOfData, не обрабатывая события
                        draining = true;
                        Self::disable_context(&self.ctrl, self.context)?;
                    }
                }
                _ => {}
            }
        }

        info!("X11RecordTap: запись клавиатуры остановлена");
        Ok(())
    }
}

impl Drop for X11RecordTap {
    fn drop(&mut self) {
        info!("Освобождение контекста записи");
        let freed = self
            .ctrl
            .record_free_context(self.context)
            .and_then(|_| self.ctrl.flush());
        if let Err(e) = freed {
            warn!("Не удалось освободить контекст записи: {}", e);
        }
    }
}

/// Разобрать данные ответа RECORD: пачку 32-байтных core-событий.
/// KeyPress/KeyRelease превращаются в RawKeyEvent, остальное пропускается.
pub fn parse_record_payload(mut data: &[u8]) -> Vec<RawKeyEvent> {
    let mut events = Vec::new();

    while data.len() >= EVENT_SIZE {
        let state = match data[0] & !SEND_EVENT_BIT {
            xproto::KEY_PRESS_EVENT => Some(KeyState::Pressed),
            xproto::KEY_RELEASE_EVENT => Some(KeyState::Released),
            _ => None,
        };

        if let Some(state) = state {
            match xproto::KeyPressEvent::try_parse(data) {
                Ok((event, _)) => {
                    let raw = RawKeyEvent::new(
                        event.detail,
                        state,
                        Modifiers::from_x11_mask(u16::from(event.state)),
                        event.time,
                    );
                    debug_if_enabled!("Получено событие: {}", raw);
                    events.push(raw);
                }
                Err(e) => {
                    warn!("Не удалось разобрать событие клавиатуры: {}", e);
                    break;
                }
            }
        } else {
            debug_if_enabled!("Пропускаем событие типа {}", data[0]);
        }

        data = &data[EVENT_SIZE..];
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 32-байтное core-событие клавиатуры в порядке байт клиента
    fn key_event_bytes(kind: u8, keycode: u8, state: u16, time: u32) -> Vec<u8> {
        let mut bytes = vec![0u8; EVENT_SIZE];
        bytes[0] = kind;
        bytes[1] = keycode;
        bytes[4..8].copy_from_slice(&time.to_ne_bytes());
        bytes[28..30].copy_from_slice(&state.to_ne_bytes());
        bytes[30] = 1;
        bytes
    }

    #[test]
    fn test_parse_batched_payload() {
        let mut data = key_event_bytes(xproto::KEY_PRESS_EVENT, 38, 0x0004, 1000);
        data.extend(key_event_bytes(xproto::KEY_RELEASE_EVENT, 38, 0x0004, 1010));
        data.extend(key_event_bytes(xproto::KEY_PRESS_EVENT, 36, 0, 1020));

        let events = parse_record_payload(&data);

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].keycode, 38);
        assert!(events[0].is_press());
        assert!(events[0].modifiers.ctrl);
        assert_eq!(events[0].time, 1000);
        assert_eq!(events[1].state, KeyState::Released);
        assert_eq!(events[2].keycode, 36);
    }

    #[test]
    fn test_non_key_events_are_skipped() {
        // MotionNotify (6) между двумя нажатиями
        let mut data = key_event_bytes(xproto::KEY_PRESS_EVENT, 38, 0, 1);
        data.extend(key_event_bytes(6, 0, 0, 2));
        data.extend(key_event_bytes(xproto::KEY_PRESS_EVENT, 39, 0, 3));

        let keycodes: Vec<u8> = parse_record_payload(&data).iter().map(|e| e.keycode).collect();
        assert_eq!(keycodes, vec![38, 39]);
    }

    #[test]
    fn test_send_event_bit_and_truncated_tail() {
        let mut data = key_event_bytes(xproto::KEY_PRESS_EVENT | SEND_EVENT_BIT, 40, 0, 1);
        data.extend([xproto::KEY_PRESS_EVENT, 41, 0, 0]);

        let events = parse_record_payload(&data);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].keycode, 40);
    }

    #[test]
    fn test_empty_payload() {
        assert!(parse_record_payload(&[]).is_empty());
    }
}
