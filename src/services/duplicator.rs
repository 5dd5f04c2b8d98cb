use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::RawKeyEvent;
use crate::services::allow_list::AllowList;
use crate::services::client_registry::ClientRegistry;
use crate::services::dispatcher::Dispatcher;
use crate::services::event_tap::{EventTap, EventTapFactory, TapWaker};
use crate::services::key_decoder::KeyDecoder;
use crate::services::key_sender::KeySender;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Флаг "дублятор слушает клавиатуру", общий для контроллера и потока приёма
#[derive(Debug, Default)]
pub struct ListeningState {
    active: AtomicBool,
}

impl ListeningState {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn activate(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    /// Возвращает предыдущее значение
    fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::SeqCst)
    }
}

/// Декодирование -> фильтр -> рассылка для каждой пачки событий
pub struct KeyPipeline {
    decoder: KeyDecoder,
    allow_list: Arc<AllowList>,
    dispatcher: Dispatcher,
}

impl KeyPipeline {
    pub fn new(decoder: KeyDecoder, allow_list: Arc<AllowList>, dispatcher: Dispatcher) -> Self {
        Self {
            decoder,
            allow_list,
            dispatcher,
        }
    }

    pub fn handle_payload(&self, payload: Vec<RawKeyEvent>) {
        for event in payload {
            // Отпускания не дублируются: xdotool key шлёт нажатие и отпускание сам
            if !event.is_press() {
                continue;
            }

            let Some(key) = self.decoder.decode(event.keycode) else {
                debug_if_enabled!("Keycode {} не декодируется", event.keycode);
                continue;
            };
            debug_if_enabled!("Нажата клавиша: {}, код: {}", key, event.keycode);

            if !self.allow_list.is_allowed(&key) {
                continue;
            }
            debug_if_enabled!("Клавиша {} разрешена к дублированию", key);

            let report = self.dispatcher.dispatch(&key);
            debug_if_enabled!(
                "Клавиша {}: доставлено {}, пропущено {}, ошибок {}",
                key, report.delivered, report.skipped, report.failed
            );
        }
    }
}

enum TapSlot {
    /// Перехватчик ещё не создавался или был потерян после ошибки
    Empty,
    Idle(Box<dyn EventTap>),
    Running {
        handle: JoinHandle<Option<Box<dyn EventTap>>>,
        waker: Arc<dyn TapWaker>,
    },
}

/// Дублятор клавиш: владеет перехватчиком и потоком приёма
pub struct Duplicator {
    factory: EventTapFactory,
    sender: Arc<dyn KeySender>,
    state: Arc<ListeningState>,
    slot: TapSlot,
}

impl Duplicator {
    pub fn new(factory: EventTapFactory, sender: Arc<dyn KeySender>) -> Self {
        Self {
            factory,
            sender,
            state: Arc::new(ListeningState::default()),
            slot: TapSlot::Empty,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.state.is_active()
    }

    /// Начать дублирование. Повторный вызов во время прослушивания ничего не делает.
    /// Ошибка создания перехватчика возвращается вызывающему, состояние остаётся "не слушает".
    pub fn start(&mut self, registry: Arc<ClientRegistry>, allow_list: Arc<AllowList>) -> Result<()> {
        if self.is_listening() {
            debug!("Дублятор уже слушает клавиатуру");
            return Ok(());
        }

        // Поток мог завершиться сам после ошибки чтения
        self.reap_finished();

        let tap = match std::mem::replace(&mut self.slot, TapSlot::Empty) {
            TapSlot::Idle(tap) => tap,
            TapSlot::Empty => {
                info!("Инициализация перехватчика клавиатуры");
                (self.factory)()?
            }
            running @ TapSlot::Running { .. } => {
                self.slot = running;
                return Ok(());
            }
        };

        let mapping = match tap.keyboard_mapping() {
            Ok(mapping) => mapping,
            Err(e) => {
                self.slot = TapSlot::Idle(tap);
                return Err(e);
            }
        };

        let pipeline = KeyPipeline::new(
            KeyDecoder::new(mapping),
            allow_list,
            Dispatcher::new(registry, Arc::clone(&self.sender)),
        );
        let waker = tap.waker();

        self.state.activate();
        let state = Arc::clone(&self.state);
        let spawned = thread::Builder::new()
            .name("brawler-key-tap".to_string())
            .spawn(move || Self::receive_loop(tap, pipeline, state));

        match spawned {
            Ok(handle) => {
                info!("Дублирование клавиш запущено");
                self.slot = TapSlot::Running { handle, waker };
                Ok(())
            }
            Err(e) => {
                self.state.deactivate();
                Err(e.into())
            }
        }
    }

    /// Остановить дублирование и дождаться завершения потока приёма.
    /// После возврата новых рассылок не будет.
    pub fn stop(&mut self) {
        let was_active = self.state.deactivate();

        match std::mem::replace(&mut self.slot, TapSlot::Empty) {
            TapSlot::Running { handle, waker } => {
                if was_active {
                    info!("Остановка дублирования клавиш");
                }
                waker.wake();
                self.slot = Self::join(handle);
            }
            other => {
                self.slot = other;
                debug!("Дублятор не слушает клавиатуру, остановка не требуется");
            }
        }
    }

    fn reap_finished(&mut self) {
        if matches!(&self.slot, TapSlot::Running { handle, .. } if handle.is_finished()) {
            if let TapSlot::Running { handle, .. } = std::mem::replace(&mut self.slot, TapSlot::Empty) {
                self.slot = Self::join(handle);
            }
        }
    }

    fn join(handle: JoinHandle<Option<Box<dyn EventTap>>>) -> TapSlot {
        match handle.join() {
            Ok(Some(tap)) => TapSlot::Idle(tap),
            Ok(None) => TapSlot::Empty,
            Err(_) => {
                error!("Поток приёма клавиш завершился паникой");
                TapSlot::Empty
            }
        }
    }

    fn receive_loop(
        mut tap: Box<dyn EventTap>,
        pipeline: KeyPipeline,
        state: Arc<ListeningState>,
    ) -> Option<Box<dyn EventTap>> {
        info!("Начинаем слушать клавиатуру");

        let result = tap.run(&mut |payload| {
            // Флаг проверяется один раз на пачку событий
            if !state.is_active() {
                return ControlFlow::Break(());
            }
            pipeline.handle_payload(payload);
            ControlFlow::Continue(())
        });

        if state.deactivate() {
            warn!("Поток событий клавиатуры закончился без команды остановки");
        }

        match result {
            Ok(()) => Some(tap),
            Err(e) => {
                error!("Ошибка перехвата клавиатуры: {}", e);
                None
            }
        }
    }
}

impl Drop for Duplicator {
    fn drop(&mut self) {
        self.stop();
    }
}
