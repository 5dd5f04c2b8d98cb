use crate::error::Result;
use crate::events::RawKeyEvent;
use crate::services::key_decoder::{KeyboardMapping, ENTER_KEYCODE};
use std::ops::ControlFlow;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::r#trait::{EventTap, PayloadHandler, TapWaker};

enum TapMessage {
    Payload(Vec<RawKeyEvent>),
    Wake,
}

/// Перехватчик, получающий события из канала вместо X-сервера
pub struct ChannelEventTap {
    mapping: KeyboardMapping,
    sender: Sender<TapMessage>,
    receiver: Receiver<TapMessage>,
    running: Arc<AtomicBool>,
    heartbeat: Option<Duration>,
}

/// Источник событий для ChannelEventTap
#[derive(Clone)]
pub struct PayloadInjector {
    sender: Sender<TapMessage>,
    running: Arc<AtomicBool>,
}

impl PayloadInjector {
    /// false, если перехватчик уже уничтожен
    pub fn inject(&self, payload: Vec<RawKeyEvent>) -> bool {
        self.sender.send(TapMessage::Payload(payload)).is_ok()
    }

    /// Крутится ли сейчас цикл приёма
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

struct ChannelWaker {
    sender: Sender<TapMessage>,
}

impl TapWaker for ChannelWaker {
    fn wake(&self) {
        let _ = self.sender.send(TapMessage::Wake);
    }
}

impl ChannelEventTap {
    pub fn new(mapping: KeyboardMapping) -> (Self, PayloadInjector) {
        let (sender, receiver) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(false));
        let injector = PayloadInjector {
            sender: sender.clone(),
            running: Arc::clone(&running),
        };
        let tap = Self {
            mapping,
            sender,
            receiver,
            running,
            heartbeat: None,
        };
        (tap, injector)
    }

    /// Эмулировать нажатие Enter, если событий не было дольше `interval`
    pub fn with_heartbeat(mut self, interval: Duration) -> Self {
        self.heartbeat = Some(interval);
        self
    }

    fn next_message(&self) -> Option<TapMessage> {
        match self.heartbeat {
            None => self.receiver.recv().ok(),
            Some(interval) => match self.receiver.recv_timeout(interval) {
                Ok(message) => Some(message),
                Err(RecvTimeoutError::Timeout) => {
                    debug!("Dry-run: эмулируем нажатие Enter");
                    Some(TapMessage::Payload(vec![RawKeyEvent::press(ENTER_KEYCODE)]))
                }
                Err(RecvTimeoutError::Disconnected) => None,
            },
        }
    }
}

impl EventTap for ChannelEventTap {
    fn keyboard_mapping(&self) -> Result<KeyboardMapping> {
        Ok(self.mapping.clone())
    }

    fn waker(&self) -> Arc<dyn TapWaker> {
        Arc::new(ChannelWaker {
            sender: self.sender.clone(),
        })
    }

    fn run(&mut self, handler: &mut PayloadHandler<'_>) -> Result<()> {
        // Всё, что пришло до запуска (включая старые wake), не буферизуется
        while self.receiver.try_recv().is_ok() {}
        self.running.store(true, Ordering::SeqCst);

        info!("ChannelEventTap запущен");
        if handler(Vec::new()).is_continue() {
            while let Some(message) = self.next_message() {
                match message {
                    TapMessage::Payload(payload) => {
                        if handler(payload).is_break() {
                            break;
                        }
                    }
                    TapMessage::Wake => break,
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("ChannelEventTap остановлен");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payloads_reach_handler_until_wake() {
        let (mut tap, injector) = ChannelEventTap::new(KeyboardMapping::default());
        let waker = tap.waker();

        let mut seen = Vec::new();
        let handle = std::thread::spawn(move || {
            let result = tap.run(&mut |payload| {
                seen.extend(payload);
                ControlFlow::Continue(())
            });
            result.map(|_| seen)
        });

        // Пачки, пришедшие до старта цикла, отбрасываются
        while !injector.is_running() {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(injector.inject(vec![RawKeyEvent::press(38), RawKeyEvent::release(38)]));
        std::thread::sleep(Duration::from_millis(50));
        waker.wake();

        let seen = handle.join().unwrap().unwrap();
        assert_eq!(seen, vec![RawKeyEvent::press(38), RawKeyEvent::release(38)]);
    }

    #[test]
    fn test_break_ends_run() {
        let (mut tap, injector) = ChannelEventTap::new(KeyboardMapping::default());
        let handle = std::thread::spawn(move || {
            let mut calls = 0;
            let result = tap.run(&mut |payload| {
                if payload.is_empty() {
                    return ControlFlow::Continue(());
                }
                calls += 1;
                ControlFlow::Break(())
            });
            result.map(|_| calls)
        });

        while !injector.is_running() {
            std::thread::sleep(Duration::from_millis(5));
        }
        injector.inject(vec![RawKeyEvent::press(38)]);
        injector.inject(vec![RawKeyEvent::press(39)]);

        assert_eq!(handle.join().unwrap().unwrap(), 1);
    }

    #[test]
    fn test_heartbeat_emulates_enter() {
        let (tap, _injector) = ChannelEventTap::new(KeyboardMapping::default());
        let mut tap = tap.with_heartbeat(Duration::from_millis(10));

        let mut payloads = Vec::new();
        tap.run(&mut |payload| {
            if payload.is_empty() {
                return ControlFlow::Continue(());
            }
            payloads.push(payload);
            ControlFlow::Break(())
        })
        .unwrap();

        assert_eq!(payloads, vec![vec![RawKeyEvent::press(ENTER_KEYCODE)]]);
    }

    #[test]
    fn test_first_batch_is_empty_and_can_end_run() {
        let (mut tap, injector) = ChannelEventTap::new(KeyboardMapping::default());
        let waker = tap.waker();

        // Wake до запуска отбрасывается очисткой канала
        waker.wake();
        let mut batches = Vec::new();
        tap.run(&mut |payload| {
            batches.push(payload);
            ControlFlow::Break(())
        })
        .unwrap();

        assert_eq!(batches, vec![Vec::new()]);
        assert!(!injector.is_running());
    }
}
