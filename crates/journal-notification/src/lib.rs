//! # Journal Notification
//!
//! 트리거 알림 타입 및 전송 채널.
//!
//! 포지션 모니터가 생성한 알림을 구독자에게 전달합니다. 호스트가
//! 대화형 저널이므로 Telegram 전송기를 기본 채널로 제공하며,
//! [`AlertSubscriber`]를 구현하면 어떤 채널이든 등록할 수 있습니다.

pub mod telegram;
pub mod types;

pub use telegram::{TelegramConfig, TelegramSender};
pub use types::{AlertPriority, AlertSubscriber, NotificationError, NotificationResult, TriggerAlert};
