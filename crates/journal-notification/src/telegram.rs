//! 텔레그램 알림 전송기.
//!
//! Telegram Bot API를 통해 트리거 알림을 전송합니다. 호스트 저널 봇과
//! 같은 봇 토큰을 사용하면 사용자는 대화 중인 채팅에서 알림을 받습니다.

use crate::types::{AlertPriority, AlertSubscriber, NotificationError, NotificationResult, TriggerAlert};
use async_trait::async_trait;
use journal_core::TriggerKind;
use tracing::{debug, info};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// 텔레그램 전송 설정.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// @BotFather에서 받은 봇 토큰
    pub bot_token: String,
    /// 메시지를 보낼 채팅 ID
    pub chat_id: String,
    /// 전송 활성화 여부
    pub enabled: bool,
}

impl TelegramConfig {
    /// 새 텔레그램 설정을 생성합니다.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            enabled: true,
        }
    }

    /// 환경 변수에서 설정을 생성합니다.
    ///
    /// `TELEGRAM_BOT_TOKEN`과 `TELEGRAM_CHAT_ID`가 없으면 None.
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok()?;
        let enabled = std::env::var("TELEGRAM_ENABLED")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(true);

        Some(Self {
            bot_token,
            chat_id,
            enabled,
        })
    }
}

/// 텔레그램 알림 전송기.
pub struct TelegramSender {
    config: TelegramConfig,
    client: reqwest::Client,
    api_base: String,
}

impl TelegramSender {
    /// 새 전송기를 생성합니다.
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// 환경 변수에서 전송기를 생성합니다.
    pub fn from_env() -> Option<Self> {
        TelegramConfig::from_env().map(Self::new)
    }

    /// API 기본 URL을 교체합니다 (테스트용).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// 알림을 텔레그램 HTML 메시지로 포맷합니다.
    fn format_message(&self, alert: &TriggerAlert) -> String {
        let header = match alert.kind {
            TriggerKind::StopLoss => "🛑 <b>손절 트리거</b>",
            TriggerKind::TakeProfit => "🎯 <b>익절 트리거</b>",
        };
        let priority_mark = match alert.priority {
            AlertPriority::Low => "ℹ️",
            AlertPriority::Normal => "📊",
            AlertPriority::High => "⚠️",
            AlertPriority::Critical => "🚨",
        };

        let mut lines = vec![
            format!("{} {}", priority_mark, header),
            format!(
                "<b>{}</b> {} {} 랏",
                alert.instrument, alert.direction, alert.lot_size
            ),
            format!(
                "진입 {} → 현재 {} (레벨 {})",
                alert.entry_price, alert.market_price, alert.trigger_level
            ),
            format!(
                "손익: {} {} ({} {})",
                alert.pnl_native, alert.native_currency, alert.pnl_base, alert.base_currency
            ),
        ];

        if !alert.rate_trusted {
            lines.push("⚠️ 환율 변환 실패 - 기준 통화 손익은 1:1 환산".to_string());
        }

        lines.join("\n")
    }
}

#[async_trait]
impl AlertSubscriber for TelegramSender {
    async fn notify(&self, alert: &TriggerAlert) -> NotificationResult<()> {
        if !self.config.enabled {
            debug!("텔레그램 전송 비활성화됨, 알림 건너뜀");
            return Ok(());
        }

        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_base, self.config.bot_token
        );
        let payload = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": self.format_message(alert),
            "parse_mode": "HTML",
        });

        let response = self.client.post(&url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::SendFailed(format!(
                "Telegram API {} - {}",
                status, body
            )));
        }

        info!(
            alert_id = %alert.id,
            position_id = %alert.position_id,
            kind = %alert.kind,
            "텔레그램 알림 전송 완료"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use journal_core::Direction;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn sample_alert(kind: TriggerKind, rate_trusted: bool) -> TriggerAlert {
        TriggerAlert {
            id: Uuid::new_v4(),
            position_id: Uuid::new_v4(),
            owner_id: "user-1".to_string(),
            instrument: "DAX".to_string(),
            direction: Direction::Long,
            kind,
            trigger_level: dec!(18100),
            market_price: dec!(18110),
            entry_price: dec!(18000),
            lot_size: dec!(1),
            pnl_native: dec!(110),
            native_currency: "EUR".to_string(),
            pnl_base: dec!(118.80),
            base_currency: "USD".to_string(),
            exchange_rate: dec!(1.08),
            rate_trusted,
            priority: AlertPriority::for_trigger(kind),
            triggered_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_take_profit_message() {
        let sender = TelegramSender::new(TelegramConfig::new("token", "chat"));
        let message = sender.format_message(&sample_alert(TriggerKind::TakeProfit, true));

        assert!(message.contains("익절 트리거"));
        assert!(message.contains("DAX"));
        assert!(message.contains("LONG"));
        assert!(message.contains("118.80 USD"));
        assert!(!message.contains("환율 변환 실패"));
    }

    #[test]
    fn test_format_marks_untrusted_rate() {
        let sender = TelegramSender::new(TelegramConfig::new("token", "chat"));
        let message = sender.format_message(&sample_alert(TriggerKind::StopLoss, false));

        assert!(message.contains("손절 트리거"));
        assert!(message.contains("환율 변환 실패"));
    }

    #[tokio::test]
    async fn test_disabled_sender_short_circuits() {
        let mut config = TelegramConfig::new("token", "chat");
        config.enabled = false;
        let sender = TelegramSender::new(config);

        // 비활성화 시 네트워크 없이 성공
        sender
            .notify(&sample_alert(TriggerKind::TakeProfit, true))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bottoken/sendMessage")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;

        let sender =
            TelegramSender::new(TelegramConfig::new("token", "chat")).with_api_base(server.url());
        sender
            .notify(&sample_alert(TriggerKind::TakeProfit, true))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_failure_surfaces_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/bottoken/sendMessage")
            .with_status(403)
            .with_body(r#"{"ok": false, "description": "bot was blocked"}"#)
            .create_async()
            .await;

        let sender =
            TelegramSender::new(TelegramConfig::new("token", "chat")).with_api_base(server.url());
        let err = sender
            .notify(&sample_alert(TriggerKind::StopLoss, true))
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::SendFailed(_)));
    }
}
