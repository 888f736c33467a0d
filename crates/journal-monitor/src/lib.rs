//! # Journal Monitor
//!
//! 백그라운드 포지션 모니터링.
//!
//! 주기적으로 외부 저장소의 오픈 포지션을 조회하여 손절/익절 레벨 도달을
//! 탐지하고, 중복이 제거된 알림을 구독자에게 최대 1회 전달합니다.
//!
//! - 한 사이클 내에서 종목당 가격 조회는 1회
//! - `{포지션 ID, 트리거 종류}` 단위 알림 억제 (외부 clear 호출로만 해제)
//! - 사이클 실패는 로그 후 다음 사이클로 진행 (루프는 절대 죽지 않음)
//! - `stop()`은 현재 사이클 종료를 기다린 후 반환
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use journal_market::{BlockingBridge, ExchangeRateProvider, PriceProvider};
//! use journal_monitor::PositionMonitor;
//! use journal_pnl::PnLEngine;
//!
//! let config = journal_core::AppConfig::load_default()?;
//! let bridge = Arc::new(BlockingBridge::new(
//!     vendor_client,
//!     config.market.vendor_workers,
//!     Duration::from_secs(config.market.request_timeout_secs),
//! )?);
//! let rates = Arc::new(ExchangeRateProvider::from_config(&config.market, bridge.clone())?);
//! let prices = Arc::new(PriceProvider::from_config(&config.market, bridge));
//! let instruments = Arc::new(InstrumentRegistry::new(config.instruments.clone()));
//! let engine = Arc::new(PnLEngine::new(rates, instruments, &config.base_currency));
//!
//! let monitor = PositionMonitor::from_config(&config.monitor, repository, prices, engine);
//! monitor.register_subscriber(Arc::new(telegram_sender)).await;
//! monitor.start().await?;
//! ```

pub mod dedup;
pub mod error;
pub mod monitor;
pub mod repository;

pub use dedup::AlertDedup;
pub use error::MonitorError;
pub use monitor::{MonitorStatus, PositionMonitor};
pub use repository::{PositionRepository, RepositoryError};
