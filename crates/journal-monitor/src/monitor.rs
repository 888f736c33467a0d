//! 포지션 모니터 - 취소 가능한 백그라운드 폴링 루프.
//!
//! 사이클당 동작:
//! 1. 저장소에서 손절/익절이 설정된 오픈 포지션 조회
//! 2. 종목별로 묶어 종목당 가격을 1회만 조회
//! 3. 방향 인식 트리거 판정 → 중복 제거 → 손익 계산 → 알림 페이로드 조립
//! 4. 등록된 모든 구독자에게 순차 전달 (구독자별 실패 격리)
//!
//! 사이클 중 오류(저장소 장애, 가격 조회 실패)는 로그 후 해당 범위만
//! 건너뛰며, 루프 자체는 stop() 호출 전까지 절대 종료되지 않습니다.

use crate::dedup::AlertDedup;
use crate::error::MonitorError;
use crate::repository::PositionRepository;
use chrono::Utc;
use journal_core::{evaluate_triggers, PositionSnapshot, TriggerKind};
use journal_market::{PriceQuote, PriceSource};
use journal_notification::{AlertPriority, AlertSubscriber, TriggerAlert};
use journal_pnl::PnLEngine;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 모니터 상태 조회 결과.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    /// 루프 실행 중 여부
    pub running: bool,
    /// 폴링 주기 (초)
    pub cycle_interval_seconds: u64,
    /// 등록된 구독자 수
    pub subscriber_count: usize,
    /// 최근 사이클에서 관측한 오픈 포지션 수
    pub tracked_positions: usize,
    /// 프로세스 시작 이후 발송한 알림 총수
    pub total_alerts_emitted: u64,
}

/// 루프 태스크와 공유되는 모니터 내부 상태.
struct MonitorInner {
    repository: Arc<dyn PositionRepository>,
    prices: Arc<dyn PriceSource>,
    engine: Arc<PnLEngine>,
    subscribers: RwLock<Vec<Arc<dyn AlertSubscriber>>>,
    dedup: AlertDedup,
    poll_interval: Duration,
    running: AtomicBool,
    tracked_positions: AtomicUsize,
    total_alerts: AtomicU64,
}

/// 실행 중인 루프의 핸들.
struct LoopHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// 백그라운드 포지션 모니터.
pub struct PositionMonitor {
    inner: Arc<MonitorInner>,
    loop_state: Mutex<Option<LoopHandle>>,
}

impl PositionMonitor {
    /// 새 모니터를 생성합니다. 루프는 `start()` 호출 전까지 돌지 않습니다.
    ///
    /// 폴링 주기는 최소 1초로 보정됩니다 (tokio interval은 0을 허용하지 않음).
    pub fn new(
        repository: Arc<dyn PositionRepository>,
        prices: Arc<dyn PriceSource>,
        engine: Arc<PnLEngine>,
        poll_interval_secs: u64,
    ) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                repository,
                prices,
                engine,
                subscribers: RwLock::new(Vec::new()),
                dedup: AlertDedup::new(),
                poll_interval: Duration::from_secs(poll_interval_secs.max(1)),
                running: AtomicBool::new(false),
                tracked_positions: AtomicUsize::new(0),
                total_alerts: AtomicU64::new(0),
            }),
            loop_state: Mutex::new(None),
        }
    }

    /// 설정으로부터 모니터를 생성합니다.
    pub fn from_config(
        config: &journal_core::MonitorConfig,
        repository: Arc<dyn PositionRepository>,
        prices: Arc<dyn PriceSource>,
        engine: Arc<PnLEngine>,
    ) -> Self {
        Self::new(repository, prices, engine, config.poll_interval_secs)
    }

    /// 알림 구독자를 등록합니다.
    pub async fn register_subscriber(&self, subscriber: Arc<dyn AlertSubscriber>) {
        let mut subscribers = self.inner.subscribers.write().await;
        info!(subscriber = subscriber.name(), "알림 구독자 등록");
        subscribers.push(subscriber);
    }

    /// 이름으로 구독자를 등록 해제합니다. 제거되었으면 true.
    pub async fn unregister_subscriber(&self, name: &str) -> bool {
        let mut subscribers = self.inner.subscribers.write().await;
        let before = subscribers.len();
        subscribers.retain(|s| s.name() != name);
        let removed = subscribers.len() < before;
        if removed {
            info!(subscriber = name, "알림 구독자 등록 해제");
        }
        removed
    }

    /// 포지션의 알림 억제 상태를 초기화합니다.
    ///
    /// 호스트는 포지션 종료/재오픈 시 반드시 호출해야 합니다.
    /// 제거된 억제 키 수를 반환합니다.
    pub async fn clear_alert_state(&self, position_id: Uuid) -> usize {
        let removed = self.inner.dedup.clear_position(position_id).await;
        if removed > 0 {
            debug!(%position_id, removed, "알림 억제 상태 초기화");
        }
        removed
    }

    /// 현재 모니터 상태를 반환합니다.
    pub async fn status(&self) -> MonitorStatus {
        MonitorStatus {
            running: self.inner.running.load(Ordering::SeqCst),
            cycle_interval_seconds: self.inner.poll_interval.as_secs(),
            subscriber_count: self.inner.subscribers.read().await.len(),
            tracked_positions: self.inner.tracked_positions.load(Ordering::SeqCst),
            total_alerts_emitted: self.inner.total_alerts.load(Ordering::SeqCst),
        }
    }

    /// 모니터 루프를 시작합니다.
    ///
    /// 이미 실행 중이면 `AlreadyRunning` 오류를 반환합니다.
    pub async fn start(&self) -> Result<(), MonitorError> {
        let mut loop_state = self.loop_state.lock().await;
        if loop_state.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }

        let token = CancellationToken::new();
        let child_token = token.clone();
        let inner = Arc::clone(&self.inner);
        inner.running.store(true, Ordering::SeqCst);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(inner.poll_interval);
            // 사이클이 주기를 초과해도 중첩 실행하지 않음
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = child_token.cancelled() => {
                        info!("포지션 모니터 루프 종료");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = inner.run_cycle().await {
                            error!(error = %e, "모니터 사이클 실패, 다음 주기에 재시도");
                        }
                    }
                }
            }

            inner.running.store(false, Ordering::SeqCst);
        });

        *loop_state = Some(LoopHandle { token, handle });
        info!(
            interval_secs = self.inner.poll_interval.as_secs(),
            "포지션 모니터 시작"
        );
        Ok(())
    }

    /// 모니터 루프를 중지합니다.
    ///
    /// 취소를 신호한 뒤 루프 태스크가 완전히 종료될 때까지 기다립니다.
    /// 진행 중인 사이클은 끝까지 수행됩니다. 이미 중지 상태면 아무것도
    /// 하지 않습니다.
    pub async fn stop(&self) {
        let state = self.loop_state.lock().await.take();
        if let Some(LoopHandle { token, handle }) = state {
            token.cancel();
            if let Err(e) = handle.await {
                error!(error = %e, "모니터 태스크 join 실패");
            }
            info!("포지션 모니터 중지 완료");
        }
    }
}

impl MonitorInner {
    /// 한 사이클을 실행합니다.
    async fn run_cycle(&self) -> Result<(), MonitorError> {
        let positions = self
            .repository
            .open_positions_with_triggers()
            .await
            .map_err(|e| MonitorError::Repository(e.to_string()))?;

        self.tracked_positions
            .store(positions.len(), Ordering::SeqCst);

        if positions.is_empty() {
            debug!("모니터링할 포지션 없음");
            return Ok(());
        }

        // 종목별 그룹핑 - 종목당 가격 조회 1회
        let mut groups: BTreeMap<String, Vec<&PositionSnapshot>> = BTreeMap::new();
        for position in &positions {
            groups
                .entry(position.instrument.to_uppercase())
                .or_default()
                .push(position);
        }

        debug!(
            positions = positions.len(),
            instruments = groups.len(),
            "모니터 사이클 시작"
        );

        for (instrument, group) in groups {
            let quote = match self.prices.get_price(&instrument).await {
                Ok(quote) => quote,
                Err(e) => {
                    warn!(
                        %instrument,
                        error = %e,
                        "가격 조회 실패, 이 종목 그룹은 이번 사이클에서 건너뜀"
                    );
                    continue;
                }
            };

            for position in group {
                self.evaluate_position(position, &quote).await;
            }
        }

        Ok(())
    }

    /// 포지션 하나의 트리거를 판정하고 필요 시 알림을 발송합니다.
    async fn evaluate_position(&self, position: &PositionSnapshot, quote: &PriceQuote) {
        let hits = evaluate_triggers(
            position.direction,
            quote.price,
            position.stop_loss,
            position.take_profit,
        );

        for kind in hits {
            if self.dedup.is_marked(position.id, kind).await {
                debug!(position_id = %position.id, %kind, "이미 발송된 알림, 억제");
                continue;
            }

            // 트리거를 발생시킨 시장 가격 기준으로 손익 계산
            let pnl = self
                .engine
                .calculate_unrealized(
                    &position.instrument,
                    position.direction,
                    position.entry_price,
                    quote.price,
                    position.lot_size,
                )
                .await;

            let trigger_level = match kind {
                TriggerKind::StopLoss => position.stop_loss.unwrap_or(quote.price),
                TriggerKind::TakeProfit => position.take_profit.unwrap_or(quote.price),
            };

            let alert = TriggerAlert {
                id: Uuid::new_v4(),
                position_id: position.id,
                owner_id: position.owner_id.clone(),
                instrument: position.instrument.clone(),
                direction: position.direction,
                kind,
                trigger_level,
                market_price: quote.price,
                entry_price: position.entry_price,
                lot_size: position.lot_size,
                pnl_native: pnl.pnl_native,
                native_currency: pnl.native_currency,
                pnl_base: pnl.pnl_base,
                base_currency: pnl.base_currency,
                exchange_rate: pnl.exchange_rate,
                rate_trusted: pnl.rate_basis.trusted(),
                priority: AlertPriority::for_trigger(kind),
                triggered_at: Utc::now(),
            };

            self.dedup.mark(position.id, kind).await;
            self.dispatch(&alert).await;
            self.total_alerts.fetch_add(1, Ordering::SeqCst);

            info!(
                position_id = %position.id,
                instrument = %alert.instrument,
                %kind,
                price = %quote.price,
                pnl_base = %alert.pnl_base,
                "트리거 알림 발송"
            );
        }
    }

    /// 등록된 모든 구독자에게 알림을 전달합니다.
    ///
    /// 구독자 실패는 로그만 남기고 나머지 구독자 전달을 계속합니다.
    async fn dispatch(&self, alert: &TriggerAlert) {
        let subscribers: Vec<Arc<dyn AlertSubscriber>> =
            self.subscribers.read().await.clone();

        for subscriber in subscribers {
            if let Err(e) = subscriber.notify(alert).await {
                warn!(
                    subscriber = subscriber.name(),
                    error = %e,
                    "구독자 알림 실패, 나머지 구독자 전달 계속"
                );
            }
        }
    }
}
