//! 종목 설정 레지스트리.
//!
//! 종목별 네이티브 통화와 포인트 가치를 조회합니다.
//! 등록되지 않은 종목은 `{USD, 1.0}` 기본값을 사용합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 종목 명세.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    /// 종목이 표시되는 통화 (예: DAX는 EUR)
    #[serde(default = "default_native_currency")]
    pub native_currency: String,
    /// 1랏 기준 1포인트 가격 변동의 금액 가치
    #[serde(default = "default_point_value")]
    pub point_value: Decimal,
}

fn default_native_currency() -> String {
    "USD".to_string()
}

fn default_point_value() -> Decimal {
    Decimal::ONE
}

impl Default for InstrumentSpec {
    fn default() -> Self {
        Self {
            native_currency: default_native_currency(),
            point_value: default_point_value(),
        }
    }
}

/// 종목 설정 조회 레지스트리.
///
/// 설정 파일의 종목 맵으로부터 생성되며, 심볼은 대문자로 정규화됩니다.
#[derive(Debug, Clone, Default)]
pub struct InstrumentRegistry {
    specs: HashMap<String, InstrumentSpec>,
}

impl InstrumentRegistry {
    /// 설정 맵으로부터 레지스트리를 생성합니다.
    pub fn new(specs: HashMap<String, InstrumentSpec>) -> Self {
        let specs = specs
            .into_iter()
            .map(|(symbol, spec)| (symbol.to_uppercase(), spec))
            .collect();
        Self { specs }
    }

    /// 종목 명세를 반환합니다. 미등록 종목은 기본값 `{USD, 1.0}`.
    pub fn spec(&self, symbol: &str) -> InstrumentSpec {
        self.specs
            .get(&symbol.to_uppercase())
            .cloned()
            .unwrap_or_default()
    }

    /// 종목이 명시적으로 등록되어 있는지 확인합니다.
    pub fn is_known(&self, symbol: &str) -> bool {
        self.specs.contains_key(&symbol.to_uppercase())
    }

    /// 등록된 종목 수.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// 레지스트리가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_registry_lookup() {
        let mut specs = HashMap::new();
        specs.insert(
            "dax".to_string(),
            InstrumentSpec {
                native_currency: "EUR".to_string(),
                point_value: dec!(25),
            },
        );
        let registry = InstrumentRegistry::new(specs);

        // 대소문자 무관 조회
        let spec = registry.spec("DAX");
        assert_eq!(spec.native_currency, "EUR");
        assert_eq!(spec.point_value, dec!(25));
        assert!(registry.is_known("Dax"));
    }

    #[test]
    fn test_unknown_symbol_defaults() {
        let registry = InstrumentRegistry::default();
        let spec = registry.spec("UNKNOWN");
        assert_eq!(spec.native_currency, "USD");
        assert_eq!(spec.point_value, Decimal::ONE);
        assert!(!registry.is_known("UNKNOWN"));
    }
}
