//! 시나리오 누적 컨텍스트 스냅샷
//!
//! 각 스텝은 이전 스텝들이 반환한 값이 병합된 읽기 전용 스냅샷을 받습니다.
//! 객체 반환값은 얕게 병합되며(같은 키는 나중 값이 우선), 객체가 아닌 값은
//! [`RESULT_KEY`] 아래에 저장됩니다.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// 객체가 아닌 스텝 반환값이 저장되는 키
pub const RESULT_KEY: &str = "result";

/// 불변 컨텍스트 스냅샷
///
/// 내부 맵은 `Arc`로 공유되므로 복제 비용이 작고, 스텝이 받은 스냅샷을
/// 변경해도 러너가 보관한 컨텍스트에는 영향이 없습니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepContext {
    values: Arc<Map<String, Value>>,
}

impl StepContext {
    /// 빈 컨텍스트를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON 객체 맵으로 컨텍스트를 생성합니다.
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self {
            values: Arc::new(values),
        }
    }

    /// 키의 값을 지정한 타입으로 역직렬화합니다.
    ///
    /// 키가 없거나 타입이 맞지 않으면 `None`을 반환합니다.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// 키의 값을 역직렬화하고, 없거나 타입이 다르면 에러를 반환합니다.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<T> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("context key '{key}' is not set"))?;
        serde_json::from_value(value.clone())
            .map_err(|e| anyhow::anyhow!("context key '{key}' has unexpected shape: {e}"))
    }

    /// 원시 JSON 값
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// 키 존재 여부
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// 키 개수
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 키 목록
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// 내부 맵 참조
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// 내부 맵을 꺼냅니다. 공유 중이면 복제합니다.
    pub fn into_map(self) -> Map<String, Value> {
        Arc::unwrap_or_clone(self.values)
    }

    /// JSON 객체 값으로 변환합니다.
    pub fn to_value(&self) -> Value {
        Value::Object(self.as_map().clone())
    }

    /// 스텝 반환값을 병합한 새 스냅샷을 반환합니다.
    ///
    /// 기존 키는 제거되지 않습니다. `null`은 "반환값 없음"으로 취급되어 무시됩니다.
    pub fn merged(&self, delta: Value) -> Self {
        let mut values = self.as_map().clone();
        match delta {
            Value::Object(map) => values.extend(map),
            Value::Null => {}
            other => {
                values.insert(RESULT_KEY.to_owned(), other);
            }
        }
        Self::from_map(values)
    }
}

impl From<Map<String, Value>> for StepContext {
    fn from(values: Map<String, Value>) -> Self {
        Self::from_map(values)
    }
}
