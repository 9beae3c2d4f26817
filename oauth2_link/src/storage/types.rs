use serde::{Deserialize, Serialize};

/// Data stored in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheData {
    pub value: String,
}

impl From<String> for CacheData {
    fn from(value: String) -> Self {
        Self { value }
    }
}

impl From<&str> for CacheData {
    fn from(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_data_serialization() {
        let data = CacheData::from("test value");
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, "{\"value\":\"test value\"}");

        let back: CacheData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }
}
