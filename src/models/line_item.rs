use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::service::normalizer::{parse_line_id, parse_number};

/// 发票明细行 (提取结果与映射记录共用同一结构)
///
/// 只接受标准键名；别名 (placement 等) 由 normalizer 解析。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    #[serde(deserialize_with = "lenient_line_id")]
    pub line_id: Option<u32>,
    #[serde(deserialize_with = "lenient_text")]
    pub campaign_name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub insertion_order_id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub ad_unit: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub format: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub geo: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub booked_impressions: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub billed_impressions: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub clicks: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub net_cost: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub gross_revenue: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub net_revenue: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub discount: Option<f64>,
    /// 原样保留 (如 "$12 CPM")，不参与比较
    #[serde(deserialize_with = "lenient_text")]
    pub rate: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub notes: Option<String>,
}

/// 数值字段: 数字或带千分位/货币符号的字符串，解析失败视为缺失
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_number))
}

pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(crate::service::normalizer::value_to_text))
}

fn lenient_line_id<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_line_id))
}
