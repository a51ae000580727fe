use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::line_item::{lenient_number, lenient_text, LineItem};

/// 发票抬头 (核心流程只使用 vendor_name)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceHeader {
    #[serde(deserialize_with = "lenient_text")]
    pub invoice_number: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub vendor_name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub campaign_name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub invoice_date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub billing_start_date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub billing_end_date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub currency: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub total_amount: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub total_impressions: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub total_clicks: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub gross_revenue: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub net_revenue: Option<f64>,
}

/// 提取服务输出的标准发票 JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedInvoice {
    pub invoice_header: InvoiceHeader,
    pub line_items: Vec<LineItem>,
    pub notes: Option<String>,
}

impl ExtractedInvoice {
    /// 报告中使用的供应商名称，缺失时为 "Unknown"
    pub fn vendor_label(&self) -> &str {
        self.invoice_header
            .vendor_name
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("Unknown")
    }
}

/// 提取结果的前置校验
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// 在调用核心流程之前检查提取 JSON 的基本结构
pub fn validate_extracted(data: &Value) -> ExtractionValidation {
    let mut validation = ExtractionValidation {
        valid: true,
        ..Default::default()
    };

    let header = data.get("invoice_header");
    if header.is_none() {
        validation.valid = false;
        validation.errors.push("Missing 'invoice_header' field".to_string());
    }

    match data.get("line_items") {
        None => {
            validation.valid = false;
            validation.errors.push("Missing 'line_items' field".to_string());
        }
        Some(items) if !items.is_array() => {
            validation.valid = false;
            validation.errors.push("'line_items' must be an array".to_string());
        }
        Some(_) => {}
    }

    if let Some(header) = header {
        let present = |key: &str| {
            header
                .get(key)
                .map(|v| !v.is_null() && v.as_str().map_or(true, |s| !s.trim().is_empty()))
                .unwrap_or(false)
        };
        if !present("invoice_number") && !present("vendor_name") {
            validation
                .warnings
                .push("Missing both invoice_number and vendor_name".to_string());
        }
    }

    validation
}
