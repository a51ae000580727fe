use serde_json::{Map, Value};

use crate::models::{ExtractedInvoice, InvoiceHeader, LineItem, MappingRecord};

/// 单个规范字段的候选键列表，按优先级排列
pub type Aliases = &'static [&'static str];

const INVOICE_NUMBER: Aliases = &["Invoice ID", "Bill Number", "Reference No."];
const INVOICE_DATE: Aliases = &["Invoice Date", "Date Issued", "Date"];
const CURRENCY: Aliases = &["Currency Type", "Currency"];
const TOTAL_AMOUNT: Aliases = &["Total Due", "Grand Total", "Amount"];
const HEADER_VENDOR: Aliases = &["Vendor", "Vendor Name"];

const CAMPAIGN: Aliases = &["Campaign", "Campaign Name"];
const IO: Aliases = &["IO", "IO Number", "Insertion Order"];
const AD_UNIT: Aliases = &["Ad Unit", "Placement"];
const FORMAT: Aliases = &["Format"];
const GEO: Aliases = &["Geo", "Region"];
const BOOKED: Aliases = &["Booked", "Booked Impressions"];
const BILLED: Aliases = &["Billed", "Billed Impressions"];
const CLICKS: Aliases = &["Clicks"];
const NET_COST: Aliases = &["Net Cost", "Cost"];
const GROSS_REVENUE: Aliases = &["Gross Revenue"];
const NET_REVENUE: Aliases = &["Net Revenue"];
const RATE: Aliases = &["Rate"];
const DISCOUNT: Aliases = &["Discount"];
const DATES: Aliases = &["Dates"];
const NOTES: Aliases = &["Notes"];

/// 提取端 (snake_case) 的候选键: 标准键在前，旧别名在后
mod canonical {
    use super::Aliases;

    pub const LINE_ID: Aliases = &["line_id"];
    pub const CAMPAIGN: Aliases = &["campaign_name"];
    pub const IO: Aliases = &["insertion_order_id"];
    pub const AD_UNIT: Aliases = &["ad_unit", "placement"];
    pub const FORMAT: Aliases = &["format"];
    pub const GEO: Aliases = &["geo"];
    pub const START_DATE: Aliases = &["start_date"];
    pub const END_DATE: Aliases = &["end_date"];
    pub const BOOKED: Aliases = &["booked_impressions", "planned_impressions"];
    pub const BILLED: Aliases = &["billed_impressions"];
    pub const CLICKS: Aliases = &["clicks"];
    pub const NET_COST: Aliases = &["net_cost"];
    pub const GROSS_REVENUE: Aliases = &["gross_revenue"];
    pub const NET_REVENUE: Aliases = &["net_revenue"];
    pub const DISCOUNT: Aliases = &["discount", "discount_amount"];
    pub const RATE: Aliases = &["rate"];
    pub const NOTES: Aliases = &["notes"];
}

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹'];

/// 取第一个存在且非 null 的候选键
pub fn first_present<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !v.is_null())
}

/// 宽松数值解析: 去掉千分位、空白与货币符号，失败返回 None
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_number_str(s),
        _ => None,
    }
}

pub fn parse_number_str(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// 行号: 非负整数 (允许 "3" 这样的字符串)，其余视为缺失
pub fn parse_line_id(value: &Value) -> Option<u32> {
    parse_number(value)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32)
}

/// 文本取值: 字符串原样，数字转为文本 (投放单号常为数字)
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(obj: &Map<String, Value>, aliases: Aliases) -> Option<String> {
    first_present(obj, aliases).and_then(value_to_text)
}

fn number(obj: &Map<String, Value>, aliases: Aliases) -> Option<f64> {
    first_present(obj, aliases).and_then(parse_number)
}

/// "2025-01-01 - 2025-01-31" / "Jan 1 to Jan 31" 拆为起止日期
fn split_dates(raw: &str) -> (Option<String>, Option<String>) {
    for sep in [" - ", " to ", " – "] {
        if let Some((start, end)) = raw.split_once(sep) {
            return (Some(start.trim().to_string()), Some(end.trim().to_string()));
        }
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        (None, None)
    } else {
        (Some(trimmed.to_string()), None)
    }
}

fn normalize_line_item(line_id: u32, item: &Map<String, Value>) -> LineItem {
    let (start_date, end_date) = text(item, DATES)
        .map(|d| split_dates(&d))
        .unwrap_or((None, None));

    LineItem {
        line_id: Some(line_id),
        campaign_name: text(item, CAMPAIGN),
        insertion_order_id: text(item, IO),
        ad_unit: text(item, AD_UNIT),
        format: text(item, FORMAT),
        geo: text(item, GEO),
        start_date,
        end_date,
        booked_impressions: number(item, BOOKED),
        billed_impressions: number(item, BILLED),
        clicks: number(item, CLICKS),
        net_cost: number(item, NET_COST),
        gross_revenue: number(item, GROSS_REVENUE),
        net_revenue: number(item, NET_REVENUE),
        discount: number(item, DISCOUNT),
        rate: text(item, RATE),
        notes: text(item, NOTES),
    }
}

/// 提取端明细行: 同一字段的标准键与别名同时出现时取第一个非 null 的
pub fn normalize_extracted_line_item(item: &Map<String, Value>) -> LineItem {
    LineItem {
        line_id: first_present(item, canonical::LINE_ID).and_then(parse_line_id),
        campaign_name: text(item, canonical::CAMPAIGN),
        insertion_order_id: text(item, canonical::IO),
        ad_unit: text(item, canonical::AD_UNIT),
        format: text(item, canonical::FORMAT),
        geo: text(item, canonical::GEO),
        start_date: text(item, canonical::START_DATE),
        end_date: text(item, canonical::END_DATE),
        booked_impressions: number(item, canonical::BOOKED),
        billed_impressions: number(item, canonical::BILLED),
        clicks: number(item, canonical::CLICKS),
        net_cost: number(item, canonical::NET_COST),
        gross_revenue: number(item, canonical::GROSS_REVENUE),
        net_revenue: number(item, canonical::NET_REVENUE),
        discount: number(item, canonical::DISCOUNT),
        rate: text(item, canonical::RATE),
        notes: text(item, canonical::NOTES),
    }
}

/// 将提取服务输出的发票 JSON 转为标准结构；不是对象的明细行跳过并记录，其余照常处理
pub fn normalize_extracted(raw: &Value) -> ExtractedInvoice {
    let invoice_header = match raw.get("invoice_header").filter(|h| h.is_object()) {
        Some(header) => serde_json::from_value(header.clone()).unwrap_or_else(|e| {
            tracing::warn!("Unreadable invoice_header, using empty header: {}", e);
            InvoiceHeader::default()
        }),
        None => InvoiceHeader::default(),
    };

    let line_items = raw
        .get("line_items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .filter_map(|(idx, item)| match item.as_object() {
                    Some(obj) => Some(normalize_extracted_line_item(obj)),
                    None => {
                        tracing::warn!("line_items[{}] is not an object, skipped", idx);
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    ExtractedInvoice {
        invoice_header,
        line_items,
        notes: raw.get("notes").and_then(value_to_text),
    }
}

/// 将任意键名的映射记录归一化为标准结构；缺失的段落取默认值，从不报错
pub fn normalize_mapping(raw: &Value, source_file: &str) -> MappingRecord {
    let empty = Map::new();
    let root = raw.as_object().unwrap_or(&empty);
    let header = root.get("Header").and_then(Value::as_object).unwrap_or(&empty);

    let vendor_name = root
        .get("Vendor")
        .filter(|v| !v.is_null())
        .and_then(value_to_text)
        .or_else(|| text(header, HEADER_VENDOR));

    let invoice_header = InvoiceHeader {
        invoice_number: text(header, INVOICE_NUMBER),
        vendor_name,
        invoice_date: text(header, INVOICE_DATE),
        currency: text(header, CURRENCY),
        total_amount: number(header, TOTAL_AMOUNT),
        ..Default::default()
    };

    // 序号从 1 开始，非对象的行按空行处理但仍占用序号
    let line_items = root
        .get("LineItems")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .zip(1u32..)
                .map(|(item, line_id)| {
                    normalize_line_item(line_id, item.as_object().unwrap_or(&empty))
                })
                .collect()
        })
        .unwrap_or_default();

    MappingRecord {
        source_file: source_file.to_string(),
        invoice_index: root.get("InvoiceIndex").filter(|v| !v.is_null()).cloned(),
        invoice_header,
        line_items,
    }
}
