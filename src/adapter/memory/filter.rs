//! 内存存储的查询条件匹配
//!
//! 支持的子集：字段相等（含数组成员匹配）、`$eq $ne $gt $gte $lt $lte $in $nin $exists`、
//! 顶层 `$and $or $nor`，以及点号路径

use crate::error::{GatewayError, GatewayResult};
use mongodb::bson::{Bson, Document};
use std::cmp::Ordering;

fn unsupported(operation: &str, message: String) -> GatewayError {
    crate::gateway_error!(driver, operation, message)
}

/// 按点号路径读取字段
pub(crate) fn lookup_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(i) => Some(*i as f64),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(d) => Some(*d),
        _ => None,
    }
}

/// 相等比较，数值类型之间按值比较
pub(crate) fn values_equal(left: Option<&Bson>, right: &Bson) -> bool {
    match (left, right) {
        (None, Bson::Null) => true,
        (None, _) => false,
        (Some(l), r) => match (as_number(l), as_number(r)) {
            (Some(a), Some(b)) => a == b,
            _ => l == r,
        },
    }
}

/// 字段值是否匹配，数组字段只要有一个元素相等即视为匹配
fn field_matches(value: Option<&Bson>, expected: &Bson) -> bool {
    if values_equal(value, expected) {
        return true;
    }
    match value {
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => {
            items.iter().any(|item| values_equal(Some(item), expected))
        }
        _ => false,
    }
}

/// 同类值之间的大小比较，不同类返回None
pub(crate) fn compare_values(left: &Bson, right: &Bson) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        return a.partial_cmp(&b);
    }
    match (left, right) {
        (Bson::String(a), Bson::String(b)) => Some(a.cmp(b)),
        (Bson::Boolean(a), Bson::Boolean(b)) => Some(a.cmp(b)),
        (Bson::DateTime(a), Bson::DateTime(b)) => Some(a.timestamp_millis().cmp(&b.timestamp_millis())),
        (Bson::ObjectId(a), Bson::ObjectId(b)) => Some(a.bytes().cmp(&b.bytes())),
        _ => None,
    }
}

/// 排序时不同类型之间的先后顺序
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) | Some(Bson::Undefined) => 0,
        Some(Bson::Int32(_)) | Some(Bson::Int64(_)) | Some(Bson::Double(_)) | Some(Bson::Decimal128(_)) => 1,
        Some(Bson::String(_)) | Some(Bson::Symbol(_)) => 2,
        Some(Bson::Document(_)) => 3,
        Some(Bson::Array(_)) => 4,
        Some(Bson::Binary(_)) => 5,
        Some(Bson::ObjectId(_)) => 6,
        Some(Bson::Boolean(_)) => 7,
        Some(Bson::DateTime(_)) => 8,
        Some(_) => 9,
    }
}

/// 排序用的全序比较
pub(crate) fn sort_order(left: Option<&Bson>, right: Option<&Bson>) -> Ordering {
    let (rank_left, rank_right) = (type_rank(left), type_rank(right));
    if rank_left != rank_right {
        return rank_left.cmp(&rank_right);
    }
    match (left, right) {
        (Some(l), Some(r)) => compare_values(l, r).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

fn is_operator_document(value: &Bson) -> Option<&Document> {
    match value {
        Bson::Document(inner) if !inner.is_empty() && inner.keys().all(|k| k.starts_with('$')) => Some(inner),
        _ => None,
    }
}

fn sub_filters<'a>(operator: &str, value: &'a Bson) -> GatewayResult<Vec<&'a Document>> {
    let Bson::Array(items) = value else {
        return Err(unsupported("find", format!("{} must be an array", operator)));
    };
    if items.is_empty() {
        return Err(unsupported("find", format!("{} argument must be a non-empty array", operator)));
    }
    items
        .iter()
        .map(|item| match item {
            Bson::Document(inner) => Ok(inner),
            _ => Err(unsupported("find", format!("{} argument's entries must be objects", operator))),
        })
        .collect()
}

fn evaluate_operator(value: Option<&Bson>, operator: &str, operand: &Bson) -> GatewayResult<bool> {
    let ordered = |accept: fn(Ordering) -> bool| -> bool {
        value
            .and_then(|v| compare_values(v, operand))
            .map(accept)
            .unwrap_or(false)
    };

    let result = match operator {
        "$eq" => field_matches(value, operand),
        "$ne" => !field_matches(value, operand),
        "$gt" => ordered(|o| o == Ordering::Greater),
        "$gte" => ordered(|o| o != Ordering::Less),
        "$lt" => ordered(|o| o == Ordering::Less),
        "$lte" => ordered(|o| o != Ordering::Greater),
        "$in" | "$nin" => {
            let Bson::Array(candidates) = operand else {
                return Err(unsupported("find", format!("{} needs an array", operator)));
            };
            let found = candidates.iter().any(|candidate| field_matches(value, candidate));
            if operator == "$in" { found } else { !found }
        }
        "$exists" => {
            let wanted = match operand {
                Bson::Boolean(b) => *b,
                other => as_number(other).map(|n| n != 0.0).unwrap_or(true),
            };
            value.is_some() == wanted
        }
        other => return Err(unsupported("find", format!("unknown operator: {}", other))),
    };
    Ok(result)
}

/// 文档是否满足查询条件
pub(crate) fn matches(document: &Document, filter: &Document) -> GatewayResult<bool> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => {
                let mut all = true;
                for sub in sub_filters(key, condition)? {
                    if !matches(document, sub)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" | "$nor" => {
                let mut any = false;
                for sub in sub_filters(key, condition)? {
                    if matches(document, sub)? {
                        any = true;
                        break;
                    }
                }
                if key == "$or" { any } else { !any }
            }
            top if top.starts_with('$') => {
                return Err(unsupported("find", format!("unknown top level operator: {}", top)));
            }
            path => {
                let value = lookup_path(document, path);
                match is_operator_document(condition) {
                    Some(operators) => {
                        let mut all = true;
                        for (operator, operand) in operators {
                            if !evaluate_operator(value, operator, operand)? {
                                all = false;
                                break;
                            }
                        }
                        all
                    }
                    None => field_matches(value, condition),
                }
            }
        };

        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}
