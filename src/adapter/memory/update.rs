//! 内存存储的更新操作符：`$set`、`$unset`、`$inc`

use crate::error::{GatewayError, GatewayResult};
use crate::types::PRIMARY_KEY;
use mongodb::bson::{Bson, Document};

fn update_error(message: String) -> GatewayError {
    crate::gateway_error!(driver, "updateOne", message)
}

/// 校验更新文档必须全部由操作符组成
pub(crate) fn validate_update(update: &Document) -> GatewayResult<()> {
    if update.is_empty() || update.keys().any(|key| !key.starts_with('$')) {
        return Err(update_error("Update document requires atomic operators".to_string()));
    }
    Ok(())
}

/// 沿点号路径找到最后一级的父文档，不存在的中间层会被创建
fn parent_for_write<'a>(document: &'a mut Document, path: &str) -> GatewayResult<(&'a mut Document, String)> {
    let mut parts: Vec<&str> = path.split('.').collect();
    let last = parts.pop().unwrap_or_default().to_string();
    let mut current = document;
    for part in parts {
        if !current.contains_key(part) {
            current.insert(part, Document::new());
        }
        current = match current.get_mut(part) {
            Some(Bson::Document(inner)) => inner,
            _ => {
                return Err(update_error(format!(
                    "Cannot create field '{}' in element {{{}: non-document}}",
                    last, part
                )));
            }
        };
    }
    Ok((current, last))
}

fn set_path(document: &mut Document, path: &str, value: Bson) -> GatewayResult<()> {
    let (parent, field) = parent_for_write(document, path)?;
    parent.insert(field, value);
    Ok(())
}

fn unset_path(document: &mut Document, path: &str) {
    let mut parts: Vec<&str> = path.split('.').collect();
    let Some(last) = parts.pop() else { return };
    let mut current = document;
    for part in parts {
        current = match current.get_mut(part) {
            Some(Bson::Document(inner)) => inner,
            _ => return,
        };
    }
    current.remove(last);
}

fn add_i64(a: i64, b: i64) -> GatewayResult<Bson> {
    a.checked_add(b)
        .map(Bson::Int64)
        .ok_or_else(|| update_error(format!("$inc overflow: {} + {}", a, b)))
}

fn increment(current: Option<&Bson>, delta: &Bson) -> GatewayResult<Bson> {
    let result = match (current, delta) {
        (None, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => delta.clone(),
        (Some(Bson::Int32(a)), Bson::Int32(b)) => match a.checked_add(*b) {
            Some(sum) => Bson::Int32(sum),
            None => add_i64(i64::from(*a), i64::from(*b))?,
        },
        (Some(Bson::Int32(a)), Bson::Int64(b)) => add_i64(i64::from(*a), *b)?,
        (Some(Bson::Int64(a)), Bson::Int32(b)) => add_i64(*a, i64::from(*b))?,
        (Some(Bson::Int64(a)), Bson::Int64(b)) => add_i64(*a, *b)?,
        (Some(Bson::Double(a)), Bson::Int32(b)) => Bson::Double(a + f64::from(*b)),
        (Some(Bson::Double(a)), Bson::Int64(b)) => Bson::Double(a + *b as f64),
        (Some(Bson::Double(a)), Bson::Double(b)) => Bson::Double(a + b),
        (Some(Bson::Int32(a)), Bson::Double(b)) => Bson::Double(f64::from(*a) + b),
        (Some(Bson::Int64(a)), Bson::Double(b)) => Bson::Double(*a as f64 + b),
        (_, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => {
            return Err(update_error("Cannot apply $inc to a value of non-numeric type".to_string()));
        }
        _ => return Err(update_error("Cannot increment with non-numeric argument".to_string())),
    };
    Ok(result)
}

/// 把操作符形式的更新应用到文档上
pub(crate) fn apply_update(document: &mut Document, update: &Document) -> GatewayResult<()> {
    validate_update(update)?;

    for (operator, fields) in update {
        let Bson::Document(fields) = fields else {
            return Err(update_error(format!("Modifiers operate on fields but we found another type instead: {}", operator)));
        };

        for (path, value) in fields {
            if path == PRIMARY_KEY && operator != "$set" {
                return Err(update_error(format!(
                    "Performing an update on the path '{}' would modify the immutable field '{}'",
                    PRIMARY_KEY, PRIMARY_KEY
                )));
            }

            match operator.as_str() {
                "$set" => {
                    if path == PRIMARY_KEY && document.get(PRIMARY_KEY) != Some(value) {
                        return Err(update_error(format!(
                            "Performing an update on the path '{}' would modify the immutable field '{}'",
                            PRIMARY_KEY, PRIMARY_KEY
                        )));
                    }
                    set_path(document, path, value.clone())?;
                }
                "$unset" => unset_path(document, path),
                "$inc" => {
                    let next = increment(super::filter::lookup_path(document, path), value)?;
                    set_path(document, path, next)?;
                }
                other => return Err(update_error(format!("Unknown modifier: {}", other))),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_operator_less_update_is_rejected() {
        let mut document = doc! { "level": 1 };
        assert!(apply_update(&mut document, &doc! { "level": 10 }).is_err());
        assert!(apply_update(&mut document, &doc! {}).is_err());
        assert_eq!(document.get_i32("level").unwrap(), 1);
    }

    #[test]
    fn test_set_merges_fields() {
        let mut document = doc! { "_id": 1, "name": "testUser", "level": 1 };
        apply_update(&mut document, &doc! { "$set": { "level": 10, "profile.title": "Sheriff" } }).unwrap();
        assert_eq!(document.get_str("name").unwrap(), "testUser");
        assert_eq!(document.get_i32("level").unwrap(), 10);
        assert_eq!(document.get_document("profile").unwrap().get_str("title").unwrap(), "Sheriff");
    }

    #[test]
    fn test_unset_and_inc() {
        let mut document = doc! { "gold": 5, "temp": true };
        apply_update(&mut document, &doc! { "$inc": { "gold": 10, "xp": 3_i64 }, "$unset": { "temp": "" } }).unwrap();
        assert_eq!(document.get_i32("gold").unwrap(), 15);
        assert_eq!(document.get_i64("xp").unwrap(), 3);
        assert!(!document.contains_key("temp"));
    }

    #[test]
    fn test_inc_rejects_non_numeric() {
        let mut document = doc! { "name": "x" };
        assert!(apply_update(&mut document, &doc! { "$inc": { "name": 1 } }).is_err());
        assert!(apply_update(&mut document, &doc! { "$inc": { "gold": "1" } }).is_err());
    }

    #[test]
    fn test_inc_overflow_is_an_error() {
        let mut document = doc! { "gold": i64::MAX, "small": i32::MAX };
        assert!(apply_update(&mut document, &doc! { "$inc": { "gold": 1_i64 } }).is_err());
        assert!(apply_update(&mut document, &doc! { "$inc": { "gold": 1 } }).is_err());
        assert_eq!(document.get_i64("gold").unwrap(), i64::MAX);

        // int32溢出时提升为int64
        apply_update(&mut document, &doc! { "$inc": { "small": 1 } }).unwrap();
        assert_eq!(document.get_i64("small").unwrap(), i64::from(i32::MAX) + 1);
    }

    #[test]
    fn test_primary_key_is_immutable() {
        let mut document = doc! { "_id": 1, "level": 1 };
        assert!(apply_update(&mut document, &doc! { "$set": { "_id": 2 } }).is_err());
        assert!(apply_update(&mut document, &doc! { "$set": { "_id": 1 } }).is_ok());
    }
}
