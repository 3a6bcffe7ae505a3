//! 各导出名对应的处理函数
//!
//! 数据操作的参数错误同样折叠为失败信封，保证调用方总能拿到结果

use crate::adapter::FindOptions;
use crate::config::ConnectionOptions;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::CrudGateway;
use crate::types::{Acknowledged, AckResponse, Envelope};
use mongodb::bson::Document;
use rat_logger::error;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use super::args::Args;
use super::CallContext;

fn respond<T: Serialize>(envelope: &Envelope<T>) -> GatewayResult<JsonValue> {
    serde_json::to_value(envelope).map_err(|e| crate::gateway_error!(serialization, e))
}

/// 参数错误转为失败信封
fn reject(operation: &str, e: GatewayError) -> GatewayResult<JsonValue> {
    error!("[CFX-MongoDB Export] {} error: {}", operation, e);
    respond(&AckResponse::failure(e.to_string()))
}

fn acknowledge(result: GatewayResult<()>) -> GatewayResult<JsonValue> {
    let envelope = match result {
        Ok(()) => Envelope::success(Acknowledged {}),
        Err(e) => Envelope::failure(e.to_string()),
    };
    respond(&envelope)
}

pub(crate) async fn insert(gateway: Arc<CrudGateway>, _ctx: CallContext, args: Vec<JsonValue>) -> GatewayResult<JsonValue> {
    let args = Args::new(args);
    let (collection, document) = match args.collection(0).and_then(|c| Ok((c, args.document(1)?))) {
        Ok(parsed) => parsed,
        Err(e) => return reject("insertOne", e),
    };
    respond(&gateway.insert(&collection, &document).await)
}

pub(crate) async fn find_many(gateway: Arc<CrudGateway>, _ctx: CallContext, args: Vec<JsonValue>) -> GatewayResult<JsonValue> {
    let args = Args::new(args);
    let parsed = args.collection(0).and_then(|collection| {
        let filter = args.document_or_empty(1)?;
        let options = FindOptions::from_json(args.raw(2))?;
        Ok((collection, filter, options))
    });
    let (collection, filter, options) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return reject("find", e),
    };
    respond(&gateway.find_many::<Document>(&collection, filter, options).await)
}

pub(crate) async fn find_one(gateway: Arc<CrudGateway>, _ctx: CallContext, args: Vec<JsonValue>) -> GatewayResult<JsonValue> {
    let args = Args::new(args);
    let (collection, filter) = match args.collection(0).and_then(|c| Ok((c, args.document_or_empty(1)?))) {
        Ok(parsed) => parsed,
        Err(e) => return reject("findOne", e),
    };
    respond(&gateway.find_one::<Document>(&collection, filter).await)
}

pub(crate) async fn update(gateway: Arc<CrudGateway>, _ctx: CallContext, args: Vec<JsonValue>) -> GatewayResult<JsonValue> {
    let args = Args::new(args);
    let parsed = args.collection(0).and_then(|collection| {
        Ok((collection, args.document(1)?, args.document(2)?))
    });
    let (collection, filter, update) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return reject("updateOne", e),
    };
    respond(&gateway.update(&collection, filter, update).await)
}

pub(crate) async fn delete(gateway: Arc<CrudGateway>, _ctx: CallContext, args: Vec<JsonValue>) -> GatewayResult<JsonValue> {
    let args = Args::new(args);
    let (collection, filter) = match args.collection(0).and_then(|c| Ok((c, args.document(1)?))) {
        Ok(parsed) => parsed,
        Err(e) => return reject("deleteOne", e),
    };
    respond(&gateway.delete(&collection, filter).await)
}

pub(crate) async fn count(gateway: Arc<CrudGateway>, _ctx: CallContext, args: Vec<JsonValue>) -> GatewayResult<JsonValue> {
    let args = Args::new(args);
    let (collection, filter) = match args.collection(0).and_then(|c| Ok((c, args.document_or_empty(1)?))) {
        Ok(parsed) => parsed,
        Err(e) => return reject("countDocuments", e),
    };
    respond(&gateway.count(&collection, filter).await)
}

pub(crate) async fn is_connected(gateway: Arc<CrudGateway>, _ctx: CallContext, _args: Vec<JsonValue>) -> GatewayResult<JsonValue> {
    Ok(JsonValue::Bool(gateway.is_connected()))
}

pub(crate) async fn list_collections(gateway: Arc<CrudGateway>, _ctx: CallContext, _args: Vec<JsonValue>) -> GatewayResult<JsonValue> {
    Ok(JsonValue::from(gateway.list_collections().await))
}

pub(crate) async fn connect(gateway: Arc<CrudGateway>, ctx: CallContext, args: Vec<JsonValue>) -> GatewayResult<JsonValue> {
    let args = Args::new(args);
    let parsed = args
        .optional_string(0)
        .and_then(|url| Ok((url, ConnectionOptions::from_json(args.raw(1))?)));
    let (url, options) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return reject("connect", e),
    };
    acknowledge(gateway.connect(&ctx.source, url, options).await)
}

pub(crate) async fn disconnect(gateway: Arc<CrudGateway>, ctx: CallContext, _args: Vec<JsonValue>) -> GatewayResult<JsonValue> {
    acknowledge(gateway.disconnect(&ctx.source).await)
}
