//! Subscriber Management Handlers
//!
//! `/core/subscribers` and `/core/subscribers/{imsi}`

use std::str::FromStr;

use coredc_dbi::{DbiError, Page, SubscriberFilter};
use coredc_model::{SubscriberRecord, ValidationError, ValidationResult};
use coredc_sbi::{
    send_conflict, send_internal_error, send_method_not_allowed, send_not_found,
    send_unprocessable_entity, InvalidParam, SbiRequest, SbiResponse,
};
use serde::Serialize;

use crate::context::CoreContext;

#[derive(Serialize)]
struct StatusMessage {
    status: &'static str,
    message: String,
}

fn success(message: String) -> SbiResponse {
    let body = StatusMessage {
        status: "success",
        message,
    };
    SbiResponse::ok()
        .with_json_body(&body)
        .unwrap_or_else(|e| send_internal_error(&e.to_string()))
}

/// 422 response naming the offending field
pub fn validation_error(error: &ValidationError) -> SbiResponse {
    let detail = error.to_string();
    let invalid_params = error
        .param()
        .map(|param| vec![InvalidParam::new(param, detail.as_str())])
        .unwrap_or_default();
    send_unprocessable_entity(&detail, invalid_params)
}

/// Map a store error to its client-facing response
fn store_error(error: &DbiError) -> SbiResponse {
    match error {
        DbiError::Conflict(_) => send_conflict(&error.to_string()),
        DbiError::NotFound(_) => send_not_found(&error.to_string(), Some("SUBSCRIBER_NOT_FOUND")),
        DbiError::Validation(e) => validation_error(e),
        _ => {
            log::error!("Database error: {error}");
            send_internal_error("Database operation failed")
        }
    }
}

fn parse_param<T: FromStr>(request: &SbiRequest, name: &str, reason: &str) -> ValidationResult<Option<T>> {
    match request.http.get_param(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ValidationError::InvalidParam {
                param: name.to_string(),
                reason: reason.to_string(),
            }),
    }
}

/// Build the list filter and page from query parameters
pub fn parse_list_query(request: &SbiRequest) -> ValidationResult<(SubscriberFilter, Page)> {
    let mut filter = SubscriberFilter::new();

    if let Some(name) = request.http.get_param("name") {
        filter = filter.with_name(name.as_str());
    }

    if let Some(sst) = parse_param::<i32>(request, "sst", "must be an integer")? {
        let sd = request.http.get_param("sd").map(String::as_str);
        filter = filter.with_slice(sst, sd);
    }

    let page = Page::default();
    let limit = parse_param::<u32>(request, "limit", "must be greater than or equal to 1")?
        .unwrap_or(page.limit);
    let offset = parse_param::<u64>(request, "offset", "must be greater than or equal to 0")?
        .unwrap_or(page.offset);

    Ok((filter, Page::new(limit, offset)?))
}

/// `/core/subscribers`
pub async fn handle_subscribers(ctx: &CoreContext, method: &str, request: &SbiRequest) -> SbiResponse {
    match method {
        "GET" => list_subscribers(ctx, request).await,
        "POST" => create_subscriber(ctx, request).await,
        _ => send_method_not_allowed(method, "/core/subscribers"),
    }
}

/// `/core/subscribers/{imsi}`
pub async fn handle_subscriber(
    ctx: &CoreContext,
    imsi: &str,
    method: &str,
    request: &SbiRequest,
) -> SbiResponse {
    match method {
        "PUT" => replace_subscriber(ctx, imsi, request).await,
        "DELETE" => delete_subscriber(ctx, imsi).await,
        _ => send_method_not_allowed(method, "/core/subscribers/{imsi}"),
    }
}

async fn list_subscribers(ctx: &CoreContext, request: &SbiRequest) -> SbiResponse {
    let (filter, page) = match parse_list_query(request) {
        Ok(query) => query,
        Err(e) => return validation_error(&e),
    };

    match ctx.store.list(&filter, page).await {
        Ok(subscribers) => {
            log::info!(
                "Retrieved {} subscribers with filters name={:?} sst={:?} sd={:?} limit={} offset={}",
                subscribers.len(),
                filter.name,
                filter.sst,
                filter.sd,
                page.limit,
                page.offset
            );
            SbiResponse::ok()
                .with_json_body(&subscribers)
                .unwrap_or_else(|e| send_internal_error(&e.to_string()))
        }
        Err(e) => store_error(&e),
    }
}

async fn create_subscriber(ctx: &CoreContext, request: &SbiRequest) -> SbiResponse {
    let body = request.http.content.as_deref().unwrap_or_default();
    let subscriber = match SubscriberRecord::from_json(body) {
        Ok(subscriber) => subscriber,
        Err(e) => {
            log::warn!("Rejected subscriber: {e}");
            return validation_error(&e);
        }
    };
    let imsi = subscriber.imsi().to_string();

    match ctx.store.create(subscriber).await {
        Ok(created) => {
            log::info!("Created subscriber {imsi}");
            SbiResponse::created()
                .with_json_body(&created)
                .unwrap_or_else(|e| send_internal_error(&e.to_string()))
        }
        Err(e @ DbiError::Conflict(_)) => {
            log::warn!("Duplicate IMSI conflict while creating {imsi}");
            store_error(&e)
        }
        Err(e) => store_error(&e),
    }
}

async fn replace_subscriber(ctx: &CoreContext, imsi: &str, request: &SbiRequest) -> SbiResponse {
    let body = request.http.content.as_deref().unwrap_or_default();
    let subscriber = match SubscriberRecord::from_json(body) {
        Ok(subscriber) => subscriber,
        Err(e) => {
            log::warn!("[{imsi}] Rejected replacement: {e}");
            return validation_error(&e);
        }
    };

    if subscriber.imsi() != imsi {
        log::debug!("[{imsi}] Ignoring IMSI {} from request body", subscriber.imsi());
    }

    match ctx.store.replace(imsi, subscriber).await {
        Ok(()) => {
            log::info!("Updated subscriber {imsi}");
            success(format!("Subscriber {imsi} updated"))
        }
        Err(DbiError::Conflict(_)) => {
            log::warn!("Duplicate IMSI conflict while updating {imsi}");
            send_conflict(&format!("Subscriber IMSI {imsi} conflicts with an existing subscriber"))
        }
        Err(e @ DbiError::NotFound(_)) => {
            log::warn!("Subscriber {imsi} not found for update");
            store_error(&e)
        }
        Err(e) => store_error(&e),
    }
}

async fn delete_subscriber(ctx: &CoreContext, imsi: &str) -> SbiResponse {
    match ctx.store.delete(imsi).await {
        Ok(_) => {
            log::info!("Deleted subscriber {imsi}");
            success(format!("Subscriber {imsi} deleted"))
        }
        Err(e @ DbiError::NotFound(_)) => {
            log::warn!("Subscriber {imsi} not found for deletion");
            store_error(&e)
        }
        Err(e) => store_error(&e),
    }
}
