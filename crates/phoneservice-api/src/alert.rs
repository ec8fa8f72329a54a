//! Notification headers telling a client what a mutation did.
//!
//! A successful mutation carries `X-{app}-alert: {app}.{entity}.{action}`
//! and `X-{app}-params: {id}`. A rejected request carries
//! `X-{app}-error: error.{key}` and `X-{app}-params: {entity}`.

use axum::http::header::InvalidHeaderName;
use axum::http::{HeaderName, HeaderValue};

use crate::Headers;

/// Builds alert headers for one application name.
#[derive(Debug, Clone)]
pub struct AlertHeaders {
    app_name: String,
    alert: HeaderName,
    error: HeaderName,
    params: HeaderName,
}

fn value(raw: &str) -> HeaderValue {
    HeaderValue::from_str(raw).unwrap_or_else(|_| HeaderValue::from_static(""))
}

impl AlertHeaders {
    /// # Errors
    ///
    /// Returns an error if `app_name` cannot appear in a header name.
    pub fn new(app_name: impl Into<String>) -> Result<Self, InvalidHeaderName> {
        let app_name = app_name.into();
        Ok(Self {
            alert: HeaderName::try_from(format!("X-{app_name}-alert"))?,
            error: HeaderName::try_from(format!("X-{app_name}-error"))?,
            params: HeaderName::try_from(format!("X-{app_name}-params"))?,
            app_name,
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn alert(&self, message: &str, param: &str) -> Headers {
        vec![
            (self.alert.clone(), value(message)),
            (self.params.clone(), value(param)),
        ]
    }

    pub fn entity_created(&self, entity_name: &str, param: &str) -> Headers {
        self.alert(&format!("{}.{entity_name}.created", self.app_name), param)
    }

    pub fn entity_updated(&self, entity_name: &str, param: &str) -> Headers {
        self.alert(&format!("{}.{entity_name}.updated", self.app_name), param)
    }

    pub fn entity_deleted(&self, entity_name: &str, param: &str) -> Headers {
        self.alert(&format!("{}.{entity_name}.deleted", self.app_name), param)
    }

    pub fn failure(&self, entity_name: &str, error_key: &str) -> Headers {
        vec![
            (self.error.clone(), value(&format!("error.{error_key}"))),
            (self.params.clone(), value(entity_name)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.to_str().ok())
    }

    #[test]
    fn creation_alert() {
        let alerts = AlertHeaders::new("phoneserviceApp").unwrap();
        let headers = alerts.entity_created("phone", "1");
        assert_eq!(
            lookup(&headers, "x-phoneserviceapp-alert"),
            Some("phoneserviceApp.phone.created")
        );
        assert_eq!(lookup(&headers, "x-phoneserviceapp-params"), Some("1"));
    }

    #[test]
    fn update_and_delete_alerts() {
        let alerts = AlertHeaders::new("shop").unwrap();
        assert_eq!(
            lookup(&alerts.entity_updated("phone", "7"), "x-shop-alert"),
            Some("shop.phone.updated")
        );
        assert_eq!(
            lookup(&alerts.entity_deleted("phone", "7"), "x-shop-alert"),
            Some("shop.phone.deleted")
        );
    }

    #[test]
    fn failure_alert() {
        let alerts = AlertHeaders::new("phoneserviceApp").unwrap();
        let headers = alerts.failure("phone", "idexists");
        assert_eq!(
            lookup(&headers, "x-phoneserviceapp-error"),
            Some("error.idexists")
        );
        assert_eq!(lookup(&headers, "x-phoneserviceapp-params"), Some("phone"));
    }

    #[test]
    fn rejects_unusable_app_name() {
        assert!(AlertHeaders::new("bad name").is_err());
        assert!(AlertHeaders::new("").is_ok());
    }
}
