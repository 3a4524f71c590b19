//! Generic HTTP client tools
//!
//! Sending the request, logging, status handling and body reading live here so
//! each geocoder only builds its `RequestBuilder` and maps its own JSON.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::GeocodeError;
use crate::utils::log_sanitizer::truncate_for_log;

/// HTTP tool function set
pub struct HttpUtils;

impl HttpUtils {
    /// Performs an HTTP request and returns the response text
    ///
    /// # Arguments
    /// * `request_builder` - configured request (URL, headers, timeout)
    /// * `service_name` - geocoder name (for logging)
    /// * `method_name` - request method name (for logging)
    /// * `url` - request URL (for logging)
    ///
    /// # Returns
    /// * `Ok(response_text)` - body of a 2xx response
    /// * `Err(GeocodeError::Timeout | NetworkError)` - transport failure
    /// * `Err(GeocodeError::HttpStatus)` - any non-2xx status
    pub async fn execute_request(
        request_builder: RequestBuilder,
        service_name: &str,
        method_name: &str,
        url: &str,
    ) -> Result<String, GeocodeError> {
        log::debug!("[{service_name}] {method_name} {url}");

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GeocodeError::Timeout {
                    detail: e.to_string(),
                }
            } else {
                GeocodeError::NetworkError {
                    detail: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        log::debug!("[{service_name}] Response Status: {}", status.as_u16());

        if !status.is_success() {
            let body = response.text().await.ok().filter(|b| !b.is_empty());
            log::warn!("[{service_name}] Request rejected (HTTP {})", status.as_u16());
            return Err(GeocodeError::HttpStatus {
                status: status.as_u16(),
                body: body.map(|b| truncate_for_log(&b)),
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| GeocodeError::NetworkError {
                detail: format!("Failed to read response body: {e}"),
            })?;

        log::debug!(
            "[{service_name}] Response Body: {}",
            truncate_for_log(&response_text)
        );

        Ok(response_text)
    }

    /// Parse JSON response
    ///
    /// # Returns
    /// * `Ok(T)` - successfully parsed
    /// * `Err(GeocodeError::ParseError)` - parsing failed
    pub fn parse_json<T>(response_text: &str, service_name: &str) -> Result<T, GeocodeError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(response_text).map_err(|e| {
            log::error!("[{service_name}] JSON parse failed: {e}");
            log::error!(
                "[{service_name}] Raw response: {}",
                truncate_for_log(response_text)
            );
            GeocodeError::ParseError {
                detail: e.to_string(),
            }
        })
    }
}
