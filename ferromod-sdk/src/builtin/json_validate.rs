use super::with_whole_body;
use crate::body::{Body, BodyAccess, RequestBody};
use crate::handle::FilterHandle;
use crate::traits::{HttpFilter, HttpFilterInstance};
use ferromod_abi::BodyStatus;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonValidateConfig {
    /// Top-level fields the request object must carry.
    #[serde(default)]
    pub required_fields: Vec<String>,
}

impl JsonValidateConfig {
    pub(crate) fn check(&self, value: &Value) -> Result<(), String> {
        if self.required_fields.is_empty() {
            return Ok(());
        }
        let Some(object) = value.as_object() else {
            return Err("expected a JSON object".to_string());
        };
        match self
            .required_fields
            .iter()
            .find(|field| !object.contains_key(field.as_str()))
        {
            Some(missing) => Err(format!("missing field: {}", missing)),
            None => Ok(()),
        }
    }

    fn validate<B: BodyAccess>(&self, body: &Body<'_, B>) -> Result<(), String> {
        let value: Value =
            serde_json::from_reader(body.reader()).map_err(|e| format!("invalid JSON: {}", e))?;
        self.check(&value)
    }
}

pub(super) struct JsonValidate {
    config: Arc<JsonValidateConfig>,
}

impl JsonValidate {
    pub(super) fn new(config: JsonValidateConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl HttpFilter for JsonValidate {
    fn new_instance(&self, _filter: &mut FilterHandle) -> Option<Box<dyn HttpFilterInstance>> {
        Some(Box::new(JsonValidateInstance {
            config: Arc::clone(&self.config),
        }))
    }
}

struct JsonValidateInstance {
    config: Arc<JsonValidateConfig>,
}

impl HttpFilterInstance for JsonValidateInstance {
    fn on_request_body(
        &mut self,
        filter: &mut FilterHandle,
        body: &mut RequestBody<'_>,
        end_stream: bool,
    ) -> BodyStatus {
        if !end_stream {
            return BodyStatus::StopIterationAndBuffer;
        }
        let verdict = with_whole_body(filter.request_body(), body, |whole| {
            self.config.validate(whole)
        });
        match verdict {
            Ok(()) => BodyStatus::Continue,
            Err(reason) => {
                crate::log_debug!("rejecting request body: {}", reason);
                filter.send_response(
                    400,
                    &[("content-type", "text/plain")],
                    reason.as_bytes(),
                );
                BodyStatus::StopIterationNoBuffer
            }
        }
    }
}
