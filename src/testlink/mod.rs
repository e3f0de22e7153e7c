use crate::{config::Config, requirement::RequirementRecord};
use derive_more::{Display, Error};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use xmlrpc::{MethodResponse, Value, XmlRpcError};

pub mod xmlrpc;

pub static CREATE_REQUIREMENT_METHOD: &str = "tl.createRequirement";

#[derive(Debug, Display, Error)]
pub enum TestLinkError {
    #[display("HTTP request failed: {source}")]
    Transport { source: reqwest::Error },
    #[display("TestLink answered with HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[display("XML-RPC fault {code}: {message}")]
    Fault { code: i64, message: String },
    #[display("TestLink rejected the requirement ({code}): {message}")]
    Rejected { code: i64, message: String },
    #[display("Unreadable TestLink response: {source}")]
    MalformedResponse { source: XmlRpcError },
}

/// Client of the TestLink XML-RPC API, bound to one project and requirement
/// specification.
pub struct TestLinkClient {
    http: reqwest::Client,
    url: String,
    dev_key: String,
    project_id: i64,
    reqspec_id: i64,
}

impl TestLinkClient {
    pub fn new(config: &Config) -> Result<Self, TestLinkError> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|source| TestLinkError::Transport { source })?;

        Ok(Self {
            http,
            url: config.testlink_url.clone(),
            dev_key: config.testlink_devkey.clone(),
            project_id: config.testlink_project_id,
            reqspec_id: config.testlink_reqspec_id,
        })
    }

    /// Argument struct of `tl.createRequirement`. `overwrite` is only sent
    /// when set.
    pub fn create_requirement_params(&self, record: &RequirementRecord) -> Value {
        let mut members = vec![
            (String::from("devKey"), Value::String(self.dev_key.clone())),
            (String::from("testprojectid"), Value::Int(self.project_id)),
            (String::from("reqspecid"), Value::Int(self.reqspec_id)),
            (String::from("title"), Value::String(record.title.clone())),
            (String::from("docid"), Value::String(record.docid.clone())),
            (String::from("scope"), Value::String(record.scope.clone())),
            (
                String::from("status"),
                Value::String(record.status.code().to_owned()),
            ),
            (String::from("type"), Value::Int(record.req_type.id())),
            (
                String::from("expected_coverage"),
                Value::Int(record.expected_coverage),
            ),
        ];
        if record.overwrite {
            members.push((String::from("overwrite"), Value::Bool(true)));
        }
        Value::Struct(members)
    }

    /// Creates the requirement, or overwrites the one with the same docid when
    /// the record asks for it. Returns TestLink's answer.
    pub async fn create_requirement(
        &self,
        record: &RequirementRecord,
    ) -> Result<Value, TestLinkError> {
        let body = xmlrpc::method_call(
            CREATE_REQUIREMENT_METHOD,
            &[self.create_requirement_params(record)],
        );

        let response = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|source| TestLinkError::Transport { source })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| TestLinkError::Transport { source })?;
        debug!("TestLink answered with HTTP {}", status);

        if !status.is_success() {
            return Err(TestLinkError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        match xmlrpc::parse_response(&text)
            .map_err(|source| TestLinkError::MalformedResponse { source })?
        {
            MethodResponse::Fault { code, message } => Err(TestLinkError::Fault { code, message }),
            MethodResponse::Success(value) => match api_error(&value) {
                Some((code, message)) => Err(TestLinkError::Rejected { code, message }),
                None => Ok(value),
            },
        }
    }
}

/// TestLink reports API errors as a regular response: a list of
/// `{code, message}` structs. A result with `status_ok` false is an error too.
fn api_error(value: &Value) -> Option<(i64, String)> {
    let first = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };

    if let (Some(code), Some(message)) = (
        first.get("code").and_then(Value::as_i64),
        first.get("message").and_then(Value::as_str),
    ) {
        return Some((code, message.to_owned()));
    }

    if first.get("status_ok").and_then(Value::as_bool) == Some(false) {
        let message = first
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("status_ok is false");
        return Some((0, message.to_owned()));
    }

    None
}
