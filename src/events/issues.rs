use super::*;
use crate::requirement::RequirementRecord;
use tracing::{debug, info};

pub struct IssuesHandler<'a> {
    event: &'a IssuesEvent,
    state: &'a State,
}

#[async_trait::async_trait]
impl<'a> Handler<'a> for IssuesHandler<'a> {
    fn new(event: &'a IssuesEvent, state: &'a State) -> Self {
        Self { event, state }
    }

    async fn execute(&self) -> Result<Outcome, ForwardError> {
        let Some(action) = self.event.action.as_ref().filter(|action| action.is_handled()) else {
            info!("Action {} not handled, exiting.", self.event.action_name());
            return Ok(Outcome::Ignored {
                action: self.event.action_name().to_owned(),
            });
        };

        let Some(issue) = self.event.issue()? else {
            info!("Action {} not handled, exiting.", action);
            return Ok(Outcome::Ignored {
                action: action.to_string(),
            });
        };

        let record = RequirementRecord::from_issue(&issue, action);
        debug!(
            "Derived requirement {}: status {}, type {}, expected coverage {}, overwrite {}",
            record.docid,
            record.status.code(),
            record.req_type.id(),
            record.expected_coverage,
            record.overwrite
        );
        info!(
            "Forwarding issue #{} of {} ({}) to TestLink as requirement {}",
            issue.number, self.state.config.repository, action, record.docid
        );

        let response = self.state.testlink.create_requirement(&record).await?;
        info!("TestLink response: {}", response);

        Ok(Outcome::Submitted {
            docid: record.docid,
            response,
        })
    }
}
