//! Team sprints (iterations).

use azdo_core::{Iteration, SprintProvider, Timeframe};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{failure, params, ToolHandler};
use crate::protocol::ToolCallResult;

#[derive(Debug, Default, Deserialize)]
struct CurrentSprintParams {
    #[serde(default)]
    team: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SprintsParams {
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    include_completed: bool,
}

impl ToolHandler {
    pub(super) async fn get_current_sprint(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: CurrentSprintParams = params!("get_current_sprint", arguments);

        let iterations = match self
            .provider
            .get_iterations(params.team.as_deref(), Some(Timeframe::Current))
            .await
        {
            Ok(iterations) => iterations,
            Err(e) => return failure("Failed to get current sprint", e),
        };

        match iterations.first() {
            Some(sprint) => ToolCallResult::text(format!(
                "Current Sprint: {}\nStart Date: {}\nEnd Date: {}",
                sprint.name,
                start(sprint),
                finish(sprint)
            )),
            None => ToolCallResult::text("No active sprint found".to_string()),
        }
    }

    pub(super) async fn get_sprints(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: SprintsParams = params!("get_sprints", arguments);

        let iterations = match self
            .provider
            .get_iterations(params.team.as_deref(), None)
            .await
        {
            Ok(iterations) => iterations,
            Err(e) => return failure("Failed to get sprints", e),
        };

        let blocks: Vec<String> = iterations
            .iter()
            .filter(|s| params.include_completed || s.timeframe != Timeframe::Past)
            .map(|s| format!("Sprint: {}\nStart: {}\nEnd: {}\n---", s.name, start(s), finish(s)))
            .collect();

        if blocks.is_empty() {
            return ToolCallResult::text("No sprints found".to_string());
        }

        ToolCallResult::text(blocks.join("\n"))
    }
}

fn start(sprint: &Iteration) -> String {
    day(sprint.start_date.as_ref())
}

fn finish(sprint: &Iteration) -> String {
    day(sprint.finish_date.as_ref())
}

fn day(value: Option<&DateTime<Utc>>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "not set".to_string())
}
