use std::time::Duration;

use agentflow_core::DecisionRouter;

use crate::inference::InferenceClient;

#[derive(Clone)]
pub struct AppState {
    pub router: DecisionRouter,
    pub inference: InferenceClient,
    /// Deadline for one decision-router run
    pub agent_timeout: Duration,
}

#[cfg(test)]
impl AppState {
    /// State with the given router and an inference client pointed at a
    /// closed local port.
    pub fn for_tests(router: DecisionRouter) -> Self {
        let inference = InferenceClient::new(&crate::config::InferenceConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(2),
        })
        .expect("test inference client should build");
        Self {
            router,
            inference,
            agent_timeout: Duration::from_secs(5),
        }
    }
}
