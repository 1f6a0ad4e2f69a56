use serde::Deserialize;

use recallguard_core::UserId;
use recallguard_platform::Destination;
use recallguard_shadow::template::DEFAULT_TEMPLATE;
use recallguard_shadow::{ForwardConfig, ForwardStrategy, PromptTemplate};

use crate::error::ServerError;

/// Where and how recalled content is delivered.
#[derive(Debug, Clone, Deserialize)]
pub struct ForwardSection {
    /// Destinations as `group:<id>` or `private:<id>`.
    #[serde(default)]
    pub destinations: Vec<String>,
    /// `"sequential"` or `"merged"`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// MiniJinja prompt template.
    #[serde(default = "default_template")]
    pub template: String,
    /// Sender id shown on merged-forward nodes.
    #[serde(default = "default_bot_id")]
    pub bot_id: String,
    /// Sender name shown on merged-forward nodes.
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
}

impl Default for ForwardSection {
    fn default() -> Self {
        Self {
            destinations: Vec::new(),
            strategy: default_strategy(),
            template: default_template(),
            bot_id: default_bot_id(),
            bot_name: default_bot_name(),
        }
    }
}

impl ForwardSection {
    /// Validate and convert into the forwarder's configuration.
    ///
    /// Every destination must parse and the template must compile.
    pub fn to_forward_config(&self) -> Result<ForwardConfig, ServerError> {
        let destinations = self
            .destinations
            .iter()
            .map(|d| {
                d.parse::<Destination>()
                    .map_err(|e| ServerError::Config(format!("forward.destinations: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let strategy = match self.strategy.trim().to_ascii_lowercase().as_str() {
            "sequential" => ForwardStrategy::Sequential,
            "merged" => ForwardStrategy::Merged,
            other => {
                return Err(ServerError::Config(format!(
                    "unknown forward strategy '{other}' (expected 'sequential' or 'merged')"
                )));
            }
        };

        let template = PromptTemplate::new(self.template.clone())
            .map_err(|e| ServerError::Config(format!("forward.template: {e}")))?;

        Ok(ForwardConfig {
            destinations,
            strategy,
            template: template.source().to_owned(),
            bot_id: UserId::new(self.bot_id.trim()),
            bot_name: self.bot_name.clone(),
        })
    }
}

fn default_strategy() -> String {
    "sequential".to_owned()
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_owned()
}

fn default_bot_id() -> String {
    "0".to_owned()
}

fn default_bot_name() -> String {
    "RecallGuard".to_owned()
}
