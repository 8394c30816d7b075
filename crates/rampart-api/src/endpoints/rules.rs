// Rule endpoints
//
// Create and update share the generic manage endpoint and differ only by the
// `operation` field. Rule ids are reserved up front via `next_rule_id`.

use tracing::debug;

use crate::client::{ApiClient, RequestOptions};
use crate::error::Error;
use crate::models::{
    ApiMessage, FirewallRule, ManageRuleBody, ManagedRule, NextRuleIdResponse, RuleOperation,
    RuleSpec, RulesResponse,
};

impl ApiClient {
    /// List every rule.
    ///
    /// `GET /rules`
    pub async fn list_rules(&self) -> Result<Vec<FirewallRule>, Error> {
        debug!("listing rules");
        let resp: RulesResponse = self.get("/rules", RequestOptions::new()).await?;
        Ok(resp.rules)
    }

    /// Reserve the id for the next rule.
    ///
    /// `GET /rules/next_rule_id`
    pub async fn next_rule_id(&self) -> Result<u32, Error> {
        let resp: NextRuleIdResponse = self.get("/rules/next_rule_id", RequestOptions::new()).await?;
        Ok(resp.rule_id)
    }

    /// `POST /manage` with `{"rule": {"operation": "add", "rule_id", ...}}`
    pub async fn create_rule(&self, rule_id: u32, spec: &RuleSpec) -> Result<ApiMessage, Error> {
        debug!(rule_id, "creating rule");
        self.manage_rule(RuleOperation::Add, rule_id, spec).await
    }

    /// `POST /manage` with `{"rule": {"operation": "update", "rule_id", ...}}`
    pub async fn update_rule(&self, rule_id: u32, spec: &RuleSpec) -> Result<ApiMessage, Error> {
        debug!(rule_id, "updating rule");
        self.manage_rule(RuleOperation::Update, rule_id, spec).await
    }

    /// `DELETE /delete/{rule_id}`
    pub async fn delete_rule(&self, rule_id: u32) -> Result<ApiMessage, Error> {
        debug!(rule_id, "deleting rule");
        self.delete(&format!("/delete/{rule_id}"), RequestOptions::new())
            .await
    }

    async fn manage_rule(
        &self,
        operation: RuleOperation,
        rule_id: u32,
        spec: &RuleSpec,
    ) -> Result<ApiMessage, Error> {
        let body = ManageRuleBody {
            rule: ManagedRule {
                operation,
                rule_id,
                spec,
            },
        };
        self.post("/manage", &body).await
    }
}
