//! Firewall rule command handlers.

use tabled::Tabled;

use rampart_api::{Direction, FirewallRule, RuleAction, RuleProtocol, RuleSpec};
use rampart_core::{
    Command as CoreCommand, CommandResult, Controller, RuleTemplate, TemplateId, all_templates,
};

use crate::cli::{
    DirectionArg, GlobalOpts, ProtocolArg, RuleActionArg, RuleArgs, RulesArgs, RulesCommand,
};
use crate::error::CliError;
use crate::output;

use super::util;

pub(crate) fn map_action(a: RuleActionArg) -> RuleAction {
    match a {
        RuleActionArg::Allow => RuleAction::Allow,
        RuleActionArg::Deny => RuleAction::Deny,
    }
}

fn to_spec(args: RuleArgs) -> RuleSpec {
    RuleSpec {
        action: map_action(args.action),
        direction: match args.direction {
            DirectionArg::In => Direction::In,
            DirectionArg::Out => Direction::Out,
        },
        protocol: match args.protocol {
            ProtocolArg::Tcp => RuleProtocol::Tcp,
            ProtocolArg::Udp => RuleProtocol::Udp,
            ProtocolArg::All => RuleProtocol::All,
        },
        port: args.port,
        host: args.host,
    }
}

// ── Rule table row ──────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct RuleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Dir")]
    direction: String,
    #[tabled(rename = "Proto")]
    protocol: String,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Host")]
    host: String,
}

impl From<&FirewallRule> for RuleRow {
    fn from(r: &FirewallRule) -> Self {
        Self {
            id: util::or_dash(r.rule_id),
            action: r.action.as_str().to_uppercase(),
            direction: r.direction.to_string(),
            protocol: r.protocol.as_str().to_uppercase(),
            port: if r.port == 0 {
                "all".into()
            } else {
                r.port.to_string()
            },
            host: r.host.clone(),
        }
    }
}

// ── Template table row ──────────────────────────────────────────────

/// Serializable view of a built-in template.
#[derive(serde::Serialize)]
struct TemplateView {
    id: String,
    name: &'static str,
    description: &'static str,
    rules: Vec<RuleSpec>,
}

impl From<RuleTemplate> for TemplateView {
    fn from(t: RuleTemplate) -> Self {
        Self {
            id: t.id.to_string(),
            name: t.name,
            description: t.description,
            rules: t.rules,
        }
    }
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "Template")]
    id: String,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Rules")]
    rules: String,
}

impl From<&TemplateView> for TemplateRow {
    fn from(t: &TemplateView) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name,
            rules: t
                .rules
                .iter()
                .map(RuleSpec::describe)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Print the built-in templates. Needs no API session.
pub fn list_templates(global: &GlobalOpts) -> Result<(), CliError> {
    let templates: Vec<TemplateView> = all_templates().into_iter().map(TemplateView::from).collect();
    let out = output::render_list(
        &global.output,
        &templates,
        |t| TemplateRow::from(t),
        |t| t.id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: RulesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RulesCommand::List => {
            let rules = controller.rules().await?;
            let out = output::render_list(
                &global.output,
                &rules,
                |r| RuleRow::from(r),
                |r| util::or_dash(r.rule_id),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RulesCommand::NextId => {
            let id = controller.next_rule_id().await?;
            let out = output::render_single(&global.output, &id, ToString::to_string, ToString::to_string);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RulesCommand::Add(rule) => {
            let cmd = CoreCommand::CreateRule(to_spec(rule));
            if let CommandResult::RuleCreated { rule_id, .. } = util::execute(controller, cmd, global).await? {
                output::print_output(&rule_id.to_string(), global.quiet);
            }
            Ok(())
        }

        RulesCommand::Update { id, rule } => {
            let cmd = CoreCommand::UpdateRule {
                rule_id: id,
                spec: to_spec(rule),
            };
            util::execute(controller, cmd, global).await?;
            Ok(())
        }

        RulesCommand::Delete { id } => {
            util::execute(controller, CoreCommand::DeleteRule { rule_id: id }, global).await?;
            Ok(())
        }

        RulesCommand::Templates => list_templates(global),

        RulesCommand::ApplyTemplate { name } => {
            let id = TemplateId::from_name(&name)?;
            let result = util::execute(controller, CoreCommand::ApplyTemplate(id), global).await?;
            if let CommandResult::TemplateApplied { rule_ids, .. } = result {
                let ids: Vec<String> = rule_ids.iter().map(u32::to_string).collect();
                output::print_output(&ids.join("\n"), global.quiet);
            }
            Ok(())
        }
    }
}
