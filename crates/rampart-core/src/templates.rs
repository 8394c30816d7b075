// ── Rule templates ──
//
// Named bundles of rules for common lockdowns. Applying one creates each
// rule in order through the normal create path.

use rampart_api::{Direction, RuleAction, RuleProtocol, RuleSpec};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::CoreError;

/// Built-in template identifiers, spelled as on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum TemplateId {
    BlockSsh,
    BlockHttp,
    BlockFtp,
    BlockTelnet,
    AllowAll,
}

/// A named set of rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTemplate {
    pub id: TemplateId,
    pub name: &'static str,
    pub description: &'static str,
    pub rules: Vec<RuleSpec>,
}

const ANY_HOST: &str = "0.0.0.0";

fn inbound(action: RuleAction, protocol: RuleProtocol, port: u16) -> RuleSpec {
    RuleSpec {
        action,
        direction: Direction::In,
        protocol,
        port,
        host: ANY_HOST.to_owned(),
    }
}

impl TemplateId {
    /// Look up a template by its command-line name (`block-ssh`, ...).
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        name.trim()
            .parse()
            .map_err(|_| CoreError::UnknownTemplate {
                name: name.to_owned(),
            })
    }

    pub fn template(self) -> RuleTemplate {
        let deny_tcp = |port| inbound(RuleAction::Deny, RuleProtocol::Tcp, port);
        let (name, description, rules) = match self {
            Self::BlockSsh => ("Block SSH", "Block SSH connections on port 22", vec![deny_tcp(22)]),
            Self::BlockHttp => ("Block HTTP", "Block HTTP connections on port 80", vec![deny_tcp(80)]),
            Self::BlockFtp => (
                "Block FTP",
                "Block FTP connections (ports 20, 21)",
                vec![deny_tcp(20), deny_tcp(21)],
            ),
            Self::BlockTelnet => (
                "Block Telnet",
                "Block Telnet connections on port 23",
                vec![deny_tcp(23)],
            ),
            Self::AllowAll => (
                "Allow All",
                "Allow all connections (not recommended)",
                vec![inbound(RuleAction::Allow, RuleProtocol::All, 0)],
            ),
        };
        RuleTemplate {
            id: self,
            name,
            description,
            rules,
        }
    }
}

/// Every built-in template, in display order.
pub fn all_templates() -> Vec<RuleTemplate> {
    TemplateId::iter().map(TemplateId::template).collect()
}
