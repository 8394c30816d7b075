//! Whitelist command handlers.

use tabled::Tabled;

use rampart_api::WhitelistEntry;
use rampart_core::{Command as CoreCommand, Controller};

use crate::cli::{GlobalOpts, WhitelistArgs, WhitelistCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
pub(crate) struct WhitelistRow {
    #[tabled(rename = "IP Address")]
    ip: String,
    #[tabled(rename = "Added")]
    created_at: String,
}

impl From<&WhitelistEntry> for WhitelistRow {
    fn from(e: &WhitelistEntry) -> Self {
        Self {
            ip: e.ip_address.clone(),
            created_at: if e.created_at.is_empty() {
                "-".into()
            } else {
                e.created_at.clone()
            },
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: WhitelistArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        WhitelistCommand::List => {
            let entries = controller.whitelist().await?;
            let out = output::render_list(
                &global.output,
                &entries,
                |e| WhitelistRow::from(e),
                |e| e.ip_address.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // Input is validated before any request goes out
        WhitelistCommand::Add { ip } => {
            util::execute(controller, CoreCommand::add_whitelist(&ip)?, global).await?;
            Ok(())
        }

        WhitelistCommand::Remove { ip } => {
            util::execute(controller, CoreCommand::remove_whitelist(&ip)?, global).await?;
            Ok(())
        }
    }
}
