//! Lockdown / stealth mode command handlers.

use tabled::Tabled;

use rampart_api::{ConfigMode, ModeStatus};
use rampart_core::{Command as CoreCommand, Controller};

use crate::cli::{GlobalOpts, ModeArg, ModeArgs, ModeCommand, SwitchArg};
use crate::error::CliError;
use crate::output;

use super::util;

fn map_mode(m: ModeArg) -> ConfigMode {
    match m {
        ModeArg::Lockdown => ConfigMode::Lockdown,
        ModeArg::Stealth => ConfigMode::Stealth,
    }
}

#[derive(serde::Serialize)]
struct ModeView {
    mode: ConfigMode,
    status: ModeStatus,
}

#[derive(Tabled)]
struct ModeRow {
    #[tabled(rename = "Mode")]
    mode: &'static str,
    #[tabled(rename = "Status")]
    status: &'static str,
}

impl From<&ModeView> for ModeRow {
    fn from(v: &ModeView) -> Self {
        Self {
            mode: v.mode.title(),
            status: v.status.as_str(),
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: ModeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ModeCommand::Get { mode } => {
            let modes = mode.map_or_else(|| ConfigMode::ALL.to_vec(), |m| vec![map_mode(m)]);
            let mut views = Vec::with_capacity(modes.len());
            for mode in modes {
                let status = controller.mode(mode).await?;
                views.push(ModeView { mode, status });
            }
            let out = output::render_list(
                &global.output,
                &views,
                |v| ModeRow::from(v),
                |v| format!("{} {}", v.mode, v.status),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ModeCommand::Set { mode, state } => {
            let cmd = CoreCommand::SetMode {
                mode: map_mode(mode),
                status: ModeStatus::from(matches!(state, SwitchArg::On)),
            };
            util::execute(controller, cmd, global).await?;
            Ok(())
        }
    }
}
