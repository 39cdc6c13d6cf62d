//! `validate`: check the connection and optionally persist it.

use serde::Serialize;
use tracing::warn;

use crate::cli::{GlobalOpts, ValidateArgs};
use crate::config::ProfileContext;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ValidationResult {
    profile: String,
    url: String,
    version: Option<String>,
    revision: Option<i64>,
    build_time: Option<String>,
}

fn detail(r: &ValidationResult) -> String {
    [
        format!("Profile:  {}", r.profile),
        format!("URL:      {}", r.url),
        format!("Version:  {}", r.version.as_deref().unwrap_or("-")),
        format!(
            "Revision: {}",
            r.revision.map_or_else(|| "-".into(), |v| v.to_string())
        ),
        format!("Built:    {}", r.build_time.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

pub async fn handle(
    ctx: &mut ProfileContext,
    args: &ValidateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let bridge = super::oneshot_bridge(ctx, global)?;
    let version = bridge.validate().await?;

    let result = ValidationResult {
        profile: ctx.name.clone(),
        url: bridge.remote().base_url().to_string(),
        version: version.version,
        revision: version.revision,
        build_time: version.build_time,
    };
    let out = output::render_single(global.output, &result, detail, |r| {
        r.version.clone().unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);

    if args.save {
        if let Some(password) = &global.password {
            if let Err(e) = domosync_config::store_password(&ctx.name, password) {
                warn!(error = %e, "password not stored; set password_env in the profile instead");
            }
        }
        let path = ctx.save()?;
        output::print_status(
            &format!("Saved profile '{}' to {}", ctx.name, path.display()),
            global.quiet,
        );
    }
    Ok(())
}
