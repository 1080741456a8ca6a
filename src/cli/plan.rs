use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::cli::run::RunArgs;
use crate::config::settings::Settings;
use crate::launch::plan;

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Emit the plan as JSON on stdout (logs go to stderr)
    #[arg(long)]
    pub json: bool,
}

impl PlanArgs {
    pub async fn execute(self) -> Result<()> {
        let settings = Settings::load()?;
        let params = self.run.resolve(&settings)?;
        let plan = plan::build(&params)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
            return Ok(());
        }

        println!("{}", "Bind mounts".bold());
        for bind in plan.binds.iter() {
            println!(
                "  {} {} -> {}",
                "•".yellow(),
                bind.source.display(),
                bind.target.display()
            );
        }

        println!("\n{}", "Application arguments".bold());
        for arg in &plan.app_args {
            println!("  {arg}");
        }

        println!("\n{}", "Container environment".bold());
        for var in &plan.env {
            println!("  {}={}", var.name, var.value);
        }

        if plan.nv {
            println!("\n  {} NVIDIA runtime enabled (--nv)", "•".yellow());
        }

        Ok(())
    }
}
