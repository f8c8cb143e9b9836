//! Plan command handler.

use super::print_json;
use clap::Args;
use footprint_core::{config::AppConfig, AppResult};
use footprint_knowledge::{IndexConfig, RetrievalPlanner};

/// Show how a question would be routed
#[derive(Args, Debug)]
pub struct PlanCommand {
    /// The question to classify
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PlanCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let index = IndexConfig::load(&config.workspace)?;
        let plan = RetrievalPlanner::new(index.planner).make_plan(&self.question);

        if self.json {
            return print_json(&plan);
        }

        let categories: Vec<&str> = plan
            .eligible_categories
            .iter()
            .map(|c| c.as_str())
            .collect();

        println!("Intent:      {}", plan.intent);
        println!("Categories:  {}", categories.join(", "));
        println!("Max results: {}", plan.max_results);
        println!("Fresh data:  {}", if plan.force_fresh { "yes" } else { "no" });

        Ok(())
    }
}
