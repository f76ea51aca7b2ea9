use anyhow::{bail, Result};
use colored::Colorize;
use healthcare_cost::config;
use healthcare_cost::features::FEATURE_NAMES;
use healthcare_cost::model::Scorer;
use healthcare_cost::pipeline::ModelState;
use healthcare_cost::InferencePipeline;
use std::path::Path;
use tracing::info;

/// Execute the check command
///
/// Loads both artifacts the same way a prediction would and reports any
/// disagreement between them. Fails when no model can be loaded.
pub fn execute(config_path: &Path) -> Result<()> {
    println!("{}", "Checking artifacts...".yellow());
    let cfg = config::load_config(config_path)?;

    let pipeline = InferencePipeline::load(&cfg.artifacts, &cfg.pipeline);
    let model = match pipeline.model() {
        ModelState::Ready(model) => model.as_ref(),
        ModelState::Unavailable { reason } => bail!("Model unavailable: {}", reason),
    };
    let order = pipeline.feature_order().names();

    println!("{}", "Model:".bold());
    println!("  {}: {}", "Path".cyan(), cfg.artifacts.model_path.display());
    for (label, value) in model_summary(model) {
        println!("  {}: {}", label.cyan(), value);
    }
    println!();

    println!("{}", "Feature order:".bold());
    for (idx, name) in order.iter().enumerate() {
        println!("    {}. {}", idx + 1, name);
    }
    println!();

    let problems = find_problems(order, model);
    if problems.is_empty() {
        println!("{}", "✓ Artifacts are consistent".green());
    } else {
        for problem in &problems {
            println!("  {} {}", "!".red().bold(), problem);
        }
    }

    info!(problems = problems.len(), "Artifact check completed");
    Ok(())
}

fn model_summary(model: &dyn Scorer) -> [(&'static str, String); 3] {
    [
        ("Trees", model.num_trees().to_string()),
        ("Features", model.num_features().to_string()),
        ("Objective", model.objective().to_string()),
    ]
}

/// Disagreements between the feature order, the encoder and the model
fn find_problems(order: &[String], model: &dyn Scorer) -> Vec<String> {
    let mut problems = Vec::new();

    for name in order {
        if !FEATURE_NAMES.contains(&name.as_str()) {
            problems.push(format!("feature '{}' is not produced by the encoder", name));
        }
    }

    if order.len() != model.num_features() {
        problems.push(format!(
            "feature order has {} entries but the model expects {}",
            order.len(),
            model.num_features()
        ));
    }

    let names = model.feature_names();
    if !names.is_empty() && names.len() == order.len() {
        for (idx, (listed, trained)) in order.iter().zip(names).enumerate() {
            if listed != trained {
                problems.push(format!(
                    "column {} is '{}' but the model was trained with '{}'",
                    idx + 1,
                    listed,
                    trained
                ));
            }
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthcare_cost::model::LightGbmModel;

    const MODEL: &str = "tree
max_feature_idx=1
objective=regression
feature_names=age bmi

Tree=0
num_leaves=1
leaf_value=100

end of trees
";

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_model_summary_from_loaded_scorer() {
        let model: LightGbmModel = MODEL.parse().unwrap();
        let summary = model_summary(&model);
        assert_eq!(summary[0], ("Trees", "1".to_string()));
        assert_eq!(summary[1], ("Features", "2".to_string()));
        assert_eq!(summary[2], ("Objective", "regression".to_string()));
    }

    #[test]
    fn test_consistent_artifacts() {
        let model: LightGbmModel = MODEL.parse().unwrap();
        assert!(find_problems(&names(&["age", "bmi"]), &model).is_empty());
    }

    #[test]
    fn test_swapped_columns_reported() {
        let model: LightGbmModel = MODEL.parse().unwrap();
        let problems = find_problems(&names(&["bmi", "age"]), &model);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("column 1"));
    }

    #[test]
    fn test_unknown_and_missing_columns_reported() {
        let model: LightGbmModel = MODEL.parse().unwrap();
        let problems = find_problems(&names(&["income"]), &model);
        assert!(problems.iter().any(|p| p.contains("not produced by the encoder")));
        assert!(problems.iter().any(|p| p.contains("model expects 2")));
    }
}
