use crate::cli::SelectArgs;
use crate::config::Config;
use crate::dispatch::{plan_reviews, ReviewPlan};
use crate::owners::{canonicalize, LocalOwnersSource, OwnersSource};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::process::Command;
use tracing::info;

pub async fn execute(config_path: &Path, args: SelectArgs) -> anyhow::Result<()> {
    let mut config = Config::load_or_default(config_path)?;

    // Apply CLI overrides; status lookups need the API, so never here
    if let Some(count) = args.count {
        config.blunderbuss.request_count = Some(count);
    }
    if let Some(max) = args.max {
        config.blunderbuss.max_request_count = max;
    }
    if args.exclude_approvers {
        config.blunderbuss.exclude_approvers = true;
    }
    config.blunderbuss.use_status_availability = false;

    let files: Vec<String> = match &args.base {
        Some(base) => changed_files(&args.root, base)?,
        None if !args.files.is_empty() => args.files.iter().map(|f| canonicalize(f)).collect(),
        None => anyhow::bail!("Pass the changed files, or --base <REF> to diff against"),
    };
    info!("Selecting reviewers for {} changed files", files.len());

    let source = LocalOwnersSource::new(
        args.root.clone(),
        config.owners.filename.clone(),
        config.owners.aliases_filename.clone(),
    );
    let owners = source.load("", "", "").await?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let plan = plan_reviews(
        &owners,
        &files,
        &args.author,
        &config.blunderbuss,
        None,
        &mut rng,
    )
    .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

/// Files changed since `base`, relative to the repository root
fn changed_files(root: &Path, base: &str) -> anyhow::Result<Vec<String>> {
    let output = Command::new("git")
        .current_dir(root)
        .args(["diff", "--name-only", base])
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git diff failed: {}", stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

fn print_plan(plan: &ReviewPlan) {
    if plan.is_empty() {
        println!("No reviewers found.");
        return;
    }

    println!("Reviewers:");
    for login in &plan.reviewers {
        println!("  {}", login);
    }
    if plan.approvers_added > 0 {
        println!("  ({} added from approvers)", plan.approvers_added);
    }
    if !plan.required.is_empty() {
        println!("Required reviewers:");
        for login in &plan.required {
            println!("  {}", login);
        }
    }
}
