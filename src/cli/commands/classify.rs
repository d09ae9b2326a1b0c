//! Classification command handlers

use metrics_exporter_prometheus::PrometheusHandle;

use crate::apt::AptProfile;
use crate::config::Config;
use crate::domain::{Worklist, WriteMode};
use crate::services::{
    BatchOptions, BatchReport, ClassificationError, ClassificationService, ClassifyOptions,
    ClassifyOutcome,
};

pub struct ClassifyArgs {
    pub all: bool,
    pub limit: Option<u64>,
    pub force: bool,
    pub parallelism: Option<usize>,
}

pub async fn cmd_classify(
    config: &Config,
    args: ClassifyArgs,
    metrics: Option<&PrometheusHandle>,
) -> anyhow::Result<()> {
    let service = super::build_classification_service(config).await?;

    let options = BatchOptions {
        worklist: if args.all {
            Worklist::All
        } else {
            Worklist::Unclassified
        },
        limit: args.limit,
        mode: WriteMode::from_force_flag(args.force),
        parallelism: args.parallelism,
    };

    println!("Classifying artists...");
    let report = service.classify_batch(options).await?;
    print_report(&report);

    if let Some(handle) = metrics {
        write_metrics_snapshot(config, handle).await;
    }

    if let Some(reason) = report.aborted {
        anyhow::bail!("Batch aborted: {reason}");
    }

    Ok(())
}

pub async fn cmd_classify_one(
    config: &Config,
    id_str: &str,
    force: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let id = super::parse_artist_id(id_str)?;
    let service = super::build_classification_service(config).await?;

    let options = ClassifyOptions {
        mode: WriteMode::from_force_flag(force),
        dry_run,
    };

    match service.classify_artist(id, options).await {
        Ok(ClassifyOutcome::Undetermined { reasoning }) => {
            println!("⚠ Artist {id} left unclassified: scores too close to neutral");
            println!("  {reasoning}");
        }
        Ok(ClassifyOutcome::SkippedClaimed) => {
            println!("⚠ Artist {id} is being classified by another worker");
        }
        Ok(outcome) => {
            let Some(classification) = outcome.classification() else {
                return Ok(());
            };
            let heading = match &outcome {
                ClassifyOutcome::DryRun(_) => "Dry run (not stored)",
                ClassifyOutcome::Unchanged(_) => "✓ Profile unchanged",
                _ => "✓ Profile stored",
            };
            println!("{heading}");
            print_profile(&classification.profile);
            for discarded in &classification.discarded {
                println!("  ⚠ {} ignored: {}", discarded.source, discarded.reason);
            }
        }
        Err(ClassificationError::ProtectedProfile(_)) => {
            println!("⚠ Artist {id} has an expert preset. Use --force to overwrite it.");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

fn print_profile(profile: &AptProfile) {
    println!("{:-<60}", "");
    for entry in &profile.primary_types {
        println!(
            "  #{} {} {:>5.1}%  {}",
            entry.rank,
            entry.code,
            entry.weight * 100.0,
            entry.code.info().title
        );
    }
    let dims = &profile.dimensions;
    println!(
        "  L_S {:.2} | A_R {:.2} | E_M {:.2} | F_C {:.2}",
        dims.l_s, dims.a_r, dims.e_m, dims.f_c
    );
    println!("  Confidence: {:.3}", profile.meta.confidence);
    println!("  Method:     {}", profile.meta.classification_method);
    if !profile.meta.data_sources.is_empty() {
        println!("  Sources:    {}", profile.meta.data_sources.join(", "));
    }
    println!("  Reasoning:  {}", profile.meta.reasoning);
}

fn print_report(report: &BatchReport) {
    println!();
    println!("Batch Summary");
    println!("{:-<60}", "");
    println!("Processed:          {}", report.processed());
    println!("Written:            {}", report.written);
    println!("Unchanged:          {}", report.unchanged);
    println!("Undetermined:       {}", report.undetermined);
    println!("Protected (kept):   {}", report.rejected_protected);
    println!("Claimed elsewhere:  {}", report.skipped_claimed);
    println!("Failed:             {}", report.failures.len());
    println!("Elapsed:            {:.1}s", report.elapsed.as_secs_f64());

    if !report.failures.is_empty() {
        println!();
        println!("Failures:");
        for (id, reason) in &report.failures {
            println!("  ✗ [{id}] {reason}");
        }
    }
}

async fn write_metrics_snapshot(config: &Config, handle: &PrometheusHandle) {
    let Some(path) = config.observability.metrics_path.as_deref() else {
        return;
    };

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
    }

    match tokio::fs::write(path, handle.render()).await {
        Ok(()) => tracing::debug!(path = %path, "Wrote metrics snapshot"),
        Err(e) => tracing::warn!(path = %path, error = %e, "Failed to write metrics snapshot"),
    }
}
